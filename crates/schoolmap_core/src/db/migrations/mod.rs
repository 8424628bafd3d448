//! Numbered schema steps for the school store.
//!
//! Each step runs in its own transaction together with the
//! `PRAGMA user_version` bump, so a failed step leaves the database at the
//! previous version.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

struct SchemaStep {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const STEPS: [SchemaStep; 2] = [
    SchemaStep {
        version: 1,
        name: "schools_table",
        sql: include_str!("0001_init.sql"),
    },
    SchemaStep {
        version: 2,
        name: "location_index",
        sql: include_str!("0002_location_index.sql"),
    },
];

/// Schema version a fully migrated database reports.
pub fn latest_version() -> u32 {
    STEPS.last().map_or(0, |step| step.version)
}

/// Brings `conn` up to `latest_version()`.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the file was written by a newer binary.
/// - `Sqlite` when a step fails; earlier steps stay committed.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let found: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    let latest = latest_version();
    if found > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: found,
            latest_supported: latest,
        });
    }

    for step in STEPS.iter().skip_while(|step| step.version <= found) {
        let tx = conn.transaction()?;
        tx.execute_batch(step.sql)?;
        tx.pragma_update(None, "user_version", step.version)?;
        tx.commit()?;
        info!(
            "event=db_migrate module=db status=ok version={} step={}",
            step.version, step.name
        );
    }
    Ok(())
}

//! Embedded SQLite store for school documents.
//!
//! `open_db`/`open_db_in_memory` return migrated connections;
//! `StoreSession` shares one of them across requests and opens it on
//! first use.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;
mod session;

pub use open::{open_db, open_db_in_memory};
pub use session::{StoreLocation, StoreSession};

pub type DbResult<T> = Result<T, DbError>;

/// Failure to reach a usable store.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The file carries a schema this binary does not know.
    UnsupportedSchemaVersion { db_version: u32, latest_supported: u32 },
    /// A request panicked while holding the shared connection.
    SessionPoisoned,
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "store schema v{db_version} is ahead of this binary (max v{latest_supported})"
            ),
            Self::SessionPoisoned => f.write_str("store session is poisoned"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        if let Self::Sqlite(err) = self {
            Some(err)
        } else {
            None
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

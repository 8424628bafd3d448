use rusqlite::Connection;
use schoolmap_core::db::migrations::latest_version;
use schoolmap_core::db::{open_db, open_db_in_memory, DbError};

fn user_version(conn: &Connection) -> u32 {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .unwrap()
}

fn has_index(conn: &Connection, name: &str) -> bool {
    conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = ?1;",
        [name],
        |row| row.get::<_, i64>(0),
    )
    .unwrap()
        > 0
}

#[test]
fn fresh_store_has_schools_table_and_indexes() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(user_version(&conn), latest_version());
    let columns = conn
        .prepare("SELECT name FROM pragma_table_info('schools') ORDER BY cid;")
        .unwrap()
        .query_map([], |row| row.get::<_, String>(0))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    for expected in ["uuid", "school_code", "homepage_url", "created_at", "updated_at"] {
        assert!(columns.iter().any(|column| column == expected), "missing {expected}");
    }
    assert!(has_index(&conn, "idx_schools_name"));
    assert!(has_index(&conn, "idx_schools_location"));
}

#[test]
fn reopening_a_migrated_file_keeps_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("schools.db");

    let conn = open_db(&path).unwrap();
    conn.execute(
        "INSERT INTO schools (uuid, school_code, school_name, longitude, latitude)
         VALUES ('a', 'S1', 'Kept', 127.0, 37.5);",
        [],
    )
    .unwrap();
    drop(conn);

    let reopened = open_db(&path).unwrap();
    let count: i64 = reopened
        .query_row("SELECT COUNT(*) FROM schools;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
    assert_eq!(user_version(&reopened), latest_version());
}

#[test]
fn version_one_store_gains_location_index() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("v1.db");

    let legacy = Connection::open(&path).unwrap();
    legacy
        .execute_batch(
            "CREATE TABLE schools (
                uuid TEXT PRIMARY KEY NOT NULL,
                school_code TEXT NOT NULL UNIQUE,
                office_code TEXT,
                school_name TEXT NOT NULL,
                school_level TEXT NOT NULL DEFAULT '',
                address TEXT NOT NULL DEFAULT '',
                longitude REAL NOT NULL,
                latitude REAL NOT NULL,
                phone_number TEXT,
                homepage_url TEXT,
                created_at INTEGER NOT NULL DEFAULT 0,
                updated_at INTEGER NOT NULL DEFAULT 0
            );
            CREATE INDEX idx_schools_name ON schools (school_name);
            PRAGMA user_version = 1;",
        )
        .unwrap();
    drop(legacy);

    let upgraded = open_db(&path).unwrap();
    assert_eq!(user_version(&upgraded), 2);
    assert!(has_index(&upgraded, "idx_schools_location"));
}

#[test]
fn store_from_newer_binary_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");
    Connection::open(&path)
        .unwrap()
        .pragma_update(None, "user_version", 42u32)
        .unwrap();

    let err = open_db(&path).unwrap_err();
    assert!(matches!(
        err,
        DbError::UnsupportedSchemaVersion { db_version: 42, latest_supported } if latest_supported == latest_version()
    ));
}

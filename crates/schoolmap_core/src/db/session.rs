//! Shared store session.
//!
//! # Responsibility
//! - Own the single connection reused by every listing request.
//! - Open and migrate that connection on first use.
//!
//! # Invariants
//! - A successful open is cached for the session lifetime.
//! - A failed open is not cached; the next call retries it.
//! - Access to the connection is serialized.

use super::{open_db, open_db_in_memory, DbError, DbResult};
use once_cell::sync::OnceCell;
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::Mutex;

/// Where a session finds its database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    File(PathBuf),
    Memory,
}

/// Lazily opened, process-wide store handle.
///
/// Created once at startup and passed explicitly to request handlers.
#[derive(Debug)]
pub struct StoreSession {
    location: StoreLocation,
    conn: OnceCell<Mutex<Connection>>,
}

impl StoreSession {
    pub fn new(location: StoreLocation) -> Self {
        Self {
            location,
            conn: OnceCell::new(),
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(StoreLocation::File(path.into()))
    }

    pub fn in_memory() -> Self {
        Self::new(StoreLocation::Memory)
    }

    pub fn location(&self) -> &StoreLocation {
        &self.location
    }

    /// Returns whether the connection has been opened already.
    pub fn is_open(&self) -> bool {
        self.conn.get().is_some()
    }

    /// Runs `f` against the shared connection, opening it on first use.
    ///
    /// # Errors
    /// - Returns `DbError` (converted into `E`) when the open or migration
    ///   fails, or when a previous holder panicked while using the connection.
    pub fn with_connection<T, E>(&self, f: impl FnOnce(&Connection) -> Result<T, E>) -> Result<T, E>
    where
        E: From<DbError>,
    {
        let cell = self.conn.get_or_try_init(|| self.open().map(Mutex::new))?;
        let guard = cell.lock().map_err(|_| DbError::SessionPoisoned)?;
        f(&guard)
    }

    fn open(&self) -> DbResult<Connection> {
        match &self.location {
            StoreLocation::File(path) => open_db(path),
            StoreLocation::Memory => open_db_in_memory(),
        }
    }
}

//! Paginated school listing.
//!
//! # Responsibility
//! - Turn caller-supplied pagination strings into a page window.
//! - Read one page plus the full store count through a repository.
//!
//! # Invariants
//! - Malformed or absent pagination never fails; defaults apply instead.
//! - `total` counts the whole store, independent of `limit`/`skip`.
//! - Store failures surface as `StoreUnavailable` with no partial results.

use crate::db::{DbError, StoreSession};
use crate::model::school::School;
use crate::repo::school_repo::{PageWindow, RepoError, SchoolRepository, SqliteSchoolRepository};
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub const DEFAULT_LIMIT: u32 = 100;
pub const DEFAULT_SKIP: u32 = 0;

/// Normalized pagination parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: u32,
    pub skip: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            skip: DEFAULT_SKIP,
        }
    }
}

impl PageRequest {
    pub fn new(limit: u32, skip: u32) -> Self {
        Self { limit, skip }
    }

    /// Parses raw query values, falling back to defaults per field.
    pub fn from_params(limit: Option<&str>, skip: Option<&str>) -> Self {
        Self {
            limit: parse_or_default("limit", limit, DEFAULT_LIMIT),
            skip: parse_or_default("skip", skip, DEFAULT_SKIP),
        }
    }

    fn window(self) -> PageWindow {
        PageWindow {
            limit: self.limit,
            skip: self.skip,
        }
    }
}

fn parse_or_default(name: &str, raw: Option<&str>, default: u32) -> u32 {
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().parse::<u32>() {
        Ok(value) => value,
        Err(_) => {
            debug!(
                "event=pagination_fallback module=listing status=recovered param={} default={}",
                name, default
            );
            default
        }
    }
}

/// One page of schools plus the full store count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchoolListing {
    pub schools: Vec<School>,
    pub total: u64,
    pub limit: u32,
    pub skip: u32,
}

/// Listing failure kinds.
#[derive(Debug)]
pub enum ListingError {
    StoreUnavailable(RepoError),
}

impl Display for ListingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StoreUnavailable(err) => write!(f, "school store unavailable: {err}"),
        }
    }
}

impl Error for ListingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StoreUnavailable(err) => Some(err),
        }
    }
}

impl From<RepoError> for ListingError {
    fn from(value: RepoError) -> Self {
        Self::StoreUnavailable(value)
    }
}

impl From<DbError> for ListingError {
    fn from(value: DbError) -> Self {
        Self::StoreUnavailable(RepoError::Db(value))
    }
}

/// Read-only listing use case over a school repository.
pub struct ListingService<R: SchoolRepository> {
    repo: R,
}

impl<R: SchoolRepository> ListingService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Returns at most `request.limit` schools starting at `request.skip`.
    pub fn list(&self, request: &PageRequest) -> Result<SchoolListing, ListingError> {
        let started_at = Instant::now();
        match self.fetch(request) {
            Ok(listing) => {
                info!(
                    "event=schools_list module=listing status=ok limit={} skip={} returned={} total={} duration_ms={}",
                    listing.limit,
                    listing.skip,
                    listing.schools.len(),
                    listing.total,
                    started_at.elapsed().as_millis()
                );
                Ok(listing)
            }
            Err(err) => {
                error!(
                    "event=schools_list module=listing status=error limit={} skip={} duration_ms={} error={}",
                    request.limit,
                    request.skip,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err.into())
            }
        }
    }

    fn fetch(&self, request: &PageRequest) -> Result<SchoolListing, RepoError> {
        let schools = self.repo.find_schools(request.window())?;
        let total = self.repo.count_schools()?;
        Ok(SchoolListing {
            schools,
            total,
            limit: request.limit,
            skip: request.skip,
        })
    }
}

/// Lists schools through the session's shared connection.
pub fn list_schools(
    session: &StoreSession,
    request: &PageRequest,
) -> Result<SchoolListing, ListingError> {
    session.with_connection(|conn| ListingService::new(SqliteSchoolRepository::new(conn)).list(request))
}

//! School repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide paginated find and full count over the `schools` table.
//! - Provide the upsert used by bulk import.
//!
//! # Invariants
//! - `find_schools` selects only projected columns, ordered by identity.
//! - Read paths reject invalid persisted state instead of masking it.
//! - `upsert_school` resolves and writes a school code in one immediate transaction.

use crate::db::DbError;
use crate::model::school::{
    GeoPoint, School, SchoolDocument, SchoolId, SchoolValidationError,
};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const SCHOOL_PROJECTION_SQL: &str = "SELECT
    uuid,
    school_name,
    school_level,
    address,
    longitude,
    latitude,
    phone_number
FROM schools";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for school persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(SchoolValidationError),
    Db(DbError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted school data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<SchoolValidationError> for RepoError {
    fn from(value: SchoolValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Page window applied to `find_schools`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub limit: u32,
    pub skip: u32,
}

/// Repository interface for the school directory.
pub trait SchoolRepository {
    fn find_schools(&self, window: PageWindow) -> RepoResult<Vec<School>>;
    fn count_schools(&self) -> RepoResult<u64>;
    fn upsert_school(&self, document: &SchoolDocument) -> RepoResult<SchoolId>;
}

/// SQLite-backed school repository.
pub struct SqliteSchoolRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSchoolRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl SchoolRepository for SqliteSchoolRepository<'_> {
    fn find_schools(&self, window: PageWindow) -> RepoResult<Vec<School>> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "{SCHOOL_PROJECTION_SQL} ORDER BY uuid ASC LIMIT ?1 OFFSET ?2;"
        ))?;
        let mut rows = stmt.query(params![i64::from(window.limit), i64::from(window.skip)])?;
        let mut schools = Vec::new();

        while let Some(row) = rows.next()? {
            schools.push(parse_school_row(row)?);
        }

        Ok(schools)
    }

    fn count_schools(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM schools;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative school count {count}")))
    }

    fn upsert_school(&self, document: &SchoolDocument) -> RepoResult<SchoolId> {
        let (longitude, latitude) = document.validate()?;

        // Write lock is held from the lookup until commit.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let existing = tx
            .query_row(
                "SELECT uuid FROM schools WHERE school_code = ?1;",
                [document.school_code.as_str()],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        let id = match existing {
            Some(uuid_text) => {
                let id = parse_uuid(&uuid_text)?;
                tx.execute(
                    "UPDATE schools
                     SET
                        office_code = ?1,
                        school_name = ?2,
                        school_level = ?3,
                        address = ?4,
                        longitude = ?5,
                        latitude = ?6,
                        phone_number = ?7,
                        homepage_url = ?8,
                        updated_at = (strftime('%s', 'now') * 1000)
                     WHERE uuid = ?9;",
                    params![
                        document.office_code.as_deref(),
                        document.school_name.as_str(),
                        document.school_level.as_str(),
                        document.address.as_str(),
                        longitude,
                        latitude,
                        document.phone_number.as_deref(),
                        document.homepage_url.as_deref(),
                        uuid_text,
                    ],
                )?;
                id
            }
            None => {
                let id = Uuid::new_v4();
                tx.execute(
                    "INSERT INTO schools (
                        uuid,
                        school_code,
                        office_code,
                        school_name,
                        school_level,
                        address,
                        longitude,
                        latitude,
                        phone_number,
                        homepage_url
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
                    params![
                        id.to_string(),
                        document.school_code.as_str(),
                        document.office_code.as_deref(),
                        document.school_name.as_str(),
                        document.school_level.as_str(),
                        document.address.as_str(),
                        longitude,
                        latitude,
                        document.phone_number.as_deref(),
                        document.homepage_url.as_deref(),
                    ],
                )?;
                id
            }
        };

        tx.commit()?;
        Ok(id)
    }
}

fn parse_school_row(row: &Row<'_>) -> RepoResult<School> {
    let uuid_text: String = row.get("uuid")?;
    let id = parse_uuid(&uuid_text)?;

    let longitude: f64 = row.get("longitude")?;
    let latitude: f64 = row.get("latitude")?;
    if !longitude.is_finite() || !latitude.is_finite() {
        return Err(RepoError::InvalidData(format!(
            "non-finite location ({longitude}, {latitude}) for school {id}"
        )));
    }

    Ok(School {
        id,
        school_name: row.get("school_name")?,
        school_level: row.get("school_level")?,
        address: row.get("address")?,
        phone_number: row.get("phone_number")?,
        location: GeoPoint::point(longitude, latitude),
    })
}

fn parse_uuid(value: &str) -> RepoResult<SchoolId> {
    Uuid::parse_str(value).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{value}` in schools.uuid"))
    })
}

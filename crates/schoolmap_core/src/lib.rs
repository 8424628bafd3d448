//! Core domain logic for the school map directory.
//! Record store access, paginated listing, map rendering and the detail panel.

pub mod db;
pub mod logging;
pub mod map;
pub mod model;
pub mod panel;
pub mod repo;
pub mod service;
pub mod view;

pub use db::{StoreLocation, StoreSession};
pub use logging::{
    default_log_level, init_logging, logging_status, normalize_level, LoggingConfig,
};
pub use model::school::{
    CoordinateError, GeoPoint, School, SchoolDocument, SchoolId, SchoolValidationError,
};
pub use panel::{render_detail, DetailField, DetailView};
pub use repo::school_repo::{
    PageWindow, RepoError, RepoResult, SchoolRepository, SqliteSchoolRepository,
};
pub use service::listing_service::{
    list_schools, ListingError, ListingService, PageRequest, SchoolListing, DEFAULT_LIMIT,
    DEFAULT_SKIP,
};
pub use view::{OpenReport, SchoolMapView, SchoolSource, SourceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

//! HTTP boundary for the school directory.
//!
//! # Responsibility
//! - Serve the paginated school listing and a health check over HTTP.
//! - Fetch listing pages from a running server for map clients.
//!
//! # Invariants
//! - Handlers never panic; store failures become a 500 envelope.
//! - Pagination input never produces a 4xx response.

pub mod client;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod server;

pub use client::SchoolsClient;
pub use models::{ErrorResponse, HealthResponse, ListSchoolsResponse};
pub use routes::configure_routes;
pub use server::{run_server, ServerSettings};

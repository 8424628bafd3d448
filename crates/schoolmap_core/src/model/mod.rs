//! Domain model for school directory records.
//!
//! # Responsibility
//! - Define the public School Record shape served by the listing endpoint.
//! - Define the stored document shape accepted by the import path.
//!
//! # Invariants
//! - Every record is identified by a stable `SchoolId`.
//! - `location.coordinates` is ordered `[longitude, latitude]`.

pub mod school;

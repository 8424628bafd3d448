//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the find/count contract the listing service reads through.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Read paths only ever return the public projection.
//! - Write paths validate documents before SQL mutations.

pub mod school_repo;

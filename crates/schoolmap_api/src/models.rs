//! Response envelopes shared by handlers and the client.

use schoolmap_core::SchoolListing;
use serde::{Deserialize, Serialize};

/// `200 OK` body of `GET /api/schools`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListSchoolsResponse {
    pub success: bool,
    #[serde(flatten)]
    pub listing: SchoolListing,
}

impl ListSchoolsResponse {
    pub fn ok(listing: SchoolListing) -> Self {
        Self {
            success: true,
            listing,
        }
    }
}

/// Failure envelope; carries only a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

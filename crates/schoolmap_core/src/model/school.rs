//! School record and geospatial point model.
//!
//! # Responsibility
//! - Define the projected record shared by the listing service and the map.
//! - Validate coordinate pairs before they are stored or rendered.
//!
//! # Invariants
//! - Storage order of a point is `[longitude, latitude]`.
//! - Display order of a point is `(latitude, longitude)`.
//! - A stored document always carries a non-empty `school_code` and name.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for one school record.
pub type SchoolId = Uuid;

/// GeoJSON geometry tag used for every stored location.
pub const POINT_KIND: &str = "Point";

/// GeoJSON-style point as delivered over the wire.
///
/// Coordinates stay loosely typed so a malformed pair from a remote source
/// can be rejected per record instead of failing the whole payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Vec<Value>,
}

impl GeoPoint {
    /// Builds a point from storage-ordered values.
    pub fn point(longitude: f64, latitude: f64) -> Self {
        Self {
            kind: POINT_KIND.to_string(),
            coordinates: vec![Value::from(longitude), Value::from(latitude)],
        }
    }

    /// Returns `(longitude, latitude)` when the pair is two finite numbers.
    pub fn lng_lat(&self) -> Result<(f64, f64), CoordinateError> {
        let [longitude, latitude] = self.coordinates.as_slice() else {
            return Err(CoordinateError::WrongArity(self.coordinates.len()));
        };
        Ok((finite(longitude, 0)?, finite(latitude, 1)?))
    }
}

fn finite(value: &Value, index: usize) -> Result<f64, CoordinateError> {
    match value.as_f64() {
        Some(number) if number.is_finite() => Ok(number),
        _ => Err(CoordinateError::NotANumber {
            index,
            value: value.to_string(),
        }),
    }
}

/// Reason a coordinate pair cannot be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinateError {
    WrongArity(usize),
    NotANumber { index: usize, value: String },
}

impl Display for CoordinateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WrongArity(len) => {
                write!(f, "coordinates must hold exactly 2 values, got {len}")
            }
            Self::NotANumber { index, value } => {
                write!(f, "coordinate #{index} is not a finite number: {value}")
            }
        }
    }
}

impl Error for CoordinateError {}

/// Public projection of a school served to clients.
///
/// Only identity, name, level, address, location and phone are exposed;
/// homepage and audit columns never leave the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct School {
    #[serde(rename = "_id")]
    pub id: SchoolId,
    pub school_name: String,
    #[serde(default)]
    pub school_level: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub location: GeoPoint,
}

/// Full stored document accepted by the bulk import path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolDocument {
    /// External registry code; unique across the store.
    #[serde(rename = "sdSchulCode")]
    pub school_code: String,
    /// Education office code.
    #[serde(rename = "atptOfcdcScCode", default)]
    pub office_code: Option<String>,
    pub school_name: String,
    #[serde(default)]
    pub school_level: String,
    #[serde(default)]
    pub address: String,
    pub location: GeoPoint,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub homepage_url: Option<String>,
}

impl SchoolDocument {
    /// Validates invariants required before the document is written.
    pub fn validate(&self) -> Result<(f64, f64), SchoolValidationError> {
        if self.school_code.trim().is_empty() {
            return Err(SchoolValidationError::MissingSchoolCode);
        }
        if self.school_name.trim().is_empty() {
            return Err(SchoolValidationError::MissingSchoolName {
                school_code: self.school_code.clone(),
            });
        }
        if self.location.kind != POINT_KIND {
            return Err(SchoolValidationError::UnsupportedGeometry(
                self.location.kind.clone(),
            ));
        }
        self.location
            .lng_lat()
            .map_err(|source| SchoolValidationError::InvalidLocation {
                school_code: self.school_code.clone(),
                source,
            })
    }
}

/// Validation failures for stored school documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchoolValidationError {
    MissingSchoolCode,
    MissingSchoolName {
        school_code: String,
    },
    UnsupportedGeometry(String),
    InvalidLocation {
        school_code: String,
        source: CoordinateError,
    },
}

impl Display for SchoolValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingSchoolCode => write!(f, "school_code cannot be empty"),
            Self::MissingSchoolName { school_code } => {
                write!(f, "school `{school_code}` has an empty name")
            }
            Self::UnsupportedGeometry(kind) => {
                write!(f, "unsupported location type `{kind}`; expected `Point`")
            }
            Self::InvalidLocation {
                school_code,
                source,
            } => write!(f, "school `{school_code}` has an invalid location: {source}"),
        }
    }
}

impl Error for SchoolValidationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidLocation { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CoordinateError, GeoPoint, SchoolDocument, SchoolValidationError};
    use serde_json::json;

    fn document(coordinates: serde_json::Value) -> SchoolDocument {
        serde_json::from_value(json!({
            "sdSchulCode": "7010057",
            "schoolName": "Seoul Central High",
            "location": { "type": "Point", "coordinates": coordinates }
        }))
        .unwrap()
    }

    #[test]
    fn lng_lat_keeps_storage_order() {
        let point = GeoPoint::point(127.0, 37.5);
        assert_eq!(point.lng_lat().unwrap(), (127.0, 37.5));
    }

    #[test]
    fn lng_lat_rejects_text_and_short_pairs() {
        let text: GeoPoint =
            serde_json::from_value(json!({ "type": "Point", "coordinates": ["abc", 10] }))
                .unwrap();
        assert!(matches!(
            text.lng_lat(),
            Err(CoordinateError::NotANumber { index: 0, .. })
        ));

        let short: GeoPoint =
            serde_json::from_value(json!({ "type": "Point", "coordinates": [10] })).unwrap();
        assert_eq!(short.lng_lat(), Err(CoordinateError::WrongArity(1)));
    }

    #[test]
    fn non_finite_values_serialize_as_null_and_are_rejected() {
        let point = GeoPoint::point(f64::NAN, 37.5);
        assert!(point.lng_lat().is_err());
    }

    #[test]
    fn validate_requires_code_name_and_location() {
        assert_eq!(document(json!([126.9, 37.5])).validate().unwrap(), (126.9, 37.5));

        let mut missing_code = document(json!([126.9, 37.5]));
        missing_code.school_code = "  ".to_string();
        assert_eq!(
            missing_code.validate(),
            Err(SchoolValidationError::MissingSchoolCode)
        );

        let bad_location = document(json!([126.9]));
        assert!(matches!(
            bad_location.validate(),
            Err(SchoolValidationError::InvalidLocation { .. })
        ));
    }
}

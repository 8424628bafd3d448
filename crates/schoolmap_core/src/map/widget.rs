//! Capability interface toward the third-party map widget.
//!
//! The renderer only talks to the widget through `WidgetRuntime`; handles are
//! opaque, cheap to clone and owned by the widget implementation.

use crate::model::school::{CoordinateError, GeoPoint};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Display-ordered position (`lat`, `lng`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Converts a storage-ordered `[lng, lat]` point into display order.
    pub fn from_point(point: &GeoPoint) -> Result<Self, CoordinateError> {
        let (lng, lat) = point.lng_lat()?;
        Ok(Self { lat, lng })
    }
}

/// Smallest rectangle enclosing a set of positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLngBounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl LatLngBounds {
    pub fn around(position: LatLng) -> Self {
        Self {
            south_west: position,
            north_east: position,
        }
    }

    pub fn extend(&mut self, position: LatLng) {
        self.south_west.lat = self.south_west.lat.min(position.lat);
        self.south_west.lng = self.south_west.lng.min(position.lng);
        self.north_east.lat = self.north_east.lat.max(position.lat);
        self.north_east.lng = self.north_east.lng.max(position.lng);
    }

    /// Returns `None` for an empty set of positions.
    pub fn enclosing(positions: impl IntoIterator<Item = LatLng>) -> Option<Self> {
        let mut positions = positions.into_iter();
        let mut bounds = Self::around(positions.next()?);
        for position in positions {
            bounds.extend(position);
        }
        Some(bounds)
    }

    pub fn contains(&self, position: LatLng) -> bool {
        (self.south_west.lat..=self.north_east.lat).contains(&position.lat)
            && (self.south_west.lng..=self.north_east.lng).contains(&position.lng)
    }
}

/// Options for constructing the map instance.
#[derive(Debug, Clone, PartialEq)]
pub struct MapOptions {
    pub center: LatLng,
    pub zoom: u8,
}

/// Options for constructing one marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerOptions {
    pub position: LatLng,
    pub title: String,
}

/// Handler invoked by the widget when a marker is clicked.
pub type ClickHandler = Box<dyn Fn() + Send + Sync + 'static>;

/// Failure reported by the widget runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetError {
    message: String,
}

impl WidgetError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for WidgetError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for WidgetError {}

/// Operations the renderer needs from a loaded map widget.
pub trait WidgetRuntime: Send + Sync + 'static {
    type Map: Clone + Send + Sync + 'static;
    type Marker: Clone + Send + Sync + 'static;
    type InfoWindow: Clone + Send + Sync + 'static;

    fn create_map(&self, container: &str, options: &MapOptions) -> Result<Self::Map, WidgetError>;

    /// Creates a marker already attached to `map`.
    fn create_marker(
        &self,
        map: &Self::Map,
        options: &MarkerOptions,
    ) -> Result<Self::Marker, WidgetError>;

    /// Creates an info window owned by `marker`; it goes away with the marker.
    fn create_info_window(
        &self,
        marker: &Self::Marker,
        content: &str,
    ) -> Result<Self::InfoWindow, WidgetError>;

    fn open_info_window(&self, window: &Self::InfoWindow, map: &Self::Map, marker: &Self::Marker);

    fn add_click_listener(
        &self,
        marker: &Self::Marker,
        handler: ClickHandler,
    ) -> Result<(), WidgetError>;

    fn set_bounds(&self, map: &Self::Map, bounds: &LatLngBounds) -> Result<(), WidgetError>;

    /// Detaches a marker from its map. Removing twice is a no-op.
    fn remove_marker(&self, marker: &Self::Marker);
}

/// Result of one non-blocking probe for the widget runtime.
pub enum LoadState<W> {
    Pending,
    Ready(Arc<W>),
    Failed(WidgetError),
}

/// Source of the widget runtime, probed until it becomes available.
pub trait WidgetLoader {
    type Runtime: WidgetRuntime;

    fn poll_runtime(&self) -> LoadState<Self::Runtime>;
}

//! Map rendering of school records.
//!
//! # Responsibility
//! - Wait for the map widget runtime without blocking the host.
//! - Translate school records into markers and keep them in sync with the
//!   latest record set.
//! - Report marker clicks to the caller.
//!
//! # Invariants
//! - The renderer depends on the `WidgetRuntime` capability trait only.
//! - Rendering failures stay inside this module as logged `MapError`s.

mod error;
pub mod headless;
mod readiness;
mod renderer;
pub mod widget;

pub use error::{InitFailure, MapError, MarkerFailure};
pub use readiness::{wait_for_runtime, ReadinessPolicy, DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL};
pub use renderer::{
    info_window_content, MapConfig, MapRenderer, RenderReport, RendererPhase, SelectionCallback,
    DEFAULT_CENTER, DEFAULT_CONTAINER, DEFAULT_ZOOM,
};
pub use widget::{
    ClickHandler, LatLng, LatLngBounds, LoadState, MapOptions, MarkerOptions, WidgetError,
    WidgetLoader, WidgetRuntime,
};

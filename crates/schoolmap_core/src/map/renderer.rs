//! Marker lifecycle over a map widget.
//!
//! # Responsibility
//! - Create the map once the widget runtime is available.
//! - Keep exactly one marker per record of the latest supplied set.
//! - Delegate marker clicks to the caller's selection callback.
//!
//! # Invariants
//! - Markers from a previous set are removed before the next set is placed.
//! - A record with an unusable location never blocks the rest of its set.
//! - A set supplied before the map exists is rendered right after creation.

use super::error::{InitFailure, MapError, MarkerFailure};
use super::readiness::{wait_for_runtime, ReadinessPolicy};
use super::widget::{
    LatLng, LatLngBounds, MapOptions, MarkerOptions, WidgetLoader, WidgetRuntime,
};
use crate::model::school::School;
use log::{debug, error, info, warn};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_CONTAINER: &str = "school-map";
/// Seoul city hall.
pub const DEFAULT_CENTER: LatLng = LatLng {
    lat: 37.5665,
    lng: 126.978,
};
pub const DEFAULT_ZOOM: u8 = 8;

/// Receives the source record of a clicked marker.
pub type SelectionCallback = Arc<dyn Fn(&School) + Send + Sync>;

/// Fixed map settings.
#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    pub container: String,
    pub center: LatLng,
    pub zoom: u8,
    pub readiness: ReadinessPolicy,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            container: DEFAULT_CONTAINER.to_string(),
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            readiness: ReadinessPolicy::default(),
        }
    }
}

/// Observable renderer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererPhase {
    Uninitialized,
    Ready,
    Populated,
}

/// Outcome of supplying one record set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderReport {
    pub placed: usize,
    pub failures: Vec<MapError>,
    /// The set was held until the map exists.
    pub deferred: bool,
}

struct Mounted<W: WidgetRuntime> {
    runtime: Arc<W>,
    map: W::Map,
}

struct PlacedMarker<W: WidgetRuntime> {
    handle: W::Marker,
    position: LatLng,
    school: Arc<School>,
}

pub struct MapRenderer<W: WidgetRuntime> {
    config: MapConfig,
    on_select: SelectionCallback,
    mounted: Option<Mounted<W>>,
    markers: Vec<PlacedMarker<W>>,
    populated: bool,
    pending: Option<Vec<School>>,
    cancel: CancellationToken,
}

impl<W: WidgetRuntime> MapRenderer<W> {
    pub fn new(config: MapConfig, on_select: SelectionCallback) -> Self {
        Self {
            config,
            on_select,
            mounted: None,
            markers: Vec::new(),
            populated: false,
            pending: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn phase(&self) -> RendererPhase {
        match (&self.mounted, self.populated) {
            (None, _) => RendererPhase::Uninitialized,
            (Some(_), false) => RendererPhase::Ready,
            (Some(_), true) => RendererPhase::Populated,
        }
    }

    /// Token that aborts pending waits when cancelled by the host.
    ///
    /// Cancelling it only affects work already in flight; `teardown` or
    /// `rearm` issue a fresh token for later calls.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Replaces a cancelled token with a fresh one and returns the live token.
    pub fn rearm(&mut self) -> CancellationToken {
        if self.cancel.is_cancelled() {
            debug!("event=map_rearm module=map status=ok");
            self.cancel = CancellationToken::new();
        }
        self.cancel.clone()
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn marker_positions(&self) -> Vec<LatLng> {
        self.markers.iter().map(|marker| marker.position).collect()
    }

    /// Active marker handles paired with their source records.
    pub fn markers(&self) -> impl Iterator<Item = (&W::Marker, &School)> + '_ {
        self.markers
            .iter()
            .map(|marker| (&marker.handle, marker.school.as_ref()))
    }

    /// Waits for the widget runtime and creates the map.
    ///
    /// Runs at most once per mount; calling it on a mounted renderer is a
    /// no-op. Returns the report of a set that arrived before the map did.
    ///
    /// # Errors
    /// - `WidgetInitFailed` when the runtime fails to load, never shows up
    ///   within the readiness policy, or rejects map construction.
    /// - `Cancelled` when the cancellation token fires first.
    pub async fn initialize<L>(&mut self, loader: &L) -> Result<Option<RenderReport>, MapError>
    where
        L: WidgetLoader<Runtime = W>,
    {
        if self.mounted.is_some() {
            return Ok(None);
        }

        info!(
            "event=map_init module=map status=start container={}",
            self.config.container
        );
        let runtime = match wait_for_runtime(loader, &self.config.readiness, &self.cancel).await {
            Ok(runtime) => runtime,
            Err(err) => {
                error!("event=map_init module=map status=error error={err}");
                return Err(err);
            }
        };

        let options = MapOptions {
            center: self.config.center,
            zoom: self.config.zoom,
        };
        let map = match runtime.create_map(&self.config.container, &options) {
            Ok(map) => map,
            Err(err) => {
                let err = MapError::WidgetInitFailed(InitFailure::MapConstruction(err));
                error!("event=map_init module=map status=error error={err}");
                return Err(err);
            }
        };

        self.mounted = Some(Mounted { runtime, map });
        info!(
            "event=map_init module=map status=ok center_lat={} center_lng={} zoom={}",
            options.center.lat, options.center.lng, options.zoom
        );

        Ok(self.pending.take().map(|schools| self.render(schools)))
    }

    /// Replaces every marker with one per record of `schools`.
    ///
    /// Before the map exists the set is held and rendered on mount; a newer
    /// set replaces a held one.
    pub fn supply(&mut self, schools: Vec<School>) -> RenderReport {
        if self.mounted.is_none() {
            debug!(
                "event=markers_render module=map status=deferred records={}",
                schools.len()
            );
            self.pending = Some(schools);
            return RenderReport {
                deferred: true,
                ..RenderReport::default()
            };
        }
        self.render(schools)
    }

    /// Cancels pending waits, removes all markers and unmounts the map.
    pub fn teardown(&mut self) {
        self.cancel.cancel();
        self.cancel = CancellationToken::new();
        self.clear_markers();
        self.pending = None;
        self.populated = false;
        if self.mounted.take().is_some() {
            info!("event=map_teardown module=map status=ok");
        }
    }

    fn render(&mut self, schools: Vec<School>) -> RenderReport {
        self.clear_markers();
        self.populated = true;

        let Some(mounted) = self.mounted.as_ref() else {
            return RenderReport::default();
        };

        let requested = schools.len();
        let mut report = RenderReport::default();
        for school in schools {
            let school = Arc::new(school);
            match place_marker(mounted, &school, &self.on_select) {
                Ok(marker) => self.markers.push(marker),
                Err(reason) => {
                    let err = MapError::MarkerConstructionFailed {
                        school_id: school.id,
                        school_name: school.school_name.clone(),
                        reason,
                    };
                    warn!("event=marker_create module=map status=skipped error={err}");
                    report.failures.push(err);
                }
            }
        }
        report.placed = self.markers.len();

        if let Some(bounds) = LatLngBounds::enclosing(self.markers.iter().map(|m| m.position)) {
            if let Err(err) = mounted.runtime.set_bounds(&mounted.map, &bounds) {
                warn!("event=map_bounds module=map status=error error={err}");
            }
        }

        info!(
            "event=markers_render module=map status=ok requested={} placed={} skipped={}",
            requested,
            report.placed,
            report.failures.len()
        );
        report
    }

    fn clear_markers(&mut self) {
        let markers = std::mem::take(&mut self.markers);
        if let Some(mounted) = self.mounted.as_ref() {
            for marker in &markers {
                mounted.runtime.remove_marker(&marker.handle);
            }
        }
    }
}

fn place_marker<W: WidgetRuntime>(
    mounted: &Mounted<W>,
    school: &Arc<School>,
    on_select: &SelectionCallback,
) -> Result<PlacedMarker<W>, MarkerFailure> {
    let position = LatLng::from_point(&school.location)?;
    let runtime = &mounted.runtime;

    let handle = runtime.create_marker(
        &mounted.map,
        &MarkerOptions {
            position,
            title: school.school_name.clone(),
        },
    )?;

    let attach = runtime
        .create_info_window(&handle, &info_window_content(school))
        .and_then(|window| {
            let widget = Arc::clone(runtime);
            let map = mounted.map.clone();
            let marker = handle.clone();
            let school = Arc::clone(school);
            let on_select = Arc::clone(on_select);
            runtime.add_click_listener(
                &handle,
                Box::new(move || {
                    widget.open_info_window(&window, &map, &marker);
                    on_select(&school);
                }),
            )
        });

    if let Err(err) = attach {
        runtime.remove_marker(&handle);
        return Err(err.into());
    }

    Ok(PlacedMarker {
        handle,
        position,
        school: Arc::clone(school),
    })
}

/// Info window body: escaped name and address.
pub fn info_window_content(school: &School) -> String {
    format!(
        "<div style=\"padding: 8px; font-size: 12px;\"><strong>{}</strong><br/>{}</div>",
        escape_html(&school.school_name),
        escape_html(&school.address)
    )
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::info_window_content;
    use crate::model::school::{GeoPoint, School};
    use uuid::Uuid;

    #[test]
    fn info_window_escapes_markup() {
        let school = School {
            id: Uuid::new_v4(),
            school_name: "<b>A&B</b>".to_string(),
            school_level: "high".to_string(),
            address: "1 \"Main\" St".to_string(),
            phone_number: None,
            location: GeoPoint::point(127.0, 37.5),
        };
        let content = info_window_content(&school);
        assert!(content.contains("&lt;b&gt;A&amp;B&lt;/b&gt;"));
        assert!(content.contains("1 &quot;Main&quot; St"));
    }
}

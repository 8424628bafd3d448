//! In-process widget runtime.
//!
//! Keeps map state in memory so the renderer can drive terminal previews and
//! tests without a browser. Clicks are simulated through `click`.

use super::widget::{
    ClickHandler, LatLng, LatLngBounds, LoadState, MapOptions, MarkerOptions, WidgetError,
    WidgetLoader, WidgetRuntime,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HeadlessMap(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HeadlessMarker(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HeadlessInfoWindow(u64);

/// Snapshot of one marker currently attached to a map.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSnapshot {
    pub marker: HeadlessMarker,
    pub position: LatLng,
    pub title: String,
}

struct MarkerEntry {
    options: MarkerOptions,
    handlers: Vec<Arc<dyn Fn() + Send + Sync>>,
}

#[derive(Default)]
struct HeadlessState {
    next_id: u64,
    maps: Vec<(HeadlessMap, String, MapOptions)>,
    markers: BTreeMap<HeadlessMarker, MarkerEntry>,
    windows: HashMap<HeadlessInfoWindow, (HeadlessMarker, String)>,
    open_window: Option<(HeadlessInfoWindow, HeadlessMarker)>,
    bounds: Option<LatLngBounds>,
    created_markers: usize,
    removed_markers: usize,
}

impl HeadlessState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct HeadlessRuntime {
    state: Mutex<HeadlessState>,
}

impl HeadlessRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, HeadlessState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Markers currently attached, in creation order.
    pub fn markers(&self) -> Vec<MarkerSnapshot> {
        self.state()
            .markers
            .iter()
            .map(|(marker, entry)| MarkerSnapshot {
                marker: *marker,
                position: entry.options.position,
                title: entry.options.title.clone(),
            })
            .collect()
    }

    pub fn marker_count(&self) -> usize {
        self.state().markers.len()
    }

    pub fn created_markers(&self) -> usize {
        self.state().created_markers
    }

    pub fn removed_markers(&self) -> usize {
        self.state().removed_markers
    }

    pub fn map_count(&self) -> usize {
        self.state().maps.len()
    }

    /// Container and options of the most recently created map.
    pub fn map_options(&self) -> Option<(String, MapOptions)> {
        self.state()
            .maps
            .last()
            .map(|(_, container, options)| (container.clone(), options.clone()))
    }

    pub fn bounds(&self) -> Option<LatLngBounds> {
        self.state().bounds
    }

    /// Content of the open info window, if any.
    pub fn opened_info_window(&self) -> Option<String> {
        let state = self.state();
        let (window, _) = state.open_window?;
        state.windows.get(&window).map(|(_, content)| content.clone())
    }

    /// Info windows still owned by an attached marker.
    pub fn info_window_count(&self) -> usize {
        self.state().windows.len()
    }

    /// Fires every click listener of `marker`. Returns `false` when the
    /// marker is not attached.
    pub fn click(&self, marker: HeadlessMarker) -> bool {
        let handlers = match self.state().markers.get(&marker) {
            Some(entry) => entry.handlers.clone(),
            None => return false,
        };
        for handler in handlers {
            handler();
        }
        true
    }
}

impl WidgetRuntime for HeadlessRuntime {
    type Map = HeadlessMap;
    type Marker = HeadlessMarker;
    type InfoWindow = HeadlessInfoWindow;

    fn create_map(&self, container: &str, options: &MapOptions) -> Result<Self::Map, WidgetError> {
        if container.trim().is_empty() {
            return Err(WidgetError::new("map container id is empty"));
        }
        let mut state = self.state();
        let map = HeadlessMap(state.next_id());
        state.maps.push((map, container.to_string(), options.clone()));
        Ok(map)
    }

    fn create_marker(
        &self,
        map: &Self::Map,
        options: &MarkerOptions,
    ) -> Result<Self::Marker, WidgetError> {
        let mut state = self.state();
        if !state.maps.iter().any(|(known, _, _)| known == map) {
            return Err(WidgetError::new("marker targets an unknown map"));
        }
        let marker = HeadlessMarker(state.next_id());
        state.markers.insert(
            marker,
            MarkerEntry {
                options: options.clone(),
                handlers: Vec::new(),
            },
        );
        state.created_markers += 1;
        Ok(marker)
    }

    fn create_info_window(
        &self,
        marker: &Self::Marker,
        content: &str,
    ) -> Result<Self::InfoWindow, WidgetError> {
        let mut state = self.state();
        if !state.markers.contains_key(marker) {
            return Err(WidgetError::new("info window targets a detached marker"));
        }
        let window = HeadlessInfoWindow(state.next_id());
        state.windows.insert(window, (*marker, content.to_string()));
        Ok(window)
    }

    fn open_info_window(&self, window: &Self::InfoWindow, _map: &Self::Map, marker: &Self::Marker) {
        self.state().open_window = Some((*window, *marker));
    }

    fn add_click_listener(
        &self,
        marker: &Self::Marker,
        handler: ClickHandler,
    ) -> Result<(), WidgetError> {
        let mut state = self.state();
        let entry = state
            .markers
            .get_mut(marker)
            .ok_or_else(|| WidgetError::new("listener targets a detached marker"))?;
        entry.handlers.push(Arc::from(handler));
        Ok(())
    }

    fn set_bounds(&self, _map: &Self::Map, bounds: &LatLngBounds) -> Result<(), WidgetError> {
        self.state().bounds = Some(*bounds);
        Ok(())
    }

    fn remove_marker(&self, marker: &Self::Marker) {
        let mut state = self.state();
        if state.markers.remove(marker).is_some() {
            state.removed_markers += 1;
            state.windows.retain(|_, (owner, _)| owner != marker);
            if matches!(state.open_window, Some((_, open_on)) if open_on == *marker) {
                state.open_window = None;
            }
        }
    }
}

/// Loader handing out a shared `HeadlessRuntime`.
pub struct HeadlessLoader {
    runtime: Option<Arc<HeadlessRuntime>>,
    pending_polls: u32,
    failure: Option<WidgetError>,
    polls: AtomicU32,
}

impl HeadlessLoader {
    /// Runtime is available on the first probe.
    pub fn ready(runtime: Arc<HeadlessRuntime>) -> Self {
        Self::delayed(runtime, 0)
    }

    /// Runtime shows up after `pending_polls` unsuccessful probes.
    pub fn delayed(runtime: Arc<HeadlessRuntime>, pending_polls: u32) -> Self {
        Self {
            runtime: Some(runtime),
            pending_polls,
            failure: None,
            polls: AtomicU32::new(0),
        }
    }

    /// Runtime never shows up.
    pub fn unavailable() -> Self {
        Self {
            runtime: None,
            pending_polls: 0,
            failure: None,
            polls: AtomicU32::new(0),
        }
    }

    /// Loading fails outright, like a script that cannot be fetched.
    pub fn failing(error: WidgetError) -> Self {
        Self {
            failure: Some(error),
            ..Self::unavailable()
        }
    }

    pub fn polls(&self) -> u32 {
        self.polls.load(Ordering::SeqCst)
    }
}

impl WidgetLoader for HeadlessLoader {
    type Runtime = HeadlessRuntime;

    fn poll_runtime(&self) -> LoadState<Self::Runtime> {
        let previous = self.polls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = &self.failure {
            return LoadState::Failed(error.clone());
        }
        match &self.runtime {
            Some(runtime) if previous >= self.pending_polls => LoadState::Ready(Arc::clone(runtime)),
            _ => LoadState::Pending,
        }
    }
}

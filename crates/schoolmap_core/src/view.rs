//! Top-level school map view.
//!
//! # Responsibility
//! - Fetch one page of schools and hand it to the map renderer.
//! - Own the current selection and feed it to the detail panel.
//!
//! # Invariants
//! - The renderer writes the selection only through its click callback.
//! - A failed fetch leaves the rendered records and the selection untouched.
//! - Fetches abort when the renderer is torn down.

use crate::map::{
    MapConfig, MapError, MapRenderer, RenderReport, SelectionCallback, WidgetLoader, WidgetRuntime,
};
use crate::model::school::School;
use crate::panel::{render_detail, DetailView};
use crate::service::listing_service::{PageRequest, SchoolListing};
use async_trait::async_trait;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, PoisonError};
use tokio_util::sync::CancellationToken;

/// Remote or local provider of school pages.
#[async_trait]
pub trait SchoolSource: Send + Sync {
    async fn fetch_schools(&self, request: PageRequest) -> Result<SchoolListing, SourceError>;
}

/// Failure to obtain a page of schools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    Transport(String),
    Status { code: u16, message: String },
    Decode(String),
    Cancelled,
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(message) => write!(f, "school source unreachable: {message}"),
            Self::Status { code, message } => {
                write!(f, "school source answered {code}: {message}")
            }
            Self::Decode(message) => write!(f, "school source sent an invalid body: {message}"),
            Self::Cancelled => write!(f, "school fetch cancelled"),
        }
    }
}

impl Error for SourceError {}

/// Combined result of opening the view.
#[derive(Debug)]
pub struct OpenReport {
    pub map: Result<(), MapError>,
    pub data: Result<RenderReport, SourceError>,
}

type SharedSelection = Arc<Mutex<Option<School>>>;

pub struct SchoolMapView<W: WidgetRuntime> {
    renderer: MapRenderer<W>,
    selection: SharedSelection,
    school_count: usize,
    page: PageRequest,
}

impl<W: WidgetRuntime> SchoolMapView<W> {
    pub fn new(config: MapConfig, page: PageRequest) -> Self {
        let selection: SharedSelection = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&selection);
        let on_select: SelectionCallback = Arc::new(move |school: &School| {
            info!("event=school_select module=view status=ok school_id={}", school.id);
            *sink.lock().unwrap_or_else(PoisonError::into_inner) = Some(school.clone());
        });

        Self {
            renderer: MapRenderer::new(config, on_select),
            selection,
            school_count: 0,
            page,
        }
    }

    pub fn renderer(&self) -> &MapRenderer<W> {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut MapRenderer<W> {
        &mut self.renderer
    }

    /// Number of schools in the last successfully fetched page.
    pub fn school_count(&self) -> usize {
        self.school_count
    }

    pub fn selection(&self) -> Option<School> {
        self.selection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn detail(&self) -> DetailView {
        render_detail(self.selection().as_ref(), self.school_count)
    }

    /// Fetches the configured page and supplies it to the renderer.
    ///
    /// A token cancelled before the call is replaced, so an earlier abort
    /// does not poison later loads.
    pub async fn load<S>(&mut self, source: &S) -> Result<RenderReport, SourceError>
    where
        S: SchoolSource + ?Sized,
    {
        let cancel = self.renderer.rearm();
        let listing = fetch_with_token(source, self.page, cancel).await?;
        Ok(self.apply(listing))
    }

    /// Fetches data and initializes the map concurrently, then renders.
    ///
    /// Either side may finish first; markers are built once both are done.
    pub async fn open<S, L>(&mut self, source: &S, loader: &L) -> OpenReport
    where
        S: SchoolSource + ?Sized,
        L: WidgetLoader<Runtime = W>,
    {
        let page = self.page;
        let cancel = self.renderer.rearm();
        let (fetched, mounted) = tokio::join!(
            fetch_with_token(source, page, cancel),
            self.renderer.initialize(loader)
        );

        OpenReport {
            map: mounted.map(|_| ()),
            data: fetched.map(|listing| self.apply(listing)),
        }
    }

    fn apply(&mut self, listing: SchoolListing) -> RenderReport {
        self.school_count = listing.schools.len();
        info!(
            "event=schools_load module=view status=ok returned={} total={}",
            listing.schools.len(),
            listing.total
        );
        self.renderer.supply(listing.schools)
    }
}

async fn fetch_with_token<S>(
    source: &S,
    page: PageRequest,
    cancel: CancellationToken,
) -> Result<SchoolListing, SourceError>
where
    S: SchoolSource + ?Sized,
{
    let result = tokio::select! {
        _ = cancel.cancelled() => Err(SourceError::Cancelled),
        result = source.fetch_schools(page) => result,
    };
    if let Err(err) = &result {
        error!("event=schools_load module=view status=error error={err}");
    }
    result
}

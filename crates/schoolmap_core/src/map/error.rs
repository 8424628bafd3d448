use super::widget::WidgetError;
use crate::model::school::{CoordinateError, SchoolId};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Rendering-side failures. None of them propagate to the data layer.
#[derive(Debug, Clone, PartialEq)]
pub enum MapError {
    /// The widget never became usable; the renderer stays uninitialized.
    WidgetInitFailed(InitFailure),
    /// One record could not produce a marker; the rest of the set still renders.
    MarkerConstructionFailed {
        school_id: SchoolId,
        school_name: String,
        reason: MarkerFailure,
    },
    /// Initialization was abandoned through the renderer's cancellation token.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InitFailure {
    LoadFailed(WidgetError),
    TimedOut { attempts: u32 },
    MapConstruction(WidgetError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MarkerFailure {
    Coordinates(CoordinateError),
    Widget(WidgetError),
}

impl From<CoordinateError> for MarkerFailure {
    fn from(value: CoordinateError) -> Self {
        Self::Coordinates(value)
    }
}

impl From<WidgetError> for MarkerFailure {
    fn from(value: WidgetError) -> Self {
        Self::Widget(value)
    }
}

impl Display for InitFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LoadFailed(err) => write!(f, "widget runtime failed to load: {err}"),
            Self::TimedOut { attempts } => {
                write!(f, "widget runtime unavailable after {attempts} attempt(s)")
            }
            Self::MapConstruction(err) => write!(f, "map construction failed: {err}"),
        }
    }
}

impl Display for MarkerFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Coordinates(err) => write!(f, "{err}"),
            Self::Widget(err) => write!(f, "widget rejected marker: {err}"),
        }
    }
}

impl Display for MapError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WidgetInitFailed(cause) => write!(f, "map widget init failed: {cause}"),
            Self::MarkerConstructionFailed {
                school_id,
                school_name,
                reason,
            } => write!(
                f,
                "marker for `{school_name}` ({school_id}) could not be built: {reason}"
            ),
            Self::Cancelled => write!(f, "map initialization cancelled"),
        }
    }
}

impl Error for MapError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::WidgetInitFailed(InitFailure::LoadFailed(err))
            | Self::WidgetInitFailed(InitFailure::MapConstruction(err)) => Some(err),
            Self::MarkerConstructionFailed {
                reason: MarkerFailure::Coordinates(err),
                ..
            } => Some(err),
            Self::MarkerConstructionFailed {
                reason: MarkerFailure::Widget(err),
                ..
            } => Some(err),
            Self::WidgetInitFailed(InitFailure::TimedOut { .. }) | Self::Cancelled => None,
        }
    }
}

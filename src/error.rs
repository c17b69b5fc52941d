//! Chart load errors.
//!
//! A chart either loads completely or fails with one of these. Once a chart
//! is loaded, playback has no failure path: out-of-range times and beats are
//! extrapolated instead of reported.

use crate::game::line::Channel;
use std::fmt;
use thiserror::Error;

/// Identifies the chart entity an invariant violation refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    Chart,
    TempoSegment { index: usize },
    Line { line_id: u32 },
    SpeedEvent { line_id: u32, index: usize },
    MotionEvent { line_id: u32, channel: Channel, index: usize },
    Note { line_id: u32, index: usize },
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityRef::Chart => write!(f, "chart"),
            EntityRef::TempoSegment { index } => write!(f, "tempo segment #{}", index),
            EntityRef::Line { line_id } => write!(f, "line {}", line_id),
            EntityRef::SpeedEvent { line_id, index } => {
                write!(f, "line {} speed event #{}", line_id, index)
            }
            EntityRef::MotionEvent { line_id, channel, index } => {
                write!(f, "line {} {} event #{}", line_id, channel, index)
            }
            EntityRef::Note { line_id, index } => write!(f, "line {} note #{}", line_id, index),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChartError {
    /// Raw chart data is malformed or incomplete.
    ///
    /// `location` is either a JSON `line:column` position or a path into the
    /// chart structure such as `lines[2].motionEvents[0].easing`.
    #[error("Chart parse error at {location}: {message}")]
    Parse { location: String, message: String },

    /// The chart parsed but breaks an ordering, coverage or overlap rule.
    #[error("Chart invariant violated by {entity}: {message}")]
    InvariantViolation { entity: EntityRef, message: String },
}

impl ChartError {
    pub(crate) fn parse(location: impl Into<String>, message: impl Into<String>) -> Self {
        ChartError::Parse {
            location: location.into(),
            message: message.into(),
        }
    }

    pub(crate) fn violation(entity: EntityRef, message: impl Into<String>) -> Self {
        ChartError::InvariantViolation {
            entity,
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for ChartError {
    fn from(e: serde_json::Error) -> Self {
        ChartError::parse(format!("{}:{}", e.line(), e.column()), e.to_string())
    }
}

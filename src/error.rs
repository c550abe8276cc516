use serde::Serialize;
use thiserror::Error;

/// Errors raised by the occupancy engine.
///
/// Registry and dataset level errors are surfaced to the caller. Region
/// errors exist for callers that validate detector output up front; the
/// classifier itself never raises them and treats a bad region as vacant.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OccupancyError {
    #[error("malformed slot data for slot {slot}: {reason}")]
    MalformedSlotData { slot: String, reason: String },

    #[error("invalid vehicle region: {0}")]
    InvalidRegion(String),

    #[error("no ground-truth labeled slots found across the dataset")]
    NoLabeledData,
}

impl OccupancyError {
    pub(crate) fn malformed(slot: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedSlotData {
            slot: slot.into(),
            reason: reason.into(),
        }
    }
}

/// A dataset item that was dropped before classification.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
#[error("frame {name} skipped: {reason}")]
pub struct FrameSkipped {
    pub name: String,
    pub reason: String,
}

impl FrameSkipped {
    pub fn new(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

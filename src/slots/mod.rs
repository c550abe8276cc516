//! Parking slot definitions.
//!
//! - `Slot`: one parking space outline with an optional ground-truth label.
//! - `SlotRegistry`: the ordered, immutable slot map for one lot layout.
//! - `annotation`: PKLot-style XML ground truth.

pub mod annotation;
mod registry;

use serde::{Deserialize, Serialize};

use crate::error::OccupancyError;
use crate::geometry::{Point, Polygon};

pub use annotation::{load_annotation, parse_annotation};
pub use registry::{SlotRegistry, SlotSummary};

/// Slot identifier, stable across frames of the same lot.
///
/// Integer ids from annotation files are kept in their decimal form, so a
/// JSON key `"7"` and an XML `id="7"` name the same slot.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(String);

impl SlotId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u32> for SlotId {
    fn from(id: u32) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for SlotId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for SlotId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One parking space.
#[derive(Clone, Debug, PartialEq)]
pub struct Slot {
    id: SlotId,
    polygon: Polygon,
    ground_truth: Option<bool>,
}

impl Slot {
    /// Build an unlabeled slot, validating its outline.
    pub fn new(id: impl Into<SlotId>, points: Vec<Point>) -> Result<Self, OccupancyError> {
        let id = id.into();
        if id.as_str().trim().is_empty() {
            return Err(OccupancyError::malformed("<empty>", "empty slot id"));
        }
        let polygon = match Polygon::new(points) {
            Ok(polygon) => polygon,
            Err(defect) => return Err(OccupancyError::malformed(id.as_str(), defect.to_string())),
        };
        Ok(Self {
            id,
            polygon,
            ground_truth: None,
        })
    }

    /// Attach a ground-truth label. `None` keeps the slot out of scoring.
    pub fn with_ground_truth(mut self, occupied: Option<bool>) -> Self {
        self.ground_truth = occupied;
        self
    }

    pub fn id(&self) -> &SlotId {
        &self.id
    }

    pub fn polygon(&self) -> &Polygon {
        &self.polygon
    }

    pub fn ground_truth(&self) -> Option<bool> {
        self.ground_truth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f64, y: f64, size: f64) -> Vec<Point> {
        vec![
            Point::new(x, y),
            Point::new(x + size, y),
            Point::new(x + size, y + size),
            Point::new(x, y + size),
        ]
    }

    #[test]
    fn numeric_and_string_ids_agree() {
        assert_eq!(SlotId::from(7u32), SlotId::from("7"));
        assert_eq!(SlotId::from(7u32).to_string(), "7");
    }

    #[test]
    fn slot_rejects_empty_id() {
        let err = Slot::new("  ", square(0.0, 0.0, 10.0)).unwrap_err();
        assert!(matches!(err, OccupancyError::MalformedSlotData { .. }));
    }

    #[test]
    fn slot_reports_polygon_defect_with_id() {
        let err = Slot::new(3u32, vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)]).unwrap_err();
        match err {
            OccupancyError::MalformedSlotData { slot, reason } => {
                assert_eq!(slot, "3");
                assert!(reason.contains("at least 3"), "reason: {}", reason);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn ground_truth_defaults_to_unlabeled() {
        let slot = Slot::new(1u32, square(0.0, 0.0, 10.0)).unwrap();
        assert_eq!(slot.ground_truth(), None);
        let slot = slot.with_ground_truth(Some(true));
        assert_eq!(slot.ground_truth(), Some(true));
    }
}

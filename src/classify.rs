//! Slot occupancy decision.
//!
//! A slot is occupied when at least one vehicle region satisfies the
//! configured rule against the slot outline. Classification is existential:
//! the first matching vehicle settles a slot and the rest are not tested, so
//! the verdict never depends on the order of the vehicle regions.

use serde::{Deserialize, Serialize};

use crate::detect::{RegionForm, VehicleDetectionSet, VehicleRegion};
use crate::geometry::{BoundaryPolicy, AREA_EPSILON};
use crate::slots::{Slot, SlotId};

/// Geometric test deciding whether a vehicle occupies a slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OccupancyRule {
    /// The vehicle centroid lies inside the slot polygon. Box regions
    /// contribute their centre.
    CentroidContainment,
    /// The vehicle box and the slot polygon share positive area. Centroid
    /// regions have no area and never occupy a slot under this rule.
    #[default]
    AreaOverlap,
}

impl OccupancyRule {
    /// Region representation this rule consumes.
    pub fn region_form(&self) -> RegionForm {
        match self {
            Self::CentroidContainment => RegionForm::Center,
            Self::AreaOverlap => RegionForm::Box,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CentroidContainment => "centroid-containment",
            Self::AreaOverlap => "area-overlap",
        }
    }
}

impl std::str::FromStr for OccupancyRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "centroid" | "centroid-containment" | "centroid_containment" => {
                Ok(Self::CentroidContainment)
            }
            "area" | "area-overlap" | "area_overlap" | "overlap" => Ok(Self::AreaOverlap),
            other => Err(format!(
                "unknown occupancy rule '{}' (expected centroid|area)",
                other
            )),
        }
    }
}

impl std::fmt::Display for OccupancyRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-slot occupancy for one frame, in slot iteration order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct OccupancyVerdict {
    entries: Vec<(SlotId, bool)>,
}

impl OccupancyVerdict {
    pub fn entries(&self) -> &[(SlotId, bool)] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SlotId, bool)> + '_ {
        self.entries.iter().map(|(id, occupied)| (id, *occupied))
    }

    pub fn get(&self, id: &SlotId) -> Option<bool> {
        self.entries
            .iter()
            .find(|(slot, _)| slot == id)
            .map(|(_, occupied)| *occupied)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn occupied_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, occupied)| *occupied)
            .count()
    }
}

impl FromIterator<(SlotId, bool)> for OccupancyVerdict {
    fn from_iter<I: IntoIterator<Item = (SlotId, bool)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Applies an `OccupancyRule` to every slot of a frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OccupancyClassifier {
    rule: OccupancyRule,
    boundary: BoundaryPolicy,
}

impl OccupancyClassifier {
    pub fn new(rule: OccupancyRule) -> Self {
        Self {
            rule,
            boundary: BoundaryPolicy::default(),
        }
    }

    /// Policy for centroids exactly on a slot edge (centroid rule only).
    pub fn with_boundary(mut self, boundary: BoundaryPolicy) -> Self {
        self.boundary = boundary;
        self
    }

    pub fn rule(&self) -> OccupancyRule {
        self.rule
    }

    pub fn boundary(&self) -> BoundaryPolicy {
        self.boundary
    }

    /// Classify every slot against the frame's vehicle regions.
    pub fn classify<'a>(
        &self,
        slots: impl IntoIterator<Item = &'a Slot>,
        detections: &VehicleDetectionSet,
    ) -> OccupancyVerdict {
        slots
            .into_iter()
            .map(|slot| {
                let occupied = detections.iter().any(|region| self.occupies(slot, region));
                (slot.id().clone(), occupied)
            })
            .collect()
    }

    /// Does this single region occupy the slot?
    pub fn occupies(&self, slot: &Slot, region: &VehicleRegion) -> bool {
        let polygon = slot.polygon();
        match self.rule {
            OccupancyRule::CentroidContainment => {
                if let Some(rect) = region.rect() {
                    if rect.is_degenerate() {
                        return false;
                    }
                }
                polygon.contains(region.centroid(), self.boundary)
            }
            OccupancyRule::AreaOverlap => match region.rect() {
                Some(rect) => polygon.intersection_area(&rect) > AREA_EPSILON,
                None => false,
            },
        }
    }
}

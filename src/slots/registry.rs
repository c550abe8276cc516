use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use anyhow::{anyhow, Result};
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};

use super::{Slot, SlotId};
use crate::error::OccupancyError;
use crate::geometry::Point;

/// Immutable, ordered set of slots for one parking lot layout.
///
/// Iteration order is definition order (document order for JSON, element
/// order for XML annotations). Reports and verdicts follow this order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SlotRegistry {
    slots: Vec<Slot>,
}

/// Slot counts and ids, in registry order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SlotSummary {
    pub total_slots: usize,
    /// Slots carrying a ground-truth label.
    pub labeled_slots: usize,
    pub slot_ids: Vec<SlotId>,
}

impl SlotRegistry {
    /// Build a registry from validated slots. Fails on a duplicate id.
    pub fn new(slots: Vec<Slot>) -> Result<Self, OccupancyError> {
        let mut seen = HashSet::with_capacity(slots.len());
        for slot in &slots {
            if !seen.insert(slot.id()) {
                let id = slot.id().as_str();
                return Err(OccupancyError::malformed(id, "duplicate slot id"));
            }
        }
        Ok(Self { slots })
    }

    /// Parse the slot definition document: `{ "<id>": [[x, y], ...], ... }`.
    pub fn from_json_str(raw: &str) -> Result<Self, OccupancyError> {
        let defs: SlotDefinitions = serde_json::from_str(raw)
            .map_err(|e| OccupancyError::malformed("<document>", e.to_string()))?;
        let slots = defs
            .0
            .into_iter()
            .map(|(id, points)| Slot::new(id, points.into_iter().map(Point::from).collect()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(slots)
    }

    /// Load a slot definition file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("failed to read slot file {}: {}", path.display(), e))?;
        let registry = Self::from_json_str(&raw)
            .map_err(|e| anyhow!("invalid slot file {}: {}", path.display(), e))?;
        log::debug!("loaded {} slots from {}", registry.len(), path.display());
        Ok(registry)
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Slot> {
        self.slots.iter()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, id: &SlotId) -> Option<&Slot> {
        self.slots.iter().find(|slot| slot.id() == id)
    }

    /// Number of slots carrying a ground-truth label.
    pub fn labeled_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.ground_truth().is_some())
            .count()
    }

    pub fn summary(&self) -> SlotSummary {
        SlotSummary {
            total_slots: self.slots.len(),
            labeled_slots: self.labeled_count(),
            slot_ids: self.slots.iter().map(|slot| slot.id().clone()).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a SlotRegistry {
    type Item = &'a Slot;
    type IntoIter = std::slice::Iter<'a, Slot>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.iter()
    }
}

/// Slot map entries in document order, duplicates kept so they can be
/// reported instead of silently overwritten.
struct SlotDefinitions(Vec<(String, Vec<[f64; 2]>)>);

impl<'de> Deserialize<'de> for SlotDefinitions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DefinitionsVisitor;

        impl<'de> Visitor<'de> for DefinitionsVisitor {
            type Value = SlotDefinitions;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of slot id to a list of [x, y] points")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((id, points)) = map.next_entry::<String, Vec<[f64; 2]>>()? {
                    entries.push((id, points));
                }
                Ok(SlotDefinitions(entries))
            }
        }

        deserializer.deserialize_map(DefinitionsVisitor)
    }
}

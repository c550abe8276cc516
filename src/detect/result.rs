use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

/// COCO class id for "car", the only class the default filter keeps.
pub const COCO_CAR: u32 = 2;

/// Default minimum detector confidence.
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.5;

/// One raw detector output in pixel `xyxy` form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    #[serde(default = "full_confidence")]
    pub confidence: f32,
    #[serde(default = "car_class", alias = "class")]
    pub class_id: u32,
}

fn full_confidence() -> f32 {
    1.0
}

fn car_class() -> u32 {
    COCO_CAR
}

impl Detection {
    /// A full-confidence car detection.
    pub fn vehicle(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            confidence: 1.0,
            class_id: COCO_CAR,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_class(mut self, class_id: u32) -> Self {
        self.class_id = class_id;
        self
    }

    pub fn bbox(&self) -> Rect {
        Rect::new(self.x1, self.y1, self.x2, self.y2)
    }
}

/// Selects vehicle detections from raw detector output.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectionFilter {
    pub min_confidence: f32,
    pub vehicle_classes: Vec<u32>,
}

impl Default for DetectionFilter {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            vehicle_classes: vec![COCO_CAR],
        }
    }
}

impl DetectionFilter {
    pub fn accepts(&self, detection: &Detection) -> bool {
        detection.confidence >= self.min_confidence
            && self.vehicle_classes.contains(&detection.class_id)
    }
}

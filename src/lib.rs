//! Parking slot occupancy engine
//!
//! Given fixed slot polygons and vehicle regions from a detector, decide per
//! slot whether it is occupied, summarize a frame, and score the decisions
//! against labeled datasets.
//!
//! # Module Structure
//!
//! - `geometry`: points, rectangles, validated polygons, clipping
//! - `slots`: slot registry (JSON definitions, PKLot XML annotations)
//! - `detect`: detector output, filtering, vehicle regions, backends
//! - `classify`: occupancy rules and per-slot verdicts
//! - `stats`: frame statistics
//! - `evaluate`: accuracy over labeled datasets
//! - `dataset`: image/annotation pairing on disk
//! - `config`: layered configuration for the binaries

pub mod classify;
pub mod config;
pub mod dataset;
pub mod detect;
pub mod error;
pub mod evaluate;
pub mod geometry;
pub mod slots;
pub mod stats;

pub use classify::{OccupancyClassifier, OccupancyRule, OccupancyVerdict};
pub use config::OccupancyConfig;
pub use dataset::{DatasetLoader, LabeledFrame};
pub use detect::{
    Detection, DetectionFilter, DetectorBackend, FrameRef, VehicleDetectionSet, VehicleRegion,
};
pub use error::{FrameSkipped, OccupancyError};
pub use evaluate::{AccuracyReport, DatasetItem, EvaluationHarness, EvaluationRecord};
pub use geometry::{BoundaryPolicy, Point, Polygon, Rect};
pub use slots::{Slot, SlotId, SlotRegistry};
pub use stats::{aggregate, FrameStatistics};

mod backend;
mod backends;
mod regions;
mod result;

pub use backend::{DetectorBackend, FrameRef};
pub use backends::{ReplayBackend, StubBackend};
pub use regions::{FrameBounds, RegionForm, VehicleDetectionSet, VehicleRegion};
pub use result::{Detection, DetectionFilter, COCO_CAR, DEFAULT_MIN_CONFIDENCE};

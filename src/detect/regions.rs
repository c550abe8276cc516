use serde::{Deserialize, Serialize};

use crate::detect::result::{Detection, DetectionFilter};
use crate::error::OccupancyError;
use crate::geometry::{Point, Rect};

/// One detected vehicle's extent for a single frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleRegion {
    /// Centroid of the vehicle's bounding box.
    Center(Point),
    /// Axis-aligned bounding box.
    Box(Rect),
}

/// Representation the detection set is normalized to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegionForm {
    Center,
    Box,
}

/// Image dimensions used to reject centroids that fall outside the frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameBounds {
    pub width: u32,
    pub height: u32,
}

impl FrameBounds {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    fn contains(&self, p: Point) -> bool {
        p.x >= 0.0 && p.y >= 0.0 && p.x <= f64::from(self.width) && p.y <= f64::from(self.height)
    }
}

impl VehicleRegion {
    pub fn center(x: f64, y: f64) -> Self {
        Self::Center(Point::new(x, y))
    }

    pub fn bbox(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self::Box(Rect::new(x1, y1, x2, y2))
    }

    /// Centroid; for a box this is its centre.
    pub fn centroid(&self) -> Point {
        match self {
            Self::Center(p) => *p,
            Self::Box(rect) => rect.center(),
        }
    }

    /// The rectangle, when the region carries an extent.
    pub fn rect(&self) -> Option<Rect> {
        match self {
            Self::Center(_) => None,
            Self::Box(rect) => Some(*rect),
        }
    }

    /// Check the region against the detector output contract.
    pub fn validate(&self, bounds: Option<FrameBounds>) -> Result<(), OccupancyError> {
        match self {
            Self::Box(rect) if rect.is_degenerate() => Err(OccupancyError::InvalidRegion(format!(
                "box ({}, {})-({}, {}) has non-positive width or height",
                rect.x1, rect.y1, rect.x2, rect.y2
            ))),
            Self::Center(p) if !p.is_finite() => Err(OccupancyError::InvalidRegion(
                "centroid has a non-finite coordinate".to_string(),
            )),
            _ => {
                let c = self.centroid();
                match bounds {
                    Some(b) if !b.contains(c) => Err(OccupancyError::InvalidRegion(format!(
                        "centroid ({}, {}) outside {}x{} frame",
                        c.x, c.y, b.width, b.height
                    ))),
                    _ => Ok(()),
                }
            }
        }
    }

    fn to_form(self, form: RegionForm) -> Self {
        match (form, self) {
            (RegionForm::Center, Self::Box(rect)) => Self::Center(rect.center()),
            _ => self,
        }
    }
}

/// Vehicle regions for one frame.
///
/// Built fresh per frame and dropped after classification. Invalid regions
/// are dropped on the checked constructors and counted in `rejected`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VehicleDetectionSet {
    regions: Vec<VehicleRegion>,
    rejected: usize,
}

impl VehicleDetectionSet {
    /// Wrap regions as given. The classifier still treats bad regions as vacant.
    pub fn new(regions: Vec<VehicleRegion>) -> Self {
        Self {
            regions,
            rejected: 0,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Keep only regions that pass `VehicleRegion::validate`.
    pub fn from_regions_checked(
        regions: impl IntoIterator<Item = VehicleRegion>,
        bounds: Option<FrameBounds>,
    ) -> Self {
        let mut set = Self::default();
        for region in regions {
            match region.validate(bounds) {
                Ok(()) => set.regions.push(region),
                Err(e) => {
                    log::debug!("dropping vehicle region: {}", e);
                    set.rejected += 1;
                }
            }
        }
        set
    }

    /// Filter raw detector output and normalize it to one representation.
    ///
    /// Detections the filter refuses are not counted as rejected; they are
    /// simply not vehicles.
    pub fn from_detections(
        detections: &[Detection],
        filter: &DetectionFilter,
        form: RegionForm,
        bounds: Option<FrameBounds>,
    ) -> Self {
        let boxes = detections
            .iter()
            .filter(|d| filter.accepts(d))
            .map(|d| VehicleRegion::Box(d.bbox()));
        let mut set = Self::from_regions_checked(boxes, bounds);
        for region in &mut set.regions {
            *region = region.to_form(form);
        }
        set
    }

    pub fn regions(&self) -> &[VehicleRegion] {
        &self.regions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VehicleRegion> {
        self.regions.iter()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Regions dropped by validation.
    pub fn rejected(&self) -> usize {
        self.rejected
    }
}

impl FromIterator<VehicleRegion> for VehicleDetectionSet {
    fn from_iter<I: IntoIterator<Item = VehicleRegion>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_degenerate_boxes() {
        let square = VehicleRegion::bbox(0.0, 0.0, 10.0, 10.0);
        assert!(square.validate(None).is_ok());
        let flat = VehicleRegion::bbox(5.0, 0.0, 5.0, 10.0);
        assert!(flat.validate(None).is_err());
        let inverted = VehicleRegion::bbox(0.0, 10.0, 10.0, 0.0);
        assert!(inverted.validate(None).is_err());
        let nan = VehicleRegion::center(f64::NAN, 1.0);
        assert!(nan.validate(None).is_err());
    }

    #[test]
    fn validate_checks_frame_bounds() {
        let bounds = Some(FrameBounds::new(640, 480));
        assert!(VehicleRegion::center(320.0, 240.0).validate(bounds).is_ok());
        assert!(VehicleRegion::center(640.0, 480.0).validate(bounds).is_ok());
        assert!(matches!(
            VehicleRegion::center(700.0, 10.0).validate(bounds),
            Err(OccupancyError::InvalidRegion(_))
        ));
        let straddling = VehicleRegion::bbox(600.0, 400.0, 800.0, 600.0);
        assert!(straddling.validate(bounds).is_err());
    }

    #[test]
    fn checked_set_counts_rejections() {
        let set = VehicleDetectionSet::from_regions_checked(
            vec![
                VehicleRegion::bbox(0.0, 0.0, 10.0, 10.0),
                VehicleRegion::bbox(0.0, 0.0, 0.0, 10.0),
                VehicleRegion::center(5.0, 5.0),
            ],
            None,
        );
        assert_eq!(set.len(), 2);
        assert_eq!(set.rejected(), 1);
    }

    #[test]
    fn detections_normalize_to_requested_form() {
        let detections = vec![
            Detection::vehicle(0.0, 0.0, 10.0, 20.0),
            Detection::vehicle(0.0, 0.0, 10.0, 20.0).with_class(0),
            Detection::vehicle(0.0, 0.0, 10.0, 20.0).with_confidence(0.1),
            Detection::vehicle(10.0, 10.0, 10.0, 20.0),
        ];
        let filter = DetectionFilter::default();

        let centers =
            VehicleDetectionSet::from_detections(&detections, &filter, RegionForm::Center, None);
        assert_eq!(centers.regions(), &[VehicleRegion::center(5.0, 10.0)]);
        assert_eq!(centers.rejected(), 1);

        let boxes =
            VehicleDetectionSet::from_detections(&detections, &filter, RegionForm::Box, None);
        let expected = VehicleRegion::bbox(0.0, 0.0, 10.0, 20.0);
        assert_eq!(boxes.regions(), &[expected]);
    }
}

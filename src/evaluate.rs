//! Accuracy evaluation against ground-truth annotations.
//!
//! Every frame is classified independently and reduced to integer counters
//! (`EvaluationRecord`). Merging counters is associative and commutative, so
//! the parallel pass produces exactly the same report as the sequential one.
//!
//! Only labeled slots are scored. Unlabeled slots are counted for the report
//! but neither help nor hurt accuracy. Frames that could not be paired or
//! loaded arrive as `FrameSkipped` and are never classified.

use serde::Serialize;

use crate::classify::OccupancyClassifier;
use crate::detect::VehicleDetectionSet;
use crate::error::{FrameSkipped, OccupancyError};
use crate::slots::SlotRegistry;

/// One labeled frame ready for classification.
#[derive(Clone, Debug)]
pub struct DatasetItem {
    pub name: String,
    pub detections: VehicleDetectionSet,
    pub slots: SlotRegistry,
}

/// Per-frame or accumulated comparison counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EvaluationRecord {
    pub frames_evaluated: u64,
    /// Labeled occupied, predicted occupied.
    pub true_occupied: u64,
    /// Labeled vacant, predicted occupied.
    pub false_occupied: u64,
    /// Labeled vacant, predicted vacant.
    pub true_vacant: u64,
    /// Labeled occupied, predicted vacant.
    pub false_vacant: u64,
    pub unlabeled_slots: u64,
}

impl EvaluationRecord {
    pub fn record(&mut self, ground_truth: bool, predicted: bool) {
        match (ground_truth, predicted) {
            (true, true) => self.true_occupied += 1,
            (false, true) => self.false_occupied += 1,
            (false, false) => self.true_vacant += 1,
            (true, false) => self.false_vacant += 1,
        }
    }

    pub fn merge(self, other: Self) -> Self {
        Self {
            frames_evaluated: self.frames_evaluated + other.frames_evaluated,
            true_occupied: self.true_occupied + other.true_occupied,
            false_occupied: self.false_occupied + other.false_occupied,
            true_vacant: self.true_vacant + other.true_vacant,
            false_vacant: self.false_vacant + other.false_vacant,
            unlabeled_slots: self.unlabeled_slots + other.unlabeled_slots,
        }
    }

    pub fn matches(&self) -> u64 {
        self.true_occupied + self.true_vacant
    }

    pub fn labeled(&self) -> u64 {
        self.matches() + self.false_occupied + self.false_vacant
    }

    /// `None` when nothing was labeled.
    pub fn accuracy(&self) -> Option<f64> {
        ratio(self.matches(), self.labeled())
    }

    /// Share of labeled-occupied slots predicted occupied.
    pub fn occupied_recall(&self) -> Option<f64> {
        ratio(self.true_occupied, self.true_occupied + self.false_vacant)
    }

    /// Share of labeled-vacant slots predicted vacant.
    pub fn vacant_recall(&self) -> Option<f64> {
        ratio(self.true_vacant, self.true_vacant + self.false_occupied)
    }
}

fn ratio(num: u64, den: u64) -> Option<f64> {
    if den == 0 {
        None
    } else {
        Some(num as f64 / den as f64)
    }
}

/// Result of a full dataset pass.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AccuracyReport {
    /// Matching pairs over labeled pairs.
    pub accuracy: f64,
    pub matches: u64,
    pub labeled: u64,
    /// Share of labeled-occupied slots predicted occupied.
    pub occupied_recall: Option<f64>,
    /// Share of labeled-vacant slots predicted vacant.
    pub vacant_recall: Option<f64>,
    pub counts: EvaluationRecord,
    pub frames_skipped: usize,
    pub skipped: Vec<FrameSkipped>,
}

impl AccuracyReport {
    fn from_record(
        counts: EvaluationRecord,
        skipped: Vec<FrameSkipped>,
    ) -> Result<Self, OccupancyError> {
        let accuracy = counts.accuracy().ok_or(OccupancyError::NoLabeledData)?;
        Ok(Self {
            accuracy,
            matches: counts.matches(),
            labeled: counts.labeled(),
            occupied_recall: counts.occupied_recall(),
            vacant_recall: counts.vacant_recall(),
            counts,
            frames_skipped: skipped.len(),
            skipped,
        })
    }
}

/// Drives the classifier over a labeled dataset.
#[derive(Clone, Copy, Debug, Default)]
pub struct EvaluationHarness {
    classifier: OccupancyClassifier,
}

impl EvaluationHarness {
    pub fn new(classifier: OccupancyClassifier) -> Self {
        Self { classifier }
    }

    pub fn classifier(&self) -> &OccupancyClassifier {
        &self.classifier
    }

    /// Classify one frame and compare labeled slots.
    pub fn evaluate_item(&self, item: &DatasetItem) -> EvaluationRecord {
        let verdict = self.classifier.classify(&item.slots, &item.detections);
        let mut record = EvaluationRecord {
            frames_evaluated: 1,
            ..EvaluationRecord::default()
        };
        for (slot, (_, predicted)) in item.slots.iter().zip(verdict.iter()) {
            match slot.ground_truth() {
                Some(ground_truth) => record.record(ground_truth, predicted),
                None => record.unlabeled_slots += 1,
            }
        }
        log::debug!(
            "frame {}: {} vehicles, {}/{} slots occupied, {}/{} labeled slots correct",
            item.name,
            item.detections.len(),
            verdict.occupied_count(),
            verdict.len(),
            record.matches(),
            record.labeled()
        );
        record
    }

    /// Sequential pass. Items are consumed one at a time.
    pub fn evaluate<I>(&self, items: I) -> Result<AccuracyReport, OccupancyError>
    where
        I: IntoIterator<Item = Result<DatasetItem, FrameSkipped>>,
    {
        let mut counts = EvaluationRecord::default();
        let mut skipped = Vec::new();
        for item in items {
            match item {
                Ok(item) => counts = counts.merge(self.evaluate_item(&item)),
                Err(skip) => note_skip(&mut skipped, skip),
            }
        }
        finish(counts, skipped)
    }

    /// Parallel pass over frames; identical results to `evaluate`.
    #[cfg(feature = "parallel")]
    pub fn evaluate_parallel<I>(&self, items: I) -> Result<AccuracyReport, OccupancyError>
    where
        I: IntoIterator<Item = Result<DatasetItem, FrameSkipped>>,
    {
        use rayon::prelude::*;

        let mut ready = Vec::new();
        let mut skipped = Vec::new();
        for item in items {
            match item {
                Ok(item) => ready.push(item),
                Err(skip) => note_skip(&mut skipped, skip),
            }
        }

        let counts = ready
            .par_iter()
            .map(|item| self.evaluate_item(item))
            .reduce(EvaluationRecord::default, EvaluationRecord::merge);
        finish(counts, skipped)
    }
}

fn note_skip(skipped: &mut Vec<FrameSkipped>, skip: FrameSkipped) {
    log::warn!("{}", skip);
    skipped.push(skip);
}

fn finish(
    counts: EvaluationRecord,
    skipped: Vec<FrameSkipped>,
) -> Result<AccuracyReport, OccupancyError> {
    let report = AccuracyReport::from_record(counts, skipped)?;
    log::info!(
        "evaluated {} frames ({} skipped): accuracy {:.4} over {} labeled slots",
        report.counts.frames_evaluated,
        report.frames_skipped,
        report.accuracy,
        report.labeled
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::OccupancyRule;
    use crate::detect::VehicleRegion;
    use crate::geometry::{BoundaryPolicy, Point};
    use crate::slots::Slot;

    fn labeled_slot(id: u32, x: f64, label: Option<bool>) -> Slot {
        Slot::new(
            id,
            vec![
                Point::new(x, 0.0),
                Point::new(x + 10.0, 0.0),
                Point::new(x + 10.0, 10.0),
                Point::new(x, 10.0),
            ],
        )
        .unwrap()
        .with_ground_truth(label)
    }

    fn item(name: &str, labels: &[Option<bool>], regions: Vec<VehicleRegion>) -> DatasetItem {
        let slots = labels
            .iter()
            .enumerate()
            .map(|(i, label)| labeled_slot(i as u32 + 1, i as f64 * 20.0, *label))
            .collect();
        DatasetItem {
            name: name.to_string(),
            detections: VehicleDetectionSet::new(regions),
            slots: SlotRegistry::new(slots).unwrap(),
        }
    }

    #[test]
    fn record_merge_is_order_independent() {
        let mut a = EvaluationRecord::default();
        a.record(true, true);
        a.record(false, true);
        let mut b = EvaluationRecord::default();
        b.record(false, false);
        b.unlabeled_slots = 2;
        assert_eq!(a.merge(b), b.merge(a));
        assert_eq!(a.merge(b).labeled(), 3);
        assert_eq!(a.merge(b).matches(), 2);
    }

    #[test]
    fn unlabeled_slots_are_not_scored() {
        let harness = EvaluationHarness::new(OccupancyClassifier::new(OccupancyRule::AreaOverlap));
        // Slot 2 is unlabeled but occupied; slot 1 labeled vacant and vacant.
        let frame = item(
            "f1",
            &[Some(false), None],
            vec![VehicleRegion::bbox(22.0, 2.0, 28.0, 8.0)],
        );
        let report = harness.evaluate(vec![Ok(frame)]).unwrap();
        assert_eq!(report.accuracy, 1.0);
        assert_eq!(report.labeled, 1);
        assert_eq!(report.counts.unlabeled_slots, 1);
        assert_eq!(report.vacant_recall, Some(1.0));
        assert_eq!(report.occupied_recall, None);
    }

    #[test]
    fn skipped_frames_are_counted_not_classified() {
        let harness = EvaluationHarness::default();
        let car = VehicleRegion::bbox(1.0, 1.0, 9.0, 9.0);
        let frame = item("f1", &[Some(true)], vec![car]);
        let report = harness
            .evaluate(vec![
                Err(FrameSkipped::new("f0", "no paired annotation")),
                Ok(frame),
            ])
            .unwrap();
        assert_eq!(report.frames_skipped, 1);
        assert_eq!(report.skipped[0].name, "f0");
        assert_eq!(report.counts.frames_evaluated, 1);
        assert_eq!(report.accuracy, 1.0);
    }

    #[test]
    fn zero_labels_is_an_error_not_zero_accuracy() {
        let harness = EvaluationHarness::default();
        let frame = item("f1", &[None, None], vec![]);
        assert_eq!(
            harness.evaluate(vec![Ok(frame)]),
            Err(OccupancyError::NoLabeledData)
        );
        assert_eq!(
            harness.evaluate(Vec::new()),
            Err(OccupancyError::NoLabeledData)
        );
        assert_eq!(
            harness.evaluate(vec![Err(FrameSkipped::new("f0", "missing"))]),
            Err(OccupancyError::NoLabeledData)
        );
    }

    #[test]
    fn boundary_policy_decides_on_edge_centroids() {
        // Centroid on the right edge of a slot labeled occupied.
        let frame = || item("f1", &[Some(true)], vec![VehicleRegion::center(10.0, 5.0)]);
        let classifier = OccupancyClassifier::new(OccupancyRule::CentroidContainment);

        let strict = EvaluationHarness::new(classifier);
        assert_eq!(strict.evaluate(vec![Ok(frame())]).unwrap().accuracy, 0.0);

        let lenient = EvaluationHarness::new(classifier.with_boundary(BoundaryPolicy::Include));
        assert_eq!(lenient.evaluate(vec![Ok(frame())]).unwrap().accuracy, 1.0);
    }

    #[test]
    fn mixed_accuracy_and_breakdown() {
        let classifier = OccupancyClassifier::new(OccupancyRule::CentroidContainment);
        let harness = EvaluationHarness::new(classifier);
        // Slot 1 occupied & detected, slot 2 occupied & missed, slot 3 vacant & false alarm,
        // slot 4 vacant & empty.
        let frame = item(
            "f1",
            &[Some(true), Some(true), Some(false), Some(false)],
            vec![VehicleRegion::center(5.0, 5.0), VehicleRegion::center(45.0, 5.0)],
        );
        let report = harness.evaluate(vec![Ok(frame)]).unwrap();
        assert_eq!(report.matches, 2);
        assert_eq!(report.labeled, 4);
        assert_eq!(report.accuracy, 0.5);
        assert_eq!(report.occupied_recall, Some(0.5));
        assert_eq!(report.vacant_recall, Some(0.5));
        assert_eq!(
            report.counts,
            EvaluationRecord {
                frames_evaluated: 1,
                true_occupied: 1,
                false_occupied: 1,
                true_vacant: 1,
                false_vacant: 1,
                unlabeled_slots: 0,
            }
        );
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn parallel_matches_sequential() {
        let harness = EvaluationHarness::new(OccupancyClassifier::new(OccupancyRule::AreaOverlap));
        let frames = || {
            (0..64)
                .map(|i| {
                    if i % 9 == 0 {
                        return Err(FrameSkipped::new(format!("f{}", i), "no paired annotation"));
                    }
                    let labels = [Some(i % 2 == 0), Some(i % 3 == 0), None, Some(true)];
                    let x = (i % 4) as f64 * 20.0;
                    Ok(item(
                        &format!("f{}", i),
                        &labels,
                        vec![VehicleRegion::bbox(x + 1.0, 1.0, x + 9.0, 9.0)],
                    ))
                })
                .collect::<Vec<_>>()
        };
        let sequential = harness.evaluate(frames()).unwrap();
        let parallel = harness.evaluate_parallel(frames()).unwrap();
        assert_eq!(sequential, parallel);
    }
}

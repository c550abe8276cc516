use serde::{Deserialize, Serialize};

use crate::classify::OccupancyVerdict;

/// Frame-level counts derived from a verdict.
///
/// Field names match the interactive response consumed by the presentation
/// layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameStatistics {
    pub total_slots: usize,
    pub occupied: usize,
    pub vacant: usize,
    /// Percentage of occupied slots, one decimal; 0 for an empty lot.
    pub occupancy_rate: f64,
}

impl FrameStatistics {
    pub fn from_verdict(verdict: &OccupancyVerdict) -> Self {
        let total_slots = verdict.len();
        let occupied = verdict.occupied_count();
        Self {
            total_slots,
            occupied,
            vacant: total_slots - occupied,
            occupancy_rate: occupancy_rate(occupied, total_slots),
        }
    }
}

/// Reduce a verdict to frame statistics.
pub fn aggregate(verdict: &OccupancyVerdict) -> FrameStatistics {
    FrameStatistics::from_verdict(verdict)
}

/// `round(100 * occupied / total, 1)`, half away from zero.
fn occupancy_rate(occupied: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let percent = 100.0 * occupied as f64 / total as f64;
    (percent * 10.0).round() / 10.0
}

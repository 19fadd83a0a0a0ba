//! Cohort statistics: means, medians and median absolute deviation over
//! the two attendance dimensions.

use persona_core::CustomerRecord;
use serde::{Deserialize, Serialize};

/// Lower bound for MAD so z-scores never divide by zero.
pub const MAD_FLOOR: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CohortStats {
    pub mean_visit: f64,
    pub mean_duration: f64,
    pub median_visit: f64,
    pub median_duration: f64,
    pub mad_visit: f64,
    pub mad_duration: f64,
}

impl CohortStats {
    pub fn compute(cohort: &[CustomerRecord]) -> Self {
        let visits: Vec<f64> = cohort.iter().map(CustomerRecord::visits).collect();
        let durations: Vec<f64> = cohort.iter().map(CustomerRecord::duration).collect();

        Self {
            mean_visit: mean(&visits),
            mean_duration: mean(&durations),
            median_visit: median(&visits),
            median_duration: median(&durations),
            mad_visit: mad(&visits),
            mad_duration: mad(&durations),
        }
    }
}

/// Arithmetic mean, `0.0` for an empty slice. Finite whenever every input
/// is finite: a sum that overflows is recomputed from pre-divided terms.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let sum: f64 = values.iter().sum();
    if sum.is_finite() {
        sum / n
    } else {
        values.iter().map(|v| v / n).sum()
    }
}

/// Median, averaging the two middle elements for even lengths. `0.0` for
/// an empty slice.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        sorted[mid - 1] / 2.0 + sorted[mid] / 2.0
    } else {
        sorted[mid]
    }
}

/// Median absolute deviation from the median, floored at [`MAD_FLOOR`].
pub fn mad(values: &[f64]) -> f64 {
    let center = median(values);
    let deviations: Vec<f64> = values.iter().map(|v| (v - center).abs()).collect();
    median(&deviations).max(MAD_FLOOR)
}

//! Threshold derivation: turns cohort statistics into comparison baselines.

use persona_core::{CustomerRecord, PresenceThresholds, Thresholds};

use crate::stats::{median, CohortStats};

/// Presence scores used when the cohort is empty.
pub const PRESENCE_FALLBACK: [f64; 3] = [4.0, 8.0, 12.0];

/// Repurchase score a customer must reach to count as converting.
pub const REPURCHASE_CUT: f64 = 0.5;

/// Mean-based thresholds.
pub fn thresholds_from_data(cohort: &[CustomerRecord]) -> Thresholds {
    let stats = CohortStats::compute(cohort);
    Thresholds {
        visit_days: stats.mean_visit,
        avg_duration_min: stats.mean_duration,
    }
}

/// Median-based thresholds, resistant to a few heavy visitors.
pub fn robust_thresholds_from_data(cohort: &[CustomerRecord]) -> Thresholds {
    let stats = CohortStats::compute(cohort);
    Thresholds {
        visit_days: stats.median_visit,
        avg_duration_min: stats.median_duration,
    }
}

/// Thresholds for the presence/repurchase classifier with the default
/// fallback cohort and cutoff.
pub fn presence_thresholds_from_data(cohort: &[CustomerRecord]) -> PresenceThresholds {
    presence_thresholds_with(cohort, &PRESENCE_FALLBACK, REPURCHASE_CUT)
}

pub fn presence_thresholds_with(
    cohort: &[CustomerRecord],
    fallback: &[f64],
    repurchase_cut: f64,
) -> PresenceThresholds {
    let presences: Vec<f64> = cohort.iter().map(CustomerRecord::presence_score).collect();
    let presence_median = if presences.is_empty() {
        median(fallback)
    } else {
        median(&presences)
    };
    PresenceThresholds {
        presence_median,
        repurchase_cut,
    }
}

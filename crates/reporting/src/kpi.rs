//! Cohort-wide KPI summary for the home dashboard.

use persona_core::CustomerRecord;
use persona_segmentation::stats::mean;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KpiSummary {
    pub total: usize,
    /// Mean visit days, 2 decimals.
    pub avg_visit: f64,
    /// Mean session duration in minutes, 2 decimals.
    pub avg_duration: f64,
    /// Percentage of customers with either retention flag, 1 decimal.
    pub repurch: f64,
    pub revenue: f64,
    /// Revenue per customer.
    pub arpu: f64,
}

impl KpiSummary {
    pub fn empty() -> Self {
        Self {
            total: 0,
            avg_visit: 0.0,
            avg_duration: 0.0,
            repurch: 0.0,
            revenue: 0.0,
            arpu: 0.0,
        }
    }
}

pub fn summarize_kpis(cohort: &[CustomerRecord]) -> KpiSummary {
    let total = cohort.len();
    if total == 0 {
        return KpiSummary::empty();
    }
    let n = total as f64;

    let visits: Vec<f64> = cohort.iter().map(CustomerRecord::visits).collect();
    let durations: Vec<f64> = cohort.iter().map(CustomerRecord::duration).collect();
    let payments: Vec<f64> = cohort.iter().map(CustomerRecord::payment).collect();
    let retained = cohort.iter().filter(|c| c.is_retained()).count();
    // total revenue saturates instead of overflowing
    let revenue = payments.iter().sum::<f64>().min(f64::MAX);

    KpiSummary {
        total,
        avg_visit: round_to(mean(&visits), 2),
        avg_duration: round_to(mean(&durations), 2),
        repurch: round_to(retained as f64 * 100.0 / n, 1),
        revenue,
        arpu: mean(&payments),
    }
}

/// Round to `places` decimals. Values too large to scale are already
/// integral and pass through.
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / factor
}

//! Repurchase ETA estimators.
//!
//! The bucketed estimator gives a quick category-level answer; the decay
//! estimator responds smoothly to slider input in the simulator.

use persona_core::{CustomerRecord, EtaPolicy, PersonaCode, Thresholds};

use crate::classifier::quadrant_code;

/// Every value the bucketed estimator can return.
pub const ETA_BUCKETS: [u32; 5] = [14, 21, 28, 35, 45];

const DECAY_BASE_DAYS: f64 = 90.0;
const DECAY_MAX_REDUCTION: f64 = 0.45;
const DECAY_PRESENCE_SPAN: f64 = 12.0;
const RECENT_MULTIPLIER: f64 = 0.75;
const SUMMER_MULTIPLIER: f64 = 0.9;
const DECAY_MIN_DAYS: f64 = 7.0;
const DECAY_MAX_DAYS: f64 = 120.0;

/// Bucketed ETA: retention flags first, then the mean/quadrant cell.
/// Missing thresholds compare against zero.
pub fn next_repurchase_eta_days(customer: &CustomerRecord, thresholds: Option<&Thresholds>) -> u32 {
    if customer.retained_90 {
        return 14;
    }
    if customer.retained_june_august {
        return 21;
    }

    let thresholds = thresholds.copied().unwrap_or_default();
    match quadrant_code(customer, &thresholds) {
        PersonaCode::Loyal => 21,
        PersonaCode::Browser => 28,
        PersonaCode::Sniper => 35,
        PersonaCode::Churn => 45,
    }
}

/// Continuous ETA: 90 days shortened by up to 45% with presence, then by
/// the retention multipliers (which compound), clamped to [7, 120].
pub fn decay_repurchase_eta_days(customer: &CustomerRecord) -> u32 {
    let boost = (customer.presence_score() / DECAY_PRESENCE_SPAN).clamp(0.0, 1.0);
    let mut eta = DECAY_BASE_DAYS * (1.0 - DECAY_MAX_REDUCTION * boost);

    if customer.retained_90 {
        eta *= RECENT_MULTIPLIER;
    }
    if customer.retained_june_august {
        eta *= SUMMER_MULTIPLIER;
    }

    eta.clamp(DECAY_MIN_DAYS, DECAY_MAX_DAYS).round() as u32
}

/// ETA under the configured policy. The decay estimator ignores thresholds.
pub fn estimate_eta(
    policy: EtaPolicy,
    customer: &CustomerRecord,
    thresholds: Option<&Thresholds>,
) -> u32 {
    match policy {
        EtaPolicy::Bucketed => next_repurchase_eta_days(customer, thresholds),
        EtaPolicy::Decay => decay_repurchase_eta_days(customer),
    }
}

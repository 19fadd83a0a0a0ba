//! Customer persona engine: cohort statistics, threshold derivation,
//! persona classifiers and repurchase ETA estimation.

pub mod classifier;
pub mod eta;
pub mod playbook;
pub mod stats;
pub mod thresholds;

pub use classifier::{
    classify, classify_cohort, classify_presence, classify_robust, classify_with, prepare,
    prepare_configured, PersonaClassifier, PresenceClassifier, QuadrantClassifier, RobustClassifier,
};
pub use eta::{decay_repurchase_eta_days, estimate_eta, next_repurchase_eta_days};
pub use playbook::recommended_actions;
pub use stats::CohortStats;
pub use thresholds::{
    presence_thresholds_from_data, robust_thresholds_from_data, thresholds_from_data,
};

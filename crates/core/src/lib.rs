pub mod config;
pub mod error;
pub mod roster;
pub mod types;

pub use config::AppConfig;
pub use error::{PersonaError, PersonaResult};
pub use roster::{CustomerPatch, CustomerRoster};
pub use types::{
    decode_cohort, ClassificationResult, ClassifierPolicy, CustomerRecord, EtaPolicy,
    PersonaCode, PresenceThresholds, RobustScores, Thresholds,
};

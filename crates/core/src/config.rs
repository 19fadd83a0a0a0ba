use serde::Deserialize;

use crate::types::{ClassifierPolicy, EtaPolicy};

/// Root application configuration. Loaded from environment variables
/// with the prefix `PERSONA__` and an optional TOML config file.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub eta: EtaConfig,
    #[serde(default)]
    pub roster: RosterConfig,
}

// ─── Classifier Config ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_classifier_policy")]
    pub policy: ClassifierPolicy,
    /// Synthetic presence scores used when the cohort is empty.
    #[serde(default = "default_presence_fallback")]
    pub presence_fallback: Vec<f64>,
    #[serde(default = "default_repurchase_cut")]
    pub repurchase_cut: f64,
}

fn default_classifier_policy() -> ClassifierPolicy {
    ClassifierPolicy::RobustMedianMad
}
fn default_presence_fallback() -> Vec<f64> {
    vec![4.0, 8.0, 12.0]
}
fn default_repurchase_cut() -> f64 {
    0.5
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            policy: default_classifier_policy(),
            presence_fallback: default_presence_fallback(),
            repurchase_cut: default_repurchase_cut(),
        }
    }
}

// ─── ETA Config ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct EtaConfig {
    #[serde(default = "default_eta_policy")]
    pub policy: EtaPolicy,
}

fn default_eta_policy() -> EtaPolicy {
    EtaPolicy::Bucketed
}

impl Default for EtaConfig {
    fn default() -> Self {
        Self {
            policy: default_eta_policy(),
        }
    }
}

// ─── Roster Config ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct RosterConfig {
    #[serde(default = "default_region")]
    pub default_region: String,
    #[serde(default = "default_age_group")]
    pub default_age_group: String,
    #[serde(default = "default_customer_name")]
    pub default_name: String,
}

fn default_region() -> String {
    "서울".to_string()
}
fn default_age_group() -> String {
    "20s".to_string()
}
fn default_customer_name() -> String {
    "New".to_string()
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            default_region: default_region(),
            default_age_group: default_age_group(),
            default_name: default_customer_name(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierConfig::default(),
            eta: EtaConfig::default(),
            roster: RosterConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables only.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_with_file(None)
    }

    /// Load configuration from an optional TOML file, then environment
    /// variables on top of it.
    pub fn load_with_file(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }
        let builder = builder.add_source(
            config::Environment::with_prefix("PERSONA")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("classifier.presence_fallback"),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}

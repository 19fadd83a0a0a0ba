use serde::{Deserialize, Serialize};

use crate::error::{PersonaError, PersonaResult};

/// One observed or hypothetical customer behavior sample.
///
/// Every field decodes leniently: malformed numbers become `0.0` and
/// malformed flags become `false`, so a single bad record never fails
/// a cohort load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub age_group: Option<String>,
    /// Time bucket, usually `YYYY-MM` but numeric buckets are accepted.
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub month: Option<String>,

    #[serde(default, deserialize_with = "lenient::number")]
    pub visit_days: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub avg_duration_min: f64,

    #[serde(default, deserialize_with = "lenient::flag")]
    pub retained_june_august: bool,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub retained_90: bool,

    #[serde(default, deserialize_with = "lenient::optional_number", skip_serializing_if = "Option::is_none")]
    pub payment_amount: Option<f64>,
}

impl CustomerRecord {
    /// Ad-hoc sample with only the behavioral fields set.
    pub fn sample(
        visit_days: f64,
        avg_duration_min: f64,
        retained_june_august: bool,
        retained_90: bool,
    ) -> Self {
        Self {
            visit_days,
            avg_duration_min,
            retained_june_august,
            retained_90,
            ..Default::default()
        }
    }

    /// Visit days, guaranteed finite and non-negative.
    pub fn visits(&self) -> f64 {
        coerce_metric(self.visit_days)
    }

    /// Session duration in minutes, guaranteed finite and non-negative.
    pub fn duration(&self) -> f64 {
        coerce_metric(self.avg_duration_min)
    }

    /// Payment amount, `0.0` when absent or malformed.
    pub fn payment(&self) -> f64 {
        self.payment_amount.map(coerce_metric).unwrap_or(0.0)
    }

    /// Day count plus duration in hour-equivalents, capped at `f64::MAX`.
    pub fn presence_score(&self) -> f64 {
        (self.visits() + self.duration() / 60.0).min(f64::MAX)
    }

    /// True when either repurchase flag is set.
    pub fn is_retained(&self) -> bool {
        self.retained_90 || self.retained_june_august
    }
}

/// Clamp a raw metric to a finite, non-negative value.
pub fn coerce_metric(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

/// Decode a cohort from JSON. Only a top-level array is accepted;
/// individual records never fail.
pub fn decode_cohort(json: &str) -> PersonaResult<Vec<CustomerRecord>> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    match value {
        serde_json::Value::Array(items) => Ok(items
            .into_iter()
            .map(|item| serde_json::from_value(item).unwrap_or_default())
            .collect()),
        other => Err(PersonaError::InvalidInput(format!(
            "cohort must be a JSON array, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

// ─── Personas ───────────────────────────────────────────────────────────────

/// The four mutually exclusive customer-behavior categories.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PersonaCode {
    /// Frequent and converting.
    Loyal,
    /// Frequent but rarely converting.
    Browser,
    /// Infrequent but converting when present.
    Sniper,
    /// Neither frequent nor converting.
    Churn,
}

impl PersonaCode {
    /// Dashboard order.
    pub const ALL: [PersonaCode; 4] = [
        PersonaCode::Loyal,
        PersonaCode::Browser,
        PersonaCode::Sniper,
        PersonaCode::Churn,
    ];

    /// The shared 2x2 decision table.
    pub fn from_signals(attendance_high: bool, repurchase_high: bool) -> Self {
        match (attendance_high, repurchase_high) {
            (true, true) => PersonaCode::Loyal,
            (true, false) => PersonaCode::Browser,
            (false, true) => PersonaCode::Sniper,
            (false, false) => PersonaCode::Churn,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PersonaCode::Loyal => "LOYAL",
            PersonaCode::Browser => "BROWSER",
            PersonaCode::Sniper => "SNIPER",
            PersonaCode::Churn => "CHURN",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PersonaCode::Loyal => "Loyal",
            PersonaCode::Browser => "Browser",
            PersonaCode::Sniper => "Sniper",
            PersonaCode::Churn => "Churn",
        }
    }

    /// Step index for the simulator history chart.
    pub fn ordinal(&self) -> u8 {
        match self {
            PersonaCode::Churn => 0,
            PersonaCode::Sniper => 1,
            PersonaCode::Browser => 2,
            PersonaCode::Loyal => 3,
        }
    }

    /// Badge color used by presentation layers.
    pub fn color(&self) -> &'static str {
        match self {
            PersonaCode::Loyal => "#2563eb",
            PersonaCode::Browser => "#eab308",
            PersonaCode::Sniper => "#22c55e",
            PersonaCode::Churn => "#ef4444",
        }
    }
}

impl std::fmt::Display for PersonaCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Thresholds ─────────────────────────────────────────────────────────────

/// Cohort baseline cutoffs for the two attendance dimensions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub visit_days: f64,
    pub avg_duration_min: f64,
}

/// Cutoffs for the presence/repurchase composite classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PresenceThresholds {
    pub presence_median: f64,
    pub repurchase_cut: f64,
}

// ─── Classification output ──────────────────────────────────────────────────

/// Intermediate scores of the robust classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RobustScores {
    pub attendance_z: f64,
    pub visit_z: f64,
    pub dur_z: f64,
    pub repurchase_z: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub code: PersonaCode,
    pub label: String,
    pub desc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub why: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scores: Option<RobustScores>,
}

// ─── Policies ───────────────────────────────────────────────────────────────

/// Selects one of the three classifier strategies.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierPolicy {
    /// Visit days and duration against cohort means.
    MeanQuadrant,
    /// Median/MAD z-scores plus repurchase flags, with an explanation.
    RobustMedianMad,
    /// Presence score against its cohort median plus a repurchase score.
    PresenceRepurchase,
}

impl ClassifierPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassifierPolicy::MeanQuadrant => "mean_quadrant",
            ClassifierPolicy::RobustMedianMad => "robust_median_mad",
            ClassifierPolicy::PresenceRepurchase => "presence_repurchase",
        }
    }
}

impl std::str::FromStr for ClassifierPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "mean_quadrant" | "mean" => Ok(ClassifierPolicy::MeanQuadrant),
            "robust_median_mad" | "robust" => Ok(ClassifierPolicy::RobustMedianMad),
            "presence_repurchase" | "presence" => Ok(ClassifierPolicy::PresenceRepurchase),
            other => Err(format!("unknown classifier policy: {other}")),
        }
    }
}

/// Selects one of the two repurchase ETA heuristics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EtaPolicy {
    /// Five fixed buckets from flags and quadrant.
    Bucketed,
    /// Continuous decay from presence score and flags.
    Decay,
}

impl std::str::FromStr for EtaPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bucketed" | "bucket" => Ok(EtaPolicy::Bucketed),
            "decay" | "continuous" => Ok(EtaPolicy::Decay),
            other => Err(format!("unknown eta policy: {other}")),
        }
    }
}

// ─── Lenient decoding ───────────────────────────────────────────────────────

mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::coerce_metric;

    pub fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().map(coerce_number).unwrap_or(0.0))
    }

    pub fn optional_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value
            .filter(|v| !v.is_null())
            .map(|v| coerce_number(&v)))
    }

    pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::Bool(b)) => b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|x| x != 0.0),
            Some(Value::String(s)) => {
                matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "1")
            }
            _ => false,
        })
    }

    pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(number_text(&n)),
            Some(Value::Bool(b)) => Some(b.to_string()),
            _ => None,
        })
    }

    /// Integers print without a fraction, so `8`, `8.0` and `8e0` share a
    /// bucket.
    fn number_text(n: &serde_json::Number) -> String {
        if let Some(i) = n.as_i64() {
            return i.to_string();
        }
        if let Some(u) = n.as_u64() {
            return u.to_string();
        }
        match n.as_f64() {
            Some(x) if x.fract() == 0.0 && x.abs() < 1e21 => format!("{x:.0}"),
            Some(x) => x.to_string(),
            None => n.to_string(),
        }
    }

    fn coerce_number(value: &Value) -> f64 {
        let raw = match value {
            Value::Number(n) => n.as_f64().unwrap_or(0.0),
            Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
            Value::Bool(true) => 1.0,
            _ => 0.0,
        };
        coerce_metric(raw)
    }
}

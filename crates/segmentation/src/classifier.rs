//! Persona classifiers: three interchangeable strategies over the shared
//! 2x2 attendance/repurchase table.
//!
//! Each prepared classifier computes its cohort baseline once in its
//! constructor, so classifying a whole cohort costs one statistics pass.
//! [`classify_robust`] is the single-shot variant that recomputes the
//! statistics on every call.

use persona_core::config::ClassifierConfig;
use persona_core::{
    ClassificationResult, ClassifierPolicy, CustomerRecord, PersonaCode, PresenceThresholds,
    RobustScores, Thresholds,
};
use tracing::debug;

use crate::stats::CohortStats;
use crate::thresholds::{
    presence_thresholds_from_data, presence_thresholds_with, thresholds_from_data,
};

/// Repurchase bias when either retention flag is set.
const RETAINED_BIAS: f64 = 0.5;
/// Repurchase bias when neither flag is set.
const NOT_RETAINED_BIAS: f64 = -0.25;

/// A classifier prepared against one cohort snapshot.
pub trait PersonaClassifier {
    fn policy(&self) -> ClassifierPolicy;

    fn classify(&self, customer: &CustomerRecord) -> ClassificationResult;
}

// ─── Descriptions ───────────────────────────────────────────────────────────

fn quadrant_desc(code: PersonaCode) -> &'static str {
    match code {
        PersonaCode::Loyal => "Visits often and stays long",
        PersonaCode::Browser => "Looks around a lot but buys less",
        PersonaCode::Sniper => "Visits now and then but buys decisively",
        PersonaCode::Churn => "Few visits and short stays",
    }
}

fn presence_desc(code: PersonaCode) -> &'static str {
    match code {
        PersonaCode::Loyal => "Steady visitor with strong repurchase, a true fan",
        PersonaCode::Browser => {
            "Many visits but low conversion; push cart reminders and a first purchase"
        }
        PersonaCode::Sniper => "Rare visits that still convert; send reminders and bundles",
        PersonaCode::Churn => "Low visits and purchases; win-back coupon and tailored content",
    }
}

fn result(code: PersonaCode, desc: &str) -> ClassificationResult {
    ClassificationResult {
        code,
        label: code.label().to_string(),
        desc: desc.to_string(),
        why: None,
        scores: None,
    }
}

// ─── Strategy A: mean quadrant ──────────────────────────────────────────────

/// Compares visit days and duration against fixed thresholds. Duration
/// stands in for the repurchase axis; retention flags are not consulted.
#[derive(Debug, Clone, Copy)]
pub struct QuadrantClassifier {
    thresholds: Thresholds,
}

impl QuadrantClassifier {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn from_cohort(cohort: &[CustomerRecord]) -> Self {
        Self::new(thresholds_from_data(cohort))
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }
}

impl PersonaClassifier for QuadrantClassifier {
    fn policy(&self) -> ClassifierPolicy {
        ClassifierPolicy::MeanQuadrant
    }

    fn classify(&self, customer: &CustomerRecord) -> ClassificationResult {
        classify(customer, &self.thresholds)
    }
}

/// Mean/quadrant classification against precomputed thresholds.
pub fn classify(customer: &CustomerRecord, thresholds: &Thresholds) -> ClassificationResult {
    let code = quadrant_code(customer, thresholds);
    result(code, quadrant_desc(code))
}

/// Quadrant cell for a customer. Duration above threshold alone is BROWSER,
/// visits above threshold alone is SNIPER. Shared with the bucketed ETA
/// estimator.
pub(crate) fn quadrant_code(customer: &CustomerRecord, thresholds: &Thresholds) -> PersonaCode {
    let tv = threshold_bound(thresholds.visit_days);
    let td = threshold_bound(thresholds.avg_duration_min);
    let visit_high = customer.visits() > tv;
    let duration_high = customer.duration() > td;
    PersonaCode::from_signals(duration_high, visit_high)
}

/// NaN and negative thresholds compare as zero; an overflowed threshold
/// stays above every finite metric.
fn threshold_bound(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, f64::MAX)
    }
}

// ─── Strategy B: robust median/MAD ──────────────────────────────────────────

/// Median/MAD z-scores on attendance plus a flag-driven repurchase bias.
/// Every result carries the scores and a `why` line.
#[derive(Debug, Clone, Copy)]
pub struct RobustClassifier {
    stats: CohortStats,
}

impl RobustClassifier {
    pub fn from_cohort(cohort: &[CustomerRecord]) -> Self {
        Self::from_stats(CohortStats::compute(cohort))
    }

    pub fn from_stats(stats: CohortStats) -> Self {
        Self { stats }
    }

    pub fn scores(&self, customer: &CustomerRecord) -> RobustScores {
        let visit_z = (customer.visits() - self.stats.median_visit) / self.stats.mad_visit;
        let dur_z = (customer.duration() - self.stats.median_duration) / self.stats.mad_duration;
        let repurchase_z = if customer.is_retained() {
            RETAINED_BIAS
        } else {
            NOT_RETAINED_BIAS
        };
        RobustScores {
            attendance_z: visit_z / 2.0 + dur_z / 2.0,
            visit_z,
            dur_z,
            repurchase_z,
        }
    }
}

impl PersonaClassifier for RobustClassifier {
    fn policy(&self) -> ClassifierPolicy {
        ClassifierPolicy::RobustMedianMad
    }

    fn classify(&self, customer: &CustomerRecord) -> ClassificationResult {
        let scores = self.scores(customer);
        let code = PersonaCode::from_signals(scores.attendance_z >= 0.0, scores.repurchase_z >= 0.0);
        let why = format!(
            "attendanceZ={:.2} (visitZ={:.2}, durZ={:.2}), repurchaseZ={:.2}",
            round2(scores.attendance_z),
            round2(scores.visit_z),
            round2(scores.dur_z),
            round2(scores.repurchase_z),
        );

        debug!(code = %code, why = %why, "Robust classification");

        ClassificationResult {
            why: Some(why),
            scores: Some(scores),
            ..result(code, quadrant_desc(code))
        }
    }
}

/// Robust classification that recomputes cohort statistics on every call.
pub fn classify_robust(customer: &CustomerRecord, cohort: &[CustomerRecord]) -> ClassificationResult {
    RobustClassifier::from_cohort(cohort).classify(customer)
}

fn round2(value: f64) -> f64 {
    let scaled = value * 100.0;
    if !scaled.is_finite() {
        return value;
    }
    let rounded = scaled.round() / 100.0;
    // avoid printing "-0.00"
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

// ─── Strategy C: presence / repurchase score ────────────────────────────────

/// Presence score (days plus hours) against its cohort median, and the
/// average of the two retention flags against a fixed cutoff.
#[derive(Debug, Clone, Copy)]
pub struct PresenceClassifier {
    thresholds: PresenceThresholds,
}

impl PresenceClassifier {
    pub fn new(thresholds: PresenceThresholds) -> Self {
        Self { thresholds }
    }

    pub fn from_cohort(cohort: &[CustomerRecord]) -> Self {
        Self::new(presence_thresholds_from_data(cohort))
    }

    pub fn thresholds(&self) -> PresenceThresholds {
        self.thresholds
    }
}

impl PersonaClassifier for PresenceClassifier {
    fn policy(&self) -> ClassifierPolicy {
        ClassifierPolicy::PresenceRepurchase
    }

    fn classify(&self, customer: &CustomerRecord) -> ClassificationResult {
        classify_presence(customer, &self.thresholds)
    }
}

pub fn classify_presence(
    customer: &CustomerRecord,
    thresholds: &PresenceThresholds,
) -> ClassificationResult {
    let presence_high = customer.presence_score() >= thresholds.presence_median;
    let repurchase_high = repurchase_score(customer) >= thresholds.repurchase_cut;
    let code = PersonaCode::from_signals(presence_high, repurchase_high);
    result(code, presence_desc(code))
}

/// Mean of the two retention flags as 0/1. Both flags always exist on the
/// record, so the denominator is fixed at 2.
pub fn repurchase_score(customer: &CustomerRecord) -> f64 {
    let summer = if customer.retained_june_august { 1.0 } else { 0.0 };
    let recent = if customer.retained_90 { 1.0 } else { 0.0 };
    (summer + recent) / 2.0
}

// ─── Policy dispatch ────────────────────────────────────────────────────────

/// Prepare the classifier selected by `policy` against `cohort`.
pub fn prepare(policy: ClassifierPolicy, cohort: &[CustomerRecord]) -> Box<dyn PersonaClassifier> {
    match policy {
        ClassifierPolicy::MeanQuadrant => Box::new(QuadrantClassifier::from_cohort(cohort)),
        ClassifierPolicy::RobustMedianMad => Box::new(RobustClassifier::from_cohort(cohort)),
        ClassifierPolicy::PresenceRepurchase => Box::new(PresenceClassifier::from_cohort(cohort)),
    }
}

/// Prepare the configured classifier. The presence fallback and cutoff
/// only affect the presence/repurchase policy.
pub fn prepare_configured(
    config: &ClassifierConfig,
    cohort: &[CustomerRecord],
) -> Box<dyn PersonaClassifier> {
    match config.policy {
        ClassifierPolicy::PresenceRepurchase => Box::new(PresenceClassifier::new(
            presence_thresholds_with(cohort, &config.presence_fallback, config.repurchase_cut),
        )),
        policy => prepare(policy, cohort),
    }
}

/// Classify one customer under `policy`, deriving baselines from `cohort`.
pub fn classify_with(
    policy: ClassifierPolicy,
    customer: &CustomerRecord,
    cohort: &[CustomerRecord],
) -> ClassificationResult {
    prepare(policy, cohort).classify(customer)
}

/// Classify every member of `cohort` against the cohort itself, computing
/// the baseline once.
pub fn classify_cohort(
    policy: ClassifierPolicy,
    cohort: &[CustomerRecord],
) -> Vec<ClassificationResult> {
    let classifier = prepare(policy, cohort);
    let results: Vec<ClassificationResult> = cohort.iter().map(|c| classifier.classify(c)).collect();
    metrics::counter!("classifier.classified").increment(results.len() as u64);
    debug!(policy = policy.as_str(), customers = results.len(), "Cohort classified");
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer(visit_days: f64, avg_duration_min: f64, summer: bool, recent: bool) -> CustomerRecord {
        CustomerRecord::sample(visit_days, avg_duration_min, summer, recent)
    }

    fn cohort() -> Vec<CustomerRecord> {
        vec![
            customer(2.0, 15.0, false, false),
            customer(4.0, 30.0, true, false),
            customer(6.0, 40.0, false, true),
            customer(8.0, 60.0, false, false),
            customer(12.0, 90.0, true, true),
        ]
    }

    const POLICIES: [ClassifierPolicy; 3] = [
        ClassifierPolicy::MeanQuadrant,
        ClassifierPolicy::RobustMedianMad,
        ClassifierPolicy::PresenceRepurchase,
    ];

    #[test]
    fn test_quadrant_cells() {
        let th = Thresholds {
            visit_days: 5.0,
            avg_duration_min: 30.0,
        };
        assert_eq!(classify(&customer(6.0, 31.0, false, false), &th).code, PersonaCode::Loyal);
        assert_eq!(classify(&customer(5.0, 31.0, false, false), &th).code, PersonaCode::Browser);
        assert_eq!(classify(&customer(6.0, 30.0, false, false), &th).code, PersonaCode::Sniper);
        assert_eq!(classify(&customer(5.0, 30.0, false, false), &th).code, PersonaCode::Churn);
    }

    #[test]
    fn test_quadrant_ignores_retention_flags() {
        let th = Thresholds {
            visit_days: 5.0,
            avg_duration_min: 30.0,
        };
        let plain = classify(&customer(1.0, 1.0, false, false), &th);
        let retained = classify(&customer(1.0, 1.0, true, true), &th);
        assert_eq!(plain, retained);
        assert_eq!(retained.code, PersonaCode::Churn);
        assert!(retained.why.is_none());
    }

    #[test]
    fn test_quadrant_near_max_cohort() {
        let data = vec![
            customer(1e308, 20.0, false, false),
            customer(1e308, 20.0, false, false),
            customer(1.0, 20.0, false, false),
        ];
        let th = thresholds_from_data(&data);
        assert!(th.visit_days.is_finite());
        assert_eq!(classify(&customer(1.0, 20.0, false, false), &th).code, PersonaCode::Churn);

        let overflowed = Thresholds {
            visit_days: f64::INFINITY,
            avg_duration_min: f64::NAN,
        };
        assert_eq!(
            classify(&customer(1.0, 20.0, false, false), &overflowed).code,
            PersonaCode::Browser
        );
    }

    #[test]
    fn test_robust_near_max_scores_stay_finite() {
        let data = cohort();
        let res = classify_robust(&customer(1.7e308, 1.7e308, false, false), &data);
        let scores = res.scores.unwrap();
        assert!(scores.visit_z.is_finite());
        assert!(scores.dur_z.is_finite());
        assert!(scores.attendance_z.is_finite());
        assert_eq!(res.code, PersonaCode::Browser);
        assert!(!res.why.unwrap().contains("inf"));
    }

    #[test]
    fn test_quadrant_against_empty_cohort() {
        let classifier = QuadrantClassifier::from_cohort(&[]);
        assert_eq!(classifier.classify(&customer(0.0, 0.0, false, false)).code, PersonaCode::Churn);
        assert_eq!(classifier.classify(&customer(1.0, 1.0, false, false)).code, PersonaCode::Loyal);
    }

    #[test]
    fn test_robust_scores_and_why() {
        // medians 6 / 40; visit deviations [4,2,0,2,6] -> MAD 2;
        // duration deviations [25,10,0,20,50] -> MAD 20
        let data = cohort();
        let res = classify_robust(&customer(10.0, 60.0, false, true), &data);
        let scores = res.scores.unwrap();
        assert_eq!(scores.visit_z, 2.0);
        assert_eq!(scores.dur_z, 1.0);
        assert_eq!(scores.attendance_z, 1.5);
        assert_eq!(scores.repurchase_z, 0.5);
        assert_eq!(res.code, PersonaCode::Loyal);
        assert_eq!(
            res.why.as_deref(),
            Some("attendanceZ=1.50 (visitZ=2.00, durZ=1.00), repurchaseZ=0.50")
        );
    }

    #[test]
    fn test_robust_cells() {
        let data = cohort();
        assert_eq!(classify_robust(&customer(6.0, 40.0, true, false), &data).code, PersonaCode::Loyal);
        assert_eq!(classify_robust(&customer(6.0, 40.0, false, false), &data).code, PersonaCode::Browser);
        assert_eq!(classify_robust(&customer(1.0, 5.0, false, true), &data).code, PersonaCode::Sniper);
        assert_eq!(classify_robust(&customer(1.0, 5.0, false, false), &data).code, PersonaCode::Churn);
    }

    #[test]
    fn test_robust_single_and_constant_cohorts() {
        let single = vec![customer(5.0, 5.0, false, false)];
        let res = classify_robust(&single[0], &single);
        assert_eq!(res.code, PersonaCode::Browser);
        assert_eq!(res.scores.unwrap().attendance_z, 0.0);

        let constant = vec![customer(5.0, 5.0, false, false); 3];
        let res = classify_robust(&customer(6.0, 5.0, false, false), &constant);
        assert_eq!(res.scores.unwrap().visit_z, 1.0);
        assert!(res.scores.unwrap().attendance_z.is_finite());
    }

    #[test]
    fn test_robust_empty_cohort() {
        let res = classify_robust(&customer(0.0, 0.0, false, false), &[]);
        assert_eq!(res.code, PersonaCode::Browser);
        assert_eq!(
            res.why.as_deref(),
            Some("attendanceZ=0.00 (visitZ=0.00, durZ=0.00), repurchaseZ=-0.25")
        );
    }

    #[test]
    fn test_presence_cells() {
        let th = PresenceThresholds {
            presence_median: 8.0,
            repurchase_cut: 0.5,
        };
        assert_eq!(classify_presence(&customer(7.0, 60.0, true, false), &th).code, PersonaCode::Loyal);
        assert_eq!(classify_presence(&customer(8.0, 0.0, false, false), &th).code, PersonaCode::Browser);
        assert_eq!(classify_presence(&customer(7.0, 59.0, false, true), &th).code, PersonaCode::Sniper);
        assert_eq!(classify_presence(&customer(0.0, 0.0, false, false), &th).code, PersonaCode::Churn);
    }

    #[test]
    fn test_presence_uses_fallback_on_empty_cohort() {
        let classifier = PresenceClassifier::from_cohort(&[]);
        assert_eq!(classifier.thresholds().presence_median, 8.0);
        assert_eq!(classifier.classify(&customer(7.0, 0.0, false, false)).code, PersonaCode::Churn);
    }

    #[test]
    fn test_repurchase_score_fixed_denominator_matches_flag_count() {
        for (summer, recent) in [(false, false), (true, false), (false, true), (true, true)] {
            let c = customer(0.0, 0.0, summer, recent);
            let flags = [summer as u8 as f64, recent as u8 as f64];
            let present = flags.iter().filter(|f| **f == 0.0 || **f == 1.0).count().max(1);
            let counted = flags.iter().sum::<f64>() / present as f64;
            assert_eq!(repurchase_score(&c), counted);
        }
    }

    #[test]
    fn test_every_policy_returns_exactly_one_code() {
        let data = cohort();
        let probes = vec![
            customer(0.0, 0.0, false, false),
            customer(f64::NAN, 10.0, true, false),
            customer(100.0, f64::INFINITY, false, true),
            customer(6.0, 40.0, true, true),
            CustomerRecord::default(),
        ];
        for policy in POLICIES {
            for probe in &probes {
                let res = classify_with(policy, probe, &data);
                assert_eq!(PersonaCode::ALL.iter().filter(|c| **c == res.code).count(), 1);
                assert_eq!(res.label, res.code.label());
            }
        }
    }

    #[test]
    fn test_prepare_configured_presence_params() {
        let config = ClassifierConfig {
            policy: ClassifierPolicy::PresenceRepurchase,
            presence_fallback: vec![1.0],
            repurchase_cut: 1.0,
        };
        let classifier = prepare_configured(&config, &[]);
        // presence 2 >= 1 but a single flag stays below the 1.0 cut
        assert_eq!(
            classifier.classify(&customer(2.0, 0.0, true, false)).code,
            PersonaCode::Browser
        );
        assert_eq!(
            classifier.classify(&customer(2.0, 0.0, true, true)).code,
            PersonaCode::Loyal
        );
    }

    #[test]
    fn test_classifiers_idempotent() {
        let data = cohort();
        for policy in POLICIES {
            assert_eq!(classify_cohort(policy, &data), classify_cohort(policy, &data));
        }
    }

    #[test]
    fn test_prepared_matches_single_shot() {
        let data = cohort();
        let batch = classify_cohort(ClassifierPolicy::RobustMedianMad, &data);
        for (customer, res) in data.iter().zip(&batch) {
            assert_eq!(&classify_robust(customer, &data), res);
        }
        assert_eq!(
            prepare(ClassifierPolicy::PresenceRepurchase, &data).policy(),
            ClassifierPolicy::PresenceRepurchase
        );
    }
}

//! Persona dashboard: distribution, segment breakdowns and the monthly
//! loyal-customer trend, bundled into one snapshot for presentation layers.

use chrono::{DateTime, Utc};
use persona_core::config::ClassifierConfig;
use persona_core::{ClassifierPolicy, CustomerRecord, PersonaCode, Thresholds};
use persona_segmentation::{classify, prepare_configured, thresholds_from_data, PersonaClassifier};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::grouping::{by_age_group, by_month, by_region, sort_time_buckets};
use crate::kpi::{summarize_kpis, KpiSummary};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breakdown {
    pub key: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaCount {
    pub code: PersonaCode,
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthPoint {
    pub month: String,
    pub loyal: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub kpis: KpiSummary,
    pub policy: ClassifierPolicy,
    pub thresholds: Thresholds,
    pub distribution: Vec<PersonaCount>,
    pub regions: Vec<Breakdown>,
    pub age_groups: Vec<Breakdown>,
    pub monthly_loyal: Vec<MonthPoint>,
    pub generated_at: DateTime<Utc>,
}

pub fn region_breakdown(cohort: &[CustomerRecord]) -> Vec<Breakdown> {
    by_region(cohort)
        .into_iter()
        .map(|(key, members)| Breakdown {
            key,
            count: members.len(),
        })
        .collect()
}

pub fn age_group_breakdown(cohort: &[CustomerRecord]) -> Vec<Breakdown> {
    by_age_group(cohort)
        .into_iter()
        .map(|(key, members)| Breakdown {
            key,
            count: members.len(),
        })
        .collect()
}

/// Count of mean/quadrant LOYAL customers per month, in time-bucket order.
pub fn monthly_loyal_series(cohort: &[CustomerRecord], thresholds: &Thresholds) -> Vec<MonthPoint> {
    let mut groups = by_month(cohort);
    let mut months: Vec<String> = groups.keys().cloned().collect();
    sort_time_buckets(&mut months);

    months
        .into_iter()
        .map(|month| {
            let loyal = groups
                .remove(&month)
                .unwrap_or_default()
                .into_iter()
                .filter(|c| classify(c, thresholds).code == PersonaCode::Loyal)
                .count();
            MonthPoint { month, loyal }
        })
        .collect()
}

/// Persona counts in dashboard order, classifying each customer once with
/// an already prepared classifier.
pub fn persona_distribution(
    classifier: &dyn PersonaClassifier,
    cohort: &[CustomerRecord],
) -> Vec<PersonaCount> {
    let mut counts = [0usize; 4];
    for customer in cohort {
        let code = classifier.classify(customer).code;
        if let Some(idx) = PersonaCode::ALL.iter().position(|c| *c == code) {
            counts[idx] += 1;
        }
    }
    PersonaCode::ALL
        .iter()
        .zip(counts)
        .map(|(code, count)| PersonaCount {
            code: *code,
            label: code.label().to_string(),
            count,
        })
        .collect()
}

/// Builds dashboard snapshots under one classifier configuration.
pub struct PersonaDashboard {
    config: ClassifierConfig,
}

impl PersonaDashboard {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn snapshot(&self, cohort: &[CustomerRecord]) -> DashboardSnapshot {
        let thresholds = thresholds_from_data(cohort);
        let classifier = prepare_configured(&self.config, cohort);
        let distribution = persona_distribution(classifier.as_ref(), cohort);

        info!(
            customers = cohort.len(),
            policy = self.config.policy.as_str(),
            "Dashboard snapshot generated"
        );

        DashboardSnapshot {
            kpis: summarize_kpis(cohort),
            policy: self.config.policy,
            thresholds,
            distribution,
            regions: region_breakdown(cohort),
            age_groups: age_group_breakdown(cohort),
            monthly_loyal: monthly_loyal_series(cohort, &thresholds),
            generated_at: Utc::now(),
        }
    }
}

impl Default for PersonaDashboard {
    fn default() -> Self {
        Self::new(&ClassifierConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use persona_segmentation::QuadrantClassifier;

    fn customer(month: &str, visit_days: f64, avg_duration_min: f64) -> CustomerRecord {
        CustomerRecord {
            month: Some(month.to_string()),
            visit_days,
            avg_duration_min,
            ..Default::default()
        }
    }

    #[test]
    fn test_monthly_loyal_series_sorted() {
        let cohort = vec![
            customer("2025-10", 10.0, 60.0),
            customer("2025-02", 10.0, 60.0),
            customer("2025-02", 1.0, 5.0),
            customer("2025-02", 12.0, 70.0),
            customer("", 12.0, 70.0),
        ];
        let th = Thresholds {
            visit_days: 5.0,
            avg_duration_min: 30.0,
        };
        let series = monthly_loyal_series(&cohort, &th);
        assert_eq!(
            series,
            vec![
                MonthPoint {
                    month: "2025-02".to_string(),
                    loyal: 2
                },
                MonthPoint {
                    month: "2025-10".to_string(),
                    loyal: 1
                },
                MonthPoint {
                    month: "UNKNOWN".to_string(),
                    loyal: 1
                },
            ]
        );
    }

    #[test]
    fn test_persona_distribution_counts() {
        let cohort = vec![
            customer("1", 10.0, 60.0),
            customer("1", 10.0, 1.0),
            customer("1", 1.0, 60.0),
            customer("1", 1.0, 1.0),
            customer("1", 1.0, 1.0),
        ];
        let classifier = QuadrantClassifier::new(Thresholds {
            visit_days: 5.0,
            avg_duration_min: 30.0,
        });
        let dist = persona_distribution(&classifier, &cohort);
        let counts: Vec<(PersonaCode, usize)> = dist.iter().map(|p| (p.code, p.count)).collect();
        assert_eq!(
            counts,
            vec![
                (PersonaCode::Loyal, 1),
                (PersonaCode::Browser, 1),
                (PersonaCode::Sniper, 1),
                (PersonaCode::Churn, 2),
            ]
        );
        assert_eq!(dist.iter().map(|p| p.count).sum::<usize>(), cohort.len());
    }

    #[test]
    fn test_breakdowns() {
        let cohort = vec![
            CustomerRecord {
                region: Some("Seoul".to_string()),
                age_group: Some("20s".to_string()),
                ..Default::default()
            },
            CustomerRecord {
                region: Some("Seoul".to_string()),
                ..Default::default()
            },
        ];
        assert_eq!(
            region_breakdown(&cohort),
            vec![Breakdown {
                key: "Seoul".to_string(),
                count: 2
            }]
        );
        let ages = age_group_breakdown(&cohort);
        assert_eq!(ages.len(), 2);
        assert!(ages.iter().any(|b| b.key == "UNKNOWN" && b.count == 1));
    }

    #[test]
    fn test_snapshot_on_empty_cohort() {
        let snapshot = PersonaDashboard::default().snapshot(&[]);
        assert_eq!(snapshot.kpis.total, 0);
        assert_eq!(snapshot.distribution.len(), 4);
        assert!(snapshot.distribution.iter().all(|p| p.count == 0));
        assert!(snapshot.regions.is_empty());
        assert!(snapshot.monthly_loyal.is_empty());
    }
}

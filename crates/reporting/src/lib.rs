//! Persona reporting: KPI summaries, segment breakdowns and dashboard
//! snapshots over a customer cohort.

pub mod dashboard;
pub mod grouping;
pub mod kpi;

pub use dashboard::{
    persona_distribution, DashboardSnapshot, MonthPoint, PersonaCount, PersonaDashboard,
};
pub use grouping::{compare_time_buckets, group_by, sort_time_buckets, UNKNOWN_KEY};
pub use kpi::{summarize_kpis, KpiSummary};

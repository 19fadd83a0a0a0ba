//! In-memory customer roster: the ordered list presentation layers edit
//! before handing a snapshot to the classifiers. Persistence is external.

use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::RosterConfig;
use crate::error::{PersonaError, PersonaResult};
use crate::types::CustomerRecord;

/// Partial update applied on top of an existing or default record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerPatch {
    pub name: Option<String>,
    pub region: Option<String>,
    pub age_group: Option<String>,
    pub month: Option<String>,
    pub visit_days: Option<f64>,
    pub avg_duration_min: Option<f64>,
    pub retained_june_august: Option<bool>,
    pub retained_90: Option<bool>,
    pub payment_amount: Option<f64>,
}

impl CustomerPatch {
    fn apply(self, record: &mut CustomerRecord) {
        if let Some(name) = self.name {
            record.name = Some(name);
        }
        if let Some(region) = self.region {
            record.region = Some(region);
        }
        if let Some(age_group) = self.age_group {
            record.age_group = Some(age_group);
        }
        if let Some(month) = self.month {
            record.month = Some(month);
        }
        if let Some(v) = self.visit_days {
            record.visit_days = crate::types::coerce_metric(v);
        }
        if let Some(d) = self.avg_duration_min {
            record.avg_duration_min = crate::types::coerce_metric(d);
        }
        if let Some(flag) = self.retained_june_august {
            record.retained_june_august = flag;
        }
        if let Some(flag) = self.retained_90 {
            record.retained_90 = flag;
        }
        if let Some(amount) = self.payment_amount {
            record.payment_amount = Some(crate::types::coerce_metric(amount));
        }
    }
}

pub struct CustomerRoster {
    config: RosterConfig,
    customers: RwLock<Vec<CustomerRecord>>,
}

impl CustomerRoster {
    pub fn new(config: &RosterConfig) -> Self {
        Self::with_customers(config, Vec::new())
    }

    pub fn with_customers(config: &RosterConfig, customers: Vec<CustomerRecord>) -> Self {
        info!(customers = customers.len(), "Customer roster initialized");
        Self {
            config: config.clone(),
            customers: RwLock::new(customers),
        }
    }

    /// Insert a new customer at the front, filling unspecified fields with
    /// roster defaults. Returns the generated id.
    pub fn add(&self, patch: CustomerPatch) -> String {
        let id = Uuid::new_v4().to_string();
        let mut record = CustomerRecord {
            id: Some(id.clone()),
            name: Some(self.config.default_name.clone()),
            region: Some(self.config.default_region.clone()),
            age_group: Some(self.config.default_age_group.clone()),
            month: Some(Utc::now().format("%Y-%m").to_string()),
            payment_amount: Some(0.0),
            ..Default::default()
        };
        patch.apply(&mut record);

        self.customers.write().insert(0, record);
        metrics::counter!("roster.added").increment(1);
        debug!(id = %id, "Customer added");
        id
    }

    pub fn update(&self, id: &str, patch: CustomerPatch) -> PersonaResult<CustomerRecord> {
        let mut customers = self.customers.write();
        let record = customers
            .iter_mut()
            .find(|c| c.id.as_deref() == Some(id))
            .ok_or_else(|| PersonaError::NotFound(id.to_string()))?;
        patch.apply(record);
        metrics::counter!("roster.updated").increment(1);
        debug!(id = %id, "Customer updated");
        Ok(record.clone())
    }

    pub fn remove(&self, id: &str) -> PersonaResult<CustomerRecord> {
        let mut customers = self.customers.write();
        let idx = customers
            .iter()
            .position(|c| c.id.as_deref() == Some(id))
            .ok_or_else(|| PersonaError::NotFound(id.to_string()))?;
        metrics::counter!("roster.removed").increment(1);
        debug!(id = %id, "Customer removed");
        Ok(customers.remove(idx))
    }

    /// Swap the whole list, e.g. when reloading sample data.
    pub fn replace_all(&self, customers: Vec<CustomerRecord>) {
        info!(customers = customers.len(), "Customer roster replaced");
        *self.customers.write() = customers;
    }

    pub fn get(&self, id: &str) -> Option<CustomerRecord> {
        self.customers
            .read()
            .iter()
            .find(|c| c.id.as_deref() == Some(id))
            .cloned()
    }

    /// Case-insensitive name search, in roster order.
    pub fn search(&self, query: &str) -> Vec<CustomerRecord> {
        let q = query.trim().to_lowercase();
        self.customers
            .read()
            .iter()
            .filter(|c| {
                c.name
                    .as_deref()
                    .unwrap_or_default()
                    .to_lowercase()
                    .contains(&q)
            })
            .cloned()
            .collect()
    }

    /// Point-in-time copy of the cohort.
    pub fn snapshot(&self) -> Vec<CustomerRecord> {
        self.customers.read().clone()
    }

    pub fn len(&self) -> usize {
        self.customers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.customers.read().is_empty()
    }
}

impl Default for CustomerRoster {
    fn default() -> Self {
        Self::new(&RosterConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_prepends_with_defaults() {
        let roster = CustomerRoster::default();
        let first = roster.add(CustomerPatch::default());
        let second = roster.add(CustomerPatch {
            name: Some("Mina".to_string()),
            visit_days: Some(9.0),
            ..Default::default()
        });

        let snapshot = roster.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].id.as_deref(), Some(second.as_str()));
        assert_eq!(snapshot[1].id.as_deref(), Some(first.as_str()));
        assert_eq!(snapshot[0].name.as_deref(), Some("Mina"));
        assert_eq!(snapshot[0].visit_days, 9.0);
        assert_eq!(snapshot[1].name.as_deref(), Some("New"));
        assert_eq!(snapshot[1].age_group.as_deref(), Some("20s"));
        assert_eq!(snapshot[1].month.as_ref().map(|m| m.len()), Some(7));
        assert!(!snapshot[1].retained_90);
    }

    #[test]
    fn test_update_and_remove() {
        let roster = CustomerRoster::default();
        let id = roster.add(CustomerPatch::default());

        let updated = roster
            .update(
                &id,
                CustomerPatch {
                    retained_90: Some(true),
                    avg_duration_min: Some(-3.0),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(updated.retained_90);
        assert_eq!(updated.avg_duration_min, 0.0);

        let removed = roster.remove(&id).unwrap();
        assert_eq!(removed.id.as_deref(), Some(id.as_str()));
        assert!(roster.is_empty());
    }

    #[test]
    fn test_unknown_id_is_not_found() {
        let roster = CustomerRoster::default();
        assert!(matches!(
            roster.update("missing", CustomerPatch::default()),
            Err(PersonaError::NotFound(_))
        ));
        assert!(matches!(roster.remove("missing"), Err(PersonaError::NotFound(_))));
        assert!(roster.get("missing").is_none());
    }

    #[test]
    fn test_search_and_replace_all() {
        let roster = CustomerRoster::default();
        roster.replace_all(vec![
            CustomerRecord {
                name: Some("Jiwoo Park".to_string()),
                ..Default::default()
            },
            CustomerRecord {
                name: Some("Minji Kim".to_string()),
                ..Default::default()
            },
        ]);
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.search("PARK").len(), 1);
        assert_eq!(roster.search("").len(), 2);
    }
}

//! Group-by and time-bucket ordering for segment breakdowns.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use persona_core::CustomerRecord;

/// Bucket for absent or empty group values.
pub const UNKNOWN_KEY: &str = "UNKNOWN";

/// Group `cohort` by `key`. Members keep cohort order; `None` and empty
/// keys land under [`UNKNOWN_KEY`].
pub fn group_by<'a, F, S>(cohort: &'a [CustomerRecord], key: F) -> BTreeMap<String, Vec<&'a CustomerRecord>>
where
    F: Fn(&'a CustomerRecord) -> Option<S>,
    S: AsRef<str>,
{
    let mut groups: BTreeMap<String, Vec<&'a CustomerRecord>> = BTreeMap::new();
    for customer in cohort {
        let k = match key(customer) {
            Some(raw) if !raw.as_ref().is_empty() => raw.as_ref().to_string(),
            _ => UNKNOWN_KEY.to_string(),
        };
        groups.entry(k).or_default().push(customer);
    }
    groups
}

pub fn by_region(cohort: &[CustomerRecord]) -> BTreeMap<String, Vec<&CustomerRecord>> {
    group_by(cohort, |c| c.region.as_deref())
}

pub fn by_age_group(cohort: &[CustomerRecord]) -> BTreeMap<String, Vec<&CustomerRecord>> {
    group_by(cohort, |c| c.age_group.as_deref())
}

pub fn by_month(cohort: &[CustomerRecord]) -> BTreeMap<String, Vec<&CustomerRecord>> {
    group_by(cohort, |c| c.month.as_deref())
}

/// Compare two time-bucket keys: `YYYY-MM` pairs lexicographically, then
/// numeric pairs numerically, then everything else lexicographically.
pub fn compare_time_buckets(a: &str, b: &str) -> Ordering {
    if is_year_month(a) && is_year_month(b) {
        return a.cmp(b);
    }
    if let (Some(na), Some(nb)) = (numeric_key(a), numeric_key(b)) {
        return na.total_cmp(&nb);
    }
    a.cmp(b)
}

/// Sort keys with [`compare_time_buckets`].
///
/// The comparator is not transitive across mixed key shapes, so this uses a
/// stable insertion sort instead of `sort_by`, which may panic on
/// inconsistent orderings. Bucket counts are small.
pub fn sort_time_buckets(keys: &mut [String]) {
    for i in 1..keys.len() {
        let mut j = i;
        while j > 0 && compare_time_buckets(&keys[j - 1], &keys[j]) == Ordering::Greater {
            keys.swap(j - 1, j);
            j -= 1;
        }
    }
}

fn is_year_month(key: &str) -> bool {
    let bytes = key.as_bytes();
    bytes.len() == 7
        && bytes[4] == b'-'
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[5..].iter().all(u8::is_ascii_digit)
}

/// Numeric reading of a key. Blank keys read as zero.
fn numeric_key(key: &str) -> Option<f64> {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

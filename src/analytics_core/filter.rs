//! Predicate set applied to the canonical dataset

use super::normalizer::{parse_datetime, SaleRecord};
use chrono::{DateTime, Utc};

/// Sentinel request value that disables the region/product predicates
const ALL_SENTINEL: &str = "all";

/// Zero or more independent predicates over the canonical dataset.
///
/// Region and product match exactly; `"all"` (case-insensitive) disables the
/// predicate. Date bounds are inclusive; an unparsable bound is dropped at
/// construction time rather than surfaced as an error.
#[derive(Debug, Clone, Default)]
pub struct SaleFilter {
    pub region: Option<String>,
    pub product: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

impl SaleFilter {
    /// Build a filter from loosely-typed request parameters.
    pub fn from_params(
        region: Option<&str>,
        product: Option<&str>,
        date_from: Option<&str>,
        date_to: Option<&str>,
    ) -> Self {
        Self {
            region: normalize_exact_match(region),
            product: normalize_exact_match(product),
            date_from: parse_bound(date_from, "from"),
            date_to: parse_bound(date_to, "to"),
        }
    }

    pub fn matches(&self, record: &SaleRecord) -> bool {
        if let Some(ref region) = self.region {
            if record.region != *region {
                return false;
            }
        }
        if let Some(ref product) = self.product {
            if record.product != *product {
                return false;
            }
        }
        if let Some(from) = self.date_from {
            if record.date < from {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if record.date > to {
                return false;
            }
        }
        true
    }

    /// Filtered subsequence, preserving relative order.
    pub fn apply(&self, records: &[SaleRecord]) -> Vec<SaleRecord> {
        records
            .iter()
            .filter(|r| self.matches(r))
            .cloned()
            .collect()
    }
}

fn normalize_exact_match(value: Option<&str>) -> Option<String> {
    match value {
        Some(v) if !v.is_empty() && !v.eq_ignore_ascii_case(ALL_SENTINEL) => Some(v.to_string()),
        _ => None,
    }
}

fn parse_bound(value: Option<&str>, which: &str) -> Option<DateTime<Utc>> {
    let raw = value.filter(|v| !v.is_empty())?;
    let parsed = parse_datetime(raw);
    if parsed.is_none() {
        // Permissive policy: a bad bound disables that one predicate
        log::debug!("Ignoring unparsable '{}' date bound: {}", which, raw);
    }
    parsed
}

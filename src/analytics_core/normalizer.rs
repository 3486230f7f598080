//! Record normalization from loosely-typed raw sales events to the canonical dataset

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Numeric date values above this are treated as epoch seconds
const EPOCH_SECONDS_FLOOR: f64 = 1_000_000_000.0;

/// One canonical sales event. Every field is present after normalization;
/// no nulls survive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub sale_id: String,
    pub date: DateTime<Utc>,
    pub region: String,
    pub product: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub total_price: f64,
}

impl SaleRecord {
    /// Calendar day of the sale (UTC)
    pub fn day(&self) -> NaiveDate {
        self.date.date_naive()
    }
}

/// Canonical dataset: records strictly sorted ascending by date (stable for
/// ties), plus a counter of dates that had to be substituted with the
/// current time because they were unparsable.
#[derive(Debug, Clone, Default)]
pub struct SalesDataset {
    pub records: Vec<SaleRecord>,
    pub date_fallbacks: usize,
}

impl SalesDataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sorted distinct region names across the whole dataset
    pub fn regions(&self) -> Vec<String> {
        let mut regions: Vec<String> = self.records.iter().map(|r| r.region.clone()).collect();
        regions.sort();
        regions.dedup();
        regions
    }

    /// Sorted distinct product names across the whole dataset
    pub fn products(&self) -> Vec<String> {
        let mut products: Vec<String> = self.records.iter().map(|r| r.product.clone()).collect();
        products.sort();
        products.dedup();
        products
    }
}

/// Normalize raw heterogeneous records into the canonical dataset.
///
/// Field resolution, in order of precedence:
/// - `sale_id`: key `sale_id`, else `id`, else `"unknown"` (cast to string)
/// - `date`: numeric values above 1e9 are epoch seconds; otherwise a
///   flexible calendar parse; otherwise `now()` (counted in `date_fallbacks`)
/// - `region`: key `region`, else the upstream-misspelled `reigon`, else `"Unknown"`
/// - `product`: key `product`, else `"Unknown"`
/// - `quantity` / `unit_price` / `total_price`: numeric-coerced, 0 on failure;
///   quantity truncated to a non-negative integer
///
/// Output is sorted ascending by date, stable for ties.
pub fn normalize_records<F>(raw: &[Value], now: F) -> SalesDataset
where
    F: Fn() -> DateTime<Utc>,
{
    let mut date_fallbacks = 0usize;

    let mut records: Vec<SaleRecord> = raw
        .iter()
        .map(|value| {
            let sale_id = value
                .get("sale_id")
                .or_else(|| value.get("id"))
                .map(value_to_string)
                .unwrap_or_else(|| "unknown".to_string());

            let date = match resolve_date(value.get("date")) {
                Some(date) => date,
                None => {
                    date_fallbacks += 1;
                    log::warn!(
                        "Unparsable date in record {}: substituting current time",
                        sale_id
                    );
                    now()
                }
            };

            let region = value
                .get("region")
                .or_else(|| value.get("reigon"))
                .map(value_to_string)
                .unwrap_or_else(|| "Unknown".to_string());

            let product = value
                .get("product")
                .map(value_to_string)
                .unwrap_or_else(|| "Unknown".to_string());

            let quantity = coerce_f64(value.get("quantity")).trunc() as i64;

            SaleRecord {
                sale_id,
                date,
                region,
                product,
                quantity: quantity.max(0),
                unit_price: coerce_f64(value.get("unit_price")),
                total_price: coerce_f64(value.get("total_price")),
            }
        })
        .collect();

    // Stable, so same-date records keep their arrival order
    records.sort_by_key(|r| r.date);

    SalesDataset {
        records,
        date_fallbacks,
    }
}

fn resolve_date(value: Option<&Value>) -> Option<DateTime<Utc>> {
    let value = value?;

    if let Some(number) = value.as_f64() {
        if number > EPOCH_SECONDS_FLOOR {
            return DateTime::from_timestamp(number.trunc() as i64, 0);
        }
        return None;
    }

    value.as_str().and_then(parse_datetime)
}

/// Flexible calendar parse for the ISO-ish date strings upstream systems emit.
pub(crate) fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.and_utc());
        }
    }

    for format in ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }

    None
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Numeric coercion: numbers pass through, numeric strings parse,
/// everything else (including missing) collapses to 0.
fn coerce_f64(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixed_now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_800_000_000, 0).unwrap()
    }

    #[test]
    fn test_field_drift_resolution() {
        // Misspelled region key, stringly-typed numerics, numeric id
        let raw = vec![json!({
            "id": 1,
            "date": 1_700_000_000,
            "reigon": "East",
            "product": "A",
            "quantity": "5",
            "unit_price": "10",
            "total_price": "50"
        })];

        let dataset = normalize_records(&raw, fixed_now);
        let record = &dataset.records[0];

        assert_eq!(record.sale_id, "1");
        assert_eq!(record.date, DateTime::from_timestamp(1_700_000_000, 0).unwrap());
        assert_eq!(record.region, "East");
        assert_eq!(record.product, "A");
        assert_eq!(record.quantity, 5);
        assert_eq!(record.unit_price, 10.0);
        assert_eq!(record.total_price, 50.0);
        assert_eq!(dataset.date_fallbacks, 0);
    }

    #[test]
    fn test_missing_fields_get_defaults() {
        let raw = vec![json!({ "date": "2024-03-01" })];

        let dataset = normalize_records(&raw, fixed_now);
        let record = &dataset.records[0];

        assert_eq!(record.sale_id, "unknown");
        assert_eq!(record.region, "Unknown");
        assert_eq!(record.product, "Unknown");
        assert_eq!(record.quantity, 0);
        assert_eq!(record.unit_price, 0.0);
        assert_eq!(record.total_price, 0.0);
    }

    #[test]
    fn test_unparsable_date_falls_back_to_now() {
        let raw = vec![
            json!({ "sale_id": "a", "date": "not-a-date" }),
            json!({ "sale_id": "b", "date": "2024-01-02" }),
            json!({ "sale_id": "c" }),
        ];

        let dataset = normalize_records(&raw, fixed_now);

        assert_eq!(dataset.date_fallbacks, 2);
        let fallback = dataset
            .records
            .iter()
            .find(|r| r.sale_id == "a")
            .unwrap();
        assert_eq!(fallback.date, fixed_now());
    }

    #[test]
    fn test_small_numeric_date_is_not_epoch() {
        let raw = vec![json!({ "sale_id": "a", "date": 12345 })];

        let dataset = normalize_records(&raw, fixed_now);
        assert_eq!(dataset.date_fallbacks, 1);
        assert_eq!(dataset.records[0].date, fixed_now());
    }

    #[test]
    fn test_output_sorted_by_date_stable() {
        let raw = vec![
            json!({ "sale_id": "late", "date": "2024-02-01" }),
            json!({ "sale_id": "first", "date": "2024-01-01" }),
            json!({ "sale_id": "second", "date": "2024-01-01" }),
        ];

        let dataset = normalize_records(&raw, fixed_now);
        let ids: Vec<&str> = dataset.records.iter().map(|r| r.sale_id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "late"]);
    }

    #[test]
    fn test_negative_quantity_clamped() {
        let raw = vec![json!({ "date": "2024-01-01", "quantity": -3.9 })];

        let dataset = normalize_records(&raw, fixed_now);
        assert_eq!(dataset.records[0].quantity, 0);
    }

    #[test]
    fn test_quantity_truncated_not_rounded() {
        let raw = vec![json!({ "date": "2024-01-01", "quantity": 5.9 })];

        let dataset = normalize_records(&raw, fixed_now);
        assert_eq!(dataset.records[0].quantity, 5);
    }

    #[test]
    fn test_parse_datetime_formats() {
        for input in [
            "2024-03-05",
            "2024/03/05",
            "03/05/2024",
            "2024-03-05T00:00:00",
            "2024-03-05 00:00:00",
            "2024-03-05T00:00:00Z",
        ] {
            let parsed = parse_datetime(input).unwrap();
            assert_eq!(parsed.date_naive(), NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        }

        assert!(parse_datetime("yesterday-ish").is_none());
    }

    #[test]
    fn test_metadata_sorted_distinct() {
        let raw = vec![
            json!({ "date": "2024-01-01", "region": "West", "product": "B" }),
            json!({ "date": "2024-01-02", "region": "East", "product": "A" }),
            json!({ "date": "2024-01-03", "region": "West", "product": "A" }),
        ];

        let dataset = normalize_records(&raw, fixed_now);
        assert_eq!(dataset.regions(), vec!["East", "West"]);
        assert_eq!(dataset.products(), vec!["A", "B"]);
    }
}

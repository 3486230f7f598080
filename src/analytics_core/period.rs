//! Trailing-30-day period-over-period revenue comparison

use super::normalizer::SaleRecord;
use chrono::{Duration, NaiveDate};
use std::collections::BTreeSet;

/// Window width in days, inclusive on both ends
const WINDOW_DAYS: i64 = 30;
/// Substituted for an exactly-zero previous-window sum before dividing
const PREV_EPSILON: f64 = 1e-6;

/// Percentage change of the trailing 30-day revenue window against the 30
/// days before it, anchored at the latest day present in the filtered set.
///
/// Windows are compared at day granularity. Fewer than 2 distinct days
/// yields 0 with no computation.
pub fn period_over_period_pct(records: &[SaleRecord]) -> f64 {
    let days: BTreeSet<NaiveDate> = records.iter().map(|r| r.day()).collect();
    if days.len() < 2 {
        return 0.0;
    }

    // Non-empty set, so the max exists
    let last_day = match days.iter().next_back() {
        Some(&day) => day,
        None => return 0.0,
    };

    let current_start = last_day - Duration::days(WINDOW_DAYS - 1);
    let previous_end = current_start - Duration::days(1);
    let previous_start = previous_end - Duration::days(WINDOW_DAYS - 1);

    let current_sum = window_revenue(records, current_start, last_day);
    let mut previous_sum = window_revenue(records, previous_start, previous_end);
    if previous_sum == 0.0 {
        previous_sum = PREV_EPSILON;
    }

    (current_sum - previous_sum) / previous_sum * 100.0
}

fn window_revenue(records: &[SaleRecord], start: NaiveDate, end: NaiveDate) -> f64 {
    records
        .iter()
        .filter(|r| {
            let day = r.day();
            day >= start && day <= end
        })
        .map(|r| r.total_price)
        .sum()
}

//! Four-estimator revenue forecasting over the daily timeseries

use super::aggregator::TimeSeriesPoint;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Trailing moving-average window
const MA_WINDOW: usize = 3;
/// Exponential smoothing factor
const SMOOTHING_ALPHA: f64 = 0.3;
/// Weekly seasonality period
const SEASONAL_PERIOD: usize = 7;
/// Minimum history length for any forecasting
const MIN_HISTORY: usize = 3;

/// Parallel forecast series sharing one date axis of length n + horizon.
///
/// `values` is the raw history continued by the linear-trend forecast; `ma`
/// covers history only and pads its forecast region with nulls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
    pub ma: Vec<Option<f64>>,
    pub exponential_smooth: Vec<f64>,
    pub seasonal: Vec<f64>,
}

/// Build all four forecast series from the daily timeseries.
///
/// Requires at least 3 historical points; otherwise every series is empty.
/// The horizon extends the date axis with consecutive calendar days after
/// the last historical day.
pub fn build_forecast(points: &[TimeSeriesPoint], horizon: usize) -> ForecastResult {
    if points.len() < MIN_HISTORY {
        return ForecastResult::default();
    }

    let n = points.len();
    let values: Vec<f64> = points.iter().map(|p| p.revenue).collect();
    let last_date = points[n - 1].date;

    let mut dates: Vec<NaiveDate> = points.iter().map(|p| p.date).collect();
    for i in 0..horizon {
        dates.push(last_date + Duration::days(i as i64 + 1));
    }

    // Moving average is causal only: no extrapolation into the forecast region
    let mut ma: Vec<Option<f64>> = moving_average(&values, MA_WINDOW)
        .into_iter()
        .map(Some)
        .collect();
    ma.extend(std::iter::repeat(None).take(horizon));

    let mut exponential_smooth = exponential_smoothing(&values, SMOOTHING_ALPHA);
    // alpha*s + (1-alpha)*s == s, so the forecast is flat at the last
    // smoothed value for every step
    let last_smoothed = exponential_smooth[n - 1];
    exponential_smooth.extend(std::iter::repeat(last_smoothed).take(horizon));

    let (slope, intercept) = linear_trend(&values);
    let mut combined = values.clone();
    for i in 0..horizon {
        combined.push(slope * (n + i) as f64 + intercept);
    }

    let mut seasonal = seasonal_history(&values);
    seasonal.extend(seasonal_forecast(&values, horizon));

    ForecastResult {
        dates,
        values: combined,
        ma,
        exponential_smooth,
        seasonal,
    }
}

/// Trailing moving average with a minimum of one period at the series start.
fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    values
        .iter()
        .enumerate()
        .map(|(i, _)| {
            let start = i.saturating_sub(window - 1);
            let slice = &values[start..=i];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}

/// s[0] = v[0]; s[i] = alpha * v[i] + (1 - alpha) * s[i-1]
fn exponential_smoothing(values: &[f64], alpha: f64) -> Vec<f64> {
    let mut smoothed = Vec::with_capacity(values.len());
    for (i, &value) in values.iter().enumerate() {
        if i == 0 {
            smoothed.push(value);
        } else {
            smoothed.push(alpha * value + (1.0 - alpha) * smoothed[i - 1]);
        }
    }
    smoothed
}

/// Ordinary least-squares fit of value against position index.
/// Returns (slope, intercept).
fn linear_trend(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let sum_x: f64 = (0..values.len()).map(|i| i as f64).sum();
    let sum_y: f64 = values.iter().sum();
    let sum_xy: f64 = values.iter().enumerate().map(|(i, &y)| i as f64 * y).sum();
    let sum_xx: f64 = (0..values.len()).map(|i| (i as f64).powi(2)).sum();

    let denominator = n * sum_xx - sum_x * sum_x;
    if denominator == 0.0 {
        return (0.0, sum_y / n);
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denominator;
    let intercept = (sum_y - slope * sum_x) / n;
    (slope, intercept)
}

/// Mean value per position-modulo-7 bucket across history.
/// Empty when history is shorter than one full period.
fn seasonal_buckets(values: &[f64]) -> Vec<f64> {
    if values.len() < SEASONAL_PERIOD {
        return Vec::new();
    }

    (0..SEASONAL_PERIOD)
        .map(|offset| {
            let bucket: Vec<f64> = values
                .iter()
                .skip(offset)
                .step_by(SEASONAL_PERIOD)
                .copied()
                .collect();
            bucket.iter().sum::<f64>() / bucket.len() as f64
        })
        .collect()
}

fn seasonal_history(values: &[f64]) -> Vec<f64> {
    let buckets = seasonal_buckets(values);
    if buckets.is_empty() {
        return vec![0.0; values.len()];
    }
    (0..values.len())
        .map(|i| buckets[i % SEASONAL_PERIOD])
        .collect()
}

fn seasonal_forecast(values: &[f64], horizon: usize) -> Vec<f64> {
    let buckets = seasonal_buckets(values);
    if buckets.is_empty() {
        return vec![0.0; horizon];
    }
    (0..horizon)
        .map(|i| buckets[(values.len() + i) % SEASONAL_PERIOD])
        .collect()
}

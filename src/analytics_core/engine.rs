//! Analytics engine - per-request orchestration of the pipeline stages
//!
//! One request flows Normalizer → Filter, then fans out read-only to the
//! Aggregator, Forecaster (over the aggregated timeseries), Clusterer, and
//! PeriodComparator; their results are merged into one response object.
//! Nothing outlives the call: every request normalizes fresh data, so
//! concurrent requests are isolated by construction.

use super::aggregator::{
    compute_kpis, daily_timeseries, product_totals, region_distribution,
    top_products_by_quantity, top_products_by_revenue, Kpis, ProductQuantity, ProductRevenue,
    RegionRevenue, TimeSeriesPoint,
};
use super::clusterer::{cluster_products, ClusterOutcome, ClusterStats, ProductCluster};
use super::filter::SaleFilter;
use super::forecaster::{build_forecast, ForecastResult};
use super::normalizer::{normalize_records, SalesDataset};
use super::period::period_over_period_pct;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Cluster count when the request omits or mangles `k`
const DEFAULT_CLUSTERS: usize = 3;
/// Forecast horizon when the request omits or mangles `forecast_days`
const DEFAULT_HORIZON: usize = 7;

/// Loosely-typed request parameters as the presentation layer hands them over.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestParams {
    pub region: Option<String>,
    pub product: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub k: Option<String>,
    pub forecast_days: Option<String>,
}

/// Parsed, validated, defaulted request configuration. All defaulting and
/// permissive-parse rules are applied here, exactly once.
#[derive(Debug, Clone)]
pub struct AnalyticsParams {
    pub filter: SaleFilter,
    pub clusters: usize,
    pub horizon: usize,
}

impl AnalyticsParams {
    pub fn from_request(request: &RequestParams) -> Self {
        Self {
            filter: SaleFilter::from_params(
                request.region.as_deref(),
                request.product.as_deref(),
                request.from.as_deref(),
                request.to.as_deref(),
            ),
            clusters: parse_or_default(request.k.as_deref(), DEFAULT_CLUSTERS),
            horizon: parse_or_default(request.forecast_days.as_deref(), DEFAULT_HORIZON),
        }
    }
}

fn parse_or_default(value: Option<&str>, default: usize) -> usize {
    value.and_then(|s| s.trim().parse().ok()).unwrap_or(default)
}

/// Sorted distinct regions and products from the unfiltered canonical dataset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub regions: Vec<String>,
    pub products: Vec<String>,
}

/// The merged analytics result for one request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyticsResponse {
    pub kpis: Kpis,
    pub timeseries: Vec<TimeSeriesPoint>,
    pub region_distribution: Vec<RegionRevenue>,
    pub top_products_qty: Vec<ProductQuantity>,
    pub top_products_revenue: Vec<ProductRevenue>,
    pub forecast: ForecastResult,
    pub clusters: Vec<ProductCluster>,
    pub cluster_centers: Vec<Vec<f64>>,
    pub cluster_stats: BTreeMap<String, ClusterStats>,
    pub period_over_period_pct: f64,
    pub metadata: DatasetMetadata,
}

/// Stateless per-call pipeline. The only injected collaborator besides the
/// DataSource is the current-time provider used for the normalizer's
/// unparsable-date fallback.
pub struct AnalyticsEngine {
    now_fn: Box<dyn Fn() -> DateTime<Utc> + Send + Sync>,
}

impl AnalyticsEngine {
    /// Engine with the system clock
    pub fn new() -> Self {
        Self::with_now_fn(Box::new(Utc::now))
    }

    /// Engine with a custom time provider (deterministic tests)
    pub fn with_now_fn(now_fn: Box<dyn Fn() -> DateTime<Utc> + Send + Sync>) -> Self {
        Self { now_fn }
    }

    /// Normalize raw records into the canonical, time-sorted dataset.
    pub fn normalize(&self, raw: &[Value]) -> SalesDataset {
        let dataset = normalize_records(raw, &self.now_fn);
        if dataset.date_fallbacks > 0 {
            log::warn!(
                "{} of {} records needed the current-time date fallback",
                dataset.date_fallbacks,
                dataset.len()
            );
        }
        dataset
    }

    /// Run the analytics stages over an already-normalized dataset.
    pub fn analyze(&self, dataset: &SalesDataset, params: &AnalyticsParams) -> AnalyticsResponse {
        let metadata = DatasetMetadata {
            regions: dataset.regions(),
            products: dataset.products(),
        };

        let filtered = params.filter.apply(&dataset.records);
        log::debug!(
            "Filter kept {} of {} records",
            filtered.len(),
            dataset.len()
        );

        let totals = product_totals(&filtered);
        let timeseries = daily_timeseries(&filtered);
        let forecast = build_forecast(&timeseries, params.horizon);
        let ClusterOutcome {
            clusters,
            cluster_centers,
            cluster_stats,
        } = cluster_products(&filtered, params.clusters);

        AnalyticsResponse {
            kpis: compute_kpis(&filtered),
            region_distribution: region_distribution(&filtered),
            top_products_qty: top_products_by_quantity(&totals),
            top_products_revenue: top_products_by_revenue(&totals),
            timeseries,
            forecast,
            clusters,
            cluster_centers,
            cluster_stats,
            period_over_period_pct: period_over_period_pct(&filtered),
            metadata,
        }
    }

    /// Full pipeline: raw records + loose request parameters → response.
    pub fn run(&self, raw: &[Value], request: &RequestParams) -> AnalyticsResponse {
        let dataset = self.normalize(raw);
        let params = AnalyticsParams::from_request(request);
        self.analyze(&dataset, &params)
    }
}

impl Default for AnalyticsEngine {
    fn default() -> Self {
        Self::new()
    }
}

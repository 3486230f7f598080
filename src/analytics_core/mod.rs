//! Analytics Core - Sales Decision-Support Pipeline
//!
//! This module turns raw, schema-inconsistent sales event records into the
//! analytics a dashboard consumes: filtered KPIs, multi-method revenue
//! forecasts, product clusters, and period-over-period comparisons.
//!
//! # Architecture
//!
//! ```text
//! DataSource (raw JSON records) → Normalizer (canonical, time-sorted)
//!     ↓
//! SaleFilter (region / product / date-bound predicates)
//!     ↓
//! Aggregator (KPIs, daily timeseries, region distribution, top-5s)
//!     ↓                          ↘
//! Forecaster (4 estimators        Clusterer (scaled k-means)
//!   over the daily timeseries)    PeriodComparator (trailing 30d)
//!     ↓
//! AnalyticsEngine → AnalyticsResponse
//! ```

pub mod aggregator;
pub mod clusterer;
pub mod engine;
pub mod filter;
pub mod forecaster;
pub mod normalizer;
pub mod period;

pub use aggregator::{
    compute_kpis, daily_timeseries, product_totals, region_distribution,
    top_products_by_quantity, top_products_by_revenue, Kpis, ProductQuantity, ProductRevenue,
    ProductTotals, RegionRevenue, TimeSeriesPoint,
};
pub use clusterer::{cluster_products, ClusterOutcome, ClusterStats, ProductCluster, StandardScaler};
pub use engine::{
    AnalyticsEngine, AnalyticsParams, AnalyticsResponse, DatasetMetadata, RequestParams,
};
pub use filter::SaleFilter;
pub use forecaster::{build_forecast, ForecastResult};
pub use normalizer::{normalize_records, SaleRecord, SalesDataset};
pub use period::period_over_period_pct;

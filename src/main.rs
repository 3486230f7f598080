
pub mod analytics_core;
pub mod config;
pub mod datasource;
pub mod export;

pub use analytics_core::{AnalyticsEngine, AnalyticsResponse, RequestParams};
pub use config::{ConfigError, RuntimeConfig};
pub use datasource::{FetchError, RemoteSalesSource, SalesDataSource, StaticSalesSource};

//! Analytics Binary - One-Shot Sales Analytics Pipeline
//!
//! Fetches the raw sales batch from the configured remote source, runs the
//! full analytics pipeline, and prints the response as JSON on stdout.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin analytics -- --region East --forecast-days 14
//! ```
//!
//! ## Environment Variables
//!
//! - SALES_API_URL - Remote sales records endpoint (required)
//! - FETCH_TIMEOUT_SECS - Fetch timeout in seconds (default: 10)
//! - RUST_LOG - Logging level (optional, default: info)
//!
//! ## Flags
//!
//! - --region / --product - Exact-match filters ("all" disables)
//! - --from / --to - Inclusive date bounds (unparsable bounds are ignored)
//! - --k - Requested cluster count (default: 3)
//! - --forecast-days - Forecast horizon (default: 7)
//! - --ids - Comma-separated sale ids for the CSV export
//! - --export - Path to write the selected records as CSV

use salesflow::analytics_core::{AnalyticsEngine, AnalyticsParams, RequestParams};
use salesflow::datasource::{RemoteSalesSource, SalesDataSource};
use salesflow::export::{select_records, write_csv, ExportSelection};
use salesflow::RuntimeConfig;
use std::env;
use std::path::Path;

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    dotenv::dotenv().ok();

    let config = RuntimeConfig::from_env()?;
    let args: Vec<String> = env::args().collect();

    let request = RequestParams {
        region: flag_value(&args, "--region"),
        product: flag_value(&args, "--product"),
        from: flag_value(&args, "--from"),
        to: flag_value(&args, "--to"),
        k: flag_value(&args, "--k"),
        forecast_days: flag_value(&args, "--forecast-days"),
    };
    let ids = flag_value(&args, "--ids");
    let export_path = flag_value(&args, "--export");

    log::info!("🚀 Starting sales analytics run");
    log::info!("   Source: {}", config.sales_api_url);
    log::info!("   Fetch timeout: {}s", config.fetch_timeout_secs);

    let source = RemoteSalesSource::new(&config.sales_api_url, config.fetch_timeout_secs)?;

    // A fetch failure is fatal for the run; no retries
    let raw = source.fetch().await?;

    let engine = AnalyticsEngine::new();
    let dataset = engine.normalize(&raw);
    let params = AnalyticsParams::from_request(&request);
    let response = engine.analyze(&dataset, &params);

    println!("{}", serde_json::to_string_pretty(&response)?);

    if let Some(path) = export_path {
        let selection = ExportSelection::from_params(ids.as_deref(), params.filter.clone());
        let selected = select_records(&dataset.records, &selection);
        write_csv(Path::new(&path), &selected)?;
    }

    log::info!("✅ Analytics run complete ({} records)", dataset.len());
    Ok(())
}

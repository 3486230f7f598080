//! Remote sales data source - fetches the raw record batch for one request
//!
//! Any non-success (timeout, network failure, non-success status, malformed
//! payload) is fatal for the current request; the core performs no retries.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug)]
pub enum FetchError {
    /// Transport-level failure: DNS, connect, TLS, timeout
    Http(reqwest::Error),
    /// Upstream answered with a non-success status
    Status(reqwest::StatusCode),
    /// Body was not the expected JSON array of records
    Payload(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Http(e) => write!(f, "HTTP error: {}", e),
            FetchError::Status(status) => write!(f, "Upstream returned status {}", status),
            FetchError::Payload(msg) => write!(f, "Malformed payload: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Http(err)
    }
}

/// Source of raw sales records. The analytics core only sees the fetched
/// batch; where it comes from is the collaborator's business.
#[async_trait]
pub trait SalesDataSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Value>, FetchError>;
}

/// HTTP JSON source with a bounded request timeout.
pub struct RemoteSalesSource {
    client: reqwest::Client,
    url: String,
}

impl RemoteSalesSource {
    pub fn new(url: &str, timeout_secs: u64) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl SalesDataSource for RemoteSalesSource {
    async fn fetch(&self) -> Result<Vec<Value>, FetchError> {
        log::debug!("Fetching sales records from {}", self.url);

        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let payload: Value = response.json().await?;
        match payload {
            Value::Array(records) => {
                log::info!("Fetched {} raw sales records", records.len());
                Ok(records)
            }
            other => Err(FetchError::Payload(format!(
                "expected a JSON array of records, got {}",
                json_type_name(&other)
            ))),
        }
    }
}

/// Fixed in-memory batch, for tests and demos.
pub struct StaticSalesSource {
    records: Vec<Value>,
}

impl StaticSalesSource {
    pub fn new(records: Vec<Value>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl SalesDataSource for StaticSalesSource {
    async fn fetch(&self) -> Result<Vec<Value>, FetchError> {
        Ok(self.records.clone())
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

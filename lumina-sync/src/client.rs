//! Chain endpoint client
//!
//! The engine talks to a single configured endpoint through the
//! `ChainClient` trait; the HTTP implementation keeps every call behind a
//! bounded timeout so a dead endpoint surfaces as a network error instead
//! of a hang.

use crate::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Default connect timeout
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Default per-request timeout
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// One block as reported by the endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockSummary {
    /// Block height
    pub height: u64,
    /// Block hash, hex
    pub hash: String,
    /// Number of transactions in the block
    #[serde(default)]
    pub tx_count: u32,
}

#[derive(Debug, Deserialize)]
struct HeightResponse {
    height: u64,
}

/// Access to the configured network endpoint.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Probe the endpoint for reachability.
    async fn connect(&self) -> Result<()>;

    /// Latest block height known to the endpoint.
    async fn latest_height(&self) -> Result<u64>;

    /// Fetch block summaries for the inclusive height range.
    async fn fetch_blocks(&self, start: u64, end: u64) -> Result<Vec<BlockSummary>>;
}

/// HTTP JSON client for a LuminaChain node endpoint.
pub struct HttpChainClient {
    endpoint: String,
    http: reqwest::Client,
}

impl HttpChainClient {
    /// Create a client for the given endpoint URL.
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    /// The endpoint this client talks to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChainClient for HttpChainClient {
    async fn connect(&self) -> Result<()> {
        let url = format!("{}/status", self.endpoint);
        self.http.get(&url).send().await?.error_for_status()?;
        info!("Connected to network: {}", self.endpoint);
        Ok(())
    }

    async fn latest_height(&self) -> Result<u64> {
        let url = format!("{}/chain/height", self.endpoint);
        let response: HeightResponse = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        info!("Latest block height: {}", response.height);
        Ok(response.height)
    }

    async fn fetch_blocks(&self, start: u64, end: u64) -> Result<Vec<BlockSummary>> {
        if start > end {
            return Err(Error::Network(format!(
                "Invalid block range: {start}..{end}"
            )));
        }
        let url = format!(
            "{}/chain/blocks?start={start}&end={end}",
            self.endpoint
        );
        let blocks: Vec<BlockSummary> = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        debug!("Fetched {} blocks for range {start}..{end}", blocks.len());
        Ok(blocks)
    }
}

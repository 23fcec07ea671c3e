//! Sync engine
//!
//! Drives the NotSynced -> Syncing -> Synced state machine for one wallet:
//! connect to the endpoint, fetch the latest height, process heights in
//! fixed-size batches, and report progress after every batch. Cancellation
//! is cooperative and observed only at batch boundaries.

use crate::client::{BlockSummary, ChainClient, HttpChainClient};
use crate::state::{SyncSnapshot, SyncState, SyncStatus};
use crate::{CancelToken, Error, Result};
use async_trait::async_trait;
use lumina_core::{AppContext, Synchronizer};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Progress callback invoked after each processed batch.
pub type ProgressCallback = Box<dyn Fn(f32, &str) + Send + Sync>;

/// Number of attempts per batch fetch before the run fails
const MAX_RETRY_ATTEMPTS: u32 = 3;
/// Delay between batch fetch retries
const RETRY_BACKOFF: Duration = Duration::from_millis(100);

/// Sync configuration
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Heights processed per batch
    pub batch_size: u64,
    /// Attempts per batch fetch
    pub retry_attempts: u32,
    /// Delay between retries
    pub retry_backoff: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            retry_attempts: MAX_RETRY_ATTEMPTS,
            retry_backoff: RETRY_BACKOFF,
        }
    }
}

/// Sync engine for one wallet address.
pub struct SyncEngine {
    wallet_address: String,
    endpoint: RwLock<String>,
    client: RwLock<Arc<dyn ChainClient>>,
    state: SyncState,
    cancel: CancelToken,
    is_syncing: AtomicBool,
    config: SyncConfig,
}

#[allow(dead_code)]
fn _assert_sync_engine_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<SyncEngine>();
}

impl SyncEngine {
    /// Create an engine for the endpoint configured in the context.
    pub fn new(ctx: &AppContext, wallet_address: impl Into<String>) -> Result<Self> {
        Self::with_config(ctx, wallet_address, SyncConfig::default())
    }

    /// Create an engine with explicit configuration.
    pub fn with_config(
        ctx: &AppContext,
        wallet_address: impl Into<String>,
        config: SyncConfig,
    ) -> Result<Self> {
        let endpoint = ctx.network_endpoint();
        let client: Arc<dyn ChainClient> = Arc::new(HttpChainClient::new(&endpoint)?);
        Ok(Self::with_client(endpoint, wallet_address, config, client))
    }

    /// Create an engine over a caller-supplied transport.
    pub fn with_client(
        endpoint: impl Into<String>,
        wallet_address: impl Into<String>,
        config: SyncConfig,
        client: Arc<dyn ChainClient>,
    ) -> Self {
        let wallet_address = wallet_address.into();
        info!("Network synchronizer initialized for wallet: {wallet_address}");
        Self {
            wallet_address,
            endpoint: RwLock::new(endpoint.into()),
            client: RwLock::new(client),
            state: SyncState::new(),
            cancel: CancelToken::new(),
            is_syncing: AtomicBool::new(false),
            config,
        }
    }

    /// Start a synchronization run.
    ///
    /// Fails with `AlreadySyncing` (touching no state) if a run is active.
    /// Otherwise runs to completion, invoking the callback synchronously
    /// after each batch, and returns `Cancelled` if `stop_sync` interrupted
    /// it between batches.
    pub async fn start_sync(&self, callback: Option<ProgressCallback>) -> Result<()> {
        if self
            .is_syncing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Synchronization is already in progress");
            return Err(Error::AlreadySyncing);
        }

        self.cancel.reset();
        let result = self.run(callback.as_ref()).await;
        if result.is_err() {
            self.state.interrupt();
        }
        self.is_syncing.store(false, Ordering::Release);
        result
    }

    /// Run a sync on a background task.
    pub fn spawn_sync(
        self: Arc<Self>,
        callback: Option<ProgressCallback>,
    ) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.start_sync(callback).await })
    }

    /// Request cancellation of the active run.
    ///
    /// The run observes the request at the next batch boundary; if its
    /// final batch already completed the state stays Synced.
    pub fn stop_sync(&self) -> Result<()> {
        if !self.is_syncing.load(Ordering::Acquire) {
            warn!("Synchronization is not in progress");
            return Err(Error::NotSyncing);
        }
        self.cancel.cancel();
        info!("Synchronization stop requested");
        Ok(())
    }

    /// Current synchronization status.
    pub fn status(&self) -> SyncStatus {
        self.state.status()
    }

    /// Progress of the last or current run, in [0.0, 1.0].
    pub fn progress(&self) -> f32 {
        self.state.progress()
    }

    /// Latest height reported by the network.
    pub fn latest_height(&self) -> u64 {
        self.state.latest_height()
    }

    /// Highest height processed for this wallet.
    pub fn current_height(&self) -> u64 {
        self.state.current_height()
    }

    /// Copy of the full sync state.
    pub fn snapshot(&self) -> SyncSnapshot {
        self.state.snapshot()
    }

    /// Whether a run is currently active.
    pub fn is_syncing(&self) -> bool {
        self.is_syncing.load(Ordering::Acquire)
    }

    /// The wallet address this engine synchronizes.
    pub fn wallet_address(&self) -> &str {
        &self.wallet_address
    }

    /// The configured endpoint.
    pub fn network_endpoint(&self) -> String {
        self.endpoint.read().clone()
    }

    /// Point future runs at a different endpoint.
    ///
    /// An in-progress run keeps the client it snapshotted at start.
    pub fn set_network_endpoint(&self, endpoint: &str) -> Result<()> {
        let client: Arc<dyn ChainClient> = Arc::new(HttpChainClient::new(endpoint)?);
        *self.endpoint.write() = endpoint.to_string();
        *self.client.write() = client;
        info!("Network endpoint set to: {endpoint}");
        Ok(())
    }

    /// Restore the processed height recorded for this wallet.
    ///
    /// Rejected while a run is active.
    pub fn restore_height(&self, height: u64) -> Result<()> {
        if self.is_syncing() {
            return Err(Error::AlreadySyncing);
        }
        self.state.restore_height(height);
        Ok(())
    }

    async fn run(&self, callback: Option<&ProgressCallback>) -> Result<()> {
        let client = Arc::clone(&*self.client.read());

        client.connect().await?;
        let latest = client.latest_height().await?;

        if latest == 0 {
            // Nothing to process; the wallet is already caught up
            self.state.complete();
            if let Some(cb) = callback {
                cb(1.0, "Already up to date");
            }
            info!("Synchronization completed");
            return Ok(());
        }

        self.state.begin(latest);
        info!(
            "Starting synchronization for {} up to height {latest}",
            self.wallet_address
        );

        let batch_size = self.config.batch_size.max(1);
        let mut current = self.state.current_height();
        while current < latest {
            if self.cancel.is_cancelled() {
                info!("Synchronization stopped at height {current}");
                return Err(Error::Cancelled);
            }

            let end = current.saturating_add(batch_size).min(latest);
            let blocks = self.fetch_batch(&client, current + 1, end).await?;
            self.process_batch(&blocks);

            current = end;
            self.state.advance(current);
            if let Some(cb) = callback {
                cb(self.state.progress(), &format!("Processed blocks up to {current}"));
            }
        }

        self.state.complete();
        info!("Synchronization completed");
        Ok(())
    }

    async fn fetch_batch(
        &self,
        client: &Arc<dyn ChainClient>,
        start: u64,
        end: u64,
    ) -> Result<Vec<BlockSummary>> {
        let mut attempt = 0;
        loop {
            match client.fetch_blocks(start, end).await {
                Ok(blocks) => return Ok(blocks),
                Err(e) => {
                    attempt += 1;
                    if attempt >= self.config.retry_attempts.max(1) || self.cancel.is_cancelled() {
                        return Err(Error::Network(format!(
                            "Failed to fetch blocks {start}..{end}: {e}"
                        )));
                    }
                    warn!("Batch fetch {start}..{end} failed (attempt {attempt}): {e}");
                    tokio::time::sleep(self.config.retry_backoff).await;
                }
            }
        }
    }

    fn process_batch(&self, blocks: &[BlockSummary]) {
        let transactions: u32 = blocks.iter().map(|b| b.tx_count).sum();
        debug!(
            "Processed batch of {} blocks ({transactions} transactions)",
            blocks.len()
        );
    }
}

#[async_trait]
impl Synchronizer for SyncEngine {
    async fn sync_to_tip(&self) -> lumina_core::Result<()> {
        self.start_sync(None).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.retry_attempts, 3);
    }

    #[test]
    fn test_engine_initial_state() {
        let ctx = AppContext::with_endpoint("http://localhost:9070");
        let engine = SyncEngine::new(&ctx, "LMTwallet").unwrap();

        assert_eq!(engine.status(), SyncStatus::NotSynced);
        assert_eq!(engine.progress(), 0.0);
        assert!(!engine.is_syncing());
        assert_eq!(engine.network_endpoint(), "http://localhost:9070");
        assert_eq!(engine.wallet_address(), "LMTwallet");
    }

    #[test]
    fn test_stop_without_run_fails() {
        let ctx = AppContext::with_endpoint("http://localhost:9070");
        let engine = SyncEngine::new(&ctx, "LMTwallet").unwrap();
        assert!(matches!(engine.stop_sync(), Err(Error::NotSyncing)));
    }

    #[test]
    fn test_endpoint_update() {
        let ctx = AppContext::with_endpoint("http://localhost:9070");
        let engine = SyncEngine::new(&ctx, "LMTwallet").unwrap();
        engine.set_network_endpoint("http://localhost:9071").unwrap();
        assert_eq!(engine.network_endpoint(), "http://localhost:9071");
    }
}

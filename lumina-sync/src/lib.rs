//! LuminaChain network synchronization
//!
//! Keeps a wallet's local chain state aligned with a configured network
//! endpoint: fetch the latest height, process blocks in batches, report
//! progress, and support cooperative cancellation between batches.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cancel;
pub mod client;
pub mod engine;
pub mod error;
pub mod state;

pub use cancel::CancelToken;
pub use client::{BlockSummary, ChainClient, HttpChainClient, CONNECT_TIMEOUT, REQUEST_TIMEOUT};
pub use engine::{ProgressCallback, SyncConfig, SyncEngine};
pub use error::{Error, Result};
pub use state::{SyncSnapshot, SyncState, SyncStatus};

//! Error types for sync operations

/// Result type
pub type Result<T> = std::result::Result<T, Error>;

/// Error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A synchronization run is already active
    #[error("Synchronization is already in progress")]
    AlreadySyncing,

    /// No synchronization run to stop
    #[error("Synchronization is not in progress")]
    NotSyncing,

    /// Network failure while connecting, fetching heights, or fetching blocks
    #[error("Network error: {0}")]
    Network(String),

    /// Transport-level failure from the HTTP client
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Run was cancelled between batches
    #[error("Cancelled")]
    Cancelled,

    /// Sync error
    #[error("Sync error: {0}")]
    Sync(String),
}

impl From<Error> for lumina_core::Error {
    fn from(e: Error) -> Self {
        lumina_core::Error::Sync(e.to_string())
    }
}

//! Error types for the wallet core
//!
//! Every failure a caller can recover from is an explicit variant here;
//! nothing in this crate panics on user input.

/// Result type
pub type Result<T> = std::result::Result<T, Error>;

/// Wallet core errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed input: bad seed phrase, zero amount, invalid address
    #[error("Validation error: {0}")]
    Validation(String),

    /// Wrong password for the encrypted seed
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Not enough balance to cover a transfer
    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),

    /// Wallet has already been created or recovered
    #[error("Wallet is already initialized")]
    AlreadyInitialized,

    /// Wallet must be created or recovered first
    #[error("Wallet is not initialized")]
    NotInitialized,

    /// Key derivation error
    #[error("Key derivation error: {0}")]
    KeyDerivation(String),

    /// Transaction signing error
    #[error("Transaction signing error: {0}")]
    TransactionSigning(String),

    /// Wallet file read/write/format failure
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Synchronization failure reported by the sync collaborator
    #[error("Sync error: {0}")]
    Sync(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Check if error is a user-facing error (vs internal error)
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::Validation(_)
                | Error::Authentication(_)
                | Error::InsufficientBalance(_)
                | Error::AlreadyInitialized
                | Error::NotInitialized
        )
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Error::Validation(_) => {
                "The input is invalid. Please check and try again.".to_string()
            }
            Error::Authentication(_) => {
                "The password is incorrect. Please try again.".to_string()
            }
            Error::InsufficientBalance(_) => {
                "You don't have enough funds for this transfer. Please check your balance.".to_string()
            }
            Error::AlreadyInitialized => {
                "A wallet already exists. Remove it before creating a new one.".to_string()
            }
            Error::NotInitialized => {
                "No wallet found. Create or recover a wallet first.".to_string()
            }
            _ => self.to_string(),
        }
    }
}

//! LuminaChain wallet core
//!
//! This crate implements the wallet engine: seed custody and encryption,
//! signing keys and addresses, the transaction ledger, and wallet state
//! with atomic transfers and file persistence.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod context;
pub mod error;
pub mod keys;
pub mod keyvault;
pub mod storage;
pub mod transaction;
pub mod wallet;

pub use context::{AppContext, DEFAULT_NETWORK_ENDPOINT};
pub use error::{Error, Result};
pub use keys::{derive_address, is_valid_address, SigningKey, ADDRESS_PREFIX};
pub use keyvault::{KeyVault, SeedPhrase, SEED_WORDS, SEED_WORD_COUNT};
pub use storage::{WalletData, WALLET_FILE_HEADER};
pub use transaction::{Transaction, TransactionLedger, TransactionStatus};
pub use wallet::{Synchronizer, Wallet, DONATION_ADDRESS, NATIVE_TOKEN};

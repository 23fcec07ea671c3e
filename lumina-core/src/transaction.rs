//! Transaction ledger
//!
//! Creates transactions with deterministic content-derived ids, signs and
//! verifies them, and enforces the Pending -> Confirmed/Failed status
//! machine. Terminal states are final.

use crate::keys::{self, SigningKey};
use crate::{Error, Result};
use blake2b_simd::Params as Blake2bParams;
use chrono::{TimeZone, Utc};
use secp256k1::ecdsa::Signature;
use secp256k1::PublicKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// Domain separator for transaction id derivation
const TXID_PERSONALIZATION: &[u8; 16] = b"LuminaTxId______";
/// Domain separator for the signature hash
const SIGHASH_PERSONALIZATION: &[u8; 16] = b"LuminaTxSigHash_";

/// Transaction status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    /// Created but not yet confirmed by the network
    Pending,
    /// Accepted by the network; final
    Confirmed,
    /// Rejected or dropped; final
    Failed,
}

impl TransactionStatus {
    /// Whether this status permits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Failed)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Confirmed => write!(f, "CONFIRMED"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

/// A single transfer recorded in the wallet's history.
///
/// Immutable after creation except for `status` and `signature`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Content-derived unique id
    pub id: String,
    /// Sender address
    pub from: String,
    /// Recipient address
    pub to: String,
    /// Amount in base units
    pub amount: u64,
    /// Token symbol
    pub token: String,
    /// Creation time, seconds since the Unix epoch
    pub timestamp: i64,
    /// Current status
    pub status: TransactionStatus,
    /// Compact ECDSA signature, hex; present only after signing
    pub signature: Option<String>,
}

impl Transaction {
    /// Transition the status.
    ///
    /// Pending may move to Confirmed or Failed; terminal states reject any
    /// further change.
    pub fn set_status(&mut self, status: TransactionStatus) -> Result<()> {
        if self.status.is_terminal() {
            return Err(Error::Validation(format!(
                "Transaction {} is already {} and cannot change status",
                self.id, self.status
            )));
        }
        self.status = status;
        info!("Transaction {} status changed to {}", self.id, status);
        Ok(())
    }

    /// Whether the transaction carries a signature.
    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    /// Digest that a signature commits to: every content field plus the id.
    pub fn sighash(&self) -> [u8; 32] {
        let hash = Blake2bParams::new()
            .hash_length(32)
            .personal(SIGHASH_PERSONALIZATION)
            .to_state()
            .update(self.id.as_bytes())
            .update(&[0])
            .update(self.from.as_bytes())
            .update(&[0])
            .update(self.to.as_bytes())
            .update(&[0])
            .update(&self.amount.to_le_bytes())
            .update(self.token.as_bytes())
            .update(&self.timestamp.to_le_bytes())
            .finalize();
        let mut digest = [0u8; 32];
        digest.copy_from_slice(hash.as_bytes());
        digest
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let time = Utc
            .timestamp_opt(self.timestamp, 0)
            .single()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| self.timestamp.to_string());
        writeln!(f, "Transaction ID: {}", self.id)?;
        writeln!(f, "From: {}", self.from)?;
        writeln!(f, "To: {}", self.to)?;
        writeln!(f, "Amount: {} {}", self.amount, self.token)?;
        writeln!(f, "Timestamp: {time}")?;
        writeln!(f, "Status: {}", self.status)
    }
}

/// Transaction factory and signer for one wallet.
///
/// Owns the per-wallet nonce that feeds transaction ids; the wallet
/// persists it so ids stay unique across restarts.
#[derive(Debug, Default)]
pub struct TransactionLedger {
    next_nonce: u64,
}

impl TransactionLedger {
    /// Create a ledger starting at nonce zero.
    pub fn new() -> Self {
        Self { next_nonce: 0 }
    }

    /// Restore a ledger from a persisted nonce.
    pub fn with_nonce(next_nonce: u64) -> Self {
        Self { next_nonce }
    }

    /// Nonce the next transaction will consume.
    pub fn next_nonce(&self) -> u64 {
        self.next_nonce
    }

    /// Create a new Pending transaction with a content-derived id.
    pub fn create_transaction(
        &mut self,
        from: &str,
        to: &str,
        amount: u64,
        token: &str,
    ) -> Result<Transaction> {
        if amount == 0 {
            return Err(Error::Validation(
                "Transaction amount must be positive".to_string(),
            ));
        }

        let timestamp = Utc::now().timestamp();
        let nonce = self.next_nonce;
        let id = compute_id(from, to, amount, token, timestamp, nonce);
        self.next_nonce += 1;

        debug!("Created transaction {id} (nonce {nonce})");
        Ok(Transaction {
            id,
            from: from.to_string(),
            to: to.to_string(),
            amount,
            token: token.to_string(),
            timestamp,
            status: TransactionStatus::Pending,
            signature: None,
        })
    }

    /// Sign a transaction, binding all of its fields to the signer's key.
    ///
    /// Re-signing a Pending transaction replaces the signature; terminal
    /// transactions reject signing.
    pub fn sign(&self, tx: &mut Transaction, key: &SigningKey) -> Result<()> {
        if tx.status.is_terminal() {
            return Err(Error::Validation(format!(
                "Transaction {} is {} and can no longer be signed",
                tx.id, tx.status
            )));
        }
        let signature = key.sign_digest(&tx.sighash())?;
        tx.signature = Some(hex::encode(signature.serialize_compact()));
        info!("Transaction {} signed", tx.id);
        Ok(())
    }

    /// Verify a transaction signature against the claimed signer's key.
    ///
    /// Returns `false` for unsigned, garbled, or mismatched signatures.
    pub fn verify_signature(&self, tx: &Transaction, signer: &PublicKey) -> bool {
        let Some(sig_hex) = tx.signature.as_deref() else {
            return false;
        };
        let Ok(sig_bytes) = hex::decode(sig_hex) else {
            return false;
        };
        let Ok(signature) = Signature::from_compact(&sig_bytes) else {
            return false;
        };
        keys::verify_digest(&tx.sighash(), &signature, signer)
    }
}

/// Derive a transaction id from its content and the per-wallet nonce.
fn compute_id(from: &str, to: &str, amount: u64, token: &str, timestamp: i64, nonce: u64) -> String {
    let hash = Blake2bParams::new()
        .hash_length(32)
        .personal(TXID_PERSONALIZATION)
        .to_state()
        .update(from.as_bytes())
        .update(&[0])
        .update(to.as_bytes())
        .update(&[0])
        .update(&amount.to_le_bytes())
        .update(token.as_bytes())
        .update(&timestamp.to_le_bytes())
        .update(&nonce.to_le_bytes())
        .finalize();
    format!("TX-{}", hex::encode(hash.as_bytes()))
}

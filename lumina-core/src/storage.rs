//! Wallet file persistence
//!
//! Line-oriented text format behind a fixed header:
//!
//! ```text
//! LUMINA_WALLET_DATA
//! ADDRESS:<address>
//! SEED:<base64 of the encrypted seed blob>
//! NONCE:<next transaction nonce>
//! BALANCE:<token>:<amount>
//! TX:<one transaction as JSON>
//! ```
//!
//! A wrong header fails loading; unknown line prefixes are skipped so newer
//! versions can append data without breaking older readers.

use crate::transaction::Transaction;
use crate::{Error, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// First line of every wallet file
pub const WALLET_FILE_HEADER: &str = "LUMINA_WALLET_DATA";

/// Snapshot of everything the wallet persists.
#[derive(Debug, Clone, Default)]
pub struct WalletData {
    /// Main wallet address
    pub address: String,
    /// Password-encrypted seed blob
    pub encrypted_seed: Option<Vec<u8>>,
    /// Next transaction nonce
    pub next_nonce: u64,
    /// Token symbol -> balance in base units
    pub balances: BTreeMap<String, u64>,
    /// Transaction history, in creation order
    pub transactions: Vec<Transaction>,
}

/// Serialize wallet data to the text format.
pub fn encode(data: &WalletData) -> Result<String> {
    let mut out = String::new();
    out.push_str(WALLET_FILE_HEADER);
    out.push('\n');
    out.push_str(&format!("ADDRESS:{}\n", data.address));
    if let Some(seed) = &data.encrypted_seed {
        out.push_str(&format!("SEED:{}\n", BASE64.encode(seed)));
    }
    out.push_str(&format!("NONCE:{}\n", data.next_nonce));
    for (token, amount) in &data.balances {
        out.push_str(&format!("BALANCE:{token}:{amount}\n"));
    }
    for tx in &data.transactions {
        out.push_str(&format!("TX:{}\n", serde_json::to_string(tx)?));
    }
    Ok(out)
}

/// Parse the text format back into wallet data.
pub fn decode(text: &str) -> Result<WalletData> {
    let mut lines = text.lines();
    match lines.next() {
        Some(WALLET_FILE_HEADER) => {}
        _ => {
            return Err(Error::Persistence(
                "Invalid wallet file format: bad header".to_string(),
            ))
        }
    }

    let mut data = WalletData::default();
    for line in lines {
        if let Some(address) = line.strip_prefix("ADDRESS:") {
            data.address = address.to_string();
        } else if let Some(seed) = line.strip_prefix("SEED:") {
            let blob = BASE64
                .decode(seed)
                .map_err(|e| Error::Persistence(format!("Invalid seed encoding: {e}")))?;
            data.encrypted_seed = Some(blob);
        } else if let Some(nonce) = line.strip_prefix("NONCE:") {
            data.next_nonce = nonce
                .parse()
                .map_err(|e| Error::Persistence(format!("Invalid nonce: {e}")))?;
        } else if let Some(balance) = line.strip_prefix("BALANCE:") {
            let (token, amount) = balance.split_once(':').ok_or_else(|| {
                Error::Persistence(format!("Invalid balance line: {balance}"))
            })?;
            let amount: u64 = amount
                .parse()
                .map_err(|e| Error::Persistence(format!("Invalid balance amount: {e}")))?;
            data.balances.insert(token.to_string(), amount);
        } else if let Some(tx) = line.strip_prefix("TX:") {
            let tx: Transaction = serde_json::from_str(tx)
                .map_err(|e| Error::Persistence(format!("Invalid transaction record: {e}")))?;
            data.transactions.push(tx);
        } else if !line.trim().is_empty() {
            debug!("Skipping unknown wallet file line: {line}");
        }
    }
    Ok(data)
}

/// Write wallet data to `path`, replacing any previous file.
///
/// The data is written to a sibling temp file first and renamed into place
/// so a crash mid-write cannot truncate the wallet.
pub fn save(path: &Path, data: &WalletData) -> Result<()> {
    let text = encode(data)?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, text)
        .map_err(|e| Error::Persistence(format!("Failed to write {}: {e}", tmp.display())))?;
    fs::rename(&tmp, path)
        .map_err(|e| Error::Persistence(format!("Failed to replace {}: {e}", path.display())))?;
    info!("Wallet saved to {}", path.display());
    Ok(())
}

/// Load wallet data from `path`.
pub fn load(path: &Path) -> Result<WalletData> {
    let text = fs::read_to_string(path)
        .map_err(|e| Error::Persistence(format!("Failed to read {}: {e}", path.display())))?;
    let data = decode(&text)?;
    info!("Wallet loaded from {}", path.display());
    Ok(data)
}

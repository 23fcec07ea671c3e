//! Wallet management
//!
//! Owns balances and the transaction history, orchestrates transfers
//! through the vault and the ledger, and persists itself to a single
//! wallet file. All mutating operations serialize on one lock so the
//! balance-check-then-debit sequence is atomic under concurrency.

use crate::keys::{self, SigningKey};
use crate::keyvault::{KeyVault, SeedPhrase};
use crate::storage::{self, WalletData};
use crate::transaction::{Transaction, TransactionLedger};
use crate::{Error, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// The network's native token symbol
pub const NATIVE_TOKEN: &str = "LMT";

/// Development team donation address
pub const DONATION_ADDRESS: &str = "LMTDEVTEAM123456789ABCDEFGHIJKLMNOPQRSTUVW";

/// Collaborator that brings local chain state up to the network tip.
///
/// Implemented by the sync engine crate; the wallet only needs to drive a
/// full run and flag itself synchronized afterwards.
#[async_trait]
pub trait Synchronizer: Send + Sync {
    /// Run synchronization to completion.
    async fn sync_to_tip(&self) -> Result<()>;
}

/// Wallet instance bound to one wallet file.
pub struct Wallet {
    path: PathBuf,
    vault: KeyVault,
    inner: Mutex<WalletInner>,
}

#[derive(Default)]
struct WalletInner {
    address: String,
    encrypted_seed: Option<Vec<u8>>,
    balances: BTreeMap<String, u64>,
    ledger: TransactionLedger,
    transactions: Vec<Transaction>,
    signing_key: Option<SigningKey>,
    initialized: bool,
    synchronized: bool,
}

impl Wallet {
    /// Open the wallet at `path`, loading existing data if the file exists.
    ///
    /// A missing file yields an uninitialized wallet ready for `create` or
    /// `recover_from_seed`; a malformed file is a persistence error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let inner = if path.exists() {
            let data = storage::load(&path)?;
            WalletInner {
                address: data.address,
                encrypted_seed: data.encrypted_seed,
                balances: data.balances,
                ledger: TransactionLedger::with_nonce(data.next_nonce),
                transactions: data.transactions,
                signing_key: None,
                initialized: true,
                synchronized: false,
            }
        } else {
            info!("No existing wallet found at {}", path.display());
            WalletInner::default()
        };

        Ok(Self {
            path,
            vault: KeyVault::new(),
            inner: Mutex::new(inner),
        })
    }

    /// Create a new wallet with a freshly generated seed.
    ///
    /// Returns the seed phrase so the caller can show it for backup.
    pub fn create(&self, password: &str) -> Result<SeedPhrase> {
        let mut inner = self.inner.lock();
        if inner.initialized {
            warn!("Wallet is already initialized");
            return Err(Error::AlreadyInitialized);
        }

        let seed = self.vault.generate_seed();
        self.initialize_locked(&mut inner, &seed, password)?;
        info!("Created new wallet with address {}", inner.address);
        Ok(seed)
    }

    /// Recover a wallet from a 12-word seed phrase.
    pub fn recover_from_seed(&self, phrase: &str, password: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.initialized {
            warn!("Wallet is already initialized");
            return Err(Error::AlreadyInitialized);
        }

        self.vault.validate_seed(phrase)?;
        let seed = SeedPhrase::new(phrase);
        self.initialize_locked(&mut inner, &seed, password)?;
        info!("Recovered wallet with address {}", inner.address);
        Ok(())
    }

    /// Get the balance for a token. Unknown tokens report zero.
    pub fn get_balance(&self, token: &str) -> u64 {
        self.inner.lock().balances.get(token).copied().unwrap_or(0)
    }

    /// Register incoming funds for a token.
    pub fn credit(&self, token: &str, amount: u64) -> Result<()> {
        let mut inner = self.inner.lock();
        if !inner.initialized {
            return Err(Error::NotInitialized);
        }
        let balance = inner.balances.entry(token.to_string()).or_insert(0);
        *balance = balance.checked_add(amount).ok_or_else(|| {
            Error::Validation(format!("Balance overflow for token {token}"))
        })?;
        Ok(())
    }

    /// Transfer funds to another address.
    ///
    /// Debiting the balance and appending the transaction to history commit
    /// together; a failure at any point leaves both untouched. The wallet
    /// file is rewritten before the lock is released.
    pub fn transfer(&self, to: &str, amount: u64, token: &str) -> Result<String> {
        let mut inner = self.inner.lock();
        if !inner.initialized {
            return Err(Error::NotInitialized);
        }
        if amount == 0 {
            return Err(Error::Validation(
                "Transfer amount must be positive".to_string(),
            ));
        }
        if !inner.synchronized {
            warn!("Wallet is not synchronized with the network");
        }
        if !keys::is_valid_address(to) {
            info!("Recipient {to} is not a canonical address");
        }

        let balance = inner.balances.get(token).copied().unwrap_or(0);
        if balance < amount {
            return Err(Error::InsufficientBalance(format!(
                "Balance {balance} {token} does not cover transfer of {amount}"
            )));
        }

        let from = inner.address.clone();
        let mut tx = inner.ledger.create_transaction(&from, to, amount, token)?;
        if let Some(key) = &inner.signing_key {
            inner.ledger.sign(&mut tx, key)?;
        } else {
            warn!("Wallet is locked; transaction {} left unsigned", tx.id);
        }

        let tx_id = tx.id.clone();
        if let Some(bal) = inner.balances.get_mut(token) {
            *bal -= amount;
        }
        inner.transactions.push(tx);

        if let Err(e) = self.save_locked(&inner) {
            // A failed save must not leave a half-committed transfer
            *inner.balances.entry(token.to_string()).or_insert(0) += amount;
            inner.transactions.pop();
            return Err(e);
        }

        info!("Transfer initiated: {amount} {token} to {to} ({tx_id})");
        Ok(tx_id)
    }

    /// Donate to the development team.
    pub fn donate(&self, amount: u64) -> Result<String> {
        self.transfer(DONATION_ADDRESS, amount, NATIVE_TOKEN)
    }

    /// Export the seed phrase for backup.
    pub fn seed_phrase(&self, password: &str) -> Result<SeedPhrase> {
        let inner = self.inner.lock();
        if !inner.initialized {
            return Err(Error::NotInitialized);
        }
        let blob = inner
            .encrypted_seed
            .as_ref()
            .ok_or_else(|| Error::Persistence("Wallet has no stored seed".to_string()))?;
        self.vault.decrypt_seed(blob, password)
    }

    /// Restore the in-memory signing key after loading from disk.
    pub fn unlock(&self, password: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        if !inner.initialized {
            return Err(Error::NotInitialized);
        }
        let blob = inner
            .encrypted_seed
            .as_ref()
            .ok_or_else(|| Error::Persistence("Wallet has no stored seed".to_string()))?;
        let seed = self.vault.decrypt_seed(blob, password)?;
        let key = SigningKey::from_seed(&seed)?;
        if keys::derive_address(&key.public_key()) != inner.address {
            return Err(Error::Authentication(
                "Stored seed does not match wallet address".to_string(),
            ));
        }
        inner.signing_key = Some(key);
        info!("Wallet unlocked");
        Ok(())
    }

    /// Whether the signing key is available in memory.
    pub fn is_unlocked(&self) -> bool {
        self.inner.lock().signing_key.is_some()
    }

    /// Synchronize with the network through the given engine.
    pub async fn synchronize(&self, sync: &dyn Synchronizer) -> Result<()> {
        if !self.inner.lock().initialized {
            return Err(Error::NotInitialized);
        }
        sync.sync_to_tip().await?;
        self.inner.lock().synchronized = true;
        info!("Wallet synchronized with the network");
        Ok(())
    }

    /// Mark the wallet as out of sync (e.g. after a long offline period).
    pub fn mark_unsynchronized(&self) {
        self.inner.lock().synchronized = false;
    }

    /// Current wallet status string.
    pub fn status(&self) -> &'static str {
        let inner = self.inner.lock();
        if !inner.initialized {
            "Not initialized"
        } else if !inner.synchronized {
            "Not synchronized with the network"
        } else {
            "Ready"
        }
    }

    /// The wallet's main address, if initialized.
    pub fn address(&self) -> Option<String> {
        let inner = self.inner.lock();
        inner.initialized.then(|| inner.address.clone())
    }

    /// Snapshot of the transaction history, in creation order.
    pub fn history(&self) -> Vec<Transaction> {
        self.inner.lock().transactions.clone()
    }

    /// Number of transactions in the history.
    pub fn history_len(&self) -> usize {
        self.inner.lock().transactions.len()
    }

    /// Public key of the wallet's signing key, if unlocked.
    pub fn public_key(&self) -> Option<secp256k1::PublicKey> {
        self.inner.lock().signing_key.as_ref().map(|k| k.public_key())
    }

    /// Whether the wallet has been created or recovered.
    pub fn is_initialized(&self) -> bool {
        self.inner.lock().initialized
    }

    /// Whether the wallet is synchronized with the network.
    pub fn is_synchronized(&self) -> bool {
        self.inner.lock().synchronized
    }

    /// Persist the wallet to its file.
    pub fn save(&self) -> Result<()> {
        let inner = self.inner.lock();
        if !inner.initialized {
            return Err(Error::NotInitialized);
        }
        self.save_locked(&inner)
    }

    /// Path of the wallet file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn initialize_locked(
        &self,
        inner: &mut WalletInner,
        seed: &SeedPhrase,
        password: &str,
    ) -> Result<()> {
        let key = SigningKey::from_seed(seed)?;
        let address = keys::derive_address(&key.public_key());
        let encrypted_seed = self.vault.encrypt_seed(seed, password)?;

        inner.address = address;
        inner.encrypted_seed = Some(encrypted_seed);
        inner.balances.clear();
        inner.balances.insert(NATIVE_TOKEN.to_string(), 0);
        inner.ledger = TransactionLedger::new();
        inner.transactions.clear();
        inner.signing_key = Some(key);
        inner.initialized = true;
        inner.synchronized = false;

        self.save_locked(inner)
    }

    fn snapshot(inner: &WalletInner) -> WalletData {
        WalletData {
            address: inner.address.clone(),
            encrypted_seed: inner.encrypted_seed.clone(),
            next_nonce: inner.ledger.next_nonce(),
            balances: inner.balances.clone(),
            transactions: inner.transactions.clone(),
        }
    }

    fn save_locked(&self, inner: &WalletInner) -> Result<()> {
        storage::save(&self.path, &Self::snapshot(inner)).map_err(|e| {
            warn!("Failed to save wallet: {e}");
            e
        })
    }
}

impl Drop for Wallet {
    fn drop(&mut self) {
        let inner = self.inner.get_mut();
        if inner.initialized {
            if let Err(e) = storage::save(&self.path, &Self::snapshot(inner)) {
                warn!("Failed to save wallet on shutdown: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::TransactionStatus;
    use tempfile::tempdir;

    fn fresh_wallet(dir: &tempfile::TempDir) -> Wallet {
        Wallet::open(dir.path().join("wallet.dat")).unwrap()
    }

    #[test]
    fn test_create_fresh_wallet() {
        let dir = tempdir().unwrap();
        let wallet = fresh_wallet(&dir);
        assert_eq!(wallet.status(), "Not initialized");

        let seed = wallet.create("password123").unwrap();
        assert_eq!(seed.words().count(), 12);
        assert!(wallet.is_initialized());
        assert_eq!(wallet.get_balance(NATIVE_TOKEN), 0);
        assert_eq!(wallet.status(), "Not synchronized with the network");
        assert!(wallet.path().exists());
    }

    #[test]
    fn test_create_twice_fails() {
        let dir = tempdir().unwrap();
        let wallet = fresh_wallet(&dir);
        wallet.create("pw").unwrap();
        assert!(matches!(wallet.create("pw"), Err(Error::AlreadyInitialized)));
    }

    #[test]
    fn test_recover_bad_seed_leaves_wallet_uninitialized() {
        let dir = tempdir().unwrap();
        let wallet = fresh_wallet(&dir);

        assert!(matches!(
            wallet.recover_from_seed("only two words", "pw"),
            Err(Error::Validation(_))
        ));
        assert!(!wallet.is_initialized());
        assert_eq!(wallet.status(), "Not initialized");
        assert!(!wallet.path().exists());
    }

    #[test]
    fn test_recover_same_seed_same_address() {
        let dir1 = tempdir().unwrap();
        let wallet1 = fresh_wallet(&dir1);
        let seed = wallet1.create("pw").unwrap();

        let dir2 = tempdir().unwrap();
        let wallet2 = fresh_wallet(&dir2);
        wallet2.recover_from_seed(seed.as_str(), "other-pw").unwrap();

        assert_eq!(wallet1.address(), wallet2.address());
    }

    #[test]
    fn test_transfer_success_debits_and_appends() {
        let dir = tempdir().unwrap();
        let wallet = fresh_wallet(&dir);
        wallet.create("pw").unwrap();
        wallet.credit(NATIVE_TOKEN, 10).unwrap();

        let tx_id = wallet.transfer("LMTbob", 5, NATIVE_TOKEN).unwrap();
        assert_eq!(wallet.get_balance(NATIVE_TOKEN), 5);

        let history = wallet.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, tx_id);
        assert_eq!(history[0].status, TransactionStatus::Pending);
        assert!(history[0].is_signed());
    }

    #[test]
    fn test_transfer_insufficient_balance_mutates_nothing() {
        let dir = tempdir().unwrap();
        let wallet = fresh_wallet(&dir);
        wallet.create("pw").unwrap();
        wallet.credit(NATIVE_TOKEN, 10).unwrap();

        assert!(matches!(
            wallet.transfer("LMTbob", 50, NATIVE_TOKEN),
            Err(Error::InsufficientBalance(_))
        ));
        assert_eq!(wallet.get_balance(NATIVE_TOKEN), 10);
        assert_eq!(wallet.history_len(), 0);
    }

    #[test]
    fn test_transfer_zero_amount_rejected() {
        let dir = tempdir().unwrap();
        let wallet = fresh_wallet(&dir);
        wallet.create("pw").unwrap();
        wallet.credit(NATIVE_TOKEN, 10).unwrap();

        assert!(matches!(
            wallet.transfer("LMTbob", 0, NATIVE_TOKEN),
            Err(Error::Validation(_))
        ));
        assert_eq!(wallet.history_len(), 0);
    }

    #[test]
    fn test_transfer_uninitialized_rejected() {
        let dir = tempdir().unwrap();
        let wallet = fresh_wallet(&dir);
        assert!(matches!(
            wallet.transfer("LMTbob", 5, NATIVE_TOKEN),
            Err(Error::NotInitialized)
        ));
    }

    #[test]
    fn test_unknown_token_balance_is_zero() {
        let dir = tempdir().unwrap();
        let wallet = fresh_wallet(&dir);
        wallet.create("pw").unwrap();
        assert_eq!(wallet.get_balance("DOGE"), 0);
    }

    #[test]
    fn test_donate_uses_fixed_address() {
        let dir = tempdir().unwrap();
        let wallet = fresh_wallet(&dir);
        wallet.create("pw").unwrap();
        wallet.credit(NATIVE_TOKEN, 10).unwrap();

        wallet.donate(3).unwrap();
        let history = wallet.history();
        assert_eq!(history[0].to, DONATION_ADDRESS);
        assert_eq!(wallet.get_balance(NATIVE_TOKEN), 7);
    }

    #[test]
    fn test_seed_phrase_export() {
        let dir = tempdir().unwrap();
        let wallet = fresh_wallet(&dir);
        let seed = wallet.create("pw").unwrap();

        let exported = wallet.seed_phrase("pw").unwrap();
        assert_eq!(exported, seed);

        assert!(matches!(
            wallet.seed_phrase("wrong"),
            Err(Error::Authentication(_))
        ));
    }

    #[test]
    fn test_save_load_identity() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wallet.dat");

        let wallet = Wallet::open(&path).unwrap();
        wallet.create("pw").unwrap();
        wallet.credit(NATIVE_TOKEN, 10).unwrap();
        wallet.credit("AUX", 2).unwrap();
        wallet.transfer("LMTbob", 4, NATIVE_TOKEN).unwrap();

        let reloaded = Wallet::open(&path).unwrap();
        assert!(reloaded.is_initialized());
        assert_eq!(reloaded.address(), wallet.address());
        assert_eq!(reloaded.get_balance(NATIVE_TOKEN), 6);
        assert_eq!(reloaded.get_balance("AUX"), 2);
        assert_eq!(reloaded.history_len(), 1);
        // Loaded wallets start locked and unsynchronized
        assert!(!reloaded.is_unlocked());
        assert_eq!(reloaded.status(), "Not synchronized with the network");
    }

    #[test]
    fn test_unlock_after_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wallet.dat");

        {
            let wallet = Wallet::open(&path).unwrap();
            wallet.create("pw").unwrap();
            wallet.credit(NATIVE_TOKEN, 10).unwrap();
            wallet.save().unwrap();
        }

        let wallet = Wallet::open(&path).unwrap();
        assert!(matches!(wallet.unlock("wrong"), Err(Error::Authentication(_))));
        assert!(!wallet.is_unlocked());

        wallet.unlock("pw").unwrap();
        assert!(wallet.is_unlocked());

        // Transfers sign again after unlock
        wallet.transfer("LMTbob", 1, NATIVE_TOKEN).unwrap();
        assert!(wallet.history()[0].is_signed());
    }

    #[test]
    fn test_nonce_survives_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wallet.dat");

        let wallet = Wallet::open(&path).unwrap();
        wallet.create("pw").unwrap();
        wallet.credit(NATIVE_TOKEN, 10).unwrap();
        let first = wallet.transfer("LMTbob", 1, NATIVE_TOKEN).unwrap();

        let reloaded = Wallet::open(&path).unwrap();
        reloaded.credit(NATIVE_TOKEN, 10).unwrap();
        let second = reloaded.transfer("LMTbob", 1, NATIVE_TOKEN).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_concurrent_transfers_never_overdraw() {
        use std::sync::Arc;

        let dir = tempdir().unwrap();
        let wallet = Arc::new(fresh_wallet(&dir));
        wallet.create("pw").unwrap();
        wallet.credit(NATIVE_TOKEN, 10).unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let wallet = Arc::clone(&wallet);
            handles.push(std::thread::spawn(move || {
                wallet.transfer("LMTbob", 3, NATIVE_TOKEN).is_ok()
            }));
        }
        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        // 10 / 3 = at most 3 transfers can clear the balance check
        assert_eq!(successes, 3);
        assert_eq!(wallet.get_balance(NATIVE_TOKEN), 1);
        assert_eq!(wallet.history_len(), 3);
    }
}

//! Wallet end-to-end scenarios
//!
//! Drives the wallet through the full create / fund / transfer / recover /
//! reload lifecycle against real files.

use lumina_core::{
    Error, TransactionLedger, TransactionStatus, Wallet, DONATION_ADDRESS, NATIVE_TOKEN,
};
use tempfile::tempdir;

#[test]
fn test_fresh_wallet_scenario() {
    let dir = tempdir().unwrap();
    let wallet = Wallet::open(dir.path().join("wallet.dat")).unwrap();

    wallet.create("hunter2!hunter2").unwrap();
    assert_eq!(wallet.get_balance(NATIVE_TOKEN), 0);
    assert_eq!(wallet.status(), "Not synchronized with the network");
    assert!(wallet.address().unwrap().starts_with("LMT"));
}

#[test]
fn test_transfer_scenario() {
    let dir = tempdir().unwrap();
    let wallet = Wallet::open(dir.path().join("wallet.dat")).unwrap();
    wallet.create("hunter2!hunter2").unwrap();
    wallet.credit(NATIVE_TOKEN, 10).unwrap();

    wallet.transfer("LMTbob", 5, NATIVE_TOKEN).unwrap();
    assert_eq!(wallet.get_balance(NATIVE_TOKEN), 5);
    let history = wallet.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, TransactionStatus::Pending);
    assert_eq!(history[0].amount, 5);
    assert_eq!(history[0].from, wallet.address().unwrap());
}

#[test]
fn test_overdraw_scenario_changes_nothing() {
    let dir = tempdir().unwrap();
    let wallet = Wallet::open(dir.path().join("wallet.dat")).unwrap();
    wallet.create("hunter2!hunter2").unwrap();
    wallet.credit(NATIVE_TOKEN, 10).unwrap();

    let before_history = wallet.history_len();
    assert!(matches!(
        wallet.transfer("LMTbob", 50, NATIVE_TOKEN),
        Err(Error::InsufficientBalance(_))
    ));
    assert_eq!(wallet.get_balance(NATIVE_TOKEN), 10);
    assert_eq!(wallet.history_len(), before_history);
}

#[test]
fn test_recover_with_short_phrase_scenario() {
    let dir = tempdir().unwrap();
    let wallet = Wallet::open(dir.path().join("wallet.dat")).unwrap();

    assert!(matches!(
        wallet.recover_from_seed("only two words", "pw"),
        Err(Error::Validation(_))
    ));
    assert!(!wallet.is_initialized());
    assert_eq!(wallet.status(), "Not initialized");
}

#[test]
fn test_signed_history_verifies_with_wallet_key() {
    let dir = tempdir().unwrap();
    let wallet = Wallet::open(dir.path().join("wallet.dat")).unwrap();
    wallet.create("hunter2!hunter2").unwrap();
    wallet.credit(NATIVE_TOKEN, 10).unwrap();
    wallet.transfer("LMTbob", 5, NATIVE_TOKEN).unwrap();

    let ledger = TransactionLedger::new();
    let signer = wallet.public_key().unwrap();
    for tx in wallet.history() {
        assert!(ledger.verify_signature(&tx, &signer));
    }
}

#[test]
fn test_save_load_reproduces_wallet() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wallet.dat");

    let wallet = Wallet::open(&path).unwrap();
    wallet.create("hunter2!hunter2").unwrap();
    wallet.credit(NATIVE_TOKEN, 25).unwrap();
    wallet.credit("GEM", 7).unwrap();
    wallet.transfer("LMTbob", 5, NATIVE_TOKEN).unwrap();
    wallet.donate(2).unwrap();

    let reloaded = Wallet::open(&path).unwrap();
    assert_eq!(reloaded.address(), wallet.address());
    assert_eq!(reloaded.get_balance(NATIVE_TOKEN), 18);
    assert_eq!(reloaded.get_balance("GEM"), 7);

    let original: Vec<_> = wallet.history().iter().map(|t| t.id.clone()).collect();
    let restored: Vec<_> = reloaded.history().iter().map(|t| t.id.clone()).collect();
    assert_eq!(original, restored);
    assert_eq!(reloaded.history()[1].to, DONATION_ADDRESS);
}

#[test]
fn test_corrupt_wallet_file_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wallet.dat");
    std::fs::write(&path, "GARBAGE HEADER\nADDRESS:LMTx\n").unwrap();

    assert!(matches!(Wallet::open(&path), Err(Error::Persistence(_))));
}

#[test]
fn test_recovered_wallet_can_spend_again() {
    let dir = tempdir().unwrap();
    let wallet = Wallet::open(dir.path().join("a.dat")).unwrap();
    let seed = wallet.create("first-password").unwrap();

    // Same seed on a new machine with a different password
    let other_dir = tempdir().unwrap();
    let recovered = Wallet::open(other_dir.path().join("b.dat")).unwrap();
    recovered
        .recover_from_seed(seed.as_str(), "second-password")
        .unwrap();

    assert_eq!(wallet.address(), recovered.address());
    recovered.credit(NATIVE_TOKEN, 3).unwrap();
    recovered.transfer("LMTbob", 1, NATIVE_TOKEN).unwrap();
    assert!(recovered.history()[0].is_signed());

    let exported = recovered.seed_phrase("second-password").unwrap();
    assert_eq!(exported, seed);
}

#[tokio::test]
async fn test_synchronize_via_stub_collaborator() {
    use async_trait::async_trait;
    use lumina_core::Synchronizer;

    struct InstantSync;

    #[async_trait]
    impl Synchronizer for InstantSync {
        async fn sync_to_tip(&self) -> lumina_core::Result<()> {
            Ok(())
        }
    }

    struct FailingSync;

    #[async_trait]
    impl Synchronizer for FailingSync {
        async fn sync_to_tip(&self) -> lumina_core::Result<()> {
            Err(Error::Sync("endpoint unreachable".to_string()))
        }
    }

    let dir = tempdir().unwrap();
    let wallet = Wallet::open(dir.path().join("wallet.dat")).unwrap();
    wallet.create("hunter2!hunter2").unwrap();

    assert!(matches!(
        wallet.synchronize(&FailingSync).await,
        Err(Error::Sync(_))
    ));
    assert!(!wallet.is_synchronized());

    wallet.synchronize(&InstantSync).await.unwrap();
    assert!(wallet.is_synchronized());
    assert_eq!(wallet.status(), "Ready");
}

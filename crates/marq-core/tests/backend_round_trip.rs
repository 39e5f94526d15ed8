use std::fs;

use marq_core::{
    FileStore, Intention, KeyValueStore, LedgerStatus, NewThread, SqliteStore, TapestryConfig,
    TapestryLedger, TimeOfDay,
};
use tempfile::tempdir;

async fn weave_and_encrypt<S: KeyValueStore>(store: S, password: &str) -> Vec<marq_core::Thread> {
    let mut ledger = TapestryLedger::new(store, TapestryConfig::default());
    ledger.initialize().await.expect("initialize should succeed");
    ledger
        .add_thread(NewThread::new(
            Intention::Legacy,
            TimeOfDay::Night,
            "harbor",
            "PLAINTEXT_MARKER_123",
        ))
        .await
        .expect("add should succeed");
    ledger
        .add_thread(NewThread::new(Intention::Awe, TimeOfDay::Dawn, "ridge", "Second"))
        .await
        .expect("add should succeed");
    ledger
        .enable_encryption(password)
        .await
        .expect("enable encryption should succeed");
    ledger.threads()
}

#[tokio::test]
async fn test_file_store_encrypted_round_trip() {
    let dir = tempdir().expect("tempdir");
    let original = weave_and_encrypt(FileStore::new(dir.path()), "file-store-pw").await;

    let on_disk = fs::read_to_string(dir.path().join("marq_tapestry_threads.json"))
        .expect("read should succeed");
    assert!(on_disk.contains("AEGIS_SECURE"));
    assert!(!on_disk.contains("PLAINTEXT_MARKER_123"));

    let mut reopened = TapestryLedger::new(FileStore::new(dir.path()), TapestryConfig::default());
    reopened.initialize().await.expect("initialize should succeed");
    assert_eq!(reopened.status(), LedgerStatus::Locked);

    assert!(!reopened.unlock("wrong-password").await.unwrap());
    assert!(reopened.unlock("file-store-pw").await.unwrap());
    assert_eq!(reopened.threads(), original);
    assert!(reopened.is_integrity_verified());
}

#[tokio::test]
async fn test_sqlite_store_encrypted_round_trip() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("tapestry.db");

    let original = weave_and_encrypt(
        SqliteStore::open(&path).expect("open should succeed"),
        "sqlite-store-pw",
    )
    .await;

    let mut reopened = TapestryLedger::new(
        SqliteStore::open(&path).expect("reopen should succeed"),
        TapestryConfig::default(),
    );
    reopened.initialize().await.expect("initialize should succeed");
    assert_eq!(reopened.status(), LedgerStatus::Locked);

    assert!(reopened.unlock("sqlite-store-pw").await.unwrap());
    assert_eq!(reopened.threads(), original);
}

#[tokio::test]
async fn test_plain_file_store_is_readable_json() {
    let dir = tempdir().expect("tempdir");
    let mut ledger = TapestryLedger::new(FileStore::new(dir.path()), TapestryConfig::default());
    ledger.initialize().await.unwrap();
    let thread = ledger
        .add_thread(NewThread::new(Intention::Serenity, TimeOfDay::Dusk, "lake", "Calm"))
        .await
        .unwrap();

    let on_disk = fs::read_to_string(dir.path().join("marq_tapestry_threads.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&on_disk).unwrap();
    assert_eq!(value[0]["hash"], thread.hash.as_str());
    assert_eq!(value[0]["previousHash"], "GENESIS_HASH");
}

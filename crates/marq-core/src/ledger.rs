//! The tapestry ledger: a hash-chained, optionally encrypted thread list.
//!
//! ## Lifecycle
//!
//! ```text
//! UNINITIALIZED --initialize()--> READY
//!                            \--> LOCKED --unlock(pw)--> READY
//!                                 READY  --lock()-----> LOCKED
//! ```
//!
//! Every mutation persists the whole thread list through the
//! [`KeyValueStore`] port: as a plain JSON array, or as an
//! [`EncryptedEnvelope`] while a session password is set.
//!
//! ## Concurrency
//!
//! Mutating operations take `&mut self`, so a ledger has exactly one writer
//! at a time. Hosts that share a ledger across tasks wrap it in
//! `tokio::sync::Mutex`; two independent ledgers over the same store key
//! will race and the last write wins.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::chain::first_broken_link;
use crate::config::TapestryConfig;
use crate::crypto::{CryptoGuard, EncryptedEnvelope};
use crate::error::{ImportError, Result, TapestryError};
use crate::schema::{check_new_thread_text, validate_thread};
use crate::storage::KeyValueStore;
use crate::thread::{
    IntegrityStatus, Intention, NewThread, Thread, TimeOfDay, GENESIS_HASH, THREAD_ID_LEN,
};

/// Region given to legacy threads that never recorded one.
pub const LEGACY_REGION: &str = "unknown";

/// Title given to legacy threads that never recorded one.
pub const LEGACY_TITLE: &str = "Legacy Thread";

/// Lifecycle state of a ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerStatus {
    Uninitialized,
    Locked,
    Ready,
}

impl fmt::Display for LedgerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LedgerStatus::Uninitialized => "UNINITIALIZED",
            LedgerStatus::Locked => "LOCKED",
            LedgerStatus::Ready => "READY",
        })
    }
}

/// First thread that failed verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorruptedThread {
    pub index: usize,
    pub id: String,
}

/// Snapshot of the ledger's integrity for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    pub thread_count: usize,
    pub verified: bool,
    pub first_corrupted: Option<CorruptedThread>,
}

/// What a raw stored value turned out to be.
enum Stored {
    Envelope,
    Threads(Vec<Value>),
    Corrupt(String),
}

impl Stored {
    fn classify(raw: &str) -> Self {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(err) => return Stored::Corrupt(format!("unparseable JSON: {}", err)),
        };
        if EncryptedEnvelope::from_value(&value).is_some() {
            return Stored::Envelope;
        }
        match value {
            Value::Array(values) => Stored::Threads(values),
            _ => Stored::Corrupt("unrecognized shape".to_string()),
        }
    }
}

/// Outcome of loading a stored plain array.
enum PlainLoad {
    Loaded,
    /// The array cannot be used; carries the reason.
    Unusable(String),
}

/// Hash-chained, optionally encrypted thread ledger over a key-value store.
pub struct TapestryLedger<S: KeyValueStore> {
    store: S,
    config: TapestryConfig,
    threads: Vec<Thread>,
    status: LedgerStatus,
    integrity_verified: bool,
    guard: CryptoGuard,
}

impl<S: KeyValueStore> TapestryLedger<S> {
    /// Create an empty, uninitialized ledger. Nothing is read until
    /// [`initialize`](Self::initialize) runs.
    pub fn new(store: S, config: TapestryConfig) -> Self {
        Self {
            store,
            config,
            threads: Vec::new(),
            status: LedgerStatus::Uninitialized,
            integrity_verified: false,
            guard: CryptoGuard::new(),
        }
    }

    pub fn status(&self) -> LedgerStatus {
        self.status
    }

    /// Result of the most recent verification.
    pub fn is_integrity_verified(&self) -> bool {
        self.integrity_verified
    }

    /// True while a session password is held (encryption at rest enabled).
    pub fn has_session(&self) -> bool {
        self.guard.has_session()
    }

    pub fn config(&self) -> &TapestryConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Number of readable threads (zero while locked).
    pub fn len(&self) -> usize {
        match self.status {
            LedgerStatus::Ready => self.threads.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load the stored value and settle into `READY` or `LOCKED`.
    ///
    /// Unreadable or unrecognized stored data is discarded and the ledger
    /// starts empty. Integrity failures are recorded but do not block
    /// loading.
    pub async fn initialize(&mut self) -> Result<()> {
        let raw = self.store.get(&self.config.storage_key).await?;
        self.threads.clear();
        self.guard.clear_session();

        let Some(raw) = raw else {
            debug!(key = %self.config.storage_key, "no stored tapestry; starting empty");
            self.integrity_verified = true;
            self.status = LedgerStatus::Ready;
            return Ok(());
        };

        match Stored::classify(&raw) {
            Stored::Envelope => {
                info!(key = %self.config.storage_key, "stored tapestry is encrypted; locked");
                self.status = LedgerStatus::Locked;
            }
            Stored::Threads(values) => match self.load_plain(values).await? {
                PlainLoad::Loaded => {}
                PlainLoad::Unusable(reason) => self.reset_corrupt(&reason),
            },
            Stored::Corrupt(reason) => self.reset_corrupt(&reason),
        }
        Ok(())
    }

    /// Load a plain stored array, migrating legacy threads if needed.
    async fn load_plain(&mut self, values: Vec<Value>) -> Result<PlainLoad> {
        let needs_migration = values
            .iter()
            .any(|value| value.as_object().map_or(false, |obj| !obj.contains_key("hash")));

        if needs_migration {
            let Some(threads) = migrate_legacy(&values) else {
                return Ok(PlainLoad::Unusable(
                    "legacy array holds non-object entries".to_string(),
                ));
            };
            info!(count = threads.len(), "migrated legacy threads into a hash chain");
            self.threads = threads;
            self.persist().await?;
        } else {
            match serde_json::from_value::<Vec<Thread>>(Value::Array(values)) {
                Ok(threads) => self.threads = threads,
                Err(err) => {
                    return Ok(PlainLoad::Unusable(format!(
                        "threads do not match schema: {}",
                        err
                    )))
                }
            }
        }

        self.status = LedgerStatus::Ready;
        self.verify_integrity();
        Ok(PlainLoad::Loaded)
    }

    fn reset_corrupt(&mut self, reason: &str) {
        warn!(
            key = %self.config.storage_key,
            reason,
            "stored tapestry is corrupt; resetting to an empty ledger"
        );
        self.threads.clear();
        self.integrity_verified = true;
        self.status = LedgerStatus::Ready;
    }

    /// Decrypt the stored envelope with `password`.
    ///
    /// Returns `Ok(true)` without doing anything unless the ledger is
    /// locked. A wrong password or damaged envelope yields `Ok(false)` and
    /// the ledger stays locked; only storage failures are errors.
    pub async fn unlock(&mut self, password: &str) -> Result<bool> {
        if self.status != LedgerStatus::Locked {
            return Ok(true);
        }

        let raw = self.store.get(&self.config.storage_key).await?;
        let Some(envelope) = raw.as_deref().and_then(EncryptedEnvelope::parse) else {
            warn!("unlock requested but no encrypted envelope is stored");
            return Ok(false);
        };

        match CryptoGuard::decrypt::<Vec<Thread>>(&envelope, password).await {
            Ok(threads) => {
                self.threads = threads;
                self.guard.set_session_password(password);
                self.status = LedgerStatus::Ready;
                self.verify_integrity();
                info!(count = self.threads.len(), "tapestry unlocked");
                Ok(true)
            }
            Err(err) => {
                warn!(error = %err, "tapestry unlock failed");
                Ok(false)
            }
        }
    }

    /// Drop the in-memory threads and session password.
    ///
    /// Only meaningful for an encrypted ledger: the data stays in the
    /// stored envelope. Returns false when no session password is held.
    pub fn lock(&mut self) -> bool {
        if !self.guard.has_session() {
            return false;
        }
        self.threads.clear();
        self.guard.clear_session();
        self.status = LedgerStatus::Locked;
        info!("tapestry locked");
        true
    }

    /// Start encrypting at rest under `password` and rewrite the store.
    pub async fn enable_encryption(&mut self, password: &str) -> Result<()> {
        self.ensure_ready()?;
        if password.is_empty() {
            return Err(TapestryError::InvalidInput(
                "Password cannot be empty".to_string(),
            ));
        }
        let previous = self.guard.take_session();
        self.guard.set_session_password(password);
        if let Err(err) = self.persist().await {
            self.guard.restore_session(previous);
            return Err(err);
        }
        info!("encryption at rest enabled");
        Ok(())
    }

    /// Stop encrypting at rest and rewrite the store as a plain array.
    ///
    /// Returns false when encryption was not enabled. Rejected unless the
    /// ledger is ready, since the in-memory list is what gets written.
    pub async fn disable_encryption(&mut self) -> Result<bool> {
        if !self.guard.has_session() {
            return Ok(false);
        }
        self.ensure_ready()?;
        let previous = self.guard.take_session();
        if let Err(err) = self.persist().await {
            self.guard.restore_session(previous);
            return Err(err);
        }
        info!("encryption at rest disabled");
        Ok(true)
    }

    /// Append a new thread linked to the current chain head.
    pub async fn add_thread(&mut self, data: NewThread) -> Result<Thread> {
        self.ensure_ready()?;
        check_new_thread_text(&data.region, &data.title)
            .map_err(|violation| TapestryError::Validation(violation.to_string()))?;

        let previous_hash = self
            .threads
            .last()
            .map(|thread| thread.hash.clone())
            .unwrap_or_else(|| GENESIS_HASH.to_string());
        let thread = data.weave(now_millis(), &previous_hash);

        self.threads.push(thread.clone());
        if let Err(err) = self.persist().await {
            self.threads.pop();
            return Err(err);
        }
        debug!(id = %thread.id, "thread woven");
        Ok(thread)
    }

    /// Re-check the whole chain.
    ///
    /// On the first broken link the offending thread is marked corrupted
    /// and verification stops there.
    pub fn verify_integrity(&mut self) -> bool {
        for thread in &mut self.threads {
            thread.integrity_status = None;
        }

        match first_broken_link(&self.threads) {
            Some(index) => {
                let thread = &mut self.threads[index];
                thread.integrity_status = Some(IntegrityStatus::Corrupted);
                warn!(index, id = %thread.id, "tapestry integrity check failed");
                self.integrity_verified = false;
                false
            }
            None => {
                self.integrity_verified = true;
                true
            }
        }
    }

    pub fn integrity_report(&self) -> IntegrityReport {
        let threads = self.threads();
        let first_corrupted = threads
            .iter()
            .position(Thread::is_corrupted)
            .map(|index| CorruptedThread {
                index,
                id: threads[index].id.clone(),
            });
        IntegrityReport {
            thread_count: threads.len(),
            verified: self.integrity_verified,
            first_corrupted,
        }
    }

    /// Replace every thread with the contents of a scroll.
    ///
    /// The scroll must fit the size and count limits, every record must
    /// pass schema validation, and the records must form an intact chain of
    /// their own. Nothing changes unless all checks pass.
    pub async fn import_scroll(&mut self, json: &str) -> Result<usize> {
        self.ensure_ready()?;
        let threads = self.validate_scroll(json)?;
        let count = threads.len();

        let previous = std::mem::replace(&mut self.threads, threads);
        if let Err(err) = self.persist().await {
            self.threads = previous;
            return Err(err);
        }
        self.verify_integrity();
        info!(count, "scroll imported");
        Ok(count)
    }

    fn validate_scroll(&self, json: &str) -> std::result::Result<Vec<Thread>, ImportError> {
        let max = self.config.max_import_bytes;
        if json.len() > max {
            return Err(ImportError::TooLarge {
                size: json.len(),
                max,
            });
        }

        let value: Value =
            serde_json::from_str(json).map_err(|e| ImportError::Malformed(e.to_string()))?;
        let Value::Array(records) = value else {
            return Err(ImportError::NotAnArray);
        };

        let max = self.config.max_import_threads;
        if records.len() > max {
            return Err(ImportError::TooManyThreads {
                count: records.len(),
                max,
            });
        }

        let threads = records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                validate_thread(record).map_err(|violation| ImportError::Schema { index, violation })
            })
            .collect::<std::result::Result<Vec<Thread>, ImportError>>()?;

        if let Some(index) = first_broken_link(&threads) {
            return Err(ImportError::BrokenChain { index });
        }
        Ok(threads)
    }

    /// All threads as a pretty-printed JSON array.
    pub fn export_scroll(&self) -> Result<String> {
        self.ensure_ready()?;
        Ok(serde_json::to_string_pretty(&self.threads)?)
    }

    /// A copy of the threads; empty unless the ledger is ready.
    pub fn threads(&self) -> Vec<Thread> {
        match self.status {
            LedgerStatus::Ready => self.threads.clone(),
            _ => Vec::new(),
        }
    }

    /// Remove every thread. Does nothing while locked.
    pub async fn clear(&mut self) -> Result<()> {
        match self.status {
            LedgerStatus::Locked => return Ok(()),
            LedgerStatus::Uninitialized => return Err(TapestryError::NotInitialized),
            LedgerStatus::Ready => {}
        }
        let previous = std::mem::take(&mut self.threads);
        if let Err(err) = self.persist().await {
            self.threads = previous;
            return Err(err);
        }
        self.integrity_verified = true;
        info!("tapestry cleared");
        Ok(())
    }

    fn ensure_ready(&self) -> Result<()> {
        match self.status {
            LedgerStatus::Ready => Ok(()),
            LedgerStatus::Locked => Err(TapestryError::Locked),
            LedgerStatus::Uninitialized => Err(TapestryError::NotInitialized),
        }
    }

    async fn persist(&self) -> Result<()> {
        let payload = if self.guard.has_session() {
            let envelope = self.guard.encrypt_with_session(&self.threads).await?;
            serde_json::to_string(&envelope)?
        } else {
            serde_json::to_string(&self.threads)?
        };
        self.store.set(&self.config.storage_key, &payload).await?;
        debug!(
            key = %self.config.storage_key,
            count = self.threads.len(),
            encrypted = self.guard.has_session(),
            "tapestry persisted"
        );
        Ok(())
    }
}

impl<S: KeyValueStore> fmt::Debug for TapestryLedger<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TapestryLedger")
            .field("status", &self.status)
            .field("threads", &self.len())
            .field("integrity_verified", &self.integrity_verified)
            .field("guard", &self.guard)
            .finish()
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Rebuild a chain from legacy records, keeping what they recorded and
/// substituting defaults for what they did not.
///
/// Returns `None` if any entry is not a JSON object.
fn migrate_legacy(values: &[Value]) -> Option<Vec<Thread>> {
    let now = now_millis();
    let mut threads: Vec<Thread> = Vec::with_capacity(values.len());

    for value in values {
        let obj = value.as_object()?;
        let previous_hash = threads
            .last()
            .map(|thread| thread.hash.clone())
            .unwrap_or_else(|| GENESIS_HASH.to_string());

        let mut thread = Thread {
            id: String::new(),
            intention: legacy_str(obj, "intention")
                .map(|s| s.parse().unwrap_or(Intention::Unknown))
                .unwrap_or(Intention::Unknown),
            time: legacy_str(obj, "time")
                .map(|s| s.parse().unwrap_or(TimeOfDay::Unknown))
                .unwrap_or(TimeOfDay::Midday),
            region: legacy_str(obj, "region").unwrap_or(LEGACY_REGION).to_string(),
            title: legacy_str(obj, "title").unwrap_or(LEGACY_TITLE).to_string(),
            timestamp: obj
                .get("timestamp")
                .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
                .unwrap_or(now),
            previous_hash: previous_hash.clone(),
            hash: String::new(),
            integrity_status: None,
        };
        thread.hash = thread.compute_hash(&previous_hash);
        thread.id = legacy_str(obj, "id")
            .map(str::to_string)
            .unwrap_or_else(|| thread.hash[..THREAD_ID_LEN].to_string());
        threads.push(thread);
    }
    Some(threads)
}

fn legacy_str<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(Value::as_str)
}

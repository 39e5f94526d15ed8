//! # MARQ Core
//!
//! The tapestry ledger: a tamper-evident, append-only list of woven
//! threads, optionally encrypted at rest, persisted through a minimal
//! key-value store port.
//!
//! ## Architecture
//!
//! - **hash**: canonical thread payload and SHA-256 digest
//! - **thread**: the `Thread` record and its enums
//! - **chain**: hash chain verification over plain slices
//! - **schema**: typed validation of untrusted thread records
//! - **crypto**: PBKDF2 + AES-256-GCM envelopes and session custody
//! - **storage**: the `KeyValueStore` port and its backends
//! - **ledger**: the `TapestryLedger` lifecycle and operations
//!
//! ## Example
//!
//! ```no_run
//! use marq_core::{Intention, MemoryStore, NewThread, TapestryConfig, TapestryLedger, TimeOfDay};
//!
//! # async fn run() -> marq_core::Result<()> {
//! let mut ledger = TapestryLedger::new(MemoryStore::new(), TapestryConfig::default());
//! ledger.initialize().await?;
//! let thread = ledger
//!     .add_thread(NewThread::new(Intention::Serenity, TimeOfDay::Dawn, "coast", "First light"))
//!     .await?;
//! assert_eq!(thread.previous_hash, marq_core::GENESIS_HASH);
//! # Ok(())
//! # }
//! ```

pub mod chain;
pub mod config;
pub mod crypto;
pub mod error;
pub mod hash;
pub mod ledger;
pub mod schema;
pub mod storage;
pub mod thread;

pub use chain::verify_chain;
pub use config::TapestryConfig;
pub use crypto::{CryptoGuard, EncryptedEnvelope};
pub use error::{ImportError, Result, TapestryError};
pub use ledger::{IntegrityReport, LedgerStatus, TapestryLedger};
pub use schema::SchemaViolation;
pub use storage::{FileStore, KeyValueStore, MemoryStore, SqliteStore};
pub use thread::{Intention, NewThread, Thread, TimeOfDay, GENESIS_HASH};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}

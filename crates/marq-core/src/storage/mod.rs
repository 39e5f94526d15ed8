//! Storage abstraction for the tapestry.
//!
//! The ledger persists through the [`KeyValueStore`] port and never touches
//! a backend directly.
//!
//! ## Backends
//!
//! - [`MemoryStore`]: process-local map, used by tests and embedding hosts
//! - [`FileStore`]: one JSON file per key with atomic replace
//! - [`SqliteStore`]: a single `kv` table in a SQLite database
//!
//! Stores hold whatever string the ledger hands them; encryption at rest is
//! the ledger's job, not the backend's.

pub mod file;
pub mod memory;
pub mod sqlite;
pub mod traits;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::KeyValueStore;

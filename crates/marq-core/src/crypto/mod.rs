//! Cryptographic operations for the tapestry.
//!
//! - **PBKDF2-HMAC-SHA256** (100 000 iterations) derives a 256-bit key from
//!   the session password and a per-envelope random salt
//! - **AES-256-GCM** seals the thread array with a per-envelope random IV
//!
//! ## Threat Model
//!
//! We defend against:
//! - Theft of the stored tapestry
//! - Offline brute-force attacks on the password
//! - Undetected modification of the encrypted payload
//!
//! We do NOT defend against:
//! - Compromised OS / keylogger
//! - Access to an unlocked session / memory

pub mod envelope;
pub mod guard;
pub mod key;
pub mod password;

pub use envelope::{EncryptedEnvelope, ENVELOPE_TAG, ENVELOPE_VERSION};
pub use guard::CryptoGuard;
pub use key::{derive_key, DerivedKey};
pub use password::validate_password;

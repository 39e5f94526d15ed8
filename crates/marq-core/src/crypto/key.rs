//! Key derivation using PBKDF2-HMAC-SHA256.
//!
//! Envelopes written by other clients carry no KDF parameters, so the
//! iteration count and key length are fixed constants of the envelope
//! format.

use sha2::Sha256;
use zeroize::ZeroizeOnDrop;

use crate::error::{Result, TapestryError};

/// PBKDF2 iterations for envelope format version 1.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Length of derived key in bytes (32 bytes = 256 bits for AES-256).
pub const KEY_LENGTH: usize = 32;

/// Length of the random salt stored in each envelope.
pub const SALT_LENGTH: usize = 16;

/// A cryptographic key derived from a password.
///
/// Key material is zeroized from memory when dropped.
#[derive(Clone, ZeroizeOnDrop)]
pub struct DerivedKey {
    key: [u8; KEY_LENGTH],
}

impl DerivedKey {
    pub(crate) fn from_bytes(bytes: [u8; KEY_LENGTH]) -> Self {
        Self { key: bytes }
    }

    /// Get a reference to the raw key bytes.
    ///
    /// # Security
    ///
    /// Avoid storing or logging this value. Use only for immediate encryption operations.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Derive an encryption key from a password and salt.
///
/// Same password + salt always produces the same key. This is CPU-bound;
/// async callers run it on the blocking pool.
///
/// # Examples
///
/// ```
/// use marq_core::crypto::derive_key;
///
/// let salt = [7u8; 16];
/// let key = derive_key("my-password", &salt).unwrap();
/// assert_eq!(key.as_bytes().len(), 32);
/// ```
pub fn derive_key(password: &str, salt: &[u8]) -> Result<DerivedKey> {
    if password.is_empty() {
        return Err(TapestryError::InvalidInput(
            "Password cannot be empty".to_string(),
        ));
    }

    if salt.len() < SALT_LENGTH {
        return Err(TapestryError::InvalidInput(format!(
            "Salt must be at least {} bytes",
            SALT_LENGTH
        )));
    }

    let mut key_bytes = [0u8; KEY_LENGTH];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key_bytes);

    Ok(DerivedKey::from_bytes(key_bytes))
}

//! AES-256-GCM envelope encryption.
//!
//! Layout on disk:
//!
//! ```json
//! { "ciphertext": "<b64>", "iv": "<b64>", "salt": "<b64>", "version": 1, "tag": "AEGIS_SECURE" }
//! ```
//!
//! `ciphertext` is the AEAD output with the 16-byte GCM tag appended, the
//! same layout WebCrypto produces, so envelopes are interchangeable with
//! other clients.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::key::{derive_key, SALT_LENGTH};
use crate::error::{Result, TapestryError};

/// Tag identifying an encrypted tapestry envelope.
pub const ENVELOPE_TAG: &str = "AEGIS_SECURE";

/// Current envelope format version.
pub const ENVELOPE_VERSION: u32 = 1;

/// Length of the AES-GCM nonce.
pub const IV_LENGTH: usize = 12;

/// Encrypted-at-rest form of a JSON payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedEnvelope {
    pub ciphertext: String,
    pub iv: String,
    pub salt: String,
    pub version: u32,
    pub tag: String,
}

impl EncryptedEnvelope {
    /// Recognize a stored value as an envelope.
    ///
    /// Returns `None` for anything that is not a JSON object carrying the
    /// envelope tag and the envelope fields.
    pub fn parse(raw: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(raw).ok()?;
        Self::from_value(&value)
    }

    pub(crate) fn from_value(value: &Value) -> Option<Self> {
        let tag = value.as_object()?.get("tag")?.as_str()?;
        if tag != ENVELOPE_TAG {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }
}

fn random_bytes<const N: usize>() -> Result<[u8; N]> {
    let mut bytes = [0u8; N];
    getrandom::getrandom(&mut bytes)
        .map_err(|e| TapestryError::Crypto(format!("Random source unavailable: {}", e)))?;
    Ok(bytes)
}

/// Encrypt `plaintext` under a key derived from `password`.
///
/// A fresh salt and IV are drawn for every call.
pub fn seal(plaintext: &[u8], password: &str) -> Result<EncryptedEnvelope> {
    if password.is_empty() {
        return Err(TapestryError::Crypto(
            "A password is required to encrypt".to_string(),
        ));
    }

    let salt: [u8; SALT_LENGTH] = random_bytes()?;
    let iv: [u8; IV_LENGTH] = random_bytes()?;
    let key = derive_key(password, &salt)?;

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| TapestryError::Crypto(format!("Failed to create cipher: {}", e)))?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&iv), plaintext)
        .map_err(|e| TapestryError::Crypto(format!("Encryption failed: {}", e)))?;

    Ok(EncryptedEnvelope {
        ciphertext: STANDARD.encode(ciphertext),
        iv: STANDARD.encode(iv),
        salt: STANDARD.encode(salt),
        version: ENVELOPE_VERSION,
        tag: ENVELOPE_TAG.to_string(),
    })
}

/// Decrypt and authenticate an envelope.
///
/// # Errors
///
/// Returns `TapestryError::InvalidEnvelope` when the tag does not match.
/// Every other failure, including a wrong password, is reported as
/// `TapestryError::DecryptionFailed`.
pub fn open(envelope: &EncryptedEnvelope, password: &str) -> Result<Vec<u8>> {
    if envelope.tag != ENVELOPE_TAG {
        return Err(TapestryError::InvalidEnvelope);
    }

    let salt = STANDARD
        .decode(&envelope.salt)
        .map_err(|_| TapestryError::DecryptionFailed)?;
    let iv = STANDARD
        .decode(&envelope.iv)
        .map_err(|_| TapestryError::DecryptionFailed)?;
    let ciphertext = STANDARD
        .decode(&envelope.ciphertext)
        .map_err(|_| TapestryError::DecryptionFailed)?;
    if iv.len() != IV_LENGTH {
        return Err(TapestryError::DecryptionFailed);
    }

    let key = derive_key(password, &salt).map_err(|_| TapestryError::DecryptionFailed)?;
    let cipher =
        Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| TapestryError::DecryptionFailed)?;
    cipher
        .decrypt(Nonce::from_slice(&iv), ciphertext.as_slice())
        .map_err(|_| TapestryError::DecryptionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_open_round_trip() {
        let envelope = seal(b"[1,2,3]", "correct-horse").unwrap();
        let plaintext = open(&envelope, "correct-horse").unwrap();
        assert_eq!(plaintext, b"[1,2,3]");
    }

    #[test]
    fn test_envelope_layout() {
        let envelope = seal(b"payload", "correct-horse").unwrap();

        assert_eq!(envelope.tag, ENVELOPE_TAG);
        assert_eq!(envelope.version, 1);
        assert_eq!(STANDARD.decode(&envelope.salt).unwrap().len(), 16);
        assert_eq!(STANDARD.decode(&envelope.iv).unwrap().len(), 12);
        // plaintext + 16-byte GCM tag
        assert_eq!(STANDARD.decode(&envelope.ciphertext).unwrap().len(), 7 + 16);
    }

    #[test]
    fn test_fresh_salt_and_iv_per_call() {
        let a = seal(b"same", "correct-horse").unwrap();
        let b = seal(b"same", "correct-horse").unwrap();

        assert_ne!(a.salt, b.salt);
        assert_ne!(a.iv, b.iv);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn test_wrong_password_and_tampering_are_indistinguishable() {
        let envelope = seal(b"secret", "correct-horse").unwrap();

        let wrong = open(&envelope, "battery-staple").unwrap_err();
        assert!(matches!(wrong, TapestryError::DecryptionFailed));

        let mut bytes = STANDARD.decode(&envelope.ciphertext).unwrap();
        bytes[0] ^= 0xFF;
        let mut tampered = envelope.clone();
        tampered.ciphertext = STANDARD.encode(bytes);
        let tamper = open(&tampered, "correct-horse").unwrap_err();
        assert!(matches!(tamper, TapestryError::DecryptionFailed));

        assert_eq!(wrong.to_string(), tamper.to_string());
    }

    #[test]
    fn test_wrong_tag_is_format_error() {
        let mut envelope = seal(b"secret", "correct-horse").unwrap();
        envelope.tag = "SOMETHING_ELSE".to_string();
        assert!(matches!(
            open(&envelope, "correct-horse"),
            Err(TapestryError::InvalidEnvelope)
        ));
    }

    #[test]
    fn test_empty_password_rejected() {
        assert!(seal(b"secret", "").is_err());
    }

    #[test]
    fn test_parse_recognizes_only_tagged_objects() {
        let envelope = seal(b"x", "correct-horse").unwrap();
        let raw = serde_json::to_string(&envelope).unwrap();

        assert_eq!(EncryptedEnvelope::parse(&raw), Some(envelope));
        assert_eq!(EncryptedEnvelope::parse("[]"), None);
        assert_eq!(EncryptedEnvelope::parse(r#"{"tag":"OTHER"}"#), None);
        assert_eq!(EncryptedEnvelope::parse("not json"), None);
    }
}

//! Session password custody and async envelope encryption.

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use zeroize::Zeroizing;

use super::envelope::{open, seal, EncryptedEnvelope};
use crate::error::{Result, TapestryError};

/// Holds the session password of an unlocked tapestry and runs envelope
/// encryption off the async executor.
///
/// The password lives only in memory for the lifetime of the unlocked
/// session and is never written anywhere.
#[derive(Default)]
pub struct CryptoGuard {
    session: Option<SecretString>,
}

impl CryptoGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_session_password(&mut self, password: &str) {
        self.session = Some(SecretString::from(password.to_string()));
    }

    pub fn session_password(&self) -> Option<&SecretString> {
        self.session.as_ref()
    }

    pub fn clear_session(&mut self) {
        self.session = None;
    }

    /// Remove and return the session password.
    pub fn take_session(&mut self) -> Option<SecretString> {
        self.session.take()
    }

    /// Put back a session previously returned by [`take_session`](Self::take_session).
    pub fn restore_session(&mut self, session: Option<SecretString>) {
        self.session = session;
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Serialize `data` to JSON and seal it under `password`.
    pub async fn encrypt<T: Serialize + ?Sized>(
        data: &T,
        password: &str,
    ) -> Result<EncryptedEnvelope> {
        if password.is_empty() {
            return Err(TapestryError::Crypto(
                "A password is required to encrypt".to_string(),
            ));
        }
        let plaintext = Zeroizing::new(serde_json::to_vec(data)?);
        let password = Zeroizing::new(password.to_string());
        tokio::task::spawn_blocking(move || seal(&plaintext, &password))
            .await
            .map_err(|e| TapestryError::Crypto(format!("Encryption task failed: {}", e)))?
    }

    /// Open `envelope` with `password` and decode the JSON payload.
    ///
    /// A payload that decrypts but does not decode as `T` is reported the
    /// same way as a wrong password.
    pub async fn decrypt<T: DeserializeOwned>(
        envelope: &EncryptedEnvelope,
        password: &str,
    ) -> Result<T> {
        let envelope = envelope.clone();
        let password = Zeroizing::new(password.to_string());
        let plaintext = tokio::task::spawn_blocking(move || open(&envelope, &password))
            .await
            .map_err(|_| TapestryError::DecryptionFailed)??;
        let plaintext = Zeroizing::new(plaintext);
        serde_json::from_slice(&plaintext).map_err(|_| TapestryError::DecryptionFailed)
    }

    /// Seal `data` under the current session password.
    pub async fn encrypt_with_session<T: Serialize + ?Sized>(
        &self,
        data: &T,
    ) -> Result<EncryptedEnvelope> {
        let password = self
            .session
            .as_ref()
            .ok_or_else(|| TapestryError::Crypto("No session password is set".to_string()))?;
        Self::encrypt(data, password.expose_secret()).await
    }
}

impl std::fmt::Debug for CryptoGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CryptoGuard")
            .field("has_session", &self.has_session())
            .finish()
    }
}

//! Password policy for enabling encryption.
//!
//! The envelope format accepts any non-empty password; this policy is what
//! operator tooling enforces before a new password is put to use.

use crate::error::{Result, TapestryError};

/// Minimum password length in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Validate a password meets the minimum requirements.
///
/// # Examples
///
/// ```
/// use marq_core::crypto::validate_password;
///
/// assert!(validate_password("woven-threads-42").is_ok());
/// assert!(validate_password("short").is_err());
/// ```
pub fn validate_password(password: &str) -> Result<()> {
    if password.trim().is_empty() {
        return Err(TapestryError::InvalidInput(
            "Password cannot be empty".to_string(),
        ));
    }

    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        return Err(TapestryError::InvalidInput(format!(
            "Password must be at least {} characters (got {})",
            MIN_PASSWORD_LENGTH, length
        )));
    }

    Ok(())
}

//! Password handling and unlocking with retry logic.

use std::future::Future;
use std::io::IsTerminal;
use std::time::Duration;

use dialoguer::Password;
use indicatif::ProgressBar;
use zeroize::Zeroizing;

use marq_core::crypto::validate_password;

use crate::constants::{MAX_PASSWORD_ATTEMPTS, PASSWORD_ENV};
use crate::errors::CliError;

use super::context::Ledger;

/// Read the password from MARQ_PASSWORD, ignoring blank values.
fn env_password() -> Option<Zeroizing<String>> {
    std::env::var(PASSWORD_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(Zeroizing::new)
}

/// Unlock a locked ledger from MARQ_PASSWORD or an interactive prompt.
///
/// The environment password gets exactly one try; the prompt allows
/// `MAX_PASSWORD_ATTEMPTS`.
pub async fn unlock_with_retry(
    ledger: &mut Ledger,
    interactive: bool,
    quiet: bool,
) -> anyhow::Result<()> {
    if let Some(password) = env_password() {
        if with_spinner(interactive && !quiet, ledger.unlock(&password)).await? {
            return Ok(());
        }
        return Err(CliError::auth_failed_with_hint(
            "Incorrect password",
            format!("Hint: Check the {} environment variable.", PASSWORD_ENV),
        )
        .into());
    }

    if !interactive {
        return Err(CliError::auth_failed_with_hint(
            "The tapestry is encrypted and no password was provided",
            format!("Hint: Set {} or run from a terminal.", PASSWORD_ENV),
        )
        .into());
    }

    for attempt in 1..=MAX_PASSWORD_ATTEMPTS {
        let password = Zeroizing::new(
            Password::new()
                .with_prompt("Password")
                .interact()
                .map_err(|e| anyhow::anyhow!("Failed to read password: {}", e))?,
        );
        if with_spinner(!quiet, ledger.unlock(&password)).await? {
            return Ok(());
        }
        let remaining = MAX_PASSWORD_ATTEMPTS - attempt;
        if remaining > 0 {
            eprintln!(
                "Incorrect password ({} attempt{} left)",
                remaining,
                if remaining == 1 { "" } else { "s" }
            );
        }
    }

    Err(CliError::auth_failed("Too many failed password attempts").into())
}

/// Ask for a new encryption password, or take it from MARQ_PASSWORD.
pub fn prompt_new_password(interactive: bool) -> anyhow::Result<Zeroizing<String>> {
    let password = match env_password() {
        Some(password) => password,
        None if interactive => Zeroizing::new(
            Password::new()
                .with_prompt("New password")
                .with_confirmation("Confirm password", "Passwords do not match")
                .interact()
                .map_err(|e| anyhow::anyhow!("Failed to read password: {}", e))?,
        ),
        None => {
            return Err(CliError::invalid_input(format!(
                "No password provided and no TTY available. Set {}.",
                PASSWORD_ENV
            ))
            .into())
        }
    };
    validate_password(&password).map_err(|e| CliError::invalid_input(e.to_string()))?;
    Ok(password)
}

/// Show a spinner on stderr while key derivation runs.
pub async fn with_spinner<F: Future>(enabled: bool, work: F) -> F::Output {
    if !enabled || !std::io::stderr().is_terminal() {
        return work.await;
    }
    let spinner = ProgressBar::new_spinner();
    spinner.set_message("Deriving key...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    let output = work.await;
    spinner.finish_and_clear();
    output
}

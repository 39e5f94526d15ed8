pub mod init;
pub mod maintenance;
pub mod misc;
pub mod scroll;
pub mod security;
pub mod threads;

use marq_core::TapestryError;

use crate::errors::CliError;

/// Map rejected user input to `CliError::InvalidInput`, leaving other
/// failures as they are.
pub(crate) fn reject_input(err: TapestryError) -> anyhow::Error {
    match err {
        TapestryError::Validation(_) | TapestryError::InvalidInput(_) | TapestryError::Import(_) => {
            CliError::invalid_input(err.to_string()).into()
        }
        other => other.into(),
    }
}

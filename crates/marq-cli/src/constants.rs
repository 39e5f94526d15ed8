//! Constants used throughout the CLI.

/// Environment variable holding the tapestry password.
pub const PASSWORD_ENV: &str = "MARQ_PASSWORD";

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "MARQ_CONFIG";

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "MARQ_LOG";

/// Password prompts allowed before giving up.
pub const MAX_PASSWORD_ATTEMPTS: usize = 3;

/// Exit codes for the CLI.
///
/// These follow common Unix conventions:
/// - 0: Success
/// - 1: General error (used by anyhow for unhandled errors)
/// - 2: Misuse of shell command (reserved by shells)
/// - 3+: Application-specific errors
pub mod exit_codes {
    /// Resource not found (config, tapestry).
    pub const NOT_FOUND: i32 = 3;

    /// Invalid user input or arguments, including rejected scrolls.
    pub const INVALID_INPUT: i32 = 4;

    /// Authentication failed (wrong password, too many attempts).
    pub const AUTH_FAILED: i32 = 5;

    /// Integrity check failed.
    pub const INTEGRITY_FAILED: i32 = 6;
}

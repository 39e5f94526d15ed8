//! Application-level utilities for the Marq CLI.
//!
//! This module provides:
//! - Path resolution for the config file and tapestry
//! - Opening the configured backend
//! - Password handling with retry logic

mod context;
mod password;
mod resolver;

// Re-export public API
pub use context::{open_target, AppContext};
pub use password::{prompt_new_password, with_spinner};
pub use resolver::{resolve_config_path, Target};

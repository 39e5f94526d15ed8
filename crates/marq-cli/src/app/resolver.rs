//! Path resolution for the config file and tapestry.

use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::config::{default_config_path, read_config, Backend, MarqConfig};
use crate::constants::CONFIG_ENV;
use crate::errors::CliError;

/// Fully resolved location of a tapestry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub path: PathBuf,
    pub backend: Backend,
    pub storage_key: String,
}

impl Target {
    pub fn exists(&self) -> bool {
        match self.backend {
            Backend::File => self.path.is_dir(),
            Backend::Sqlite => self.path.is_file(),
        }
    }
}

/// Resolve the config file path, checking MARQ_CONFIG env var first.
pub fn resolve_config_path() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var(CONFIG_ENV) {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value));
        }
    }
    default_config_path()
}

/// Load the config file if one has been written.
pub fn load_config() -> anyhow::Result<Option<MarqConfig>> {
    let config_path = resolve_config_path()?;
    if !config_path.exists() {
        return Ok(None);
    }
    read_config(&config_path).map(Some)
}

/// Resolve the tapestry from CLI args or config.
///
/// An explicit `--tapestry` wins over the configured path; its backend is
/// inferred from the path unless it names the configured tapestry.
pub fn resolve_target(cli: &Cli, config: Option<&MarqConfig>) -> anyhow::Result<Target> {
    let storage_key = config
        .map(|c| c.tapestry.storage_key.clone())
        .unwrap_or_else(|| marq_core::config::DEFAULT_STORAGE_KEY.to_string());

    if let Some(path) = cli.tapestry.as_deref() {
        let path = PathBuf::from(path);
        let backend = match config {
            Some(c) if Path::new(&c.tapestry.path) == path => c.tapestry.backend,
            _ => Backend::infer(&path),
        };
        return Ok(Target {
            path,
            backend,
            storage_key,
        });
    }

    let Some(config) = config else {
        let config_path = resolve_config_path()?;
        return Err(CliError::not_found(
            format!("No tapestry configured at {}", config_path.display()),
            "Hint: Run `marq init` or set MARQ_TAPESTRY=/path/to/tapestry",
        )
        .into());
    };

    Ok(Target {
        path: PathBuf::from(&config.tapestry.path),
        backend: config.tapestry.backend,
        storage_key,
    })
}

/// Error message when the tapestry itself is missing.
pub fn missing_tapestry_message(target: &Target) -> String {
    format!(
        "No {} tapestry found at {}",
        target.backend,
        target.path.display()
    )
}

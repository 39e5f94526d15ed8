use std::fmt;
use std::path::{Path, PathBuf};

use marq_core::config::DEFAULT_STORAGE_KEY;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarqConfig {
    pub tapestry: TapestrySection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapestrySection {
    pub path: String,
    #[serde(default)]
    pub backend: Backend,
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
}

/// Where the thread list is kept on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// A directory holding one JSON file per key
    #[default]
    File,
    /// A single SQLite database
    Sqlite,
}

impl Backend {
    /// Guess the backend from a path: database extensions mean SQLite.
    pub fn infer(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("db") | Some("sqlite") | Some("sqlite3") => Backend::Sqlite,
            _ => Backend::File,
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::File => write!(f, "file"),
            Backend::Sqlite => write!(f, "sqlite"),
        }
    }
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

impl MarqConfig {
    pub fn new(tapestry_path: PathBuf, backend: Backend) -> Self {
        Self {
            tapestry: TapestrySection {
                path: tapestry_path.to_string_lossy().to_string(),
                backend,
                storage_key: default_storage_key(),
            },
        }
    }
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_config_dir()?.join("config.toml"))
}

pub fn default_tapestry_path(backend: Backend) -> anyhow::Result<PathBuf> {
    let data = xdg_data_dir()?;
    Ok(match backend {
        Backend::File => data.join("tapestry"),
        Backend::Sqlite => data.join("tapestry.db"),
    })
}

pub fn read_config(path: &Path) -> anyhow::Result<MarqConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
    toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))
}

pub fn write_config(path: &Path, config: &MarqConfig) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            anyhow::anyhow!(
                "Failed to create config directory {}: {}",
                parent.display(),
                e
            )
        })?;
    }
    let contents =
        toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("TOML error: {}", e))?;
    std::fs::write(path, contents)
        .map_err(|e| anyhow::anyhow!("Failed to write config {}: {}", path.display(), e))?;
    Ok(())
}

pub fn xdg_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_CONFIG_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("marq"));
        }
    }
    Ok(home_dir()?.join(".config").join("marq"))
}

pub fn xdg_data_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_DATA_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("marq"));
        }
    }
    Ok(home_dir()?.join(".local").join("share").join("marq"))
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve default paths"))?;
    Ok(PathBuf::from(home))
}

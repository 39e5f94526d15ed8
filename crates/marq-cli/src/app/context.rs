//! Application context for the Marq CLI.
//!
//! Bundles the parsed CLI arguments with the lazily-loaded config file and
//! knows how to open the configured tapestry.

use std::io::IsTerminal;
use std::sync::Arc;

use once_cell::unsync::OnceCell;
use tracing::debug;

use marq_core::{
    FileStore, KeyValueStore, LedgerStatus, SqliteStore, TapestryConfig, TapestryLedger,
};

use crate::cli::Cli;
use crate::config::{Backend, MarqConfig};
use crate::errors::CliError;

use super::password::unlock_with_retry;
use super::resolver::{load_config, missing_tapestry_message, resolve_target, Target};

/// Ledger over whichever backend the config selects.
pub type Ledger = TapestryLedger<Arc<dyn KeyValueStore>>;

pub struct AppContext<'a> {
    cli: &'a Cli,
    config: OnceCell<Option<MarqConfig>>,
}

impl<'a> AppContext<'a> {
    /// Create a new application context from CLI arguments.
    pub fn new(cli: &'a Cli) -> Self {
        Self {
            cli,
            config: OnceCell::new(),
        }
    }

    /// Get the CLI arguments.
    pub fn cli(&self) -> &Cli {
        self.cli
    }

    /// Check if quiet mode is enabled.
    pub fn quiet(&self) -> bool {
        self.cli.quiet
    }

    /// Prompts are allowed only on a terminal and without `--no-input`.
    pub fn interactive(&self) -> bool {
        std::io::stdin().is_terminal() && !self.cli.no_input
    }

    /// Get the config file contents, loading them lazily if needed.
    pub fn config(&self) -> anyhow::Result<Option<&MarqConfig>> {
        self.config
            .get_or_try_init(load_config)
            .map(Option::as_ref)
    }

    pub fn target(&self) -> anyhow::Result<Target> {
        resolve_target(self.cli, self.config()?)
    }

    /// Open the tapestry, unlocking it when it is encrypted.
    pub async fn open_ledger(&self) -> anyhow::Result<Ledger> {
        let target = self.target()?;
        if !target.exists() {
            return Err(CliError::not_found(
                missing_tapestry_message(&target),
                "Hint: Run `marq init` to create it.",
            )
            .into());
        }

        debug!(
            path = %target.path.display(),
            backend = %target.backend,
            "opening tapestry"
        );
        let mut ledger = open_target(&target)?;
        ledger.initialize().await?;
        if ledger.status() == LedgerStatus::Locked {
            unlock_with_retry(&mut ledger, self.interactive(), self.quiet()).await?;
        }
        Ok(ledger)
    }
}

/// Build a ledger over the target's backend without loading it.
pub fn open_target(target: &Target) -> anyhow::Result<Ledger> {
    let store: Arc<dyn KeyValueStore> = match target.backend {
        Backend::File => Arc::new(FileStore::new(&target.path)),
        Backend::Sqlite => Arc::new(SqliteStore::open(&target.path)?),
    };
    let config = TapestryConfig::default().with_storage_key(target.storage_key.clone());
    Ok(TapestryLedger::new(store, config))
}

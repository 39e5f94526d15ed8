use std::path::PathBuf;

use marq_core::config::DEFAULT_STORAGE_KEY;
use marq_core::LedgerStatus;

use crate::app::{open_target, resolve_config_path, AppContext, Target};
use crate::cli::InitArgs;
use crate::config::{default_tapestry_path, write_config, Backend, MarqConfig};
use crate::errors::CliError;

pub async fn handle_init(ctx: &AppContext<'_>, args: &InitArgs) -> anyhow::Result<()> {
    let config_path = resolve_config_path()?;
    if config_path.exists() && !args.force {
        return Err(CliError::invalid_input(format!(
            "Config already exists at {}\nHint: Pass --force to overwrite it.",
            config_path.display()
        ))
        .into());
    }

    let explicit = args
        .path
        .clone()
        .or_else(|| ctx.cli().tapestry.clone())
        .map(PathBuf::from);
    let backend = args
        .backend
        .or_else(|| explicit.as_deref().map(Backend::infer))
        .unwrap_or_default();
    let path = match explicit {
        Some(path) if path.is_relative() => std::env::current_dir()?.join(path),
        Some(path) => path,
        None => default_tapestry_path(backend)?,
    };

    let target = Target {
        path,
        backend,
        storage_key: DEFAULT_STORAGE_KEY.to_string(),
    };
    let create_dir = match backend {
        Backend::File => Some(target.path.as_path()),
        Backend::Sqlite => target.path.parent(),
    };
    if let Some(dir) = create_dir {
        std::fs::create_dir_all(dir).map_err(|e| {
            anyhow::anyhow!("Failed to create directory {}: {}", dir.display(), e)
        })?;
    }

    let mut ledger = open_target(&target)?;
    ledger.initialize().await?;
    let existing = match ledger.status() {
        LedgerStatus::Locked => Some("an encrypted tapestry".to_string()),
        LedgerStatus::Ready if !ledger.is_empty() => {
            Some(format!("a tapestry with {} threads", ledger.len()))
        }
        _ => {
            ledger.clear().await?;
            None
        }
    };

    write_config(&config_path, &MarqConfig::new(target.path.clone(), backend))?;

    if !ctx.quiet() {
        match existing {
            Some(found) => println!("Found {} at {}", found, target.path.display()),
            None => println!(
                "Initialized {} tapestry at {}",
                backend,
                target.path.display()
            ),
        }
        println!("Config written to {}", config_path.display());
    }
    Ok(())
}

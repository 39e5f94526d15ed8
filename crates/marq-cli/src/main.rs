//! Marq CLI - operator tooling for a tamper-evident, encryptable tapestry
//!
//! This is the command-line interface for Marq. It opens the configured
//! tapestry through the core library and exposes its operations as
//! subcommands.

mod app;
mod cli;
mod commands;
mod config;
mod constants;
mod errors;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::app::AppContext;
use crate::cli::{Cli, Commands};
use crate::commands::{init, maintenance, misc, scroll, security, threads};
use crate::constants::LOG_ENV;
use crate::errors::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing();
    let ctx = AppContext::new(&cli);

    if let Err(e) = run(&ctx, &cli).await {
        if let Some(cli_error) = e.downcast_ref::<CliError>() {
            cli_error.exit();
        }

        let error_msg = format!("{:#}", e);
        eprintln!("Error: {}", error_msg);
        if let Some(hint) = extract_error_hint(&error_msg) {
            eprintln!("{}", hint);
        }
        std::process::exit(1);
    }
}

/// Log to stderr, filtered by MARQ_LOG (default `warn`).
fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Extract a hint from an error message if it contains "Hint:",
/// or provide contextual hints for common error types.
fn extract_error_hint(error: &str) -> Option<String> {
    if error.contains("\nHint:") {
        return None;
    }

    let error_lower = error.to_lowercase();

    if error_lower.contains("not been initialized") {
        return Some("Hint: Run `marq init` to create a tapestry.".to_string());
    }

    if error_lower.contains("locked") {
        return Some(format!(
            "Hint: Set {} to unlock the tapestry.",
            constants::PASSWORD_ENV
        ));
    }

    if error_lower.contains("storage") || error_lower.contains("failed to read") {
        return Some(
            "Hint: Check that the tapestry path exists and is readable and writable.".to_string(),
        );
    }

    None
}

async fn run(ctx: &AppContext<'_>, cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Init(args) => init::handle_init(ctx, args).await,
        Commands::Add(args) => threads::handle_add(ctx, args).await,
        Commands::List(args) => threads::handle_list(ctx, args).await,
        Commands::Verify => maintenance::handle_verify(ctx).await,
        Commands::Export(args) => scroll::handle_export(ctx, args).await,
        Commands::Import(args) => scroll::handle_import(ctx, args).await,
        Commands::Encrypt => security::handle_encrypt(ctx).await,
        Commands::Decrypt => security::handle_decrypt(ctx).await,
        Commands::Status => maintenance::handle_status(ctx).await,
        Commands::Clear(args) => maintenance::handle_clear(ctx, args).await,
        Commands::Completions { shell } => misc::handle_completions(*shell),
    }
}

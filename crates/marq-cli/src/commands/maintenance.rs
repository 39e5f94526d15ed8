use marq_core::LedgerStatus;

use crate::app::{open_target, AppContext};
use crate::cli::ClearArgs;
use crate::errors::CliError;
use crate::output::{status_badge, use_color};

pub async fn handle_verify(ctx: &AppContext<'_>) -> anyhow::Result<()> {
    let mut ledger = ctx.open_ledger().await?;
    ledger.verify_integrity();
    let report = ledger.integrity_report();
    let color = use_color();

    if report.verified {
        if !ctx.quiet() {
            println!("Integrity check: {}", status_badge(true, color));
            println!("- threads: {}", report.thread_count);
        }
        return Ok(());
    }

    eprintln!("Integrity check: {}", status_badge(false, color));
    eprintln!("- threads: {}", report.thread_count);
    if let Some(corrupted) = &report.first_corrupted {
        eprintln!(
            "- first broken thread: #{} ({})",
            corrupted.index + 1,
            corrupted.id
        );
    }
    eprintln!("Hint: Restore from an exported scroll before weaving more threads.");
    Err(CliError::integrity_failed("Integrity check failed").into())
}

pub async fn handle_status(ctx: &AppContext<'_>) -> anyhow::Result<()> {
    let target = ctx.target()?;
    println!("Tapestry: {}", target.path.display());
    println!("Backend: {}", target.backend);
    if !target.exists() {
        println!("Status: {}", LedgerStatus::Uninitialized);
        return Ok(());
    }

    let mut ledger = open_target(&target)?;
    ledger.initialize().await?;
    println!("Status: {}", ledger.status());
    if ledger.status() == LedgerStatus::Locked {
        println!("Encryption: enabled");
        println!("Threads: unavailable while locked");
        return Ok(());
    }

    let report = ledger.integrity_report();
    println!("Encryption: disabled");
    println!("Threads: {}", report.thread_count);
    println!("Integrity: {}", status_badge(report.verified, use_color()));
    Ok(())
}

pub async fn handle_clear(ctx: &AppContext<'_>, args: &ClearArgs) -> anyhow::Result<()> {
    let mut ledger = ctx.open_ledger().await?;

    if !args.yes {
        if !ctx.interactive() {
            return Err(CliError::invalid_input(
                "Refusing to clear without confirmation\nHint: Pass --yes to skip the prompt.",
            )
            .into());
        }
        let proceed = dialoguer::Confirm::new()
            .with_prompt(format!("Remove all {} threads?", ledger.len()))
            .default(false)
            .interact()?;
        if !proceed {
            return Err(anyhow::anyhow!("Clear cancelled"));
        }
    }

    let count = ledger.len();
    ledger.clear().await?;
    if !ctx.quiet() {
        println!("Removed {} threads.", count);
    }
    Ok(())
}

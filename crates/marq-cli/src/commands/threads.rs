use marq_core::NewThread;

use crate::app::AppContext;
use crate::cli::{AddArgs, ListArgs};
use crate::output::{tail, thread_summary, thread_table};

use super::reject_input;

pub async fn handle_add(ctx: &AppContext<'_>, args: &AddArgs) -> anyhow::Result<()> {
    let mut ledger = ctx.open_ledger().await?;
    let thread = ledger
        .add_thread(NewThread::new(
            args.intention,
            args.time,
            args.region.as_str(),
            args.title.as_str(),
        ))
        .await
        .map_err(reject_input)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&thread)?);
    } else if !ctx.quiet() {
        println!("{}", thread_summary(&thread));
    }
    Ok(())
}

pub async fn handle_list(ctx: &AppContext<'_>, args: &ListArgs) -> anyhow::Result<()> {
    let ledger = ctx.open_ledger().await?;
    let threads = ledger.threads();
    let shown = tail(&threads, args.limit);

    if args.json {
        println!("{}", serde_json::to_string_pretty(shown)?);
        return Ok(());
    }

    if shown.is_empty() {
        if !ctx.quiet() {
            println!("No threads yet.");
        }
        return Ok(());
    }
    println!("{}", thread_table(shown));
    if !ctx.quiet() && !ledger.is_integrity_verified() {
        eprintln!("Warning: the hash chain is broken. Run `marq verify` for details.");
    }
    Ok(())
}

use std::io::Read;

use marq_core::{ImportError, TapestryError};

use crate::app::AppContext;
use crate::cli::{ExportArgs, ImportArgs};

use super::reject_input;

pub async fn handle_export(ctx: &AppContext<'_>, args: &ExportArgs) -> anyhow::Result<()> {
    let ledger = ctx.open_ledger().await?;
    let scroll = ledger.export_scroll()?;

    match args.output.as_deref() {
        Some(path) => {
            std::fs::write(path, format!("{}\n", scroll))
                .map_err(|e| anyhow::anyhow!("Failed to write {}: {}", path, e))?;
            if !ctx.quiet() {
                println!("Exported {} threads to {}", ledger.len(), path);
            }
        }
        None => println!("{}", scroll),
    }
    Ok(())
}

pub async fn handle_import(ctx: &AppContext<'_>, args: &ImportArgs) -> anyhow::Result<()> {
    let mut ledger = ctx.open_ledger().await?;
    let scroll = read_scroll(&args.file, ledger.config().max_import_bytes)?;
    let count = ledger.import_scroll(&scroll).await.map_err(reject_input)?;
    if !ctx.quiet() {
        println!("Imported {} threads", count);
    }
    Ok(())
}

/// Read at most `max + 1` bytes so oversized scrolls are rejected without
/// loading them whole.
fn read_scroll(path: &str, max: usize) -> anyhow::Result<String> {
    let too_large =
        |size: usize| reject_input(TapestryError::Import(ImportError::TooLarge { size, max }));

    let mut buffer = String::new();
    if path == "-" {
        std::io::stdin()
            .lock()
            .take(max as u64 + 1)
            .read_to_string(&mut buffer)
            .map_err(|e| anyhow::anyhow!("Failed to read stdin: {}", e))?;
    } else {
        let file = std::fs::File::open(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path, e))?;
        let size = file
            .metadata()
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path, e))?
            .len();
        if size > max as u64 {
            return Err(too_large(usize::try_from(size).unwrap_or(usize::MAX)));
        }
        file.take(max as u64 + 1)
            .read_to_string(&mut buffer)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path, e))?;
    }

    if buffer.len() > max {
        return Err(too_large(buffer.len()));
    }
    Ok(buffer)
}

use crate::app::{prompt_new_password, with_spinner, AppContext};

pub async fn handle_encrypt(ctx: &AppContext<'_>) -> anyhow::Result<()> {
    let mut ledger = ctx.open_ledger().await?;
    if ledger.has_session() {
        if !ctx.quiet() {
            println!("Tapestry is already encrypted.");
        }
        return Ok(());
    }

    let password = prompt_new_password(ctx.interactive())?;
    with_spinner(!ctx.quiet(), ledger.enable_encryption(&password)).await?;
    if !ctx.quiet() {
        println!("Encryption enabled for {} threads.", ledger.len());
        println!("Keep the password safe: there is no way to recover it.");
    }
    Ok(())
}

pub async fn handle_decrypt(ctx: &AppContext<'_>) -> anyhow::Result<()> {
    let mut ledger = ctx.open_ledger().await?;
    let changed = ledger.disable_encryption().await?;
    if !ctx.quiet() {
        if changed {
            println!("Encryption disabled; threads are stored as plain JSON.");
        } else {
            println!("Tapestry is not encrypted.");
        }
    }
    Ok(())
}

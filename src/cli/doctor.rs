//! CLI `doctor` command: check the vault and configuration and print a report.

use anyhow::{Context, Result};

use crate::config::NoteportConfig;
use crate::vault::fs::FsVault;
use crate::vault::DocumentStore;

/// Print a health report for the configured vault.
pub fn doctor(config: &NoteportConfig) -> Result<()> {
    let vault_path = config.resolved_vault_path();

    println!("Noteport Health Report");
    println!("======================");
    println!();
    println!("Vault path:        {}", vault_path.display());

    if !vault_path.is_dir() {
        println!("Vault status:      NOT FOUND");
        println!("Create the directory or set vault.path / NOTEPORT_VAULT.");
    } else {
        let vault = FsVault::open(vault_path.clone(), Some(config.vault.name.clone()))
            .context("failed to open vault")?;
        let documents = vault.list().context("failed to list vault")?;
        let notes = documents.iter().filter(|p| p.ends_with(".md")).count();
        println!("Vault name:        {}", vault.name());
        println!("Documents:         {}", documents.len());
        println!("  Markdown notes:  {notes}");
    }

    println!();
    println!("Listen address:    http://{}/rpc", config.bind_addr());
    println!(
        "API key:           {}",
        if config.server.api_key.is_empty() {
            "NOT SET (serve will refuse to start)"
        } else {
            "configured"
        }
    );
    println!(
        "Rate limit:        {} requests / {}s per client",
        config.rate_limit.max_requests, config.rate_limit.window_secs
    );
    println!(
        "Dataview:          {}",
        if config.dataview.enabled { "enabled" } else { "disabled" }
    );
    println!(
        "Heading targets:   {}",
        if config.patch.literal_headings { "literal" } else { "regex" }
    );

    Ok(())
}

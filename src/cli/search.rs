use anyhow::{Context, Result};

use crate::config::NoteportConfig;
use crate::note::search::search_vault;
use crate::vault::fs::FsVault;

/// Run a text search from the terminal.
pub fn search(config: &NoteportConfig, query: &str, context_length: usize) -> Result<()> {
    let vault_path = config.resolved_vault_path();
    let vault = FsVault::open(vault_path.clone(), Some(config.vault.name.clone()))
        .with_context(|| format!("failed to open vault at {}", vault_path.display()))?;

    let matches = search_vault(&vault, query, context_length)?;
    if matches.is_empty() {
        println!("No matches found.");
        return Ok(());
    }

    println!("Found {} match(es)\n", matches.len());
    for (i, m) in matches.iter().enumerate() {
        println!("  {}. {} @ {}", i + 1, m.file, m.position);
        println!("     {}", m.context.replace('\n', " "));
        println!();
    }

    Ok(())
}

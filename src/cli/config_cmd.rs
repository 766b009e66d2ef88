//! Config CLI commands

use anyhow::Result;
use clap::Subcommand;

use super::output::Output;
use crate::domain::Category;
use crate::storage::Vault;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the current root folders and item settings
    Show,

    /// Change one root folder
    ///
    /// Examples:
    ///   para config set projects "1 Projects"
    ///   para config set archive Work/Archive
    Set {
        /// Category: projects, areas, resources or archive
        category: String,

        /// New folder, relative to the vault
        path: String,
    },

    /// Restore the default root folders
    Reset,
}

pub fn run(cmd: ConfigCommands, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Show => show(output),
        ConfigCommands::Set { category, path } => set(output, &category, &path),
        ConfigCommands::Reset => reset(output),
    }
}

fn warn_if_repaired(output: &Output, vault: &Vault) {
    if let Some(conflict) = vault.repaired_conflict() {
        output.warn(&format!("{}; using default root folders", conflict));
    }
}

fn show(output: &Output) -> Result<()> {
    let vault = Vault::open_current()?;
    warn_if_repaired(output, &vault);

    let config = &vault.config().vault;

    if output.is_json() {
        output.data(&serde_json::json!({
            "roots": config.roots,
            "items": config.items,
            "repaired": vault.repaired_conflict(),
        }));
    } else {
        println!("Root folders:");
        for (category, dir) in config.roots.entries() {
            println!("  {:<10} {}", category.label(), dir);
        }
        println!();
        println!("Items:");
        println!("  name_format    {}", config.items.name_format);
        println!("  sort           {}", config.items.sort.as_str());
        println!("  index_document {}", config.items.index_document);
    }

    Ok(())
}

fn set(output: &Output, category: &str, path: &str) -> Result<()> {
    let category: Category = category.parse()?;
    let mut vault = Vault::open_current()?;
    warn_if_repaired(output, &vault);

    output.verbose_ctx(
        "config",
        &format!("Validating {} folder '{}' against the other roots", category, path),
    );
    vault.config_mut().set_root(category, path)?;
    vault.config().save_vault()?;

    let new_root = vault.config().vault.roots.root(category);
    if output.is_json() {
        output.data(&serde_json::json!({
            "category": category,
            "path": new_root,
        }));
    } else {
        output.success(&format!("{} folder set to '{}'", category, new_root));
    }

    Ok(())
}

fn reset(output: &Output) -> Result<()> {
    let mut vault = Vault::open_current()?;
    vault.config_mut().reset_roots();
    vault.config().save_vault()?;

    output.success("Root folders reset to defaults");
    Ok(())
}

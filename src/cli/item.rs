//! Item CLI commands (list, new, archive)

use anyhow::Result;

use super::output::Output;
use crate::domain::Category;
use crate::storage::{ArchiveOutcome, Archiver, TemplateRenderer, Vault};

/// Lists top-level items of one or all active categories
pub fn list(output: &Output, category: Option<&str>) -> Result<()> {
    let vault = Vault::open_current()?;
    if let Some(conflict) = vault.repaired_conflict() {
        output.warn(&format!("{}; using default root folders", conflict));
    }

    let categories = match category {
        Some(name) => vec![name.parse::<Category>()?],
        None => Category::ACTIVE.to_vec(),
    };

    let mut listed = Vec::new();
    for category in categories {
        let items = vault.list_items(category)?;
        output.verbose_ctx("list", &format!("{}: {} items", category, items.len()));
        listed.push((category, items));
    }

    if output.is_json() {
        let items: Vec<_> = listed
            .iter()
            .flat_map(|(category, items)| {
                items.iter().map(move |item| {
                    serde_json::json!({
                        "category": category,
                        "path": item.path,
                        "name": item.name,
                    })
                })
            })
            .collect();
        output.data(&items);
        return Ok(());
    }

    for (i, (category, items)) in listed.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("{} ({}):", category, vault.config().vault.roots.root(*category));
        if items.is_empty() {
            println!("  (empty)");
        }
        for item in items {
            println!("  {}", item.name);
        }
    }

    Ok(())
}

/// Creates a new item folder with its index document
pub fn create(output: &Output, category: &str, name: &str, template: Option<&str>) -> Result<()> {
    let category: Category = category.parse()?;
    let vault = Vault::open_current()?;
    if let Some(conflict) = vault.repaired_conflict() {
        anyhow::bail!("Cannot create items while root folders conflict: {}", conflict);
    }

    let renderer = TemplateRenderer::new(vault.templates_dir());
    let created = vault.create_item(category, name, template, &renderer)?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "created": created,
            "category": category,
        }));
    } else {
        output.success(&format!("Created {}", created));
    }

    Ok(())
}

/// Archives a top-level item
pub fn archive(output: &Output, item: &str) -> Result<()> {
    let vault = Vault::open_current()?;
    if let Some(conflict) = vault.repaired_conflict() {
        anyhow::bail!("Cannot archive while root folders conflict: {}", conflict);
    }

    let item = vault.resolve_item_arg(item);
    output.verbose_ctx("archive", &format!("Resolved vault path: {}", item));

    let outcome = vault.archive(&item, &Archiver::new())?;

    if output.is_json() {
        output.data(&outcome);
        return Ok(());
    }

    match outcome {
        ArchiveOutcome::Archived { from, to, attempts } => {
            output.verbose_ctx("archive", &format!("Moved after {} attempt(s)", attempts));
            output.success(&format!("Archived {} to {}", from, to));
        }
        ArchiveOutcome::AlreadyInProgress { path } => {
            output.success(&format!("Already archiving {}", path));
        }
    }

    Ok(())
}

//! Vault management
//!
//! A vault is a directory with a `.para/` folder. It owns the configuration
//! and hands out storage, listing, creation and archiving on top of it.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use thiserror::Error;

use super::archiver::{ArchiveOutcome, Archiver};
use super::config::{Config, PARA_DIR};
use super::fs::{FsStorage, Storage};
use super::templates::ContentRenderer;
use crate::domain::{
    extract_date_prefix_format, format_item_name, path, sort_items, Category, ConflictReport,
    ListedItem,
};

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Not in a para vault. Run 'para init' first.")]
    NotInVault,

    #[error("Items cannot be created in the Archive folder")]
    CreateInArchive,

    #[error("Invalid item name: '{0}'")]
    InvalidName(String),
}

const DEFAULT_CONFIG: &str = r#"# para configuration

# Root folders, relative to the vault. They must not overlap.
[roots]
projects = "Projects"
areas = "Areas"
resources = "Resources"
archive = "Archive"

[items]
# Folder name for new items. {name} is replaced; text before it is a
# strftime date prefix, e.g. "%Y-%m-%d {name}"
name_format = "{name}"

# Listing order: recency, name_date or alphabetical
sort = "recency"

# Create an index document inside new items
index_document = true
"#;

/// A PARA vault
pub struct Vault {
    root: PathBuf,
    config: Config,
    repaired: Option<ConflictReport>,
}

impl Vault {
    /// Opens an existing vault at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        if !root.join(PARA_DIR).is_dir() {
            return Err(VaultError::NotInVault.into());
        }

        let mut config = Config::for_vault(&root)?;
        let repaired = config.repair();

        Ok(Self {
            root,
            config,
            repaired,
        })
    }

    /// Opens the vault at the current directory or a parent
    pub fn open_current() -> Result<Self> {
        let root = Config::find_vault_root().ok_or(VaultError::NotInVault)?;

        Self::open(root)
    }

    /// Initializes a new vault at the given path
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let para_dir = root.join(PARA_DIR);

        fs::create_dir_all(&para_dir)
            .with_context(|| format!("Failed to create .para directory: {}", para_dir.display()))?;

        let templates_dir = para_dir.join("templates");
        fs::create_dir_all(&templates_dir).with_context(|| {
            format!(
                "Failed to create templates directory: {}",
                templates_dir.display()
            )
        })?;

        let config_path = Config::vault_config_path(&root);
        if !config_path.exists() {
            fs::write(&config_path, DEFAULT_CONFIG)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        let vault = Self::open(root)?;
        let storage = vault.storage();
        for (_, dir) in vault.config.vault.roots.entries() {
            storage
                .ensure_directory_exists(&dir)
                .with_context(|| format!("Failed to create root folder '{}'", dir))?;
        }

        Ok(vault)
    }

    /// Returns the vault root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the .para directory path
    pub fn para_dir(&self) -> PathBuf {
        self.root.join(PARA_DIR)
    }

    /// Returns the templates directory
    pub fn templates_dir(&self) -> PathBuf {
        self.para_dir().join("templates")
    }

    /// Returns the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns a mutable reference to the configuration
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// The conflict found in the stored roots when the vault was opened, if any.
    ///
    /// When set, [`Vault::config`] holds the default roots instead.
    pub fn repaired_conflict(&self) -> Option<&ConflictReport> {
        self.repaired.as_ref()
    }

    /// Returns the filesystem storage for this vault
    pub fn storage(&self) -> FsStorage {
        FsStorage::new(&self.root)
    }

    /// Lists the top-level items of a category in configured order
    pub fn list_items(&self, category: Category) -> Result<Vec<ListedItem>> {
        let dir = self.config.vault.roots.root(category);
        let mut items = self
            .storage()
            .list_top_level(&dir)
            .with_context(|| format!("Failed to list {} folder", category))?;

        let items_config = &self.config.vault.items;
        let prefix = extract_date_prefix_format(&items_config.name_format);
        sort_items(&mut items, items_config.sort, prefix);
        Ok(items)
    }

    /// Creates a new top-level item using today's date for the name format
    pub fn create_item(
        &self,
        category: Category,
        name: &str,
        template: Option<&str>,
        renderer: &impl ContentRenderer,
    ) -> Result<String> {
        self.create_item_on(category, name, template, renderer, Local::now().date_naive())
    }

    /// Creates `{root}/{formatted name}` and its index document
    pub fn create_item_on(
        &self,
        category: Category,
        name: &str,
        template: Option<&str>,
        renderer: &impl ContentRenderer,
        today: NaiveDate,
    ) -> Result<String> {
        if category.is_archive() {
            return Err(VaultError::CreateInArchive.into());
        }

        let name = name.trim();
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(VaultError::InvalidName(name.to_string()).into());
        }

        let items_config = &self.config.vault.items;
        let folder_name = format_item_name(&items_config.name_format, name, today)?;
        if folder_name.contains(['/', '\\']) {
            return Err(VaultError::InvalidName(folder_name).into());
        }

        let root = self.config.vault.roots.root(category);
        let item_path = path::join(&root, &folder_name);
        let storage = self.storage();

        storage.ensure_directory_exists(&root)?;
        storage.create_new_dir(&item_path)?;

        if items_config.index_document {
            let content = renderer.render_initial_content(name, template)?;
            let doc_path = path::join(&item_path, &format!("{}.md", folder_name));
            storage.write_new_file(&doc_path, &content)?;
        }

        tracing::info!(%category, item = %item_path, "created item");
        Ok(item_path)
    }

    /// Archives a top-level item
    pub fn archive(&self, item: &str, archiver: &Archiver) -> Result<ArchiveOutcome> {
        let outcome = archiver.archive(item, &self.config.vault.roots, &self.storage())?;
        Ok(outcome)
    }

    /// Converts a user-supplied path into a vault path.
    ///
    /// Existing filesystem paths (absolute or relative to the current
    /// directory) are made relative to the vault; anything else is taken
    /// as already vault-relative.
    pub fn resolve_item_arg(&self, arg: &str) -> String {
        let candidate = Path::new(arg);
        let on_disk = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            match std::env::current_dir() {
                Ok(cwd) => cwd.join(candidate),
                Err(_) => return path::normalize(arg),
            }
        };

        match (on_disk.canonicalize(), self.root.canonicalize()) {
            (Ok(full), Ok(root)) => match relative_path(&full, &root) {
                Some(rel) => rel,
                None => path::normalize(arg),
            },
            _ => path::normalize(arg),
        }
    }
}

/// `full` relative to `root` as a normalized vault path
fn relative_path(full: &Path, root: &Path) -> Option<String> {
    let rel = full.strip_prefix(root).ok()?;
    let parts: Vec<_> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(path::normalize(&parts.join("/")))
}

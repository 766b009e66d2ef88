//! Configuration handling for para-cli
//!
//! Configuration is stored in `.para/config.toml` (vault) and
//! `~/.config/para-cli/config.toml` (global).
//!
//! Vault configuration follows a load → validate → repair-or-reject →
//! persist lifecycle. Loading never trusts the stored roots: a conflicting
//! set is repaired to defaults in memory, and single-field edits are
//! rejected before they reach disk.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::vault::VaultError;

use crate::domain::{
    path, validate_root_set, validate_single_field_change, Category, ConflictReport, RootConfig,
    SortOrder,
};

/// Name of the per-vault configuration directory
pub const PARA_DIR: &str = ".para";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("{}", .0.message())]
    Conflict(ConflictReport),
}

/// Settings for top-level items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemsConfig {
    /// Folder name format for new items (placeholder: {name}).
    /// Text before {name} is a strftime date prefix.
    pub name_format: String,

    /// Listing order
    pub sort: SortOrder,

    /// Create `{folder}/{folder}.md` in new items
    pub index_document: bool,
}

impl Default for ItemsConfig {
    fn default() -> Self {
        Self {
            name_format: "{name}".to_string(),
            sort: SortOrder::Recency,
            index_document: true,
        }
    }
}

/// Vault-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// The four PARA root folders
    pub roots: RootConfig,

    /// Item creation and listing settings
    pub items: ItemsConfig,
}

/// Global user configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GlobalConfig {
    /// Default output format (text or json)
    pub default_format: OutputFormat,
}

/// Output format for commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Combined configuration (global + vault)
#[derive(Debug, Clone)]
pub struct Config {
    pub vault: VaultConfig,
    pub global: GlobalConfig,
    pub vault_root: Option<PathBuf>,
}

impl Config {
    /// Loads configuration for a specific vault
    pub fn for_vault(vault_root: &Path) -> Result<Self> {
        let global = Self::global()?;
        let vault = Self::load_vault_config(vault_root)?;

        Ok(Self {
            vault,
            global,
            vault_root: Some(vault_root.to_path_buf()),
        })
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "para", "para-cli").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Loads global configuration
    pub fn global() -> Result<GlobalConfig> {
        let config_dir = match Self::global_config_dir() {
            Some(dir) => dir,
            None => return Ok(GlobalConfig::default()),
        };

        let config_path = config_dir.join("config.toml");
        if !config_path.exists() {
            return Ok(GlobalConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read global config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse global config")
    }

    /// Returns the config file path for a vault
    pub fn vault_config_path(vault_root: &Path) -> PathBuf {
        vault_root.join(PARA_DIR).join("config.toml")
    }

    /// Loads vault configuration from a specific root
    fn load_vault_config(vault_root: &Path) -> Result<VaultConfig> {
        let config_path = Self::vault_config_path(vault_root);

        if !config_path.exists() {
            return Ok(VaultConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read vault config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse vault config")
    }

    /// Finds the vault root by looking for a `.para/` directory
    pub fn find_vault_root() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;

        loop {
            if current.join(PARA_DIR).is_dir() {
                return Some(current);
            }

            if !current.pop() {
                return None;
            }
        }
    }

    /// Returns the vault root, or an error if not in a vault
    pub fn require_vault_root(&self) -> Result<&Path> {
        self.vault_root
            .as_deref()
            .ok_or_else(|| anyhow::Error::from(VaultError::NotInVault))
    }

    /// Checks the four roots against each other
    pub fn validate(&self) -> Option<ConflictReport> {
        validate_root_set(&self.vault.roots)
    }

    /// Resets the roots to defaults if they conflict; returns the conflict that was repaired
    pub fn repair(&mut self) -> Option<ConflictReport> {
        let conflict = self.validate()?;
        tracing::warn!(
            conflict = %conflict,
            "root folders conflict, falling back to defaults"
        );
        self.vault.roots = RootConfig::default();
        Some(conflict)
    }

    /// Changes one root after checking it against the other three
    pub fn set_root(&mut self, category: Category, value: &str) -> Result<(), ConfigError> {
        let normalized = path::normalize(value);
        if normalized.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "{} folder cannot be the vault root",
                category
            )));
        }

        if let Some(conflict) = validate_single_field_change(&normalized, category, &self.vault.roots)
        {
            return Err(ConfigError::Conflict(conflict));
        }

        tracing::debug!(%category, root = %normalized, "root folder changed");
        self.vault.roots.set(category, normalized);
        Ok(())
    }

    /// Restores the default root folders
    pub fn reset_roots(&mut self) {
        self.vault.roots = RootConfig::default();
    }

    /// Saves the vault configuration
    pub fn save_vault(&self) -> Result<()> {
        let root = self.require_vault_root()?;
        let config_path = Self::vault_config_path(root);

        let content =
            toml::to_string_pretty(&self.vault).context("Failed to serialize vault config")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write vault config: {}", config_path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config() -> Config {
        Config {
            vault: VaultConfig::default(),
            global: GlobalConfig::default(),
            vault_root: None,
        }
    }

    #[test]
    fn default_config() {
        let config = config();
        assert_eq!(config.vault.roots, RootConfig::default());
        assert_eq!(config.vault.items.name_format, "{name}");
        assert_eq!(config.vault.items.sort, SortOrder::Recency);
        assert_eq!(config.global.default_format, OutputFormat::Text);
        assert!(config.validate().is_none());
    }

    #[test]
    fn parse_vault_config() {
        let toml = r#"
[roots]
projects = "1 Projects"
areas = "2 Areas"

[items]
name_format = "%Y-%m-%d {name}"
sort = "name_date"
"#;

        let config: VaultConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.roots.projects, "1 Projects");
        assert_eq!(config.roots.resources, "Resources");
        assert_eq!(config.items.sort, SortOrder::NameDate);
        assert!(config.items.index_document);
    }

    #[test]
    fn parse_global_config() {
        let toml = r#"
default_format = "json"
"#;

        let config: GlobalConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.default_format, OutputFormat::Json);
    }

    #[test]
    fn bad_toml_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(PARA_DIR)).unwrap();
        fs::write(Config::vault_config_path(dir.path()), "[roots\n").unwrap();

        let err = Config::for_vault(dir.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse vault config"));
    }

    #[test]
    fn repair_resets_conflicting_roots() {
        let mut config = config();
        config.vault.roots.archive = "Projects/Archive".to_string();

        let repaired = config.repair().unwrap();
        assert!(repaired.involves(Category::Archive));
        assert_eq!(config.vault.roots, RootConfig::default());
        assert!(config.repair().is_none());
    }

    #[test]
    fn set_root_accepts_valid_edit() {
        let mut config = config();
        config.set_root(Category::Projects, "/Work/Projects/").unwrap();
        assert_eq!(config.vault.roots.projects, "Work/Projects");
    }

    #[test]
    fn set_root_rejects_conflict() {
        let mut config = config();
        let err = config.set_root(Category::Areas, "Projects/Sub").unwrap_err();

        assert!(matches!(err, ConfigError::Conflict(_)));
        assert_eq!(err.to_string(), "Areas folder cannot be nested with Projects folder");
        assert_eq!(config.vault.roots.areas, "Areas");
    }

    #[test]
    fn set_root_rejects_vault_root() {
        let mut config = config();
        assert!(matches!(
            config.set_root(Category::Resources, "/"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn save_and_reload() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(PARA_DIR)).unwrap();

        let mut config = Config::for_vault(dir.path()).unwrap();
        config.set_root(Category::Archive, "Old").unwrap();
        config.vault.items.sort = SortOrder::Alphabetical;
        config.save_vault().unwrap();

        let reloaded = Config::for_vault(dir.path()).unwrap();
        assert_eq!(reloaded.vault.roots.archive, "Old");
        assert_eq!(reloaded.vault.items.sort, SortOrder::Alphabetical);
    }

    #[test]
    fn config_not_in_vault() {
        let config = config();
        let err = config.require_vault_root().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<VaultError>(),
            Some(VaultError::NotInVault)
        ));
        assert!(config.save_vault().is_err());
    }
}

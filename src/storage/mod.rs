//! # Storage Layer
//!
//! Everything that touches the disk: vault layout, configuration,
//! filesystem moves and the archiver that drives them.
//!
//! ## Storage Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Config | TOML | `.para/config.toml` |
//! | Templates | Markdown | `.para/templates/{id}.md` |
//! | Global config | TOML | `~/.config/para-cli/config.toml` |
//!
//! ## Vault Structure
//!
//! ```text
//! vault/
//! ├── .para/
//! │   ├── config.toml       # Root folders and item settings
//! │   └── templates/        # Index document templates
//! ├── Projects/
//! ├── Areas/
//! ├── Resources/
//! └── Archive/
//!     ├── Projects/         # One subfolder per source root
//!     └── Areas/
//! ```
//!
//! ## Key Types
//!
//! - [`Vault`] - Entry point for accessing a vault
//! - [`Storage`] - The archiver's view of durable storage
//! - [`FsStorage`] - [`Storage`] on the local filesystem
//! - [`Archiver`] - Collision-safe moves into the archive
//! - [`Config`] - Vault and global configuration

mod config;
mod fs;
mod archiver;
mod templates;
mod vault;

pub use config::{Config, ConfigError, GlobalConfig, ItemsConfig, OutputFormat, VaultConfig, PARA_DIR};
pub use fs::{FsStorage, Storage, StorageError};
pub use archiver::{ArchiveError, ArchiveOutcome, Archiver, MAX_MOVE_ATTEMPTS};
pub use templates::{ContentRenderer, TemplateRenderer};
pub use vault::{Vault, VaultError};

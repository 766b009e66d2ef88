//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Commands
//!
//! | Group | Purpose | Examples |
//! |-------|---------|----------|
//! | Core | Vault management | `init`, `check` |
//! | Config | Root folders | `config show`, `config set`, `config reset` |
//! | Items | Top-level items | `list`, `new`, `archive` |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! The default can be changed with `default_format` in the global config.
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for debug output and library logs:
//! ```bash
//! para --verbose archive Projects/Website
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod output;
mod config_cmd;
mod item;

pub use app::{Cli, Commands, run};
pub use output::{Output, OutputFormat};

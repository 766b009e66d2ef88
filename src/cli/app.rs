//! Main CLI application structure

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use super::output::{Output, OutputFormat};
use super::{config_cmd, item};
use crate::domain::Category;
use crate::storage::{Config, Vault};

#[derive(Parser)]
#[command(name = "para")]
#[command(author, version, about = "Local-first PARA folder organizer")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the global config, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new vault
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Check that the root folders do not overlap
    Check,

    /// Show or change the root folders
    #[command(subcommand)]
    Config(config_cmd::ConfigCommands),

    /// List top-level items, most recent first
    List {
        /// Category to list (omit for projects, areas and resources)
        category: Option<String>,
    },

    /// Create a new top-level item
    New {
        /// Category: projects, areas or resources
        category: String,

        /// Item name
        name: String,

        /// Template from .para/templates for the index document
        #[arg(long, short)]
        template: Option<String>,
    },

    /// Move a top-level item into the archive
    Archive {
        /// Item path, relative to the vault or on disk
        path: String,
    },
}

/// Installs the stderr log subscriber; `RUST_LOG` overrides the level
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "para_cli=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let format = match cli.format {
        Some(format) => format,
        None => Config::global()?.default_format.into(),
    };
    let output = Output::new(format, cli.verbose);

    output.verbose("para starting");

    match cli.command {
        Commands::Init { path } => {
            output.verbose_ctx("init", &format!("Initializing vault at: {}", path));
            let vault = Vault::init(&path)?;
            output.verbose_ctx("init", &format!("Created .para directory at: {}", vault.para_dir().display()));
            output.success(&format!("Initialized para vault at {}", vault.root().display()));
        }

        Commands::Check => check(&output)?,

        Commands::Config(cmd) => config_cmd::run(cmd, &output)?,

        Commands::List { category } => {
            output.verbose_ctx("list", &format!("Listing items, category filter: {:?}", category));
            item::list(&output, category.as_deref())?
        }

        Commands::New { category, name, template } => {
            item::create(&output, &category, &name, template.as_deref())?
        }

        Commands::Archive { path } => {
            output.verbose_ctx("archive", &format!("Archiving: {}", path));
            item::archive(&output, &path)?
        }
    }

    output.verbose("Command completed successfully");
    Ok(())
}

/// Validates the stored root folders
fn check(output: &Output) -> Result<()> {
    let vault = Vault::open_current()?;
    output.verbose_ctx("check", &format!("Opened vault at: {}", vault.root().display()));

    if let Some(conflict) = vault.repaired_conflict() {
        if output.is_json() {
            output.data(&serde_json::json!({
                "valid": false,
                "conflict": conflict,
                "message": conflict.message(),
            }));
        }
        anyhow::bail!("{}", conflict);
    }

    let roots = &vault.config().vault.roots;
    let storage = vault.storage();

    if output.is_json() {
        let items: Vec<_> = Category::ALL
            .iter()
            .map(|category| {
                let dir = roots.root(*category);
                let exists = storage.resolve(&dir).map(|p| p.is_dir()).unwrap_or(false);
                serde_json::json!({
                    "category": category,
                    "path": dir,
                    "exists": exists,
                })
            })
            .collect();
        output.data(&serde_json::json!({
            "valid": true,
            "roots": items,
        }));
    } else {
        output.success("Root folders are valid");
        for category in Category::ALL {
            let dir = roots.root(category);
            let exists = storage.resolve(&dir).map(|p| p.is_dir()).unwrap_or(false);
            let note = if exists { "" } else { "  (missing)" };
            println!("  {:<10} {}{}", category.label(), dir, note);
        }
    }

    Ok(())
}

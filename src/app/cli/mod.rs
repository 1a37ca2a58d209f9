//! CLI Adapter.

use std::io::stderr;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*, registry};

use crate::adapters::{CommandInventorySource, ContentCategory, ContentRoots};
use crate::app::{Credentials, Engine, RefreshOutcome, Settings, TaskKind};
use crate::domain::AppError;

#[derive(Parser)]
#[command(name = "nexus")]
#[command(version)]
#[command(about = "Assemble per-node provisioning scripts from the inventory", long_about = None)]
struct Cli {
    /// Settings file (defaults to ./nexus.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the provisioning script of a node
    #[clap(visible_alias = "a")]
    Assemble { hostname: String },
    /// Print the purge script of a node
    Purge { hostname: String },
    /// Print the purge script when the node is flagged, the normal one otherwise
    #[clap(visible_alias = "t")]
    Task { hostname: String },
    /// Print the hostname bound to a machine id
    #[clap(visible_alias = "l")]
    Lookup { machine_id: String },
    /// Reload the inventory and report its watermark
    Refresh {
        /// Fetch even if the cache is still fresh
        #[arg(short, long)]
        force: bool,
    },
    /// Print the bootstrap script for unregistered machines
    Bootstrap,
    /// Print the confined path of a content file
    Locate {
        #[arg(value_enum)]
        category: Category,
        path: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Category {
    Scripts,
    Skels,
    Certs,
}

impl From<Category> for ContentCategory {
    fn from(category: Category) -> Self {
        match category {
            Category::Scripts => ContentCategory::Scripts,
            Category::Skels => ContentCategory::Skels,
            Category::Certs => ContentCategory::Certs,
        }
    }
}

pub fn run() {
    let _ = dotenvy::dotenv();
    init_logging();

    let cli = Cli::parse();
    let result = execute(cli);

    match result {
        Ok(exit_code) => {
            if exit_code != 0 {
                std::process::exit(exit_code);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    registry().with(filter).with(fmt::layer().with_writer(stderr)).init();
}

fn execute(cli: Cli) -> Result<i32, AppError> {
    let settings = Settings::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Assemble { hostname } => {
            println!("{}", engine(&settings)?.assemble(&hostname)?);
        }
        Commands::Purge { hostname } => {
            println!("{}", engine(&settings)?.assemble_purge(&hostname)?);
        }
        Commands::Task { hostname } => {
            let task = engine(&settings)?.render_task(&hostname)?;
            if task.kind == TaskKind::Purge {
                info!("Serving purge script to {}; mark it purged in the registry", hostname);
            }
            println!("{}", task.body);
        }
        Commands::Lookup { machine_id } => {
            match engine(&settings)?.cache().hostname_by_machine_id(&machine_id)? {
                Some(hostname) => println!("{}", hostname),
                None => {
                    eprintln!("No node bound to machine id {}", machine_id);
                    return Ok(1);
                }
            }
        }
        Commands::Refresh { force } => match engine(&settings)?.cache().refresh(force)? {
            RefreshOutcome::Reloaded { hosts, watermark } => {
                let marker = watermark.map(|mark| mark.to_rfc3339()).unwrap_or_else(|| "none".into());
                println!("Inventory refreshed: {} hosts, watermark {}", hosts, marker);
            }
            RefreshOutcome::Fresh => println!("Inventory cache is fresh"),
        },
        Commands::Bootstrap => {
            println!("{}", engine(&settings)?.render_bootstrap()?);
        }
        Commands::Locate { category, path } => {
            let located = settings.content_roots().locate(category.into(), &path)?;
            println!("{}", located.display());
        }
    }
    Ok(0)
}

fn engine(settings: &Settings) -> Result<Engine<CommandInventorySource, ContentRoots>, AppError> {
    Engine::from_settings(settings, Credentials::from_env())
}

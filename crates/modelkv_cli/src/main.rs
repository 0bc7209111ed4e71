//! modelkv CLI
//!
//! Command-line access to a collection stored in a file store.
//!
//! # Commands
//!
//! - `head` / `tail` - List entities oldest or newest first
//! - `get` - Load one entity by id
//! - `put` - Save an entity given as JSON
//! - `delete` - Destroy an entity by id
//! - `ids` - List ids in insertion order

mod commands;

use clap::{Parser, Subcommand};
use commands::Target;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// modelkv command-line collection tools.
#[derive(Parser)]
#[command(name = "modelkv")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the store directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Collection name
    #[arg(global = true, short, long)]
    name: Option<String>,

    /// Password for encrypted collections
    #[arg(global = true, long, env = "MODELKV_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List entities, oldest first
    Head {
        /// Entities to skip
        #[arg(short, long, default_value = "0")]
        offset: usize,

        /// Maximum entities to print
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// List entities, newest first
    Tail {
        /// Entities to skip
        #[arg(short, long, default_value = "0")]
        offset: usize,

        /// Maximum entities to print
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Print one entity
    Get {
        /// Entity id
        id: String,
    },

    /// Save an entity from a JSON object
    Put {
        /// JSON object; a missing `id` is generated
        json: String,
    },

    /// Delete an entity
    Delete {
        /// Entity id
        id: String,
    },

    /// List entity ids in insertion order
    Ids {
        /// Newest first
        #[arg(short, long)]
        reverse: bool,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Version => {
            println!("modelkv CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("modelkv Core v{}", modelkv_core::VERSION);
        }
        command => {
            let target = Target {
                path: cli.path.ok_or("Store path required (--path)")?,
                name: cli.name,
                password: cli.password,
            };
            run(command, &target).await?;
        }
    }

    Ok(())
}

async fn run(command: Commands, target: &Target) -> Result<(), Box<dyn std::error::Error>> {
    use modelkv_core::Direction;

    let mut out = std::io::stdout().lock();
    match command {
        Commands::Head { offset, limit } => {
            commands::list::entities(target, Direction::Head, offset, limit, &mut out).await?;
        }
        Commands::Tail { offset, limit } => {
            commands::list::entities(target, Direction::Tail, offset, limit, &mut out).await?;
        }
        Commands::Ids { reverse } => commands::list::ids(target, reverse, &mut out).await?,
        Commands::Get { id } => commands::get::run(target, &id, &mut out).await?,
        Commands::Put { json } => commands::put::run(target, &json, &mut out).await?,
        Commands::Delete { id } => commands::delete::run(target, &id, &mut out).await?,
        Commands::Version => {}
    }
    Ok(())
}

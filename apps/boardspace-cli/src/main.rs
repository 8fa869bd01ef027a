use anyhow::Context;
use boardspace_canvas::{Board, Canvas};
use boardspace_common::VersionId;
use boardspace_persist::{DurableStore, FileStore};
use boardspace_versioning::{VersionStore, VersioningConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "boardspace-cli", about = "Save and restore named versions of a board")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Directory holding saved versions
    #[arg(long, default_value = "./board_data")]
    data_dir: PathBuf,

    /// Board scene file to snapshot and restore into
    #[arg(long, default_value = "./board.json")]
    board: PathBuf,

    /// Optional YAML file with versioning settings
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate info and store location
    Info,
    /// List saved versions, newest first
    List,
    /// Show one saved version
    Show {
        /// Version id
        id: String,
    },
    /// Save the board as a new version
    Save {
        /// Label for the version; defaults to "Version N"
        #[arg(short, long)]
        label: Option<String>,
    },
    /// Replace the board with a saved version
    Restore {
        /// Version id
        id: String,
    },
    /// Delete one saved version
    Delete {
        /// Version id
        id: String,
    },
    /// Delete all saved versions
    Clear {
        /// Confirm deleting every version
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = match &cli.config {
        Some(path) => VersioningConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => VersioningConfig::default(),
    };
    let durable = FileStore::open(&cli.data_dir)
        .with_context(|| format!("opening data dir {}", cli.data_dir.display()))?;
    let board = Board::load(&cli.board)
        .with_context(|| format!("loading board {}", cli.board.display()))?;
    let mut store = VersionStore::open(durable, Some(board), config);
    tracing::debug!(board = %cli.board.display(), versions = store.len(), "store ready");

    match cli.command {
        Commands::Info => {
            println!("boardspace-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", boardspace_common::crate_info());
            println!("canvas: {}", boardspace_canvas::crate_info());
            println!("persist: {}", boardspace_persist::crate_info());
            println!("versioning: {}", boardspace_versioning::crate_info());
            println!(
                "store: {} key={} versions={}",
                store.durable().root().display(),
                store.storage_key(),
                store.len()
            );
        }
        Commands::List => {
            if store.is_empty() {
                println!("No versions yet.");
            }
            let marked = list_marker(&store);
            for version in store.versions() {
                let marker = if Some(&version.id) == marked { "*" } else { " " };
                println!("{marker} {}", version.summary());
            }
        }
        Commands::Show { id } => {
            let summary = store
                .summary(&VersionId::from(id.as_str()))
                .with_context(|| format!("no version with id {id}"))?;
            println!("{summary}");
        }
        Commands::Save { label } => {
            let id = store.save(label.as_deref())?;
            if let Some(version) = store.get(&id) {
                println!("Saved {}", version.summary());
            }
        }
        Commands::Restore { id } => {
            let id = VersionId::from(id);
            if !store.restore(&id) {
                anyhow::bail!("no version with id {id}");
            }
            if let Some(board) = store.canvas() {
                board
                    .save(&cli.board)
                    .with_context(|| format!("writing board {}", cli.board.display()))?;
            }
            println!("Restored {id} into {}", cli.board.display());
        }
        Commands::Delete { id } => {
            let id = VersionId::from(id);
            if !store.delete(&id)? {
                anyhow::bail!("no version with id {id}");
            }
            println!("Deleted {id}");
        }
        Commands::Clear { yes } => {
            if !yes {
                anyhow::bail!(
                    "refusing to delete {} versions without --yes",
                    store.len()
                );
            }
            let removed = store.len();
            store.clear_all()?;
            println!("Deleted {removed} versions");
        }
    }

    Ok(())
}

/// Version to highlight in `list`: the last save of this run, else the newest.
///
/// Each CLI run is its own session, so earlier saves only show up as newest.
fn list_marker<C: Canvas, S: DurableStore>(store: &VersionStore<C, S>) -> Option<&VersionId> {
    store
        .last_saved_id()
        .or_else(|| store.versions().first().map(|v| &v.id))
}

//! SimpleCP command line front end
//!
//! Run: cargo run --bin simplecp -- watch
//!
//! `watch` polls the clipboard until Ctrl-C or SIGTERM, then saves both stores. Every
//! other subcommand loads the data files, performs one operation, and saves
//! again if something changed.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use simplecp::{
    ClipboardAccess, Config, Item, Manager, MemoryClipboard, SnippetDocument,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long, default_value = "simplecp.toml")]
    config: PathBuf,

    /// Override the data directory
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Override the history capacity
    #[arg(long)]
    max_history: Option<usize>,

    /// Override the polling interval in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Use a process-local clipboard instead of the system one
    #[arg(long)]
    memory_clipboard: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll the clipboard until interrupted
    Watch,
    /// List history, most recent first
    List {
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Show history grouped into display folders
    Pages,
    /// Add text to history
    Add { content: String },
    /// Delete a history item
    Delete { id: String },
    /// Remove every history item
    Clear,
    /// Copy a history item or snippet to the clipboard
    Copy { id: String },
    /// Search history and snippets
    Search { query: String },
    /// Show counts for both stores
    Stats,
    /// Show counts, data location and the last clipboard activity
    Status,
    /// Write all snippet folders as JSON, to a file or stdout
    Export { path: Option<PathBuf> },
    /// Merge snippet folders from an exported JSON file
    Import { path: PathBuf },
    /// List snippet folders and their snippets
    Snippets,
    /// Save a history item as a named snippet
    SaveSnippet {
        clip_id: String,
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        folder: String,
        #[arg(short, long, value_delimiter = ',')]
        tags: Vec<String>,
    },
    /// Create a snippet from text
    NewSnippet {
        content: String,
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        folder: String,
        #[arg(short, long, value_delimiter = ',')]
        tags: Vec<String>,
    },
    /// Move a snippet between folders
    MoveSnippet { from: String, to: String, id: String },
    /// Delete a snippet
    DeleteSnippet { folder: String, id: String },
    CreateFolder { name: String },
    RenameFolder { old_name: String, new_name: String },
    DeleteFolder { name: String },
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = Config::load(&args.config)
        .with_context(|| format!("Failed to load config {}", args.config.display()))?;
    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(max) = args.max_history {
        config.max_history = max;
        config.display_count = config.display_count.min(max.max(1));
    }
    if let Some(ms) = args.interval_ms {
        config.check_interval_ms = ms;
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn open_clipboard(memory: bool) -> Arc<dyn ClipboardAccess> {
    if memory {
        Arc::new(MemoryClipboard::new())
    } else {
        simplecp::clipboard::default_clipboard()
    }
}

fn print_item(manager: &Manager, index: Option<usize>, item: &Item) {
    let prefix = index.map(|i| format!("{:>3}. ", i + 1)).unwrap_or_default();
    let name = item.name().map(|n| format!(" [{}]", n)).unwrap_or_default();
    println!(
        "{}{}{} ({}) {}",
        prefix,
        item.id(),
        name,
        item.content_type(),
        manager.preview(item)
    );
}

/// Resolve on Ctrl-C, or on SIGTERM where there is one
async fn wait_for_shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut terminate =
            signal(SignalKind::terminate()).context("Failed to listen for SIGTERM")?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result.context("Failed to listen for Ctrl-C")?,
            _ = terminate.recv() => log::info!("Received SIGTERM"),
        }
    }
    #[cfg(not(unix))]
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    Ok(())
}

async fn watch(manager: Arc<Manager>) -> Result<()> {
    println!(
        "Watching clipboard every {:?}; press Ctrl-C to stop",
        manager.config().check_interval()
    );
    let shutdown = async {
        if let Err(e) = wait_for_shutdown_signal().await {
            log::error!("{:#}, stopping", e);
        }
    };
    simplecp::watch_until(manager, shutdown)
        .await
        .context("Failed to save data files")
}

/// Run one command; returns whether the stores need saving
fn run_command(manager: &Manager, command: Command) -> Result<bool> {
    let changed = match command {
        Command::Watch => bail!("watch runs on its own, not as a one-shot command"),
        Command::List { limit } => {
            for (i, item) in manager.history_items(limit).iter().enumerate() {
                print_item(manager, Some(i), item);
            }
            false
        }
        Command::Pages => {
            for folder in manager.history_folders() {
                println!("{} ({} items)", folder.name, folder.count);
                for (offset, item) in folder.items.iter().enumerate() {
                    print_item(manager, Some(folder.start_index + offset), item);
                }
            }
            false
        }
        Command::Add { content } => match manager.add_clip(&content) {
            Some(item) => {
                print_item(manager, None, &item);
                true
            }
            None => {
                println!("Nothing added (blank or same as the most recent clip)");
                false
            }
        },
        Command::Delete { id } => {
            if !manager.delete_history_item(&id) {
                bail!("No history item with id {}", id);
            }
            true
        }
        Command::Clear => {
            manager.clear_history();
            true
        }
        Command::Copy { id } => {
            if !manager.copy_to_clipboard(&id)? {
                bail!("No history item or snippet with id {}", id);
            }
            println!("Copied {}", id);
            false
        }
        Command::Search { query } => {
            let results = manager.search_all(&query);
            println!("History ({}):", results.history.len());
            for item in &results.history {
                print_item(manager, None, item);
            }
            println!("Snippets ({}):", results.snippets.len());
            for hit in &results.snippets {
                print!("  {}: ", hit.folder);
                print_item(manager, None, &hit.item);
            }
            false
        }
        Command::Stats => {
            println!("{}", serde_json::to_string_pretty(&manager.stats())?);
            false
        }
        Command::Status => {
            println!("{}", serde_json::to_string_pretty(&manager.status())?);
            false
        }
        Command::Export { path } => {
            let document = manager.export_snippets();
            match path {
                Some(path) => {
                    simplecp::persistence::write_json_atomic(&path, &document)?;
                    println!("Exported {} folders to {}", document.folders.len(), path.display());
                }
                None => println!("{}", serde_json::to_string_pretty(&document)?),
            }
            false
        }
        Command::Import { path } => {
            let Some(document) = simplecp::persistence::read_json::<SnippetDocument>(&path)? else {
                bail!("{} does not exist", path.display());
            };
            let imported = manager
                .import_snippets(document)
                .with_context(|| format!("Failed to import {}", path.display()))?;
            println!("Imported {} snippets", imported);
            imported > 0
        }
        Command::Snippets => {
            for folder in manager.all_snippets() {
                println!("{} ({} snippets)", folder.name, folder.items.len());
                for item in &folder.items {
                    print!("  ");
                    print_item(manager, None, item);
                }
            }
            false
        }
        Command::SaveSnippet { clip_id, name, folder, tags } => {
            match manager.save_as_snippet(&clip_id, &name, &folder, tags)? {
                Some(snippet) => print_item(manager, None, &snippet),
                None => bail!("No history item with id {}", clip_id),
            }
            true
        }
        Command::NewSnippet { content, name, folder, tags } => {
            let snippet = manager.create_snippet(&content, &folder, &name, tags)?;
            print_item(manager, None, &snippet);
            true
        }
        Command::MoveSnippet { from, to, id } => {
            manager.move_snippet(&from, &to, &id)?;
            true
        }
        Command::DeleteSnippet { folder, id } => {
            if !manager.delete_snippet(&folder, &id) {
                bail!("No snippet {} in folder '{}'", id, folder);
            }
            true
        }
        Command::CreateFolder { name } => {
            manager.create_folder(&name)?;
            true
        }
        Command::RenameFolder { old_name, new_name } => {
            let result = manager.rename_folder(&old_name, &new_name);
            if !result.is_success() {
                bail!(result.message);
            }
            println!("{}", result.message);
            true
        }
        Command::DeleteFolder { name } => {
            if !manager.delete_folder(&name) {
                bail!("Folder '{}' not found", name);
            }
            true
        }
    };
    Ok(changed)
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let clipboard = open_clipboard(args.memory_clipboard);
    let manager = Manager::open(config, clipboard).context("Failed to load data files")?;

    if let Command::Watch = args.command {
        return watch(Arc::new(manager)).await;
    }

    if run_command(&manager, args.command)? {
        manager.save_stores().context("Failed to save data files")?;
    }
    Ok(())
}

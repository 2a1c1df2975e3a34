//! # rag-console CLI (`ragc`)
//!
//! Query a retrieval-augmented knowledge base and ingest content into it.
//!
//! ## Usage
//!
//! ```bash
//! ragc --config ./config/ragc.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ragc collections` | List the backend's collections |
//! | `ragc query "<text>"` | Ask a question against one collection or all |
//! | `ragc ingest` | Upload pasted text or a single file |
//! | `ragc ingest-folder <PATH>` | Upload a zipped folder, or pack a directory first |
//! | `ragc completions <shell>` | Print a shell completion script |
//!
//! Exit status is 0 when the request succeeded and 1 otherwise, including
//! local validation failures.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use rag_console::config;
use rag_console::progress::ProgressMode;
use rag_console::{folder, query, registry, upload};
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// rag-console: ask a knowledge base questions and feed it documents.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. A missing file means built-in defaults (backend at
/// http://127.0.0.1:8000).
#[derive(Parser)]
#[command(
    name = "ragc",
    about = "Command-line client for a retrieval-augmented knowledge base",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/ragc.toml")]
    config: PathBuf,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Status output on stderr. Defaults to human when stderr is a terminal.
    #[arg(long, global = true, value_enum)]
    progress: Option<ProgressMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the collections the backend knows about.
    Collections,

    /// Ask a question.
    ///
    /// Without `--collection` the first collection the backend lists is
    /// used. Pass `--collection all` to search every collection.
    Query {
        /// The question.
        text: String,

        /// Collection name, or `all`.
        #[arg(long, short)]
        collection: Option<String>,

        /// Number of passages to retrieve (default from config).
        #[arg(long)]
        top_k: Option<u32>,

        /// Print the raw result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Upload pasted text or one file.
    ///
    /// When both `--file` and `--text` are given the file is uploaded.
    Ingest {
        /// Target collection (default: first uploadable collection).
        #[arg(long, short)]
        collection: Option<String>,

        /// File to upload.
        #[arg(long)]
        file: Option<PathBuf>,

        /// Text to upload; `-` reads standard input.
        #[arg(long)]
        text: Option<String>,
    },

    /// Upload a zipped folder.
    ///
    /// PATH is a `.zip` file or a directory. A directory is packed into a
    /// zip in memory first. Archives over 100 MiB are refused locally.
    IngestFolder {
        path: PathBuf,

        /// Target collection (default: first uploadable collection).
        #[arg(long, short)]
        collection: Option<String>,

        /// Glob to leave out when packing a directory. Repeatable.
        #[arg(long = "exclude", value_name = "GLOB")]
        excludes: Vec<String>,

        /// Print the settled status, tree included, as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print a shell completion script.
    Completions { shell: Shell },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "ragc", &mut std::io::stdout());
        return Ok(());
    }

    init_tracing(cli.verbose);
    let cfg = config::load_config(&cli.config)?;
    let reporter = cli
        .progress
        .unwrap_or_else(ProgressMode::default_for_tty)
        .reporter();

    let outcome = match cli.command {
        Commands::Collections => {
            registry::run_list_collections(&cfg).await?;
            return Ok(());
        }
        Commands::Query {
            text,
            collection,
            top_k,
            json,
        } => query::run_query(&cfg, &text, collection.as_deref(), top_k, json).await?,
        Commands::Ingest {
            collection,
            file,
            text,
        } => {
            let text = match text.as_deref() {
                Some("-") => {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .context("Failed to read text from stdin")?;
                    Some(buf)
                }
                _ => text,
            };
            upload::run_ingest(
                &cfg,
                collection.as_deref(),
                file.as_deref(),
                text,
                reporter.as_ref(),
            )
            .await?
        }
        Commands::IngestFolder {
            path,
            collection,
            excludes,
            json,
        } => {
            folder::run_ingest_folder(
                &cfg,
                &path,
                collection.as_deref(),
                &excludes,
                json,
                reporter.as_ref(),
            )
            .await?
        }
        Commands::Completions { .. } => return Ok(()),
    };

    if !outcome.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

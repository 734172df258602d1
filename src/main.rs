//! # md-harness CLI (`mdh`)
//!
//! Searches a directory of Markdown files and prints ranked snippets.
//!
//! ## Usage
//!
//! ```bash
//! mdh --config ./mdh.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `mdh list` | List documents with a short description |
//! | `mdh read <path>` | Print a whole document |
//! | `mdh search "<query>"` | Search the corpus and print snippets |
//! | `mdh chunks <path>` | Show how a document is chunked |
//! | `mdh section <path> <header>` | Print one section of a document |
//! | `mdh index` | Build or refresh the embedding cache |
//! | `mdh completions <shell>` | Print shell completions |
//!
//! ## Examples
//!
//! ```bash
//! # Keyword search over ./docs
//! mdh --root ./docs search "environment variables"
//!
//! # Hybrid search (keyword + semantic)
//! mdh search "how do I deploy" --strategy hybrid --limit 10
//!
//! # Machine-readable output
//! mdh search "setup" --json
//! ```

use anyhow::{bail, Result};
use clap::{CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};

use md_harness::config::{self, Config};
use md_harness::connector_fs::scan_filesystem;
use md_harness::embedding::create_provider;
use md_harness::index::SemanticIndex;
use md_harness::models::SearchResult;
use md_harness::search::Strategy;
use md_harness::session::RetrievalSession;

/// Config file read when `--config` is not given (optional).
const DEFAULT_CONFIG: &str = "./mdh.toml";

/// md-harness CLI: section-aware snippet search over Markdown files.
#[derive(Parser)]
#[command(
    name = "mdh",
    about = "md-harness: section-aware keyword, semantic, and hybrid search over Markdown files",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./mdh.toml` if it exists, otherwise built-in defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override `corpus.root` from the config.
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Enable debug logging (`RUST_LOG` takes precedence).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the corpus and print ranked snippets.
    Search {
        /// Search term or natural language question.
        query: String,

        /// `keyword`, `semantic`, or `hybrid`. Defaults to `retrieval.strategy`.
        /// Semantic and hybrid require an embedding provider.
        #[arg(long)]
        strategy: Option<Strategy>,

        /// Maximum number of snippets to return.
        #[arg(long)]
        limit: Option<usize>,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List documents in the corpus with a short description.
    List {
        /// Print the listing as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the full text of one document.
    Read {
        /// Document path relative to the corpus root.
        path: String,
    },

    /// Show the chunks of one document with header paths and offsets.
    Chunks {
        /// Document path relative to the corpus root.
        path: String,
    },

    /// Print one section (and its subsections) of a document.
    Section {
        /// Document path relative to the corpus root.
        path: String,
        /// Section title or full header path (`"Intro > Setup"`).
        header: String,
    },

    /// Embed all chunks and update the embedding cache.
    Index,

    /// Print shell completion script.
    Completions {
        shell: clap_complete::Shell,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_config(path: Option<&Path>, root: Option<PathBuf>) -> Result<Config> {
    let mut cfg = match path {
        Some(path) => config::load_config(path)?,
        None if Path::new(DEFAULT_CONFIG).exists() => config::load_config(Path::new(DEFAULT_CONFIG))?,
        None => Config::minimal(),
    };
    if let Some(root) = root {
        cfg.corpus.root = root;
    }
    cfg.validate()?;
    Ok(cfg)
}

/// Load the corpus and attach a semantic index when a provider is configured.
fn open_session(cfg: &Config) -> Result<RetrievalSession> {
    let documents = scan_filesystem(&cfg.corpus)?;
    let session = RetrievalSession::new(documents, cfg.chunking.max_chunk_size);

    if !cfg.embedding.is_enabled() {
        return Ok(session);
    }

    match create_provider(&cfg.embedding) {
        Ok(provider) => {
            let index = SemanticIndex::new(provider).with_cache_file(cfg.cache_path());
            Ok(session.with_index(index))
        }
        Err(e) => {
            tracing::warn!("embedding provider unavailable, keyword search only: {e:#}");
            Ok(session)
        }
    }
}

fn print_results(query: &str, strategy: Strategy, results: &[SearchResult]) {
    if results.is_empty() {
        println!("No results found for '{}' (strategy: {})", query, strategy);
        return;
    }

    println!(
        "Found {} snippet(s) for '{}' [{}]:\n",
        results.len(),
        query,
        strategy
    );
    for (n, r) in results.iter().enumerate() {
        println!("**{}. {}**", n + 1, r.source_id);
        println!("   Section: {}", r.header_path);
        println!("   Score: {:.3}", r.score);
        println!("   Range: {}..{}\n", r.start_char, r.end_char);
        println!("```\n{}\n```\n", r.snippet);
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "mdh", &mut std::io::stdout());
        return Ok(());
    }

    let cfg = resolve_config(cli.config.as_deref(), cli.root)?;

    match cli.command {
        Commands::List { json } => {
            let session = open_session(&cfg)?;
            let listed = session.list_documents();
            if json {
                println!("{}", serde_json::to_string_pretty(&listed)?);
            } else if listed.is_empty() {
                println!("No documents found under {}", cfg.corpus.root.display());
            } else {
                println!("{} document(s):\n", listed.len());
                for doc in &listed {
                    println!("- {} ({} bytes)", doc.source_id, doc.size);
                    println!("  {}", doc.description);
                }
            }
        }
        Commands::Read { path } => {
            let session = open_session(&cfg)?;
            match session.read(&path) {
                Some(body) => print!("{}", body),
                None => bail!("document not found: {}", path),
            }
        }
        Commands::Search {
            query,
            strategy,
            limit,
            json,
        } => {
            let strategy = strategy.unwrap_or(cfg.retrieval.strategy);
            let mut opts = cfg.retrieval.search_options();
            if let Some(limit) = limit {
                if limit == 0 {
                    bail!("--limit must be >= 1");
                }
                opts.max_results = limit;
            }

            let mut session = open_session(&cfg)?;
            let results = session.search(&query, strategy, &opts)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                print_results(&query, strategy, &results);
            }
        }
        Commands::Chunks { path } => {
            let session = open_session(&cfg)?;
            if session.document(&path).is_none() {
                bail!("document not found: {}", path);
            }
            let chunks = session.document_chunks(&path);
            println!("--- {} ({} chunks) ---", path, chunks.len());
            for (i, chunk) in chunks.iter().enumerate() {
                println!(
                    "[chunk {}] {} ({}..{}, {} chars)",
                    i,
                    chunk.header_path,
                    chunk.start_char,
                    chunk.end_char,
                    chunk.content.chars().count()
                );
                println!("{}\n", chunk.content.trim_end());
            }
        }
        Commands::Section { path, header } => {
            let session = open_session(&cfg)?;
            if session.document(&path).is_none() {
                bail!("document not found: {}", path);
            }
            let chunks = session.section(&path, &header);
            if chunks.is_empty() {
                bail!("section '{}' not found in {}", header, path);
            }
            for chunk in chunks {
                println!("{}\n", chunk.content.trim_end());
            }
        }
        Commands::Index => {
            let mut session = open_session(&cfg)?;
            let embedded = session.ensure_index()?;
            let Some(index) = session.index() else {
                bail!("no embedding provider configured");
            };
            println!("model:          {}", index.model_name());
            println!("chunks indexed: {}", index.len());
            println!("newly embedded: {}", embedded);
            println!("cached vectors: {}", index.cached_len());
            if let Some(path) = index.cache_path() {
                println!("cache:          {}", path.display());
            }
        }
        Commands::Completions { .. } => unreachable!(),
    }

    Ok(())
}

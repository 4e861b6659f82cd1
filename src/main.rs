//! # Concordance CLI (`concord`)
//!
//! Builds the verse and index snapshots from the raw feed, queries them, and
//! serves them over HTTP.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `concord build` | Parse the raw feed and write `parsed/*.json` snapshots |
//! | `concord books` | List book names in reference order |
//! | `concord lookup <term>` | Find verse locations for a word |
//! | `concord read <book> <chapter>` | Print a chapter or verse range |
//! | `concord serve` | Start the read-only HTTP server |
//!
//! ## Examples
//!
//! ```bash
//! concord --config ./config/concordance.toml build
//! concord lookup "wood-offering"
//! concord lookup offerings --mode stemmed
//! concord read Exodus 20 --start 1 --end 17
//! CONCORDANCE_LOG=debug concord serve
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use concordance::config::{self, Config};
use concordance::pipeline;
use concordance::query;
use concordance::server;
use concordance::stem::SnowballStemmer;
use concordance::store::ArtifactStore;

const DEFAULT_CONFIG: &str = "./config/concordance.toml";

/// Concordance — verse hierarchies and word indexes for a biblical text feed.
#[derive(Parser)]
#[command(name = "concord", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/concordance.toml`; if that file does not exist,
    /// artifacts are read from `./artifacts` with default settings.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log warnings and errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build snapshots from the raw feed.
    ///
    /// Extracts annotations, groups verses by book and chapter, builds the
    /// exact and stemmed word indexes, and writes them under the output
    /// directory. Any malformed input aborts the build without writing.
    Build {
        /// Show counts without writing any files.
        #[arg(long)]
        dry_run: bool,
    },

    /// List book names in reference order.
    Books,

    /// Find verse locations for a single word.
    Lookup {
        /// The word to look up.
        term: String,

        /// `exact` (surface form) or `stemmed` (match inflected forms).
        #[arg(long, default_value = "exact")]
        mode: String,
    },

    /// Print a chapter, or a range of its verses.
    Read {
        /// Book name as listed by `concord books`.
        book: String,

        /// Chapter number (1-based).
        chapter: usize,

        /// First verse to print (1-based, inclusive).
        #[arg(long)]
        start: Option<usize>,

        /// Last verse to print (1-based, inclusive).
        #[arg(long)]
        end: Option<usize>,
    },

    /// Start the read-only HTTP server.
    ///
    /// Loads the snapshots before binding, so a missing or corrupt
    /// snapshot stops startup instead of failing the first request.
    Serve,
}

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("CONCORDANCE_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    match explicit {
        Some(path) => config::load_config(path),
        None => {
            let default = Path::new(DEFAULT_CONFIG);
            if default.exists() {
                config::load_config(default)
            } else {
                warn!(path = DEFAULT_CONFIG, "no config file, using ./artifacts");
                Ok(Config::minimal())
            }
        }
    }
}

fn open_store(cfg: &Config) -> ArtifactStore {
    ArtifactStore::new(cfg.paths(), Box::new(SnowballStemmer::english()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let cfg = resolve_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Build { dry_run } => {
            let stemmer = SnowballStemmer::english();
            let (_, report) = pipeline::run_build(&cfg.paths(), cfg.pipeline, &stemmer, dry_run)?;
            pipeline::print_report(&report, dry_run);
        }
        Commands::Books => {
            query::run_books(&open_store(&cfg))?;
        }
        Commands::Lookup { term, mode } => {
            query::run_lookup(&open_store(&cfg), &term, &mode)?;
        }
        Commands::Read {
            book,
            chapter,
            start,
            end,
        } => {
            query::run_read(&open_store(&cfg), &book, chapter, start, end)?;
        }
        Commands::Serve => {
            let store = Arc::new(open_store(&cfg));
            store
                .load()
                .context("Failed to load artifacts; run `concord build` first")?;
            let stats = store.stats()?;
            println!(
                "Loaded {} books, {} chapters, {} verses ({} exact terms, {} stemmed terms)",
                stats.books, stats.chapters, stats.verses, stats.exact_terms, stats.stemmed_terms
            );
            server::run_server(&cfg, store).await?;
        }
    }

    Ok(())
}

//! fs-search: fuzzy search over a JSON product catalog.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use foodshare_search::{FieldMap, SearchConfig, SearchEngine, SearchOptions};
use owo_colors::OwoColorize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;

mod output;

/// Fuzzy catalog search CLI
#[derive(Parser)]
#[command(name = "fs-search")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, global = true, default_value = "text")]
    format: String,

    /// Engine configuration (TOML)
    #[arg(short, long, global = true, env = "FS_SEARCH_CONFIG")]
    config: Option<PathBuf>,

    /// Record key holding the title
    #[arg(long, global = true, default_value = "title")]
    title_field: String,

    /// Record key holding the description
    #[arg(long, global = true, default_value = "content")]
    content_field: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search a catalog
    Search {
        /// JSON file with an array of records
        corpus: PathBuf,
        /// Search query
        query: String,
        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,
        /// Only records in this category
        #[arg(long)]
        category: Option<String>,
        /// Only records with this tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Disable typo correction
        #[arg(long)]
        no_fuzzy: bool,
        /// Disable the phonetic pass
        #[arg(long)]
        no_phonetic: bool,
        /// Disable synonym expansion
        #[arg(long)]
        no_synonyms: bool,
    },

    /// Autocomplete a partial query
    Suggest {
        /// JSON file with an array of records
        corpus: PathBuf,
        /// Partial query
        partial: String,
        /// Maximum number of suggestions
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// Show typo corrections for a query
    Correct {
        /// JSON file with an array of records
        corpus: PathBuf,
        /// Query to correct
        query: String,
    },

    /// Index a catalog and print statistics
    Stats {
        /// JSON file with an array of records
        corpus: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("fs_search=debug,foodshare_search=debug")
            .with_writer(std::io::stderr)
            .init();
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let json = cli.format == "json";

    match &cli.command {
        Commands::Search {
            corpus,
            query,
            limit,
            category,
            tags,
            no_fuzzy,
            no_phonetic,
            no_synonyms,
        } => {
            let engine = build_engine(cli, corpus)?;
            let mut options = SearchOptions::default()
                .with_fuzzy(!no_fuzzy)
                .with_phonetic(!no_phonetic)
                .with_synonyms(!no_synonyms)
                .with_tags(tags.iter().cloned());
            options.limit = *limit;
            options.category = category.clone();

            let response = engine.search(query, &options)?;
            output::search(&response, &cli.title_field, json)
        }

        Commands::Suggest { corpus, partial, limit } => {
            let engine = build_engine(cli, corpus)?;
            output::suggestions(&engine.suggest(partial, *limit), json)
        }

        Commands::Correct { corpus, query } => {
            let engine = build_engine(cli, corpus)?;
            output::corrections(&engine.correct_typos(query), json)
        }

        Commands::Stats { corpus } => {
            let engine = build_engine(cli, corpus)?;
            output::stats(&engine.stats(), json)
        }
    }
}

fn build_engine(cli: &Cli, corpus: &Path) -> Result<SearchEngine> {
    let config = match &cli.config {
        Some(path) => SearchConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => SearchConfig::default(),
    };

    let field_map = FieldMap::default()
        .with_title_field(&cli.title_field)
        .with_content_field(&cli.content_field);
    let mut engine = SearchEngine::new(config)?.with_field_map(field_map);

    let records = load_corpus(corpus)?;
    let report = engine.index_data(&records);
    debug!(documents = report.documents_indexed, terms = report.terms, "Corpus indexed");

    Ok(engine)
}

fn load_corpus(path: &Path) -> Result<Vec<Value>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read corpus {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Invalid JSON in {}", path.display()))?;

    match value {
        Value::Array(records) => Ok(records),
        Value::Object(mut map) => match map.remove("items") {
            Some(Value::Array(records)) => Ok(records),
            _ => anyhow::bail!("Corpus must be a JSON array or an object with an \"items\" array"),
        },
        _ => anyhow::bail!("Corpus must be a JSON array or an object with an \"items\" array"),
    }
}

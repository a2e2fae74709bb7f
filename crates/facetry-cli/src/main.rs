//! Facetry CLI
//!
//! Command-line interface for searching and maintaining facetry indexes.
//! Without engine credentials every command runs against an empty in-memory
//! engine, which is useful for inspecting the queries a search plans.

#![warn(clippy::all)]
#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use facetry_core::ProviderConfig;
use facetry_search::{
    Facet, Filter, IndexManager, Indexer, SearchBackend, SearchRequest, Searcher,
    create_search_backend, plan,
};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Facetry CLI - Faceted search over Algolia-style engines
#[derive(Parser, Debug)]
#[command(name = "facetry")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, global = true, env = "FACETRY_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a faceted search
    Search(SearchArgs),
    /// Print the sub-queries a search would send, without sending them
    Plan(SearchArgs),
    /// Show document count and health of an index
    Metadata {
        /// Index alias
        index: String,
    },
    /// Create an index with default settings if it does not exist
    Ensure {
        /// Index alias
        index: String,
    },
    /// Remove all documents of an index, keeping its settings
    Reset {
        /// Index alias
        index: String,
    },
    /// Delete content items and their descendants
    Delete {
        /// Index alias
        index: String,
        /// Content ids
        #[arg(required = true)]
        ids: Vec<Uuid>,
    },
}

#[derive(clap::Args, Debug)]
struct SearchArgs {
    /// Index alias
    index: String,

    /// Free-text query
    #[arg(short, long)]
    query: Option<String>,

    /// Culture, e.g. en-US
    #[arg(long)]
    culture: Option<String>,

    /// Segment
    #[arg(long)]
    segment: Option<String>,

    /// Keyword filter as FIELD=VALUE[,VALUE...]; repeatable
    #[arg(short, long = "keyword", value_name = "FIELD=VALUES")]
    keywords: Vec<String>,

    /// Keyword facet on FIELD; repeatable
    #[arg(short, long = "facet", value_name = "FIELD")]
    facets: Vec<String>,

    /// Documents to skip
    #[arg(long, default_value_t = 0)]
    skip: usize,

    /// Page size
    #[arg(long, default_value_t = 10)]
    take: usize,
}

impl SearchArgs {
    fn to_request(&self) -> Result<SearchRequest> {
        let mut request = SearchRequest::new(&self.index).page(self.skip, self.take);
        if let Some(query) = &self.query {
            request = request.query(query);
        }
        if let Some(culture) = &self.culture {
            request = request.culture(culture);
        }
        if let Some(segment) = &self.segment {
            request = request.segment(segment);
        }
        for arg in &self.keywords {
            request = request.filter(parse_keyword_filter(arg)?);
        }
        for field in &self.facets {
            request = request.facet(Facet::keyword(field));
        }
        Ok(request)
    }
}

fn parse_keyword_filter(arg: &str) -> Result<Filter> {
    let Some((field, values)) = arg.split_once('=') else {
        bail!("invalid keyword filter '{arg}': expected FIELD=VALUE[,VALUE...]");
    };
    let field = field.trim();
    if field.is_empty() {
        bail!("invalid keyword filter '{arg}': missing field name");
    }
    let values: Vec<&str> = values
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect();
    Ok(Filter::keyword(field, values))
}

fn init_logging(config: &ProviderConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(
    command: Command,
    config: &ProviderConfig,
    backend: Arc<dyn SearchBackend>,
) -> Result<()> {
    match command {
        Command::Search(args) => {
            let request = args.to_request()?;
            let result = Searcher::new(backend)
                .search(&request)
                .await
                .context("search failed")?;
            print_json(&result)
        }
        Command::Plan(args) => {
            let request = args.to_request()?;
            match plan(&request) {
                Some(plan) => print_json(&plan.queries),
                None => {
                    eprintln!("(blank request: no query, filters, or facets)");
                    Ok(())
                }
            }
        }
        Command::Metadata { index } => {
            let metadata = Indexer::new(backend, config).get_metadata(&index).await;
            print_json(&metadata)
        }
        Command::Ensure { index } => {
            IndexManager::new(backend, config).ensure(&index).await;
            Ok(())
        }
        Command::Reset { index } => {
            Indexer::new(backend, config).reset(&index).await;
            Ok(())
        }
        Command::Delete { index, ids } => {
            Indexer::new(backend, config).delete(&index, &ids).await;
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config =
        ProviderConfig::load(args.config.as_deref()).context("failed to load configuration")?;
    init_logging(&config);

    let backend = create_search_backend(&config).context("failed to create search backend")?;
    tracing::debug!(
        backend = backend.name(),
        role = %config.server_role,
        "facetry CLI starting"
    );

    run(args.command, &config, backend).await
}

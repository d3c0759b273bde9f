use anyhow::Result;
use clap::{Parser, Subcommand};
use search_cli::{
    build_server, load_documents, parse_status, resolve_stop_words, run_dedup, run_match, run_search,
    run_search_joined, run_stats,
};
use search_core::{DocumentStatus, ExecutionPolicy};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "search")]
#[command(about = "Rank documents with a TF-IDF search server", long_about = None)]
struct Cli {
    /// Documents to index (.json array/object or .jsonl)
    #[arg(long)]
    docs: PathBuf,
    /// Space-delimited stop words; defaults to $SEARCH_STOP_WORDS
    #[arg(long)]
    stop_words: Option<String>,
    /// Use the parallel execution policy
    #[arg(long, default_value_t = false)]
    parallel: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the top documents for each query
    Search {
        #[arg(long = "query", required = true)]
        queries: Vec<String>,
        /// Only rank documents with this status (default ACTUAL)
        #[arg(long, value_parser = parse_status)]
        status: Option<DocumentStatus>,
        /// Flatten all results into one list
        #[arg(long, default_value_t = false)]
        joined: bool,
    },
    /// Match a query against every document
    Match {
        #[arg(long)]
        query: String,
    },
    /// Remove documents with duplicate word sets
    Dedup,
    /// Count queries that found nothing
    Stats {
        #[arg(long = "query", required = true)]
        queries: Vec<String>,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(std::io::stderr).init();
    let cli = Cli::parse();
    let policy = if cli.parallel { ExecutionPolicy::Parallel } else { ExecutionPolicy::Sequential };

    let docs = load_documents(&cli.docs)?;
    let (mut server, _rejected) = build_server(&resolve_stop_words(cli.stop_words), docs)?;

    let start = Instant::now();
    let output = match cli.command {
        Commands::Search { queries, status, joined } => {
            if joined {
                serde_json::to_value(run_search_joined(&server, policy, &queries, status)?)?
            } else {
                serde_json::to_value(run_search(&server, policy, &queries, status)?)?
            }
        }
        Commands::Match { query } => run_match(&server, policy, &query)?,
        Commands::Dedup => run_dedup(&mut server),
        Commands::Stats { queries } => run_stats(&server, &queries),
    };
    tracing::info!(took_s = start.elapsed().as_secs_f64(), ?policy, "command complete");

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use sift_core::snapshot::load_pages;
use sift_core::{Corpus, DocKind, MatchStrategy, SearchConfig, SearchEngine, DEFAULT_FUZZY_THRESHOLD};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build an in-memory search index from a crawl snapshot and query it", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index and print corpus and vocabulary statistics
    Stats {
        /// Snapshot path (JSONL/JSON file or directory)
        #[arg(long)]
        input: String,
    },
    /// Build the index and run one query against it
    Query {
        /// Snapshot path (JSONL/JSON file or directory)
        #[arg(long)]
        input: String,
        /// Query text
        #[arg(long)]
        q: String,
        /// Maximum number of results to print
        #[arg(long, default_value_t = 10)]
        k: usize,
        /// Fuzzy fallback similarity threshold (0-100)
        #[arg(long, default_value_t = DEFAULT_FUZZY_THRESHOLD)]
        fuzzy_threshold: u8,
    },
}

#[derive(Serialize)]
struct Stats {
    pages: usize,
    documents: usize,
    titles: usize,
    paragraphs: usize,
    vocabulary: usize,
    postings: usize,
}

#[derive(Serialize)]
struct QueryReport<'a> {
    query: &'a str,
    strategy: MatchStrategy,
    total_hits: usize,
    results: Vec<ReportHit<'a>>,
}

#[derive(Serialize)]
struct ReportHit<'a> {
    doc_id: u32,
    score: f64,
    kind: DocKind,
    text: &'a str,
    url: Option<&'a str>,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Stats { input } => stats(&input),
        Commands::Query { input, q, k, fuzzy_threshold } => query(&input, &q, k, SearchConfig { fuzzy_threshold }),
    }
}

fn build_engine(input: &str, config: SearchConfig) -> Result<(usize, SearchEngine)> {
    let pages = load_pages(input)?;
    tracing::info!(input, pages = pages.len(), "loaded snapshot");
    let corpus = Corpus::from_pages(&pages);
    Ok((pages.len(), SearchEngine::build(corpus, config)))
}

fn stats(input: &str) -> Result<()> {
    let (pages, engine) = build_engine(input, SearchConfig::default())?;
    let corpus = engine.corpus();
    let titles = corpus.iter().filter(|d| d.kind == DocKind::Title).count();
    let stats = Stats {
        pages,
        documents: corpus.len(),
        titles,
        paragraphs: corpus.len() - titles,
        vocabulary: engine.index().vocabulary_len(),
        postings: engine.index().postings_len(),
    };
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

fn query(input: &str, q: &str, k: usize, config: SearchConfig) -> Result<()> {
    let (_, engine) = build_engine(input, config)?;
    let outcome = engine.search(q);
    let results = outcome
        .hits
        .iter()
        .take(k)
        .filter_map(|hit| {
            let doc = engine.document(hit)?;
            Some(ReportHit { doc_id: hit.doc_id, score: hit.score, kind: doc.kind, text: &doc.text, url: doc.source.as_deref() })
        })
        .collect();
    let report = QueryReport { query: q, strategy: outcome.strategy, total_hits: outcome.hits.len(), results };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

use anyhow::Result;
use axum::Router;
use clap::Parser;
use sift_core::{SearchConfig, DEFAULT_FUZZY_THRESHOLD};
use sift_server::{build_app, ServerSettings};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Crawl snapshot path (JSONL/JSON file or directory)
    #[arg(long, default_value = "./sample_data/crawl.jsonl")]
    corpus: String,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// Fuzzy fallback similarity threshold (0-100)
    #[arg(long, default_value_t = DEFAULT_FUZZY_THRESHOLD)]
    fuzzy_threshold: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let settings = ServerSettings::from_env(&args.corpus, SearchConfig { fuzzy_threshold: args.fuzzy_threshold });
    let app: Router = build_app(settings)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

mod extract;
mod robots;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use reqwest::{header, Client};
use robots::RobotsCache;
use sha1::{Digest, Sha1};
use sift_core::snapshot::write_pages;
use sift_core::CrawledPage;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter};
use std::time::Duration;
use time::format_description::well_known::Rfc3339;
use tokio::task::JoinSet;
use tracing_subscriber::{fmt, EnvFilter};
use url::Url;

const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

#[derive(Parser, Debug)]
#[command(name = "crawler")]
#[command(about = "Fetch pages and write their <h1> titles and <p> paragraphs as a JSONL crawl snapshot")]
struct Cli {
    /// Path to a file with seed URLs (one per line, '#' comments)
    #[arg(long)]
    seeds: Option<String>,
    /// Seed URL; may be repeated
    #[arg(long)]
    url: Vec<String>,
    /// Output JSONL file path
    #[arg(long, default_value = "./sample_data/crawl.jsonl")]
    output: String,
    /// Maximum number of pages to write
    #[arg(long, default_value_t = 1_000)]
    max_pages: usize,
    /// Maximum pages to crawl per host (politeness)
    #[arg(long, default_value_t = 10)]
    max_per_host: usize,
    /// Concurrency (number of in-flight requests)
    #[arg(long, default_value_t = 8)]
    concurrency: usize,
    /// Request timeout seconds
    #[arg(long, default_value_t = 12)]
    timeout_secs: u64,
    /// User-Agent string to use for robots.txt and crawling
    #[arg(long, default_value = "sift-bot/0.1 (+https://example.com/bot)")]
    user_agent: String,
    /// Also crawl links found on fetched pages
    #[arg(long)]
    follow_links: bool,
    /// When following links, stay on the host of the page they were found on
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    same_host_only: bool,
}

/// URLs waiting to be fetched, deduplicated and capped per host.
struct Frontier {
    queue: VecDeque<Url>,
    seen: HashSet<String>,
    per_host: HashMap<String, usize>,
    max_per_host: usize,
}

impl Frontier {
    fn new(seeds: Vec<Url>, max_per_host: usize) -> Self {
        Self { queue: seeds.into(), seen: HashSet::new(), per_host: HashMap::new(), max_per_host }
    }

    fn push(&mut self, url: Url) {
        self.queue.push_back(url);
    }

    fn next(&mut self) -> Option<Url> {
        while let Some(url) = self.queue.pop_front() {
            if !self.seen.insert(normalize(&url)) {
                continue;
            }
            let Some(host) = url.host_str() else { continue };
            let count = self.per_host.entry(host.to_string()).or_insert(0);
            if *count >= self.max_per_host {
                continue;
            }
            *count += 1;
            return Some(url);
        }
        None
    }

    fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

struct Fetched {
    page: CrawledPage,
    links: Vec<Url>,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Cli::parse();

    let seeds = load_seeds(args.seeds.as_deref(), &args.url)?;
    if seeds.is_empty() {
        bail!("no valid seeds");
    }
    if let Some(dir) = std::path::Path::new(&args.output).parent() {
        fs::create_dir_all(dir).ok();
    }
    tracing::info!(seeds = seeds.len(), max_pages = args.max_pages, concurrency = args.concurrency, output = %args.output, "crawl starting");

    let client = Client::builder()
        .user_agent(args.user_agent.clone())
        .redirect(reqwest::redirect::Policy::limited(5))
        .timeout(Duration::from_secs(args.timeout_secs))
        .build()?;
    let robots = RobotsCache::default();
    let mut frontier = Frontier::new(seeds, args.max_per_host);
    let mut out = BufWriter::new(File::create(&args.output)?);
    let mut tasks: JoinSet<(Url, Result<Option<Fetched>>)> = JoinSet::new();
    let mut written = 0usize;

    while written < args.max_pages && (!frontier.is_empty() || !tasks.is_empty()) {
        while tasks.len() < args.concurrency.max(1) && written + tasks.len() < args.max_pages {
            let Some(url) = frontier.next() else { break };
            let client = client.clone();
            let robots = robots.clone();
            tasks.spawn(async move {
                let result = fetch_page(&client, &robots, &url).await;
                (url, result)
            });
        }

        let Some(joined) = tasks.join_next().await else { break };
        let (url, result) = match joined {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "fetch task failed");
                continue;
            }
        };
        match result {
            Ok(Some(fetched)) => {
                if args.follow_links {
                    for link in fetched.links {
                        if args.same_host_only && link.host_str() != url.host_str() {
                            continue;
                        }
                        frontier.push(link);
                    }
                }
                write_pages(&mut out, [&fetched.page])?;
                written += 1;
                if written % 100 == 0 {
                    tracing::info!(written, visited = frontier.seen.len(), queued = frontier.queue.len(), "progress");
                }
            }
            Ok(None) => tracing::debug!(%url, "skipped"),
            Err(e) => {
                let error = format!("{e:#}");
                tracing::warn!(%url, %error, "fetch failed");
            }
        }
    }

    tracing::info!(written, visited = frontier.seen.len(), output = %args.output, "crawl done");
    Ok(())
}

fn load_seeds(file: Option<&str>, urls: &[String]) -> Result<Vec<Url>> {
    let mut raw: Vec<String> = urls.to_vec();
    if let Some(path) = file {
        let reader = BufReader::new(File::open(path).with_context(|| format!("opening seeds {path}"))?);
        for line in reader.lines() {
            raw.push(line?);
        }
    }
    Ok(raw
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty() && !s.starts_with('#'))
        .filter_map(|s| Url::parse(s).or_else(|_| Url::parse(&format!("https://{s}"))).ok())
        .collect())
}

/// Fetch one page. `Ok(None)` when robots.txt forbids it or it is not a usable HTML page.
async fn fetch_page(client: &Client, robots: &RobotsCache, url: &Url) -> Result<Option<Fetched>> {
    let rules = robots.rules_for(client, url).await.ok_or_else(|| anyhow!("url has no host"))?;
    if !rules.allows(url.path()) {
        return Ok(None);
    }
    robots.wait_turn(url, Duration::from_millis(rules.crawl_delay_ms.unwrap_or(0))).await;

    let resp = client.get(url.clone()).send().await?;
    if !resp.status().is_success() {
        return Ok(None);
    }
    let is_html = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|ct| ct.to_str().ok())
        .map_or(true, |ct| ct.starts_with("text/html"));
    if !is_html {
        return Ok(None);
    }
    let bytes = resp.bytes().await?;
    if bytes.len() > MAX_BODY_BYTES {
        return Ok(None);
    }
    let body = String::from_utf8_lossy(&bytes);
    let extracted = extract::extract(url, &body);

    let page_url = normalize(url);
    let mut hasher = Sha1::new();
    hasher.update(page_url.as_bytes());
    let page = CrawledPage {
        id: format!("{:x}", hasher.finalize()),
        url: page_url,
        titles: extracted.titles,
        paragraphs: extracted.paragraphs,
        fetched_at: time::OffsetDateTime::now_utc().format(&Rfc3339).ok(),
    };
    Ok(Some(Fetched { page, links: extracted.links }))
}

fn normalize(u: &Url) -> String {
    let mut s = u.clone();
    s.set_fragment(None);
    s.to_string()
}

use anyhow::Result;
use axum::{
    extract::{Form, Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sift_core::snapshot::load_pages;
use sift_core::{Corpus, DocKind, MatchStrategy, SearchConfig, SearchEngine};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Crawl snapshot the engine is built from, and rebuilt from on demand.
    pub corpus: PathBuf,
    pub search: SearchConfig,
    pub admin_token: Option<String>,
    /// Comma-separated allowed origins; any origin when unset.
    pub cors_allow_origin: Option<String>,
}

impl ServerSettings {
    /// Settings with `ADMIN_TOKEN` and `CORS_ALLOW_ORIGIN` read from the environment.
    pub fn from_env(corpus: impl Into<PathBuf>, search: SearchConfig) -> Self {
        Self {
            corpus: corpus.into(),
            search,
            admin_token: std::env::var("ADMIN_TOKEN").ok(),
            cors_allow_origin: std::env::var("CORS_ALLOW_ORIGIN").ok(),
        }
    }
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { 10 }

/// Body of the HTML search form.
#[derive(Deserialize)]
pub struct SearchForm {
    pub query: String,
    #[serde(default = "default_k")]
    pub k: usize,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub strategy: MatchStrategy,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: u32,
    pub score: f64,
    pub kind: DocKind,
    pub text: String,
    pub url: Option<String>,
    pub snippet: String,
}

#[derive(Serialize)]
pub struct RebuildResponse {
    pub num_docs: usize,
    pub vocabulary: usize,
}

#[derive(Clone)]
pub struct AppState {
    /// Swapped wholesale on rebuild; readers clone the inner `Arc` and never hold the lock.
    pub engine: Arc<RwLock<Arc<SearchEngine>>>,
    pub settings: Arc<ServerSettings>,
}

impl AppState {
    pub fn engine(&self) -> Arc<SearchEngine> {
        self.engine.read().clone()
    }
}

pub fn load_engine(settings: &ServerSettings) -> Result<SearchEngine> {
    let pages = load_pages(&settings.corpus)?;
    Ok(SearchEngine::build(Corpus::from_pages(&pages), settings.search))
}

pub fn build_app(settings: ServerSettings) -> Result<Router> {
    let engine = load_engine(&settings)?;
    tracing::info!(corpus = %settings.corpus.display(), num_docs = engine.corpus().len(), "engine ready");
    let cors = cors_layer(settings.cors_allow_origin.as_deref());
    let state = AppState { engine: Arc::new(RwLock::new(Arc::new(engine))), settings: Arc::new(settings) };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler).post(search_form_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .route("/index/rebuild", post(rebuild_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);
    Ok(app)
}

fn cors_layer(allow_origin: Option<&str>) -> CorsLayer {
    let origins: Vec<_> = allow_origin
        .unwrap_or_default()
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

/// Longest accepted search query, in bytes.
pub const MAX_QUERY_BYTES: usize = 1024;

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    run_search(&state, params.q, params.k).await.map(Json)
}

pub async fn search_form_handler(
    State(state): State<AppState>,
    Form(form): Form<SearchForm>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    run_search(&state, form.query, form.k).await.map(Json)
}

/// Runs the query on the blocking pool; the fuzzy tier scans the whole vocabulary.
async fn run_search(state: &AppState, query: String, k: usize) -> Result<SearchResponse, (StatusCode, String)> {
    if query.len() > MAX_QUERY_BYTES {
        return Err((StatusCode::BAD_REQUEST, format!("query exceeds {MAX_QUERY_BYTES} bytes")));
    }
    let engine = state.engine();
    tokio::task::spawn_blocking(move || respond(&engine, query, k))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

fn respond(engine: &SearchEngine, query: String, k: usize) -> SearchResponse {
    let start = std::time::Instant::now();
    let outcome = engine.search(&query);
    let total_hits = outcome.hits.len();
    let k = k.clamp(1, 100);

    // fuzzy hits contain the activated tokens, not the misspelled query terms
    let terms: Vec<&str> = query
        .split_whitespace()
        .chain(outcome.activated_tokens.iter().map(String::as_str))
        .collect();
    let highlighter = Highlighter::new(&terms);
    let results = outcome
        .hits
        .iter()
        .take(k)
        .filter_map(|hit| {
            let doc = engine.document(hit)?;
            Some(SearchHit {
                doc_id: hit.doc_id,
                score: hit.score,
                kind: doc.kind,
                text: doc.text.clone(),
                url: doc.source.clone(),
                snippet: highlighter.snippet(&doc.text),
            })
        })
        .collect();

    let took_s = start.elapsed().as_secs_f64();
    tracing::debug!(%query, strategy = ?outcome.strategy, total_hits, took_s, "search served");
    SearchResponse { query, strategy: outcome.strategy, took_s, total_hits, results }
}

pub async fn doc_handler(State(state): State<AppState>, Path(doc_id): Path<u32>) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let engine = state.engine();
    match engine.corpus().get(doc_id) {
        Some(doc) => Ok(Json(serde_json::json!({
            "doc_id": doc.id,
            "kind": doc.kind,
            "text": doc.text,
            "url": doc.source,
        }))),
        None => Err((StatusCode::NOT_FOUND, format!("document {doc_id} not found"))),
    }
}

/// Reload the snapshot, build a fresh engine, and swap it in.
async fn rebuild_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<RebuildResponse>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    let settings = state.settings.clone();
    let engine = tokio::task::spawn_blocking(move || load_engine(&settings))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}")))?;

    let response = RebuildResponse { num_docs: engine.corpus().len(), vocabulary: engine.index().vocabulary_len() };
    *state.engine.write() = Arc::new(engine);
    tracing::info!(num_docs = response.num_docs, vocabulary = response.vocabulary, "engine swapped");
    Ok(Json(response))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), (StatusCode, String)> {
    let required = match &state.settings.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}

const SNIPPET_BEFORE: usize = 100;
const SNIPPET_AFTER: usize = 200;

/// Cuts a window around the first query term and wraps every term in `<em>`.
struct Highlighter {
    pattern: Option<regex::Regex>,
}

impl Highlighter {
    fn new(terms: &[&str]) -> Self {
        let mut terms: Vec<&str> = terms.iter().copied().filter(|t| !t.is_empty()).collect();
        // longest first, so "webb" wins over "web" where both match
        terms.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        terms.dedup();
        let alternation: Vec<String> = terms.iter().map(|t| regex::escape(t)).collect();
        let pattern = if alternation.is_empty() {
            None
        } else {
            regex::RegexBuilder::new(&alternation.join("|")).case_insensitive(true).build().ok()
        };
        Self { pattern }
    }

    fn snippet(&self, text: &str) -> String {
        let Some(pattern) = &self.pattern else {
            return text.chars().take(SNIPPET_AFTER).collect();
        };
        let window = match pattern.find(text) {
            Some(m) => {
                let start = floor_char_boundary(text, m.start().saturating_sub(SNIPPET_BEFORE));
                let end = floor_char_boundary(text, (m.start() + SNIPPET_AFTER).min(text.len()));
                &text[start..end]
            }
            None => &text[..floor_char_boundary(text, SNIPPET_AFTER.min(text.len()))],
        };
        pattern.replace_all(window, |caps: &regex::Captures| format!("<em>{}</em>", &caps[0])).into_owned()
    }
}

fn floor_char_boundary(text: &str, mut i: usize) -> usize {
    while !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highlights_case_insensitively() {
        let h = Highlighter::new(&["web"]);
        assert_eq!(h.snippet("The Web and the web"), "The <em>Web</em> and the <em>web</em>");
    }

    #[test]
    fn snippet_window_respects_char_boundaries() {
        let text = format!("{}web{}", "é".repeat(120), "ü".repeat(150));
        let snippet = Highlighter::new(&["web"]).snippet(&text);
        assert!(snippet.contains("<em>web</em>"));
        assert!(snippet.len() < text.len());
    }

    #[test]
    fn longer_terms_take_precedence() {
        let h = Highlighter::new(&["web", "website"]);
        assert_eq!(h.snippet("a website on the web"), "a <em>website</em> on the <em>web</em>");
    }

    #[test]
    fn no_terms_truncates() {
        let text = "x".repeat(500);
        assert_eq!(Highlighter::new(&[]).snippet(&text).len(), SNIPPET_AFTER);
    }
}

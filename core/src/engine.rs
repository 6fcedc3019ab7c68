use crate::corpus::{Corpus, Document};
use crate::index::InvertedIndex;
use crate::matcher::{expand_fuzzy, match_exact, DEFAULT_FUZZY_THRESHOLD};
use crate::ranker::{Ranker, ScoredDoc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Partial-similarity score (0–100) a token must exceed to match fuzzily.
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: u8,
}

fn default_fuzzy_threshold() -> u8 {
    DEFAULT_FUZZY_THRESHOLD
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD }
    }
}

/// Which matcher produced the candidates for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStrategy {
    Exact,
    Fuzzy,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchOutcome {
    pub strategy: MatchStrategy,
    pub hits: Vec<ScoredDoc>,
    /// Vocabulary tokens the fuzzy tier matched, sorted; empty for exact matches.
    pub activated_tokens: Vec<String>,
}

/// A built, read-only search engine over one corpus snapshot.
///
/// To pick up new documents build a fresh engine and swap it in; an existing
/// engine never changes.
#[derive(Debug)]
pub struct SearchEngine {
    corpus: Corpus,
    index: InvertedIndex,
    ranker: Ranker,
    config: SearchConfig,
}

impl SearchEngine {
    pub fn build(corpus: Corpus, config: SearchConfig) -> Self {
        let (index, ranker) = {
            let texts = corpus.texts();
            (InvertedIndex::build(&texts), Ranker::fit(&texts))
        };
        tracing::info!(
            num_docs = corpus.len(),
            vocabulary = index.vocabulary_len(),
            postings = index.postings_len(),
            ranking_terms = ranker.model().vocabulary_len(),
            "search engine built"
        );
        Self { corpus, index, ranker, config }
    }

    /// Exact match first; only when that finds nothing, fuzzy match instead.
    ///
    /// Exact candidates are ranked against the raw query. Fuzzy candidates are
    /// ranked against the raw query plus the vocabulary tokens it activated, so
    /// a misspelled query still scores the documents it was expanded to.
    pub fn search(&self, query: &str) -> SearchOutcome {
        let exact = match_exact(query, &self.index);
        let (strategy, candidates, activated_tokens) = if exact.is_empty() {
            let fuzzy = expand_fuzzy(query, &self.index, self.config.fuzzy_threshold);
            (MatchStrategy::Fuzzy, fuzzy.candidates, fuzzy.tokens)
        } else {
            (MatchStrategy::Exact, exact, Vec::new())
        };
        let ranking_query = if activated_tokens.is_empty() {
            Cow::Borrowed(query)
        } else {
            Cow::Owned(format!("{} {}", query, activated_tokens.join(" ")))
        };
        let hits = self.ranker.score(&candidates, &ranking_query);
        tracing::debug!(query, ?strategy, candidates = candidates.len(), hits = hits.len(), "query resolved");
        SearchOutcome { strategy, hits, activated_tokens }
    }

    /// Ranked document texts for `query`, best first.
    pub fn query(&self, query: &str) -> Vec<&str> {
        self.search(query)
            .hits
            .into_iter()
            .filter_map(|hit| self.corpus.get(hit.doc_id).map(|d| d.text.as_str()))
            .collect()
    }

    pub fn document(&self, hit: &ScoredDoc) -> Option<&Document> {
        self.corpus.get(hit.doc_id)
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn index(&self) -> &InvertedIndex {
        &self.index
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> SearchEngine {
        let corpus = Corpus::from_streams(
            Vec::<String>::new(),
            ["web scraping tutorial", "news about the web", "cooking recipes"],
        );
        SearchEngine::build(corpus, SearchConfig::default())
    }

    #[test]
    fn exact_hit_skips_fuzzy() {
        let outcome = engine().search("web");
        assert_eq!(outcome.strategy, MatchStrategy::Exact);
        assert!(outcome.activated_tokens.is_empty());
        assert_eq!(outcome.hits.iter().map(|h| h.doc_id).collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn misspelling_falls_back_to_fuzzy() {
        let engine = engine();
        let outcome = engine.search("webb");
        assert_eq!(outcome.strategy, MatchStrategy::Fuzzy);
        assert_eq!(outcome.activated_tokens, vec!["web"]);
        assert_eq!(engine.query("webb"), engine.query("web"));
    }

    #[test]
    fn query_returns_texts() {
        assert_eq!(engine().query("web"), vec!["web scraping tutorial", "news about the web"]);
    }

    #[test]
    fn empty_engine_answers_nothing() {
        let engine = SearchEngine::build(Corpus::default(), SearchConfig::default());
        assert!(engine.query("web").is_empty());
        assert_eq!(engine.search("").strategy, MatchStrategy::Fuzzy);
    }

    #[test]
    fn engine_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SearchEngine>();
    }
}

//! TF-IDF vector space ranking.
//!
//! Weights are raw term counts times smoothed idf `ln((1 + n) / (1 + df)) + 1`,
//! and every vector is L2-normalized, so cosine similarity is a plain dot
//! product. Statistics always come from the whole corpus, never from the
//! candidate subset.

use crate::matcher::CandidateSet;
use crate::tokenizer::analyze;
use crate::DocId;
use serde::Serialize;
use std::collections::HashMap;

/// Sparse vector as `(term index, weight)` pairs sorted by term index.
pub type SparseVector = Vec<(usize, f64)>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoredDoc {
    pub doc_id: DocId,
    pub score: f64,
}

#[derive(Debug, Default, Clone)]
pub struct TfidfModel {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    doc_vectors: Vec<SparseVector>,
}

impl TfidfModel {
    pub fn fit<S: AsRef<str>>(corpus: &[S]) -> Self {
        let mut vocabulary: HashMap<String, usize> = HashMap::new();
        let mut df: Vec<u32> = Vec::new();
        let mut counts: Vec<HashMap<usize, u32>> = Vec::with_capacity(corpus.len());

        for text in corpus {
            let mut tf: HashMap<usize, u32> = HashMap::new();
            for term in analyze(text.as_ref()) {
                let next_id = vocabulary.len();
                let term_id = *vocabulary.entry(term).or_insert(next_id);
                if term_id == df.len() {
                    df.push(0);
                }
                *tf.entry(term_id).or_insert(0) += 1;
            }
            for term_id in tf.keys() {
                df[*term_id] += 1;
            }
            counts.push(tf);
        }

        let n = corpus.len() as f64;
        let idf: Vec<f64> = df.iter().map(|&d| ((1.0 + n) / (1.0 + d as f64)).ln() + 1.0).collect();
        let doc_vectors = counts.into_iter().map(|tf| weigh(tf, &idf)).collect();
        Self { vocabulary, idf, doc_vectors }
    }

    /// Project `text` into the fitted space; terms outside the vocabulary are dropped.
    pub fn transform(&self, text: &str) -> SparseVector {
        let mut tf: HashMap<usize, u32> = HashMap::new();
        for term in analyze(text) {
            if let Some(&term_id) = self.vocabulary.get(&term) {
                *tf.entry(term_id).or_insert(0) += 1;
            }
        }
        weigh(tf, &self.idf)
    }

    pub fn doc_vector(&self, doc_id: DocId) -> Option<&SparseVector> {
        self.doc_vectors.get(doc_id as usize)
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn num_docs(&self) -> usize {
        self.doc_vectors.len()
    }
}

fn weigh(tf: HashMap<usize, u32>, idf: &[f64]) -> SparseVector {
    let mut v: SparseVector = tf.into_iter().map(|(t, c)| (t, c as f64 * idf[t])).collect();
    v.sort_by_key(|(t, _)| *t);
    let norm = v.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
    if norm > 0.0 {
        for (_, w) in v.iter_mut() {
            *w /= norm;
        }
    }
    v
}

/// Dot product of two sorted, normalized sparse vectors.
pub fn cosine(a: &SparseVector, b: &SparseVector) -> f64 {
    let (mut i, mut j, mut dot) = (0, 0, 0.0);
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                dot += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    dot
}

/// Ranks candidates against a query with a model fitted on the full corpus.
#[derive(Debug, Default, Clone)]
pub struct Ranker {
    model: TfidfModel,
}

impl Ranker {
    pub fn fit<S: AsRef<str>>(corpus: &[S]) -> Self {
        Self { model: TfidfModel::fit(corpus) }
    }

    pub fn model(&self) -> &TfidfModel {
        &self.model
    }

    /// Candidates with a positive cosine score, best first. Equal scores keep
    /// the candidate set's order.
    pub fn score(&self, candidates: &CandidateSet, query: &str) -> Vec<ScoredDoc> {
        let q = self.model.transform(query);
        let mut scored: Vec<ScoredDoc> = candidates
            .iter()
            .filter_map(|&doc_id| {
                let v = self.model.doc_vector(doc_id)?;
                Some(ScoredDoc { doc_id, score: cosine(v, &q) })
            })
            .collect();
        // sort_by is stable
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.retain(|s| s.score > 0.0);
        scored
    }

    /// Like [`Ranker::score`] but returns the document texts from `corpus`.
    pub fn rank<'c, S: AsRef<str>>(&self, candidates: &CandidateSet, corpus: &'c [S], query: &str) -> Vec<&'c str> {
        self.score(candidates, query)
            .into_iter()
            .filter_map(|s| corpus.get(s.doc_id as usize).map(|text| text.as_ref()))
            .collect()
    }
}

/// One-shot ranking: fit on `corpus`, then order `candidates` by similarity to `query`.
pub fn rank<S: AsRef<str>>(candidates: &CandidateSet, corpus: &[S], query: &str) -> Vec<String> {
    Ranker::fit(corpus)
        .rank(candidates, corpus, query)
        .into_iter()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CORPUS: [&str; 3] = ["web scraping tutorial", "news about the web", "cooking recipes"];

    #[test]
    fn idf_is_smoothed() {
        let model = TfidfModel::fit(&CORPUS);
        let q = model.transform("web");
        assert_eq!(q.len(), 1);
        // single-term query vector normalizes to 1
        assert!((q[0].1 - 1.0).abs() < 1e-12);

        // doc 0: web (df 2) + two df-1 terms
        let web = (4.0f64 / 3.0).ln() + 1.0;
        let rare = 2.0f64.ln() + 1.0;
        let expected = web / (web * web + 2.0 * rare * rare).sqrt();
        let v = model.doc_vector(0).unwrap();
        assert!((cosine(v, &q) - expected).abs() < 1e-12);
    }

    #[test]
    fn ranks_by_weight_and_drops_zero() {
        let ranker = Ranker::fit(&CORPUS);
        let all = CandidateSet::from([0, 1, 2]);
        let ranked = ranker.rank(&all, &CORPUS, "web");
        assert_eq!(ranked, vec!["web scraping tutorial", "news about the web"]);
    }

    #[test]
    fn higher_tf_ranks_higher() {
        let corpus = ["rust rust rust guide", "rust go java guide", "python guide"];
        let scored = Ranker::fit(&corpus).score(&CandidateSet::from([0, 1]), "rust");
        assert_eq!(scored[0].doc_id, 0);
        assert!(scored[0].score > scored[1].score);
    }

    #[test]
    fn ties_keep_candidate_order() {
        let corpus = ["alpha beta", "alpha beta", "gamma"];
        let scored = Ranker::fit(&corpus).score(&CandidateSet::from([1, 0]), "alpha");
        assert_eq!(scored.iter().map(|s| s.doc_id).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(scored[0].score, scored[1].score);
    }

    #[test]
    fn empty_inputs_rank_to_nothing() {
        assert!(rank(&CandidateSet::new(), &CORPUS, "web").is_empty());
        assert!(rank(&CandidateSet::from([0, 1]), &CORPUS, "zebra").is_empty());
        let empty: [&str; 0] = [];
        assert!(rank(&CandidateSet::from([0]), &empty, "web").is_empty());
    }

    #[test]
    fn unseen_query_terms_have_no_weight() {
        let model = TfidfModel::fit(&CORPUS);
        assert_eq!(model.transform("web zebra"), model.transform("web"));
    }
}

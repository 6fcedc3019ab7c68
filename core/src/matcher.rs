use crate::index::InvertedIndex;
use crate::similarity::partial_ratio;
use crate::tokenizer::tokenize;
use crate::DocId;
use std::collections::BTreeSet;

/// Deduplicated candidate documents, iterated in ascending id order.
pub type CandidateSet = BTreeSet<DocId>;

/// A vocabulary token must score strictly above this to join a fuzzy match.
pub const DEFAULT_FUZZY_THRESHOLD: u8 = 70;

/// Documents containing every indexed query token.
///
/// Query tokens missing from the index are skipped rather than emptying the
/// result. If no query token is indexed at all the result is empty.
pub fn match_exact(query: &str, index: &InvertedIndex) -> CandidateSet {
    let mut sets = tokenize(query)
        .into_iter()
        .filter(|token| index.contains(token))
        .map(|token| index.lookup(&token).iter().copied().collect::<CandidateSet>());

    let Some(mut acc) = sets.next() else {
        return CandidateSet::new();
    };
    for set in sets {
        acc.retain(|doc_id| set.contains(doc_id));
        if acc.is_empty() {
            break;
        }
    }
    acc
}

/// Vocabulary tokens that matched a fuzzy query, and their pooled postings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FuzzyMatch {
    /// Matched tokens in lexical order.
    pub tokens: Vec<String>,
    pub candidates: CandidateSet,
}

/// Union of the postings of every vocabulary token whose partial similarity
/// to the whole lowercased query is above `threshold`.
///
/// Scans the full vocabulary; this is the expensive path of a query.
pub fn match_fuzzy(query: &str, index: &InvertedIndex, threshold: u8) -> CandidateSet {
    expand_fuzzy(query, index, threshold).candidates
}

/// [`match_fuzzy`], also reporting which tokens were activated.
pub fn expand_fuzzy(query: &str, index: &InvertedIndex, threshold: u8) -> FuzzyMatch {
    let query = query.to_lowercase();
    let mut out = FuzzyMatch::default();
    for token in index.tokens() {
        if partial_ratio(&query, token) > threshold {
            out.candidates.extend(index.lookup(token).iter().copied());
            out.tokens.push(token.to_string());
        }
    }
    out.tokens.sort_unstable();
    out
}

pub mod corpus;
pub mod engine;
pub mod index;
pub mod matcher;
pub mod ranker;
pub mod similarity;
pub mod snapshot;
pub mod tokenizer;

/// Position of a document in its corpus. A corpus holds at most
/// `DocId::MAX + 1` documents; anything past that is not indexed.
pub type DocId = u32;

/// The id of the document at `position`, or `None` past the id space.
pub(crate) fn doc_id(position: usize) -> Option<DocId> {
    DocId::try_from(position).ok()
}

pub use corpus::{Corpus, DocKind, Document};
pub use engine::{MatchStrategy, SearchConfig, SearchEngine, SearchOutcome};
pub use index::InvertedIndex;
pub use matcher::{expand_fuzzy, match_exact, match_fuzzy, CandidateSet, FuzzyMatch, DEFAULT_FUZZY_THRESHOLD};
pub use ranker::{rank, Ranker, ScoredDoc, TfidfModel};
pub use snapshot::CrawledPage;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_map_to_ids_up_to_the_cap() {
        assert_eq!(doc_id(0), Some(0));
        assert_eq!(doc_id(DocId::MAX as usize), Some(DocId::MAX));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn positions_past_the_cap_have_no_id() {
        assert_eq!(doc_id(DocId::MAX as usize + 1), None);
        assert_eq!(doc_id(usize::MAX), None);
    }
}

use crate::tokenizer::tokenize;
use crate::{doc_id, DocId};
use std::collections::HashMap;

/// Token → positions of the documents containing it.
///
/// Postings keep one entry per occurrence, in corpus scan order. The index is
/// only ever produced whole by [`InvertedIndex::build`] and is read-only after.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InvertedIndex {
    postings: HashMap<String, Vec<DocId>>,
    num_docs: u32,
}

impl InvertedIndex {
    /// Index `documents` in order. Documents past `DocId::MAX` are skipped
    /// with a warning, since they have no id to post.
    pub fn build<S: AsRef<str>>(documents: &[S]) -> Self {
        let mut postings: HashMap<String, Vec<DocId>> = HashMap::new();
        let mut num_docs: DocId = 0;
        for (position, text) in documents.iter().enumerate() {
            let Some(id) = doc_id(position) else {
                tracing::warn!(skipped = documents.len() - position, "documents past the id space were not indexed");
                break;
            };
            for token in tokenize(text.as_ref()) {
                postings.entry(token).or_default().push(id);
            }
            num_docs = id.saturating_add(1);
        }
        Self { postings, num_docs }
    }

    /// Posting list for `token`; empty when the token was never indexed.
    pub fn lookup(&self, token: &str) -> &[DocId] {
        self.postings.get(token).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, token: &str) -> bool {
        self.postings.contains_key(token)
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.postings.keys().map(String::as_str)
    }

    pub fn vocabulary_len(&self) -> usize {
        self.postings.len()
    }

    pub fn num_docs(&self) -> u32 {
        self.num_docs
    }

    /// Total number of postings across all tokens.
    pub fn postings_len(&self) -> usize {
        self.postings.values().map(Vec::len).sum()
    }
}

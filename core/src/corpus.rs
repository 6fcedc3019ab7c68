use crate::snapshot::CrawledPage;
use crate::{doc_id, DocId};
use serde::{Deserialize, Serialize};

type Entry = (DocKind, String, Option<String>);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocKind {
    Title,
    Paragraph,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub kind: DocKind,
    pub text: String,
    /// URL of the page the text was extracted from, when known.
    pub source: Option<String>,
}

/// Ordered, immutable document collection. A document's id is its position.
///
/// Titles and paragraphs share one id space: every title comes first, then
/// every paragraph, so the index and the ranker always agree on what an id
/// refers to. At most `DocId::MAX + 1` documents are kept.
#[derive(Debug, Default, Clone)]
pub struct Corpus {
    docs: Vec<Document>,
}

impl Corpus {
    pub fn from_streams<T, P>(titles: T, paragraphs: P) -> Self
    where
        T: IntoIterator,
        T::Item: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        let titles = titles.into_iter().map(|t| -> Entry { (DocKind::Title, t.into(), None) });
        let paragraphs = paragraphs.into_iter().map(|p| -> Entry { (DocKind::Paragraph, p.into(), None) });
        Self::assemble(titles.chain(paragraphs))
    }

    pub fn from_pages(pages: &[CrawledPage]) -> Self {
        let titles = pages
            .iter()
            .flat_map(|p| p.titles.iter().map(move |t| (DocKind::Title, t.clone(), Some(p.url.clone()))));
        let paragraphs = pages
            .iter()
            .flat_map(|p| p.paragraphs.iter().map(move |t| (DocKind::Paragraph, t.clone(), Some(p.url.clone()))));
        Self::assemble(titles.chain(paragraphs))
    }

    fn assemble(items: impl Iterator<Item = Entry>) -> Self {
        let mut docs = Vec::new();
        for (position, (kind, text, source)) in items.enumerate() {
            let Some(id) = doc_id(position) else {
                tracing::warn!(kept = docs.len(), "corpus truncated at the document id limit");
                break;
            };
            docs.push(Document { id, kind, text, source });
        }
        Self { docs }
    }

    pub fn get(&self, id: DocId) -> Option<&Document> {
        self.docs.get(id as usize)
    }

    /// Document texts in id order, borrowed from the documents.
    pub fn texts(&self) -> Vec<&str> {
        self.docs.iter().map(|d| d.text.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.docs.iter()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titles_precede_paragraphs() {
        let corpus = Corpus::from_streams(["Intro", "Outro"], ["first para"]);
        let kinds: Vec<_> = corpus.iter().map(|d| (d.id, d.kind)).collect();
        assert_eq!(kinds, vec![(0, DocKind::Title), (1, DocKind::Title), (2, DocKind::Paragraph)]);
        assert_eq!(corpus.texts()[2], "first para");
    }

    #[test]
    fn pages_keep_their_source() {
        let pages = vec![
            CrawledPage::new("https://a.example/", vec!["A".into()], vec!["a body".into()]),
            CrawledPage::new("https://b.example/", vec!["B".into()], vec![]),
        ];
        let corpus = Corpus::from_pages(&pages);
        assert_eq!(corpus.texts(), vec!["A", "B", "a body"]);
        assert_eq!(corpus.get(1).and_then(|d| d.source.as_deref()), Some("https://b.example/"));
        assert_eq!(corpus.get(2).map(|d| d.kind), Some(DocKind::Paragraph));
        assert!(corpus.get(3).is_none());
    }

    #[test]
    fn texts_borrow_from_documents() {
        let corpus = Corpus::from_streams(["Intro"], ["first para"]);
        let texts = corpus.texts();
        for (doc, text) in corpus.iter().zip(&texts) {
            assert!(std::ptr::eq(doc.text.as_str(), *text));
        }
        assert_eq!(texts.len(), corpus.len());
    }
}

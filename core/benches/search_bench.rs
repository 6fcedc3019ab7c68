use criterion::{criterion_group, criterion_main, Criterion};
use sift_core::tokenizer::tokenize;
use sift_core::{match_fuzzy, Corpus, InvertedIndex, SearchConfig, SearchEngine, DEFAULT_FUZZY_THRESHOLD};

fn synthetic_corpus() -> Vec<String> {
    (0..2_000)
        .map(|i| format!("document {i} about topic{} with term{} and word{}", i % 97, i % 31, i % 503))
        .collect()
}

fn bench_tokenize(c: &mut Criterion) {
    let text = synthetic_corpus().join(" ");
    c.bench_function("tokenize_corpus", |b| b.iter(|| tokenize(&text)));
}

fn bench_fuzzy_scan(c: &mut Criterion) {
    let docs = synthetic_corpus();
    let index = InvertedIndex::build(&docs);
    c.bench_function("fuzzy_vocabulary_scan", |b| b.iter(|| match_fuzzy("topik42", &index, DEFAULT_FUZZY_THRESHOLD)));
}

fn bench_query(c: &mut Criterion) {
    let engine = SearchEngine::build(Corpus::from_streams(Vec::<String>::new(), synthetic_corpus()), SearchConfig::default());
    c.bench_function("exact_query", |b| b.iter(|| engine.query("topic42 term11")));
}

criterion_group!(benches, bench_tokenize, bench_fuzzy_scan, bench_query);
criterion_main!(benches);

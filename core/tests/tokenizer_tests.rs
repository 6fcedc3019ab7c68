use sift_core::tokenizer::{analyze, tokenize};

#[test]
fn it_lowercases_without_stemming() {
    let toks = tokenize("Running Runners RUN! The café's menu.");
    assert_eq!(toks, vec!["running", "runners", "run!", "the", "café's", "menu."]);
}

#[test]
fn it_handles_blank_input() {
    assert!(tokenize("").is_empty());
    assert!(tokenize(" \n\t ").is_empty());
}

#[test]
fn analyzer_splits_on_non_word_chars() {
    let terms = analyze("Café's menu: RUN! a b cd");
    assert_eq!(terms, vec!["café", "menu", "run", "cd"]);
}

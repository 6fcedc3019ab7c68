use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Runs of two or more word characters, the default term pattern of a TF-IDF vectorizer.
    static ref TERM_RE: Regex = Regex::new(r"\b\w\w+\b").expect("valid regex");
}

/// Split text on whitespace runs and lowercase each piece.
///
/// Punctuation stays attached to its word: `"web,"` and `"web"` are distinct tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

/// Extract ranking terms: lowercase, then every run of at least two word characters.
pub fn analyze(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TERM_RE.find_iter(&lowered).map(|m| m.as_str().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_runs_collapse() {
        assert_eq!(tokenize("  Web\t\tScraping\n tutorial "), vec!["web", "scraping", "tutorial"]);
    }

    #[test]
    fn analyze_drops_single_chars_and_punctuation() {
        assert_eq!(analyze("A web-scraping tutorial, part 2!"), vec!["web", "scraping", "tutorial", "part"]);
    }
}

use scraper::{Html, Selector};
use url::Url;

/// Text pulled out of one HTML page.
#[derive(Debug, Default, PartialEq)]
pub struct Extracted {
    pub titles: Vec<String>,
    pub paragraphs: Vec<String>,
    pub links: Vec<Url>,
}

/// `<h1>` texts become titles and `<p>` texts paragraphs; blank ones are dropped.
/// Links are resolved against `base` and kept when http(s).
pub fn extract(base: &Url, html: &str) -> Extracted {
    let doc = Html::parse_document(html);
    let h1 = Selector::parse("h1").expect("valid selector");
    let p = Selector::parse("p").expect("valid selector");
    let a = Selector::parse("a[href]").expect("valid selector");
    let texts = |selector: &Selector| -> Vec<String> {
        doc.select(selector)
            .map(|n| n.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    };
    let links = doc
        .select(&a)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| base.join(href).ok())
        .filter(|u| matches!(u.scheme(), "http" | "https"))
        .collect();
    Extracted { titles: texts(&h1), paragraphs: texts(&p), links }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pulls_headings_paragraphs_and_links() {
        let base = Url::parse("https://example.com/wiki/Web_scraping").unwrap();
        let html = r#"<html><body>
            <h1>Web scraping</h1>
            <p>Web scraping is data extraction.</p>
            <p>   </p>
            <p>It uses <b>crawlers</b>.</p>
            <a href="/wiki/Crawler">c</a>
            <a href="mailto:x@example.com">m</a>
        </body></html>"#;
        let out = extract(&base, html);
        assert_eq!(out.titles, vec!["Web scraping"]);
        assert_eq!(out.paragraphs, vec!["Web scraping is data extraction.", "It uses crawlers."]);
        assert_eq!(out.links, vec![Url::parse("https://example.com/wiki/Crawler").unwrap()]);
    }
}

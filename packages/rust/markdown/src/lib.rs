//! HTML-to-text normalization for fetched pages.
//!
//! Converts rendered HTML to compact Markdown using the `htmd` crate, then
//! applies cleanup passes so the text is ready to be summarized.

mod cleanup;

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};
use url::Url;

use lunathink_shared::{LunathinkError, Result};

/// Tags htmd drops entirely (content included).
const SKIP_TAGS: [&str; 10] = [
    "script", "style", "nav", "iframe", "noscript", "svg", "form", "button", "header", "footer",
];

/// Containers tried in order when looking for the article body.
const CONTENT_SELECTORS: [&str; 9] = [
    "article [itemprop=\"articleBody\"]",
    "article .entry-content",
    "article .post-content",
    ".article-body",
    "[role=\"main\"] article",
    "article",
    "main",
    "[role=\"main\"]",
    ".content",
];

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Result of normalizing one HTML page.
#[derive(Debug, Clone)]
pub struct Normalized {
    /// Cleaned Markdown text.
    pub text: String,
    /// Title from the first H1, falling back to `<title>`.
    pub title: Option<String>,
    /// Approximate word count of `text`.
    pub word_count: usize,
}

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

/// Normalize rendered HTML into Markdown text.
///
/// 1. Pick the article container (or `<body>`)
/// 2. Pre-process HTML tables into Markdown tables
/// 3. Convert HTML → Markdown via `htmd`
/// 4. Run the cleanup passes
#[instrument(skip(html), fields(url = %source_url))]
pub fn normalize(html: &str, source_url: &str) -> Result<Normalized> {
    let doc = Html::parse_document(html);
    let document_title = extract_document_title(&doc);

    let content_html = extract_content_html(&doc).unwrap_or_else(|| html.to_string());
    let content_html = preprocess_tables(&content_html);

    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(SKIP_TAGS.to_vec())
        .build();

    let raw_markdown = converter
        .convert(&content_html)
        .map_err(|e| LunathinkError::Conversion(format!("htmd conversion failed: {e}")))?;

    debug!(raw_len = raw_markdown.len(), "htmd conversion complete");

    let base_url = Url::parse(source_url).ok();
    let text = cleanup::run_pipeline(&raw_markdown, base_url.as_ref());

    let title = extract_title_from_markdown(&text).or(document_title);
    let word_count = text.split_whitespace().count();

    debug!(?title, word_count, "normalization complete");

    Ok(Normalized {
        text,
        title,
        word_count,
    })
}

// ---------------------------------------------------------------------------
// Content extraction
// ---------------------------------------------------------------------------

/// Inner HTML of the most specific article container, else of `<body>`.
fn extract_content_html(doc: &Html) -> Option<String> {
    CONTENT_SELECTORS
        .iter()
        .chain(std::iter::once(&"body"))
        .filter_map(|sel| Selector::parse(sel).ok())
        .find_map(|selector| doc.select(&selector).next().map(|el| el.inner_html()))
}

/// Text of the `<title>` element, if present and non-empty.
fn extract_document_title(doc: &Html) -> Option<String> {
    static TITLE_SEL: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("title").expect("valid selector"));

    doc.select(&TITLE_SEL)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Text of the first H1 in the Markdown.
fn extract_title_from_markdown(md: &str) -> Option<String> {
    static H1_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?m)^# (.+)$").expect("valid regex"));

    H1_RE.captures(md).map(|c| c[1].trim().to_string())
}

// ---------------------------------------------------------------------------
// Table pre-processing
// ---------------------------------------------------------------------------

/// Replace HTML `<table>` elements with Markdown tables before htmd runs.
///
/// `htmd` 0.1 doesn't convert tables.
fn preprocess_tables(html: &str) -> String {
    static TABLE_SEL: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("table").expect("valid selector"));

    let doc = Html::parse_fragment(html);
    if doc.select(&TABLE_SEL).next().is_none() {
        return html.to_string();
    }

    // Match against html5ever's serialization so implied tags (`<tbody>`) line up
    let mut result = doc.root_element().inner_html();

    for table in doc.select(&TABLE_SEL) {
        let md_table = table_to_markdown(&table);
        result = result.replacen(&table.html(), &md_table, 1);
    }

    result
}

/// Convert one table element to Markdown. The first row is the header.
fn table_to_markdown(table: &ElementRef) -> String {
    static ROW_SEL: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("tr").expect("valid selector"));
    static CELL_SEL: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("th, td").expect("valid selector"));

    let rows: Vec<Vec<String>> = table
        .select(&ROW_SEL)
        .map(|tr| {
            tr.select(&CELL_SEL)
                .map(|cell| {
                    cell.text()
                        .collect::<String>()
                        .split_whitespace()
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .collect::<Vec<_>>()
        })
        .filter(|cells| !cells.is_empty())
        .collect();

    let col_count = rows.iter().map(Vec::len).max().unwrap_or(0);
    if col_count == 0 {
        return String::new();
    }

    let render_row = |row: &[String]| {
        let mut cells = row.to_vec();
        cells.resize(col_count, String::new());
        format!("| {} |\n", cells.join(" | "))
    };

    let mut md = String::from("\n\n");
    md.push_str(&render_row(&rows[0]));
    md.push_str(&format!("| {} |\n", vec!["---"; col_count].join(" | ")));
    for row in &rows[1..] {
        md.push_str(&render_row(row));
    }
    md.push('\n');
    md
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://news.example.com/ai/story";

    #[test]
    fn normalize_simple_article() {
        let html = "<html><head><title>Site | Story</title></head><body>\
                    <article><h1>Chips get cheaper</h1><p>Prices fell <strong>20%</strong>.</p></article>\
                    </body></html>";
        let result = normalize(html, URL).unwrap();

        assert!(result.text.starts_with("# Chips get cheaper"));
        assert!(result.text.contains("Prices fell **20%**."));
        assert_eq!(result.title.as_deref(), Some("Chips get cheaper"));
        assert!(result.word_count >= 6);
    }

    #[test]
    fn normalize_prefers_article_body_over_chrome() {
        let html = r#"<html><body>
            <header><a href="/">Home</a> | <a href="/subscribe">Subscribe</a></header>
            <nav><a href="/ai">AI</a></nav>
            <main>
              <article><h1>Model release</h1><p>The lab published weights.</p></article>
              <aside>Most read today</aside>
            </main>
            <footer><p>Copyright 2026</p></footer>
        </body></html>"#;

        let result = normalize(html, URL).unwrap();
        assert!(result.text.contains("The lab published weights."));
        assert!(!result.text.contains("Copyright 2026"));
        assert!(!result.text.contains("Subscribe"));
        assert!(!result.text.contains("Most read"));
    }

    #[test]
    fn normalize_falls_back_to_body_and_document_title() {
        let html = "<html><head><title>Plain page</title></head>\
                    <body><p>Just a paragraph.</p><script>track()</script></body></html>";
        let result = normalize(html, URL).unwrap();

        assert_eq!(result.text, "Just a paragraph.");
        assert_eq!(result.title.as_deref(), Some("Plain page"));
    }

    #[test]
    fn normalize_converts_tables() {
        let html = r#"<html><body><article>
            <h1>Benchmarks</h1>
            <table>
                <tr><th>Model</th><th>Score</th></tr>
                <tr><td>A</td><td>71.2</td></tr>
                <tr><td>B</td><td>68.0</td></tr>
            </table>
        </article></body></html>"#;

        let result = normalize(html, URL).unwrap();
        assert!(result.text.contains("| Model | Score |"));
        assert!(result.text.contains("| A | 71.2 |"));
    }

    #[test]
    fn normalize_resolves_relative_links() {
        let html = r#"<html><body><article><p>See <a href="/ai/paper">the paper</a>.</p></article></body></html>"#;
        let result = normalize(html, URL).unwrap();
        assert!(result.text.contains("[the paper](https://news.example.com/ai/paper)"));
    }

    #[test]
    fn normalize_empty_page() {
        let result = normalize("<html><body></body></html>", URL).unwrap();
        assert!(result.text.is_empty());
        assert_eq!(result.title, None);
        assert_eq!(result.word_count, 0);
    }

    #[test]
    fn table_pads_ragged_rows() {
        let doc = Html::parse_fragment(
            "<table><tr><th>a</th><th>b</th></tr><tr><td>1</td></tr></table>",
        );
        let sel = Selector::parse("table").unwrap();
        let table = doc.select(&sel).next().unwrap();
        let md = table_to_markdown(&table);
        assert!(md.contains("| a | b |"));
        assert!(md.contains("| 1 |  |"));
    }
}

//! Post-conversion cleanup passes for normalized page text.
//!
//! Each pass is a function `&str -> String` applied in sequence. The output
//! is fed to a language model, so passes favour compact readable text over
//! faithful rendering (images become their alt text, link-less anchors
//! disappear, blank-line runs collapse to one).

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Run the full cleanup pipeline on raw Markdown text.
pub(crate) fn run_pipeline(md: &str, base_url: Option<&Url>) -> String {
    let mut result = md.to_string();

    result = normalize_headings(&result);
    result = strip_leftover_html(&result);
    result = images_to_alt_text(&result);
    result = drop_empty_links(&result);
    result = resolve_links(&result, base_url);
    result = trim_line_ends(&result);
    result = collapse_blank_lines(&result);

    result.trim().to_string()
}

// ---------------------------------------------------------------------------
// Headings
// ---------------------------------------------------------------------------

/// Keep the first H1 and demote later ones to H2.
///
/// Article pages often repeat the headline in a teaser block.
fn normalize_headings(md: &str) -> String {
    static H_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.+)$").expect("valid regex"));

    let mut seen_h1 = false;

    md.lines()
        .map(|line| match H_RE.captures(line) {
            Some(caps) if &caps[1] == "#" => {
                if seen_h1 {
                    format!("## {}", &caps[2])
                } else {
                    seen_h1 = true;
                    line.to_string()
                }
            }
            _ => line.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Leftover HTML
// ---------------------------------------------------------------------------

/// Remove layout tags htmd passed through, keeping their text. Fenced code
/// is left alone.
fn strip_leftover_html(md: &str) -> String {
    static HTML_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(
            r"</?(?:div|span|section|article|aside|header|footer|figure|figcaption|details|summary|picture|source|time|font|center)(?:\s[^>]*)?/?>",
        )
        .expect("valid regex")
    });

    let mut in_code_block = false;
    let mut lines = Vec::new();

    for line in md.lines() {
        if line.trim_start().starts_with("```") {
            in_code_block = !in_code_block;
            lines.push(line.to_string());
        } else if in_code_block {
            lines.push(line.to_string());
        } else {
            lines.push(HTML_TAG_RE.replace_all(line, "").to_string());
        }
    }

    lines.join("\n")
}

// ---------------------------------------------------------------------------
// Images and links
// ---------------------------------------------------------------------------

/// Replace `![alt](src)` with `alt` (or nothing when the alt is empty).
fn images_to_alt_text(md: &str) -> String {
    static IMG_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"!\[([^\]]*)\]\([^)]*\)").expect("valid regex"));

    IMG_RE
        .replace_all(md, |caps: &regex::Captures| caps[1].trim().to_string())
        .to_string()
}

/// Drop links whose visible text is empty (icon buttons, share widgets).
fn drop_empty_links(md: &str) -> String {
    static EMPTY_LINK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\[\s*\]\([^)]*\)").expect("valid regex"));

    EMPTY_LINK_RE.replace_all(md, "").to_string()
}

/// Resolve relative URLs in Markdown links against the page URL.
fn resolve_links(md: &str, base_url: Option<&Url>) -> String {
    let Some(base) = base_url else {
        return md.to_string();
    };

    static LINK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)\s]+)\)").expect("valid regex"));

    LINK_RE
        .replace_all(md, |caps: &regex::Captures| {
            let text = &caps[1];
            let href = &caps[2];

            if href.starts_with("http://")
                || href.starts_with("https://")
                || href.starts_with('#')
                || href.starts_with("mailto:")
            {
                return caps[0].to_string();
            }

            match base.join(href) {
                Ok(resolved) => format!("[{text}]({resolved})"),
                Err(_) => caps[0].to_string(),
            }
        })
        .to_string()
}

// ---------------------------------------------------------------------------
// Whitespace
// ---------------------------------------------------------------------------

fn trim_line_ends(md: &str) -> String {
    md.lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Collapse any run of blank (or whitespace-only) lines into a single blank line.
fn collapse_blank_lines(md: &str) -> String {
    static BLANK_RUN_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n\s*\n").expect("valid regex"));

    BLANK_RUN_RE.replace_all(md, "\n\n").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_headings_demotes_repeated_h1() {
        let input = "# Headline\n\nLede\n\n# Headline\n\nBody";
        assert_eq!(
            normalize_headings(input),
            "# Headline\n\nLede\n\n## Headline\n\nBody"
        );
    }

    #[test]
    fn normalize_headings_keeps_single_h1() {
        let input = "# Only One\n\n## Sub\n\n### Deep";
        assert_eq!(normalize_headings(input), input);
    }

    #[test]
    fn strip_leftover_html_removes_layout_tags() {
        let input = "<div class=\"byline\">By <span>Ada</span></div>";
        assert_eq!(strip_leftover_html(input), "By Ada");
    }

    #[test]
    fn strip_leftover_html_preserves_code_blocks() {
        let input = "Text\n\n```html\n<div>Preserved</div>\n```";
        assert!(strip_leftover_html(input).contains("<div>Preserved</div>"));
    }

    #[test]
    fn images_become_alt_text() {
        assert_eq!(
            images_to_alt_text("Before ![A chart of GPU prices](/img/c.png) after"),
            "Before A chart of GPU prices after"
        );
        assert_eq!(images_to_alt_text("![](/pixel.gif)"), "");
    }

    #[test]
    fn empty_links_are_dropped() {
        assert_eq!(drop_empty_links("Share [](https://x.com/share) now"), "Share  now");
    }

    #[test]
    fn resolve_links_relative_resolved() {
        let base = Url::parse("https://news.example.com/ai/story").unwrap();
        assert_eq!(
            resolve_links("[More](/ai/other)", Some(&base)),
            "[More](https://news.example.com/ai/other)"
        );
    }

    #[test]
    fn resolve_links_absolute_and_anchor_untouched() {
        let base = Url::parse("https://news.example.com/").unwrap();
        assert_eq!(
            resolve_links("[Paper](https://arxiv.org/abs/1)", Some(&base)),
            "[Paper](https://arxiv.org/abs/1)"
        );
        assert_eq!(resolve_links("[Top](#top)", Some(&base)), "[Top](#top)");
    }

    #[test]
    fn collapse_blank_lines_leaves_single_gap() {
        assert_eq!(collapse_blank_lines("a\n\n\n  \n\nb"), "a\n\nb");
        assert_eq!(collapse_blank_lines("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn full_pipeline_cleans_article_text() {
        let input = "# Title   \n\n\n\n<section>Some content</section>\n\n![](/x.png)\n\n[Read](/next)\n\n";
        let base = Url::parse("https://example.com/page").unwrap();
        let result = run_pipeline(input, Some(&base));

        assert_eq!(
            result,
            "# Title\n\nSome content\n\n[Read](https://example.com/next)"
        );
    }
}

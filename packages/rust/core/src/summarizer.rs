//! Per-page summarization with deliberate lossy truncation.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use lunathink_shared::{AcquiredPage, Condenser, PageSummary};

use crate::progress::ProgressReporter;
use crate::workers::bounded_map;

/// First `max_words` whitespace-separated words of `text`, single-spaced.
pub fn truncate_words(text: &str, max_words: usize) -> String {
    text.split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Summarize one page. Failures and empty replies yield `None`.
pub async fn summarize(
    condenser: &dyn Condenser,
    page: &AcquiredPage,
    max_words: usize,
) -> Option<PageSummary> {
    let input = truncate_words(&page.normalized_text, max_words);
    debug!(url = %page.url, words = input.split(' ').count(), "summarizing page");

    match condenser.condense(&input).await {
        Ok(summary) if !summary.trim().is_empty() => Some(PageSummary {
            url: page.url.clone(),
            summary_text: summary,
        }),
        Ok(_) => {
            warn!(url = %page.url, "empty summary, skipping page");
            None
        }
        Err(e) => {
            warn!(url = %page.url, error = %e, "summarization failed, skipping page");
            None
        }
    }
}

/// Summarize every page with at most `concurrency` calls in flight.
///
/// The result is aligned with `pages`.
#[instrument(skip_all, fields(pages = pages.len(), max_words = max_words))]
pub async fn summarize_all(
    condenser: Arc<dyn Condenser>,
    pages: Vec<AcquiredPage>,
    max_words: usize,
    concurrency: usize,
    progress: &dyn ProgressReporter,
) -> Vec<Option<PageSummary>> {
    let total = pages.len();
    let urls: Vec<String> = pages.iter().map(|p| p.url.clone()).collect();

    let summaries = bounded_map(
        pages,
        concurrency,
        |page| {
            let condenser = Arc::clone(&condenser);
            async move { summarize(condenser.as_ref(), &page, max_words).await }
        },
        |i, summary| progress.page_summarized(&urls[i], summary.is_some(), i + 1, total),
    )
    .await;

    let summarized = summaries.iter().flatten().count();
    info!(summarized, failed = total - summarized, "summarization complete");
    summaries
}

//! Best-effort page acquisition for relevant hits.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use lunathink_shared::{AcquiredPage, ContentSource, SearchHit};

use crate::progress::ProgressReporter;
use crate::workers::bounded_map;

/// Fetch one hit's page. Any failure is logged and yields `None`.
pub async fn acquire(source: &dyn ContentSource, hit: &SearchHit) -> Option<AcquiredPage> {
    match source.fetch_and_normalize(&hit.url).await {
        Ok(page) => {
            let title = if hit.title.trim().is_empty() {
                page.title.unwrap_or_default()
            } else {
                hit.title.clone()
            };
            Some(AcquiredPage {
                url: hit.url.clone(),
                title,
                normalized_text: page.text,
            })
        }
        Err(e) => {
            warn!(url = %hit.url, error = %e, "acquisition failed, skipping page");
            None
        }
    }
}

/// Acquire every hit with at most `concurrency` fetches in flight.
///
/// The result is aligned with `hits`: entry `i` is hit `i`'s page, or `None`.
#[instrument(skip_all, fields(hits = hits.len(), concurrency = concurrency))]
pub async fn acquire_all(
    source: Arc<dyn ContentSource>,
    hits: Vec<SearchHit>,
    concurrency: usize,
    progress: &dyn ProgressReporter,
) -> Vec<Option<AcquiredPage>> {
    let total = hits.len();
    let urls: Vec<String> = hits.iter().map(|h| h.url.clone()).collect();

    let pages = bounded_map(
        hits,
        concurrency,
        |hit| {
            let source = Arc::clone(&source);
            async move { acquire(source.as_ref(), &hit).await }
        },
        |i, page| progress.page_acquired(&urls[i], page.is_some(), i + 1, total),
    )
    .await;

    let acquired = pages.iter().flatten().count();
    info!(acquired, failed = total - acquired, "acquisition complete");
    pages
}

//! Bounded parallel map over independent items.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::warn;

/// Run `task` over `items` with at most `concurrency` in flight.
///
/// Results come back in input order. `on_done` is called once per item, in
/// input order, as results are collected. A panicked task counts as `None`.
pub(crate) async fn bounded_map<T, R, F, Fut>(
    items: Vec<T>,
    concurrency: usize,
    task: F,
    mut on_done: impl FnMut(usize, &Option<R>),
) -> Vec<Option<R>>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut,
    Fut: Future<Output = Option<R>> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));

    let handles: Vec<_> = items
        .into_iter()
        .map(|item| {
            let permit = Arc::clone(&semaphore);
            let work = task(item);
            tokio::spawn(async move {
                let _permit = permit.acquire_owned().await.ok()?;
                work.await
            })
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for (index, handle) in handles.into_iter().enumerate() {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "worker task failed");
                None
            }
        };
        on_done(index, &result);
        results.push(result);
    }
    results
}

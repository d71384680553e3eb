use std::future::Future;
use std::time::Duration;

use futures::stream::{self, StreamExt, TryStreamExt};
use tokio::time::sleep;

use super::cluster_error::ClusterError;

#[derive(Debug, Clone, Copy)]
pub struct BatchSettings {
    pub page_size: usize,
    pub max_concurrent_calls: usize,
    /// Held after each successful call before its page is handed on.
    pub delay: Duration,
}

/// Splits `ids` into pages of at most `page_size` and describes them with at
/// most `max_concurrent_calls` calls in flight.
///
/// Results come back in page order. The first failing page fails the whole
/// batch; calls still in flight are dropped.
pub async fn describe_in_batches<T, F, Fut>(
    ids: &[String],
    settings: BatchSettings,
    describe: F,
) -> Result<Vec<T>, ClusterError>
where
    F: Fn(Vec<String>) -> Fut,
    Fut: Future<Output = Result<Vec<T>, ClusterError>>,
{
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let page_size = settings.page_size.max(1);
    let max_concurrent_calls = settings.max_concurrent_calls.max(1);
    let delay = settings.delay;

    let pages: Vec<Vec<String>> = ids.chunks(page_size).map(<[String]>::to_vec).collect();
    log::debug!(
        "Describing {} identifiers in {} page(s), {} at a time",
        ids.len(),
        pages.len(),
        max_concurrent_calls
    );

    let described: Vec<Vec<T>> = stream::iter(pages)
        .map(|page| {
            let call = describe(page);
            async move {
                let items = call.await?;
                if !delay.is_zero() {
                    sleep(delay).await;
                }
                Ok::<_, ClusterError>(items)
            }
        })
        .buffered(max_concurrent_calls)
        .try_collect()
        .await?;

    Ok(described.into_iter().flatten().collect())
}

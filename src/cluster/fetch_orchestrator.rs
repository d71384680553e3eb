use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;

use super::cluster_error::ClusterError;
use super::cluster_state::ClusterState;
use super::cluster_state_cache::ClusterStateCache;
use super::data_source::ClusterDataSource;

/// Drives one cluster's fetch and records every transition in the cache.
pub struct FetchOrchestrator {
    cache: Arc<ClusterStateCache>,
    source: Arc<dyn ClusterDataSource>,
}

impl FetchOrchestrator {
    pub fn new(cache: Arc<ClusterStateCache>, source: Arc<dyn ClusterDataSource>) -> Self {
        Self { cache, source }
    }

    /// Populates the record of `cluster` stamped with `generation`.
    ///
    /// Failures end up in the record as ERROR and are never returned. If the
    /// record is replaced by a newer generation while this run is in flight,
    /// the run's remaining writes are dropped. Returns the last record this
    /// run wrote.
    pub async fn populate(&self, cluster: &str, generation: u64) -> Option<ClusterState> {
        let start = std::time::Instant::now();
        self.cache.update(cluster, generation, ClusterState::fetching)?;
        log::info!("Fetching cluster '{}' (generation {})", cluster, generation);

        let fetched = AssertUnwindSafe(self.source.instance_summaries(cluster))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(ClusterError::Assembly(panic_message(panic))));

        match fetched {
            Ok(summaries) => {
                log::info!(
                    "Fetched {} instance summaries for cluster '{}' in {:.2}s",
                    summaries.len(),
                    cluster,
                    start.elapsed().as_secs_f64()
                );
                self.cache
                    .update(cluster, generation, move |state| state.fetched(summaries))
            }
            Err(err) => {
                log::error!("Fetching cluster '{}' failed: {}", cluster, err);
                self.cache
                    .update(cluster, generation, |state| state.errored(err.to_string()))
            }
        }
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| String::from("unknown panic"));
    format!("fetch aborted: {}", detail)
}

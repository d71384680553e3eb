use std::sync::Arc;

use async_trait::async_trait;

use super::cluster_error::ClusterError;
use super::cluster_state::ClusterState;
use super::cluster_state_cache::ClusterStateCache;
use super::data_source::ClusterDataSource;
use super::fetch_orchestrator::FetchOrchestrator;
use super::polling::ClusterStateSource;

/// Answers state requests from the cache and starts background fetches for
/// records that need one.
#[derive(Clone)]
pub struct ClusterStateService {
    cache: Arc<ClusterStateCache>,
    orchestrator: Arc<FetchOrchestrator>,
    source: Arc<dyn ClusterDataSource>,
}

impl ClusterStateService {
    pub fn new(source: Arc<dyn ClusterDataSource>, cache: Arc<ClusterStateCache>) -> Self {
        Self {
            orchestrator: Arc::new(FetchOrchestrator::new(cache.clone(), source.clone())),
            cache,
            source,
        }
    }

    pub fn cache(&self) -> &Arc<ClusterStateCache> {
        &self.cache
    }

    /// Returns whatever is cached for `cluster` right now. A newly created
    /// record gets a background fetch; callers poll until it is terminal.
    pub fn get_cluster_state(
        &self,
        cluster: Option<&str>,
        force_refresh: bool,
    ) -> Result<ClusterState, ClusterError> {
        let cluster = cluster
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(ClusterError::MissingParameter("cluster"))?;

        if !force_refresh {
            if let Some(state) = self.cache.get(cluster) {
                return Ok(state);
            }
        }
        let (state, created) = self.cache.get_or_create(cluster, force_refresh);
        if created {
            let orchestrator = self.orchestrator.clone();
            let name = cluster.to_string();
            let generation = state.generation;
            tokio::spawn(async move {
                orchestrator.populate(&name, generation).await;
            });
        }
        Ok(state)
    }

    pub async fn cluster_names(&self) -> Result<Vec<String>, ClusterError> {
        self.source.cluster_names().await
    }
}

#[async_trait]
impl ClusterStateSource for ClusterStateService {
    async fn get_cluster_state(
        &self,
        cluster: &str,
        force_refresh: bool,
    ) -> Result<ClusterState, ClusterError> {
        ClusterStateService::get_cluster_state(self, Some(cluster), force_refresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::cluster_state::FetchStatus;
    use crate::cluster::static_provider::StaticClusterDataProvider;
    use std::time::Duration;

    fn service() -> ClusterStateService {
        ClusterStateService::new(
            Arc::new(StaticClusterDataProvider::new(None, "us-east-1")),
            Arc::new(ClusterStateCache::new(Duration::from_secs(60))),
        )
    }

    async fn wait_for_terminal(service: &ClusterStateService, cluster: &str) -> ClusterState {
        for _ in 0..100 {
            let state = service.get_cluster_state(Some(cluster), false).unwrap();
            if state.fetch_status.is_terminal() {
                return state;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("cluster '{}' never reached a terminal state", cluster);
    }

    #[tokio::test]
    async fn missing_cluster_is_a_client_error() {
        let service = service();
        assert!(matches!(
            service.get_cluster_state(None, false),
            Err(ClusterError::MissingParameter("cluster"))
        ));
        assert!(matches!(
            service.get_cluster_state(Some("  "), false),
            Err(ClusterError::MissingParameter("cluster"))
        ));
        assert!(service.cache().is_empty());
    }

    #[tokio::test]
    async fn first_request_returns_initial_and_fetches_in_background() {
        let service = service();
        let first = service.get_cluster_state(Some("demo-cluster-8"), false).unwrap();
        assert_eq!(first.fetch_status, FetchStatus::Initial);

        let done = wait_for_terminal(&service, "demo-cluster-8").await;
        assert_eq!(done.fetch_status, FetchStatus::Fetched);
        assert_eq!(done.instance_summaries.len(), 8);
        assert_eq!(done.generation, first.generation);
    }

    #[tokio::test]
    async fn terminal_record_is_served_without_refetch() {
        let service = service();
        service.get_cluster_state(Some("demo-cluster-8"), false).unwrap();
        let done = wait_for_terminal(&service, "demo-cluster-8").await;

        let again = service.get_cluster_state(Some("demo-cluster-8"), false).unwrap();
        assert_eq!(again, done);
    }

    #[tokio::test]
    async fn forced_refresh_starts_a_new_generation() {
        let service = service();
        service.get_cluster_state(Some("demo-cluster-8"), false).unwrap();
        let done = wait_for_terminal(&service, "demo-cluster-8").await;

        let refreshed = service.get_cluster_state(Some("demo-cluster-8"), true).unwrap();
        assert_eq!(refreshed.fetch_status, FetchStatus::Initial);
        assert!(refreshed.create_timestamp > done.create_timestamp);
        assert!(refreshed.instance_summaries.is_empty());

        let done_again = wait_for_terminal(&service, "demo-cluster-8").await;
        assert_eq!(done_again.generation, refreshed.generation);
    }

    #[tokio::test]
    async fn unknown_static_cluster_ends_in_error() {
        let service = service();
        service.get_cluster_state(Some("nope"), false).unwrap();
        let done = wait_for_terminal(&service, "nope").await;
        assert_eq!(done.fetch_status, FetchStatus::Error);
        assert!(done.error_details.is_some());
    }

    #[tokio::test]
    async fn oversized_demo_cluster_ends_in_error() {
        let service = service();
        let name = "demo-cluster-18446744073709551615";
        service.get_cluster_state(Some(name), false).unwrap();
        let done = wait_for_terminal(&service, name).await;
        assert_eq!(done.fetch_status, FetchStatus::Error);
        assert!(done.error_details.unwrap().contains("at most"));
    }
}

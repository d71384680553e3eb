use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use super::batched_describer::{describe_in_batches, BatchSettings};
use super::cluster_api::ClusterApi;
use super::cluster_error::ClusterError;
use super::ecs_types::{ContainerInstance, HostMetadata, Task};
use super::fetch_config::FetchConfig;
use super::instance_summary::InstanceSummary;
use super::paginated_lister::list_all;
use super::retry_policy::with_retry;
use super::summary_assembler::{assemble_summaries, EnrichedTask};
use super::task_definition_memo::TaskDefinitionMemo;

/// Where cluster names and instance summaries come from.
#[async_trait]
pub trait ClusterDataSource: Send + Sync {
    async fn cluster_names(&self) -> Result<Vec<String>, ClusterError>;

    async fn instance_summaries(&self, cluster: &str) -> Result<Vec<InstanceSummary>, ClusterError>;
}

/// Assembles summaries from the live orchestration API.
pub struct LiveClusterDataSource {
    api: Arc<dyn ClusterApi>,
    memo: Arc<TaskDefinitionMemo>,
    config: FetchConfig,
}

impl LiveClusterDataSource {
    pub fn new(api: Arc<dyn ClusterApi>, config: FetchConfig) -> Result<Self, ClusterError> {
        config.validate()?;
        Ok(Self {
            api,
            memo: Arc::new(TaskDefinitionMemo::new()),
            config,
        })
    }

    #[cfg(test)]
    pub fn memo(&self) -> &TaskDefinitionMemo {
        &self.memo
    }

    fn retrying<'a, T, F, Fut>(
        &'a self,
        action: &'a str,
        call: F,
    ) -> impl Future<Output = Result<T, ClusterError>> + 'a
    where
        T: 'a,
        F: FnMut() -> Fut + 'a,
        Fut: Future<Output = Result<T, ClusterError>> + 'a,
    {
        with_retry(&self.config.retry, action, call)
    }

    fn batch(&self, page_size: usize, max_concurrent_calls: usize) -> BatchSettings {
        BatchSettings {
            page_size,
            max_concurrent_calls,
            delay: self.config.api_delay,
        }
    }

    async fn tasks_with_definitions(&self, cluster: &str) -> Result<Vec<EnrichedTask>, ClusterError> {
        log::info!("Getting tasks annotated with task definitions for cluster '{}'", cluster);
        let page_size = self.config.list_tasks_page_size;
        let task_ids = list_all("task", |token| {
            self.retrying("ListTasks", move || {
                self.api.list_tasks(cluster, page_size, token.clone())
            })
        })
        .await?;
        if task_ids.is_empty() {
            log::warn!("No tasks found in cluster '{}'", cluster);
            return Ok(Vec::new());
        }

        let tasks: Vec<Task> = describe_in_batches(
            &task_ids,
            self.batch(
                self.config.describe_tasks_page_size,
                self.config.max_simultaneous_describe_tasks_calls,
            ),
            |page| {
                self.retrying("DescribeTasks", move || {
                    self.api.describe_tasks(cluster, page.clone())
                })
            },
        )
        .await?;
        log::info!("Found {} tasks in cluster '{}'", tasks.len(), cluster);

        self.resolve_definitions(&tasks).await?;
        tasks
            .into_iter()
            .map(|task| {
                let definition = self.memo.get(&task.task_definition_arn).ok_or_else(|| {
                    ClusterError::Assembly(format!(
                        "task definition '{}' was not resolved",
                        task.task_definition_arn
                    ))
                })?;
                Ok(EnrichedTask { task, definition })
            })
            .collect()
    }

    /// Fetches every definition referenced by `tasks` that the memo lacks.
    async fn resolve_definitions(&self, tasks: &[Task]) -> Result<(), ClusterError> {
        let mut seen = HashSet::new();
        let missing: Vec<String> = tasks
            .iter()
            .map(|t| t.task_definition_arn.as_str())
            .filter(|reference| seen.insert(*reference))
            .filter(|reference| self.memo.get(reference).is_none())
            .map(String::from)
            .collect();
        log::debug!(
            "{} distinct task definitions, {} not yet known",
            seen.len(),
            missing.len()
        );

        let fetched = describe_in_batches(
            &missing,
            self.batch(1, self.config.max_simultaneous_describe_task_definition_calls),
            |page| async move {
                let mut definitions = Vec::with_capacity(page.len());
                for reference in page {
                    if let Some(known) = self.memo.get(&reference) {
                        definitions.push(known);
                        continue;
                    }
                    let definition = self
                        .retrying("DescribeTaskDefinition", || {
                            self.api.describe_task_definition(&reference)
                        })
                        .await?;
                    log::debug!("Received task definition for {}", reference);
                    definitions.push(self.memo.put(&reference, definition));
                }
                Ok::<_, ClusterError>(definitions)
            },
        )
        .await?;
        log::info!(
            "Resolved {} task definitions, {} known in total",
            fetched.len(),
            self.memo.len()
        );
        Ok(())
    }

    async fn container_instances(&self, cluster: &str) -> Result<Vec<ContainerInstance>, ClusterError> {
        let page_size = self.config.list_instances_page_size;
        let instance_ids = list_all("container instance", |token| {
            self.retrying("ListContainerInstances", move || {
                self.api.list_container_instances(cluster, page_size, token.clone())
            })
        })
        .await?;
        log::info!(
            "Found {} container instance identifiers in cluster '{}'",
            instance_ids.len(),
            cluster
        );
        if instance_ids.is_empty() {
            return Ok(Vec::new());
        }

        describe_in_batches(
            &instance_ids,
            self.batch(
                self.config.describe_instances_page_size,
                self.config.max_simultaneous_describe_instances_calls,
            ),
            |page| {
                self.retrying("DescribeContainerInstances", move || {
                    self.api.describe_container_instances(cluster, page.clone())
                })
            },
        )
        .await
    }

    async fn hosts(&self, instances: &[ContainerInstance]) -> Result<Vec<HostMetadata>, ClusterError> {
        let host_ids: Vec<String> = instances.iter().map(|i| i.host_id.clone()).collect();
        let hosts: Vec<HostMetadata> = describe_in_batches(
            &host_ids,
            self.batch(self.config.describe_instances_page_size, 1),
            |page| {
                self.retrying("DescribeInstances", move || self.api.describe_hosts(page.clone()))
            },
        )
        .await?;
        log::info!("Found {} hosts with matching addresses", hosts.len());
        Ok(hosts)
    }
}

/// Everything after the first `/` of a cluster identifier.
fn cluster_name_from_arn(arn: &str) -> &str {
    arn.split_once('/').map_or(arn, |(_, name)| name)
}

#[async_trait]
impl ClusterDataSource for LiveClusterDataSource {
    async fn cluster_names(&self) -> Result<Vec<String>, ClusterError> {
        let arns = list_all("cluster", |token| {
            self.retrying("ListClusters", move || self.api.list_clusters(token.clone()))
        })
        .await?;
        Ok(arns
            .iter()
            .map(|arn| cluster_name_from_arn(arn).to_string())
            .collect())
    }

    async fn instance_summaries(&self, cluster: &str) -> Result<Vec<InstanceSummary>, ClusterError> {
        let tasks = self.tasks_with_definitions(cluster).await?;

        let instances = self.container_instances(cluster).await?;
        if instances.is_empty() {
            log::warn!("No container instances found in cluster '{}'", cluster);
            return Ok(Vec::new());
        }

        let hosts = self.hosts(&instances).await?;
        assemble_summaries(cluster, &self.config.region, &instances, &hosts, &tasks)
    }
}

// Demonstration data for running without access to a live cluster.
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::cluster_error::ClusterError;
use super::data_source::ClusterDataSource;
use super::instance_summary::{
    ConsoleUrls, ContainerSummary, InstanceSummary, ResourceType, TaskDefinitionSummary,
    TaskSummary,
};

pub const DEMO_CLUSTER_NAMES: [&str; 4] = [
    "demo-cluster-8",
    "demo-cluster-50",
    "demo-cluster-75",
    "demo-cluster-100",
];

const DEMO_CLUSTER_PREFIX: &str = "demo-cluster-";
const DEMO_ARN_PREFIX: &str = "arn:aws:ecs:us-east-1:123456789012";
const DEMO_REGISTERED_CPU: i64 = 2048;
const DEMO_REGISTERED_MEMORY: i64 = 7680;
/// Largest `demo-cluster-N` that is synthesised.
pub const MAX_DEMO_INSTANCES: usize = 1000;

pub struct StaticClusterDataProvider {
    data_dir: Option<PathBuf>,
    region: String,
}

impl StaticClusterDataProvider {
    pub fn new(data_dir: Option<PathBuf>, region: &str) -> Self {
        Self {
            data_dir,
            region: region.to_string(),
        }
    }

    fn data_file(dir: &Path, cluster: &str) -> PathBuf {
        dir.join(format!("ecs_instance_summaries_with_tasks-{}.json", cluster))
    }

    async fn read_file(&self, cluster: &str) -> Result<Option<Vec<InstanceSummary>>, ClusterError> {
        let Some(dir) = &self.data_dir else {
            return Ok(None);
        };
        let path = Self::data_file(dir, cluster);
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => {
                log::debug!("Loading static data for '{}' from {}", cluster, path.display());
                Ok(Some(serde_json::from_str(&contents)?))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ClusterError::StaticData(format!(
                "could not read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn synthesise(&self, cluster: &str) -> Result<Vec<InstanceSummary>, ClusterError> {
        let count: usize = cluster
            .strip_prefix(DEMO_CLUSTER_PREFIX)
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| {
                ClusterError::StaticData(format!("no demonstration data for cluster '{}'", cluster))
            })?;
        if count > MAX_DEMO_INSTANCES {
            return Err(ClusterError::StaticData(format!(
                "demonstration clusters have at most {} instances, '{}' asks for {}",
                MAX_DEMO_INSTANCES, cluster, count
            )));
        }
        let definitions = demo_definitions();
        let summaries = (0..count)
            .map(|i| {
                let host_id = format!("i-{:017x}", 0x0a1b_0000 + i);
                let instance_id = format!("{:08x}-demo-{:04}", 0xc3d1_0000usize + i, i);
                let tasks: Vec<TaskSummary> = (0..(i % 3) + 1)
                    .map(|slot| {
                        let (reference, definition) = &definitions[(i + slot) % definitions.len()];
                        TaskSummary {
                            task_arn: format!("{}:task/{}/task-{}-{}", DEMO_ARN_PREFIX, cluster, i, slot),
                            task_definition_reference: reference.clone(),
                            last_status: Some("RUNNING".into()),
                            definition: definition.clone(),
                        }
                    })
                    .collect();
                let used_cpu: i64 = tasks.iter().map(|t| t.allocated(ResourceType::Cpu)).sum();
                let used_memory: i64 = tasks.iter().map(|t| t.allocated(ResourceType::Memory)).sum();
                InstanceSummary {
                    host_address: format!("10.0.{}.{}", i / 250, i % 250 + 1),
                    console_urls: ConsoleUrls::new(&self.region, cluster, &host_id, &instance_id),
                    host_id,
                    registered_cpu: DEMO_REGISTERED_CPU,
                    registered_memory: DEMO_REGISTERED_MEMORY,
                    remaining_cpu: DEMO_REGISTERED_CPU - used_cpu,
                    remaining_memory: DEMO_REGISTERED_MEMORY - used_memory,
                    tasks,
                }
            })
            .collect();
        Ok(summaries)
    }
}

fn container(name: &str, cpu: i64, memory: i64) -> ContainerSummary {
    ContainerSummary {
        name: name.to_string(),
        cpu,
        memory,
    }
}

fn demo_definitions() -> Vec<(String, TaskDefinitionSummary)> {
    [
        ("web", 3, vec![container("nginx", 128, 256), container("app", 256, 768)]),
        ("worker", 7, vec![container("worker", 512, 1024)]),
        ("cron", 1, vec![container("cron", 64, 128), container("log-router", 32, 64)]),
    ]
    .into_iter()
    .map(|(family, revision, containers)| {
        (
            format!("{}:task-definition/{}:{}", DEMO_ARN_PREFIX, family, revision),
            TaskDefinitionSummary {
                family: family.to_string(),
                revision,
                containers,
            },
        )
    })
    .collect()
}

// Names end up in a file path.
fn is_safe_cluster_name(cluster: &str) -> bool {
    !cluster.is_empty()
        && cluster
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[async_trait]
impl ClusterDataSource for StaticClusterDataProvider {
    async fn cluster_names(&self) -> Result<Vec<String>, ClusterError> {
        Ok(DEMO_CLUSTER_NAMES.iter().map(|s| s.to_string()).collect())
    }

    async fn instance_summaries(&self, cluster: &str) -> Result<Vec<InstanceSummary>, ClusterError> {
        if !is_safe_cluster_name(cluster) {
            return Err(ClusterError::StaticData(format!(
                "invalid cluster name '{}'",
                cluster
            )));
        }
        if let Some(summaries) = self.read_file(cluster).await? {
            return Ok(summaries);
        }
        self.synthesise(cluster)
    }
}

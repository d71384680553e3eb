// In-memory orchestration API used by unit tests.
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use super::cluster_api::ClusterApi;
use super::cluster_error::ClusterError;
use super::ecs_types::{
    ContainerDefinition, ContainerInstance, HostMetadata, ListPage, Resource, Task, TaskDefinition,
};

const ARN_PREFIX: &str = "arn:aws:ecs:us-east-1:123456789012";

#[derive(Default)]
pub struct CallCounts {
    pub list_tasks: AtomicUsize,
    pub list_container_instances: AtomicUsize,
    pub describe_tasks: AtomicUsize,
    pub describe_container_instances: AtomicUsize,
    pub describe_task_definition: AtomicUsize,
    pub describe_hosts: AtomicUsize,
}

pub struct FakeClusterApi {
    cluster: String,
    task_arns: Vec<String>,
    tasks: Vec<Task>,
    instances: Vec<ContainerInstance>,
    definitions: Vec<TaskDefinition>,
    hosts: Mutex<Vec<HostMetadata>>,
    pub calls: CallCounts,
    pub fail_describe_tasks: AtomicBool,
    /// Added to every describe-tasks call, in milliseconds.
    pub describe_tasks_delay_ms: AtomicU64,
}

fn resources(cpu: i64, memory: i64) -> Vec<Resource> {
    vec![
        Resource {
            name: "CPU".into(),
            integer_value: cpu,
        },
        Resource {
            name: "MEMORY".into(),
            integer_value: memory,
        },
    ]
}

fn page_of(ids: &[String], page_size: usize, next_token: Option<String>) -> ListPage {
    let start: usize = next_token.and_then(|t| t.parse().ok()).unwrap_or(0);
    let end = (start + page_size.max(1)).min(ids.len());
    ListPage {
        ids: ids[start.min(end)..end].to_vec(),
        next_token: (end < ids.len()).then(|| end.to_string()),
    }
}

impl FakeClusterApi {
    /// A cluster whose tasks are spread round-robin over the instances and
    /// the definitions.
    pub fn with_cluster(cluster: &str, instances: usize, tasks: usize, definitions: usize) -> Self {
        let definitions: Vec<TaskDefinition> = (0..definitions)
            .map(|k| TaskDefinition {
                task_definition_arn: format!("{}:task-definition/family-{}:1", ARN_PREFIX, k),
                family: format!("family-{}", k),
                revision: 1,
                container_definitions: vec![
                    ContainerDefinition {
                        name: "app".into(),
                        cpu: 128,
                        memory: Some(256),
                        memory_reservation: None,
                    },
                    ContainerDefinition {
                        name: "sidecar".into(),
                        cpu: 64,
                        memory: None,
                        memory_reservation: Some(64),
                    },
                ],
            })
            .collect();

        let instances: Vec<ContainerInstance> = (0..instances)
            .map(|i| ContainerInstance {
                container_instance_arn: format!("{}:container-instance/{}/ci-{}", ARN_PREFIX, cluster, i),
                host_id: format!("i-{:017}", i),
                registered_resources: resources(2048, 7680),
                remaining_resources: resources(1024, 4096),
            })
            .collect();

        let hosts = instances
            .iter()
            .enumerate()
            .map(|(i, instance)| HostMetadata {
                host_id: instance.host_id.clone(),
                private_ip_address: Some(format!("10.0.{}.{}", i / 250, i % 250 + 1)),
            })
            .collect();

        let tasks: Vec<Task> = (0..tasks)
            .map(|j| Task {
                task_arn: format!("{}:task/{}/task-{}", ARN_PREFIX, cluster, j),
                task_definition_arn: definitions[j % definitions.len().max(1)]
                    .task_definition_arn
                    .clone(),
                container_instance_arn: (!instances.is_empty())
                    .then(|| instances[j % instances.len()].container_instance_arn.clone()),
                last_status: Some("RUNNING".into()),
            })
            .collect();

        Self {
            cluster: cluster.to_string(),
            task_arns: tasks.iter().map(|t| t.task_arn.clone()).collect(),
            tasks,
            instances,
            definitions,
            hosts: Mutex::new(hosts),
            calls: CallCounts::default(),
            fail_describe_tasks: AtomicBool::new(false),
            describe_tasks_delay_ms: AtomicU64::new(0),
        }
    }

    pub fn drop_host(&self, host_id: &str) {
        self.hosts.lock().unwrap().retain(|h| h.host_id != host_id);
    }

    fn check_cluster(&self, cluster: &str) -> Result<(), ClusterError> {
        if cluster == self.cluster {
            Ok(())
        } else {
            Err(ClusterError::HttpError(
                StatusCode::BAD_REQUEST,
                format!("ClusterNotFoundException: {}", cluster),
            ))
        }
    }
}

#[async_trait]
impl ClusterApi for FakeClusterApi {
    async fn list_clusters(&self, _next_token: Option<String>) -> Result<ListPage, ClusterError> {
        Ok(ListPage {
            ids: vec![format!("{}:cluster/{}", ARN_PREFIX, self.cluster)],
            next_token: None,
        })
    }

    async fn list_tasks(
        &self,
        cluster: &str,
        page_size: usize,
        next_token: Option<String>,
    ) -> Result<ListPage, ClusterError> {
        self.calls.list_tasks.fetch_add(1, Ordering::SeqCst);
        self.check_cluster(cluster)?;
        Ok(page_of(&self.task_arns, page_size, next_token))
    }

    async fn list_container_instances(
        &self,
        cluster: &str,
        page_size: usize,
        next_token: Option<String>,
    ) -> Result<ListPage, ClusterError> {
        self.calls.list_container_instances.fetch_add(1, Ordering::SeqCst);
        self.check_cluster(cluster)?;
        let arns: Vec<String> = self
            .instances
            .iter()
            .map(|i| i.container_instance_arn.clone())
            .collect();
        Ok(page_of(&arns, page_size, next_token))
    }

    async fn describe_tasks(
        &self,
        cluster: &str,
        task_ids: Vec<String>,
    ) -> Result<Vec<Task>, ClusterError> {
        self.calls.describe_tasks.fetch_add(1, Ordering::SeqCst);
        self.check_cluster(cluster)?;
        let delay = self.describe_tasks_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail_describe_tasks.load(Ordering::SeqCst) {
            return Err(ClusterError::HttpError(
                StatusCode::INTERNAL_SERVER_ERROR,
                "DescribeTasks unavailable".into(),
            ));
        }
        Ok(self
            .tasks
            .iter()
            .filter(|t| task_ids.contains(&t.task_arn))
            .cloned()
            .collect())
    }

    async fn describe_container_instances(
        &self,
        cluster: &str,
        instance_ids: Vec<String>,
    ) -> Result<Vec<ContainerInstance>, ClusterError> {
        self.calls.describe_container_instances.fetch_add(1, Ordering::SeqCst);
        self.check_cluster(cluster)?;
        Ok(self
            .instances
            .iter()
            .filter(|i| instance_ids.contains(&i.container_instance_arn))
            .cloned()
            .collect())
    }

    async fn describe_task_definition(&self, reference: &str) -> Result<TaskDefinition, ClusterError> {
        self.calls.describe_task_definition.fetch_add(1, Ordering::SeqCst);
        self.definitions
            .iter()
            .find(|d| d.task_definition_arn == reference)
            .cloned()
            .ok_or_else(|| {
                ClusterError::HttpError(
                    StatusCode::BAD_REQUEST,
                    format!("Unable to describe task definition {}", reference),
                )
            })
    }

    async fn describe_hosts(&self, host_ids: Vec<String>) -> Result<Vec<HostMetadata>, ClusterError> {
        self.calls.describe_hosts.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .hosts
            .lock()
            .unwrap()
            .iter()
            .filter(|h| host_ids.contains(&h.host_id))
            .cloned()
            .collect())
    }
}

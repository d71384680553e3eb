// Client for the external container-orchestration API.
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::cluster_error::ClusterError;
use super::ecs_types::{ContainerInstance, HostMetadata, ListPage, Task, TaskDefinition};

const ECS_TARGET_PREFIX: &str = "AmazonEC2ContainerServiceV20141113";
const HOST_TARGET_PREFIX: &str = "AmazonEC2";
const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

#[async_trait]
pub trait ClusterApi: Send + Sync {
    async fn list_clusters(&self, next_token: Option<String>) -> Result<ListPage, ClusterError>;

    async fn list_tasks(
        &self,
        cluster: &str,
        page_size: usize,
        next_token: Option<String>,
    ) -> Result<ListPage, ClusterError>;

    async fn list_container_instances(
        &self,
        cluster: &str,
        page_size: usize,
        next_token: Option<String>,
    ) -> Result<ListPage, ClusterError>;

    async fn describe_tasks(
        &self,
        cluster: &str,
        task_ids: Vec<String>,
    ) -> Result<Vec<Task>, ClusterError>;

    async fn describe_container_instances(
        &self,
        cluster: &str,
        instance_ids: Vec<String>,
    ) -> Result<Vec<ContainerInstance>, ClusterError>;

    async fn describe_task_definition(&self, reference: &str) -> Result<TaskDefinition, ClusterError>;

    async fn describe_hosts(&self, host_ids: Vec<String>) -> Result<Vec<HostMetadata>, ClusterError>;
}

/// Talks to a gateway exposing the provider's JSON 1.1 protocol.
#[derive(Clone)]
pub struct HttpClusterApi {
    client: reqwest::Client,
    base_url: Url,
    auth_token: Option<String>,
}

impl HttpClusterApi {
    pub fn new(base_url: Url, auth_token: Option<String>) -> Result<Self, ClusterError> {
        let client = reqwest::ClientBuilder::new()
            .timeout(std::time::Duration::from_secs(3))
            .build()
            .map_err(|e| ClusterError::Request(format!("Could not build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url,
            auth_token,
        })
    }

    async fn call<B, R>(&self, target: &str, payload: &B) -> Result<R, ClusterError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let mut req = self
            .client
            .post(self.base_url.clone())
            .header("X-Amz-Target", target)
            .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE)
            .body(serde_json::to_vec(payload)?);
        if let Some(token) = &self.auth_token {
            req = req.bearer_auth(token);
        }

        let start = std::time::Instant::now();
        let resp = req
            .send()
            .await
            .map_err(|e| ClusterError::Request(format!("{} failed: {}", target, e)))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| {
            ClusterError::HttpError(status, format!("Failed to read response: {}", e))
        })?;
        log::debug!(
            "{} returned {} in {:.4}s",
            target,
            status,
            start.elapsed().as_secs_f64()
        );

        match status {
            StatusCode::OK => Ok(serde_json::from_str(&body)?),
            _ => Err(ClusterError::HttpError(status, body)),
        }
    }

    async fn ecs<R: DeserializeOwned>(
        &self,
        action: &str,
        payload: serde_json::Value,
    ) -> Result<R, ClusterError> {
        self.call(&format!("{}.{}", ECS_TARGET_PREFIX, action), &payload)
            .await
    }
}

fn list_payload(cluster: &str, page_size: usize, next_token: Option<String>) -> serde_json::Value {
    let mut payload = json!({ "cluster": cluster, "maxResults": page_size });
    if let Some(token) = next_token {
        payload["nextToken"] = json!(token);
    }
    payload
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListClustersResponse {
    #[serde(default)]
    cluster_arns: Vec<String>,
    next_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListTasksResponse {
    #[serde(default)]
    task_arns: Vec<String>,
    next_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListContainerInstancesResponse {
    #[serde(default)]
    container_instance_arns: Vec<String>,
    next_token: Option<String>,
}

#[derive(Deserialize)]
struct Failure {
    arn: Option<String>,
    reason: Option<String>,
}

#[derive(Deserialize)]
struct DescribeTasksResponse {
    #[serde(default)]
    tasks: Vec<Task>,
    #[serde(default)]
    failures: Vec<Failure>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DescribeContainerInstancesResponse {
    #[serde(default)]
    container_instances: Vec<ContainerInstance>,
    #[serde(default)]
    failures: Vec<Failure>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DescribeTaskDefinitionResponse {
    task_definition: TaskDefinition,
}

#[derive(Deserialize)]
struct Reservation {
    #[serde(default)]
    instances: Vec<HostMetadata>,
}

#[derive(Deserialize)]
struct DescribeHostsResponse {
    #[serde(default)]
    reservations: Vec<Reservation>,
}

fn log_failures(action: &str, failures: &[Failure]) {
    for failure in failures {
        log::warn!(
            "{} reported failure for '{}': {}",
            action,
            failure.arn.as_deref().unwrap_or("?"),
            failure.reason.as_deref().unwrap_or("unknown reason")
        );
    }
}

// Cursors come back as empty strings from some gateways.
fn cursor(token: Option<String>) -> Option<String> {
    token.filter(|t| !t.is_empty())
}

#[async_trait]
impl ClusterApi for HttpClusterApi {
    async fn list_clusters(&self, next_token: Option<String>) -> Result<ListPage, ClusterError> {
        let mut payload = json!({});
        if let Some(token) = next_token {
            payload["nextToken"] = json!(token);
        }
        let resp: ListClustersResponse = self.ecs("ListClusters", payload).await?;
        Ok(ListPage {
            ids: resp.cluster_arns,
            next_token: cursor(resp.next_token),
        })
    }

    async fn list_tasks(
        &self,
        cluster: &str,
        page_size: usize,
        next_token: Option<String>,
    ) -> Result<ListPage, ClusterError> {
        log::debug!(
            "ListTasks cluster={} maxResults={} continuation={}",
            cluster,
            page_size,
            next_token.is_some()
        );
        let resp: ListTasksResponse = self
            .ecs("ListTasks", list_payload(cluster, page_size, next_token))
            .await?;
        Ok(ListPage {
            ids: resp.task_arns,
            next_token: cursor(resp.next_token),
        })
    }

    async fn list_container_instances(
        &self,
        cluster: &str,
        page_size: usize,
        next_token: Option<String>,
    ) -> Result<ListPage, ClusterError> {
        log::debug!(
            "ListContainerInstances cluster={} maxResults={} continuation={}",
            cluster,
            page_size,
            next_token.is_some()
        );
        let resp: ListContainerInstancesResponse = self
            .ecs(
                "ListContainerInstances",
                list_payload(cluster, page_size, next_token),
            )
            .await?;
        Ok(ListPage {
            ids: resp.container_instance_arns,
            next_token: cursor(resp.next_token),
        })
    }

    async fn describe_tasks(
        &self,
        cluster: &str,
        task_ids: Vec<String>,
    ) -> Result<Vec<Task>, ClusterError> {
        log::debug!("DescribeTasks cluster={} batch={}", cluster, task_ids.len());
        let resp: DescribeTasksResponse = self
            .ecs("DescribeTasks", json!({ "cluster": cluster, "tasks": task_ids }))
            .await?;
        log_failures("DescribeTasks", &resp.failures);
        Ok(resp.tasks)
    }

    async fn describe_container_instances(
        &self,
        cluster: &str,
        instance_ids: Vec<String>,
    ) -> Result<Vec<ContainerInstance>, ClusterError> {
        log::debug!(
            "DescribeContainerInstances cluster={} batch={}",
            cluster,
            instance_ids.len()
        );
        let resp: DescribeContainerInstancesResponse = self
            .ecs(
                "DescribeContainerInstances",
                json!({ "cluster": cluster, "containerInstances": instance_ids }),
            )
            .await?;
        log_failures("DescribeContainerInstances", &resp.failures);
        Ok(resp.container_instances)
    }

    async fn describe_task_definition(&self, reference: &str) -> Result<TaskDefinition, ClusterError> {
        log::debug!("DescribeTaskDefinition {}", reference);
        let resp: DescribeTaskDefinitionResponse = self
            .ecs("DescribeTaskDefinition", json!({ "taskDefinition": reference }))
            .await?;
        Ok(resp.task_definition)
    }

    async fn describe_hosts(&self, host_ids: Vec<String>) -> Result<Vec<HostMetadata>, ClusterError> {
        log::debug!("DescribeInstances batch={}", host_ids.len());
        let target = format!("{}.DescribeInstances", HOST_TARGET_PREFIX);
        let resp: DescribeHostsResponse = self
            .call(&target, &json!({ "InstanceIds": host_ids }))
            .await?;
        Ok(resp
            .reservations
            .into_iter()
            .flat_map(|r| r.instances)
            .collect())
    }
}

// Wire types of the orchestration provider's JSON API.
use serde::{Deserialize, Serialize};

use super::cluster_error::ClusterError;

/// One page of a cursor-paginated list call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListPage {
    pub ids: Vec<String>,
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub task_arn: String,
    pub task_definition_arn: String,
    #[serde(default)]
    pub container_instance_arn: Option<String>,
    #[serde(default)]
    pub last_status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub name: String,
    #[serde(default)]
    pub integer_value: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerInstance {
    pub container_instance_arn: String,
    #[serde(rename = "ec2InstanceId")]
    pub host_id: String,
    #[serde(default)]
    pub registered_resources: Vec<Resource>,
    #[serde(default)]
    pub remaining_resources: Vec<Resource>,
}

impl ContainerInstance {
    pub fn registered_cpu(&self) -> Result<i64, ClusterError> {
        self.resource(&self.registered_resources, "CPU", "registered")
    }

    pub fn registered_memory(&self) -> Result<i64, ClusterError> {
        self.resource(&self.registered_resources, "MEMORY", "registered")
    }

    pub fn remaining_cpu(&self) -> Result<i64, ClusterError> {
        self.resource(&self.remaining_resources, "CPU", "remaining")
    }

    pub fn remaining_memory(&self) -> Result<i64, ClusterError> {
        self.resource(&self.remaining_resources, "MEMORY", "remaining")
    }

    /// Trailing segment of the instance identifier, as used in console links.
    pub fn short_id(&self) -> &str {
        trailing_segment(&self.container_instance_arn)
    }

    fn resource(&self, resources: &[Resource], name: &str, kind: &str) -> Result<i64, ClusterError> {
        resources
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.integer_value)
            .ok_or_else(|| {
                ClusterError::Assembly(format!(
                    "container instance '{}' reports no {} {} figure",
                    self.container_instance_arn, kind, name
                ))
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerDefinition {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cpu: i64,
    #[serde(default)]
    pub memory: Option<i64>,
    #[serde(default)]
    pub memory_reservation: Option<i64>,
}

impl ContainerDefinition {
    /// Hard limit when declared, otherwise the soft reservation.
    pub fn effective_memory(&self) -> i64 {
        self.memory.or(self.memory_reservation).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDefinition {
    pub task_definition_arn: String,
    #[serde(default)]
    pub family: String,
    #[serde(default)]
    pub revision: u32,
    #[serde(default)]
    pub container_definitions: Vec<ContainerDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostMetadata {
    #[serde(rename = "instanceId")]
    pub host_id: String,
    #[serde(default)]
    pub private_ip_address: Option<String>,
}

pub fn trailing_segment(identifier: &str) -> &str {
    identifier
        .rsplit_once('/')
        .map_or(identifier, |(_, tail)| tail)
}

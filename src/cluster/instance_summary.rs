use serde::{Deserialize, Serialize};

use super::ecs_types::{trailing_segment, TaskDefinition};

/// Resource dimension a chart is drawn for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResourceType {
    #[default]
    Memory,
    Cpu,
}

impl ResourceType {
    /// Case-insensitive; anything unrecognised falls back to memory.
    pub fn parse(input: Option<&str>) -> Self {
        match input.map(str::to_ascii_lowercase).as_deref() {
            Some("cpu") => ResourceType::Cpu,
            Some("memory") | None => ResourceType::Memory,
            Some(other) => {
                log::debug!("Unknown resource type '{}', using memory", other);
                ResourceType::Memory
            }
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ResourceType::Memory => "Memory",
            ResourceType::Cpu => "CPU Units",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleUrls {
    pub host_console_url: String,
    pub orchestration_console_url: String,
}

impl ConsoleUrls {
    pub fn new(region: &str, cluster: &str, host_id: &str, instance_short_id: &str) -> Self {
        Self {
            host_console_url: format!(
                "https://console.aws.amazon.com/ec2/v2/home?region={}#Instances:instanceId={}",
                region, host_id
            ),
            orchestration_console_url: format!(
                "https://console.aws.amazon.com/ecs/home?region={}#/clusters/{}/containerInstances/{}",
                region, cluster, instance_short_id
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSummary {
    #[serde(default)]
    pub name: String,
    pub cpu: i64,
    pub memory: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDefinitionSummary {
    #[serde(default)]
    pub family: String,
    #[serde(default)]
    pub revision: u32,
    pub containers: Vec<ContainerSummary>,
}

impl From<&TaskDefinition> for TaskDefinitionSummary {
    fn from(definition: &TaskDefinition) -> Self {
        Self {
            family: definition.family.clone(),
            revision: definition.revision,
            containers: definition
                .container_definitions
                .iter()
                .map(|c| ContainerSummary {
                    name: c.name.clone(),
                    cpu: c.cpu,
                    memory: c.effective_memory(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    #[serde(default)]
    pub task_arn: String,
    pub task_definition_reference: String,
    #[serde(default)]
    pub last_status: Option<String>,
    pub definition: TaskDefinitionSummary,
}

impl TaskSummary {
    /// Sum of the declared figure across all containers of the task.
    pub fn allocated(&self, resource: ResourceType) -> i64 {
        self.definition
            .containers
            .iter()
            .map(|c| match resource {
                ResourceType::Memory => c.memory,
                ResourceType::Cpu => c.cpu,
            })
            .sum()
    }

    pub fn family_and_revision(&self) -> &str {
        trailing_segment(&self.task_definition_reference)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceSummary {
    pub host_address: String,
    pub host_id: String,
    pub console_urls: ConsoleUrls,
    pub registered_cpu: i64,
    pub registered_memory: i64,
    pub remaining_cpu: i64,
    pub remaining_memory: i64,
    pub tasks: Vec<TaskSummary>,
}

impl InstanceSummary {
    pub fn registered(&self, resource: ResourceType) -> i64 {
        match resource {
            ResourceType::Memory => self.registered_memory,
            ResourceType::Cpu => self.registered_cpu,
        }
    }

    pub fn remaining(&self, resource: ResourceType) -> i64 {
        match resource {
            ResourceType::Memory => self.remaining_memory,
            ResourceType::Cpu => self.remaining_cpu,
        }
    }
}

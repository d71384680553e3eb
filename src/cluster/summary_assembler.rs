use std::collections::HashMap;
use std::sync::Arc;

use super::cluster_error::ClusterError;
use super::ecs_types::{ContainerInstance, HostMetadata, Task, TaskDefinition};
use super::instance_summary::{ConsoleUrls, InstanceSummary, TaskDefinitionSummary, TaskSummary};

/// A described task joined with its resolved definition.
#[derive(Debug, Clone)]
pub struct EnrichedTask {
    pub task: Task,
    pub definition: Arc<TaskDefinition>,
}

impl From<&EnrichedTask> for TaskSummary {
    fn from(enriched: &EnrichedTask) -> Self {
        TaskSummary {
            task_arn: enriched.task.task_arn.clone(),
            task_definition_reference: enriched.task.task_definition_arn.clone(),
            last_status: enriched.task.last_status.clone(),
            definition: TaskDefinitionSummary::from(enriched.definition.as_ref()),
        }
    }
}

/// Builds one summary per container instance, in instance order.
///
/// Every instance's host must appear in `hosts`; a missing host means the
/// upstream data is inconsistent and the whole assembly fails.
pub fn assemble_summaries(
    cluster: &str,
    region: &str,
    instances: &[ContainerInstance],
    hosts: &[HostMetadata],
    tasks: &[EnrichedTask],
) -> Result<Vec<InstanceSummary>, ClusterError> {
    let hosts_by_id: HashMap<&str, &HostMetadata> =
        hosts.iter().map(|h| (h.host_id.as_str(), h)).collect();

    let mut tasks_by_instance: HashMap<&str, Vec<&EnrichedTask>> = HashMap::new();
    for task in tasks {
        if let Some(instance_ref) = task.task.container_instance_arn.as_deref() {
            tasks_by_instance.entry(instance_ref).or_default().push(task);
        }
    }

    instances
        .iter()
        .map(|instance| {
            let host = hosts_by_id.get(instance.host_id.as_str()).ok_or_else(|| {
                ClusterError::Assembly(format!(
                    "no host metadata for '{}' of container instance '{}'",
                    instance.host_id, instance.container_instance_arn
                ))
            })?;
            let tasks: Vec<TaskSummary> = tasks_by_instance
                .get(instance.container_instance_arn.as_str())
                .map(|tasks| tasks.iter().map(|t| TaskSummary::from(*t)).collect())
                .unwrap_or_default();

            Ok(InstanceSummary {
                host_address: host.private_ip_address.clone().unwrap_or_default(),
                host_id: instance.host_id.clone(),
                console_urls: ConsoleUrls::new(region, cluster, &instance.host_id, instance.short_id()),
                registered_cpu: instance.registered_cpu()?,
                registered_memory: instance.registered_memory()?,
                remaining_cpu: instance.remaining_cpu()?,
                remaining_memory: instance.remaining_memory()?,
                tasks,
            })
        })
        .collect()
}

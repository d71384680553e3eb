use std::time::Duration;

use super::cluster_error::ClusterError;
use super::retry_policy::RetryPolicy;

/// Largest page the provider accepts for list and describe calls.
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Pause after every describe call to stay under provider rate limits.
    pub api_delay: Duration,
    pub list_instances_page_size: usize,
    pub describe_instances_page_size: usize,
    pub list_tasks_page_size: usize,
    pub describe_tasks_page_size: usize,
    pub max_simultaneous_describe_tasks_calls: usize,
    pub max_simultaneous_describe_instances_calls: usize,
    pub max_simultaneous_describe_task_definition_calls: usize,
    pub retry: RetryPolicy,
    pub region: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            api_delay: Duration::from_millis(100),
            list_instances_page_size: MAX_PAGE_SIZE,
            describe_instances_page_size: MAX_PAGE_SIZE,
            list_tasks_page_size: MAX_PAGE_SIZE,
            describe_tasks_page_size: MAX_PAGE_SIZE,
            max_simultaneous_describe_tasks_calls: 2,
            max_simultaneous_describe_instances_calls: 1,
            max_simultaneous_describe_task_definition_calls: 1,
            retry: RetryPolicy::default(),
            region: String::from("us-east-1"),
        }
    }
}

impl FetchConfig {
    pub fn validate(&self) -> Result<(), ClusterError> {
        let page_sizes = [
            ("list_instances_page_size", self.list_instances_page_size),
            ("describe_instances_page_size", self.describe_instances_page_size),
            ("list_tasks_page_size", self.list_tasks_page_size),
            ("describe_tasks_page_size", self.describe_tasks_page_size),
        ];
        for (name, size) in page_sizes {
            if size == 0 || size > MAX_PAGE_SIZE {
                return Err(ClusterError::InvalidConfig(format!(
                    "{} must be between 1 and {}, got {}",
                    name, MAX_PAGE_SIZE, size
                )));
            }
        }

        let concurrency = [
            (
                "max_simultaneous_describe_tasks_calls",
                self.max_simultaneous_describe_tasks_calls,
            ),
            (
                "max_simultaneous_describe_instances_calls",
                self.max_simultaneous_describe_instances_calls,
            ),
            (
                "max_simultaneous_describe_task_definition_calls",
                self.max_simultaneous_describe_task_definition_calls,
            ),
        ];
        for (name, limit) in concurrency {
            if limit == 0 {
                return Err(ClusterError::InvalidConfig(format!("{} must be at least 1", name)));
            }
        }
        Ok(())
    }
}

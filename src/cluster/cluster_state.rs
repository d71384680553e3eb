use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::instance_summary::InstanceSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FetchStatus {
    Initial,
    Fetching,
    Fetched,
    Error,
}

impl FetchStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, FetchStatus::Fetched | FetchStatus::Error)
    }
}

/// One cluster's fetch lifecycle and latest result.
///
/// Records are never mutated in place: each transition builds a new record
/// from the current one, so a reader only ever sees a whole state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterState {
    pub cluster_name: String,
    pub fetch_status: FetchStatus,
    pub create_timestamp: DateTime<Utc>,
    pub error_details: Option<String>,
    pub instance_summaries: Vec<InstanceSummary>,
    /// Fetch run allowed to write this record.
    #[serde(skip)]
    pub generation: u64,
}

impl ClusterState {
    pub fn new(cluster_name: &str, create_timestamp: DateTime<Utc>, generation: u64) -> Self {
        Self {
            cluster_name: cluster_name.to_string(),
            fetch_status: FetchStatus::Initial,
            create_timestamp,
            error_details: None,
            instance_summaries: Vec::new(),
            generation,
        }
    }

    pub fn fetching(&self) -> Self {
        Self {
            fetch_status: FetchStatus::Fetching,
            error_details: None,
            instance_summaries: Vec::new(),
            ..self.clone_header()
        }
    }

    pub fn fetched(&self, instance_summaries: Vec<InstanceSummary>) -> Self {
        Self {
            fetch_status: FetchStatus::Fetched,
            error_details: None,
            instance_summaries,
            ..self.clone_header()
        }
    }

    pub fn errored(&self, details: String) -> Self {
        Self {
            fetch_status: FetchStatus::Error,
            error_details: Some(details),
            instance_summaries: Vec::new(),
            ..self.clone_header()
        }
    }

    // Copies identity fields without cloning the summaries being replaced.
    fn clone_header(&self) -> Self {
        Self {
            cluster_name: self.cluster_name.clone(),
            fetch_status: self.fetch_status,
            create_timestamp: self.create_timestamp,
            error_details: None,
            instance_summaries: Vec::new(),
            generation: self.generation,
        }
    }
}

// Client-side protocol for waiting on a cluster's fetch.
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use super::cluster_error::ClusterError;
use super::cluster_state::{ClusterState, FetchStatus};

/// Anything that answers GetClusterState.
#[async_trait]
pub trait ClusterStateSource: Send + Sync {
    async fn get_cluster_state(
        &self,
        cluster: &str,
        force_refresh: bool,
    ) -> Result<ClusterState, ClusterError>;
}

#[derive(Debug, Clone)]
pub struct PollPolicy {
    /// Steady-state wait between attempts.
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 120,
        }
    }
}

impl PollPolicy {
    /// Attempts 1-4 wait `attempt/5` of the interval, later ones all of it.
    pub fn interval_for(&self, attempt: u32) -> Duration {
        if attempt < 5 {
            self.interval * attempt / 5
        } else {
            self.interval
        }
    }
}

#[derive(Debug)]
pub enum PollStatus {
    Polling { attempt: u32 },
    Done(ClusterState),
    TimedOut { attempts: u32 },
    Failed(ClusterError),
}

pub struct Poller {
    policy: PollPolicy,
    force_refresh: bool,
    status: PollStatus,
}

impl Poller {
    pub fn new(policy: PollPolicy, force_refresh: bool) -> Self {
        Self {
            policy,
            force_refresh,
            status: PollStatus::Polling { attempt: 1 },
        }
    }

    #[cfg(test)]
    pub fn status(&self) -> &PollStatus {
        &self.status
    }

    /// The `force_refresh` flag for the next request, or `None` once the
    /// poller is terminal. Exhausting the attempt budget moves it to
    /// `TimedOut`.
    pub fn next_request(&mut self) -> Option<bool> {
        let PollStatus::Polling { attempt } = self.status else {
            return None;
        };
        if attempt >= self.policy.max_attempts {
            self.status = PollStatus::TimedOut {
                attempts: self.policy.max_attempts,
            };
            return None;
        }
        // Only the opening request may ask the server to refetch.
        Some(self.force_refresh && attempt == 1)
    }

    /// Feeds the response to the last request. Returns how long to wait
    /// before the next one while still polling.
    pub fn observe(&mut self, response: Result<ClusterState, ClusterError>) -> Option<Duration> {
        let PollStatus::Polling { attempt } = self.status else {
            return None;
        };
        match response {
            Err(err) => {
                self.status = PollStatus::Failed(err);
                None
            }
            Ok(state) if state.error_details.is_some() || state.fetch_status == FetchStatus::Error => {
                let details = state
                    .error_details
                    .unwrap_or_else(|| String::from("unknown error"));
                self.status = PollStatus::Failed(ClusterError::ServerReported(details));
                None
            }
            Ok(state) if state.fetch_status.is_terminal() => {
                self.status = PollStatus::Done(state);
                None
            }
            Ok(state) => {
                let wait = self.policy.interval_for(attempt);
                log::debug!(
                    "Cluster '{}' is {:?}, trying again after {:?} (attempt {}/{})",
                    state.cluster_name,
                    state.fetch_status,
                    wait,
                    attempt,
                    self.policy.max_attempts
                );
                self.status = PollStatus::Polling {
                    attempt: attempt + 1,
                };
                Some(wait)
            }
        }
    }

    pub fn into_result(self) -> Result<ClusterState, ClusterError> {
        match self.status {
            PollStatus::Done(state) => Ok(state),
            PollStatus::Failed(err) => Err(err),
            PollStatus::TimedOut { attempts } => Err(ClusterError::PollTimeout { attempts }),
            PollStatus::Polling { attempt } => Err(ClusterError::PollTimeout { attempts: attempt }),
        }
    }
}

/// Requests `cluster` until its fetch is terminal or the budget runs out.
pub async fn poll_until_fetched(
    source: &dyn ClusterStateSource,
    cluster: &str,
    force_refresh: bool,
    policy: PollPolicy,
) -> Result<ClusterState, ClusterError> {
    let mut poller = Poller::new(policy, force_refresh);
    while let Some(force) = poller.next_request() {
        log::debug!("Polling cluster '{}' (force refresh: {})", cluster, force);
        let response = source.get_cluster_state(cluster, force).await;
        if let Some(wait) = poller.observe(response) {
            sleep(wait).await;
        }
    }
    poller.into_result()
}

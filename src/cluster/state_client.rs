use async_trait::async_trait;
use reqwest::{StatusCode, Url};

use super::cluster_error::ClusterError;
use super::cluster_state::ClusterState;
use super::polling::ClusterStateSource;

const STATE_PATH: &str = "api/instance_summaries_with_tasks";
const NAMES_PATH: &str = "api/cluster_names";

/// Asks a running server for cluster state over HTTP.
#[derive(Clone)]
pub struct HttpStateClient {
    client: reqwest::Client,
    base_url: Url,
    use_static: bool,
}

impl HttpStateClient {
    pub fn new(base_url: Url, use_static: bool) -> Result<Self, ClusterError> {
        let client = reqwest::ClientBuilder::new()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| ClusterError::Request(format!("Could not build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url,
            use_static,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClusterError> {
        self.base_url
            .join(path)
            .map_err(|e| ClusterError::Request(format!("Invalid server URL: {}", e)))
    }

    async fn get(&self, url: Url, query: &[(&str, String)]) -> Result<String, ClusterError> {
        let resp = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| ClusterError::Request(e.to_string()))?;
        let status = resp.status();
        let body = resp.text().await.map_err(|e| {
            ClusterError::HttpError(status, format!("Failed to read response: {}", e))
        })?;
        match status {
            StatusCode::OK => Ok(body),
            _ => Err(ClusterError::HttpError(status, body)),
        }
    }

    pub async fn cluster_names(&self) -> Result<Vec<String>, ClusterError> {
        let url = self.endpoint(NAMES_PATH)?;
        let body = self.get(url, &[("static", self.use_static.to_string())]).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl ClusterStateSource for HttpStateClient {
    async fn get_cluster_state(
        &self,
        cluster: &str,
        force_refresh: bool,
    ) -> Result<ClusterState, ClusterError> {
        let url = self.endpoint(STATE_PATH)?;
        let body = self
            .get(
                url,
                &[
                    ("cluster", cluster.to_string()),
                    ("static", self.use_static.to_string()),
                    ("forceRefresh", force_refresh.to_string()),
                ],
            )
            .await?;
        Ok(serde_json::from_str(&body)?)
    }
}

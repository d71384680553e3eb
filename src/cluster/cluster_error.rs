use actix_web::{http::StatusCode as ActixStatus, HttpResponse, ResponseError};
use reqwest::StatusCode;
use serde_json::Error as JsonError;

#[derive(thiserror::Error, Debug)]
pub enum ClusterError {
    #[error("Please provide a '{0}' parameter")]
    MissingParameter(&'static str),

    #[error("HTTP error ({0}): {1}")]
    HttpError(StatusCode, String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] JsonError),

    #[error("Could not assemble instance summaries: {0}")]
    Assembly(String),

    #[error("Static data unavailable: {0}")]
    StaticData(String),

    #[error("Invalid fetch configuration: {0}")]
    InvalidConfig(String),

    #[error("Server Error: {0}")]
    ServerReported(String),

    #[error("Could not retrieve cluster details after {attempts} polling attempts")]
    PollTimeout { attempts: u32 },
}

impl ClusterError {
    /// Provider rate limiting, worth retrying after a backoff.
    pub fn is_throttling(&self) -> bool {
        match self {
            ClusterError::HttpError(status, body) => {
                *status == StatusCode::TOO_MANY_REQUESTS || body.contains("ThrottlingException")
            }
            _ => false,
        }
    }
}

impl ResponseError for ClusterError {
    fn status_code(&self) -> ActixStatus {
        match self {
            ClusterError::MissingParameter(_) => ActixStatus::BAD_REQUEST,
            _ => ActixStatus::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ClusterError::MissingParameter(_) => {
                HttpResponse::build(self.status_code()).body(format!("Error: {}", self))
            }
            _ => HttpResponse::build(self.status_code()).body(self.to_string()),
        }
    }
}

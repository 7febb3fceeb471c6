use crate::client::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request to the agent failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("agent responded with status {0}")]
    Status(reqwest::StatusCode),
    /// The service answered 2xx but reported a failure in the body.
    #[error("agent rejected the request: {0}")]
    Rejected(String),
    #[error("agent response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

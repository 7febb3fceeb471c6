use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;

use crate::client::config::Config;
use crate::client::consts::EVENT_STREAM;
use crate::client::error::ClientError;
use crate::types::{AgentPayload, ProfileUpdate, TurnRequest, UserProfile};

/// Raw body of a streamed turn, chunked however the network delivered it.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ClientError>> + Send>>;

/// The wire between the conversation and the remote stylist agent.
///
/// `Client` only ever talks to the agent through this trait, so tests can
/// script the agent's side with `MockTransport`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends a turn and resolves once the response stream is open.
    async fn open_turn(&self, request: &TurnRequest) -> Result<ByteStream, ClientError>;

    /// Single-shot turn without framing.
    async fn analyze(&self, request: &TurnRequest) -> Result<AgentPayload, ClientError>;

    async fn fetch_profile(&self, user_id: &str) -> Result<UserProfile, ClientError>;

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile, ClientError>;

    /// Uploads a portrait for analysis as the multipart field `image`.
    async fn upload_portrait(
        &self,
        image: Vec<u8>,
        file_name: &str,
    ) -> Result<UserProfile, ClientError>;
}

pub struct HttpTransport {
    http: reqwest::Client,
    config: Config,
}

impl HttpTransport {
    pub fn new(config: Config) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    async fn read_json(response: reqwest::Response) -> Result<Value, ClientError> {
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status(status));
        }
        Ok(response.json::<Value>().await?)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn open_turn(&self, request: &TurnRequest) -> Result<ByteStream, ClientError> {
        let url = self.config.turn_url();
        tracing::debug!("POST {} thread={}", url, request.thread_id());

        let response = self
            .http
            .post(&url)
            .header(ACCEPT, EVENT_STREAM)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status(status));
        }
        if let Some(content_type) = response.headers().get(CONTENT_TYPE) {
            tracing::debug!("turn stream opened, content-type={:?}", content_type);
        }

        Ok(Box::pin(
            response
                .bytes_stream()
                .map(|chunk| chunk.map_err(ClientError::from)),
        ))
    }

    async fn analyze(&self, request: &TurnRequest) -> Result<AgentPayload, ClientError> {
        let url = self.config.analyze_url();
        tracing::debug!("POST {} thread={}", url, request.thread_id());

        let response = self.http.post(&url).json(request).send().await?;
        let mut body = Self::read_json(response).await?;

        // Compatibility endpoints wrap the payload as `{ "data": ..., "agent": payload }`.
        let payload = match body.get_mut("agent") {
            Some(agent) if agent.is_object() => agent.take(),
            _ => body,
        };
        Ok(serde_json::from_value(payload)?)
    }

    async fn fetch_profile(&self, user_id: &str) -> Result<UserProfile, ClientError> {
        let url = format!("{}/{}", self.config.profile_url(), user_id);
        let response = self.http.get(&url).send().await?;
        Ok(UserProfile::from_response(Self::read_json(response).await?))
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile, ClientError> {
        let url = format!("{}/update", self.config.profile_url());
        let response = self.http.post(&url).json(update).send().await?;
        profile_or_rejection(Self::read_json(response).await?)
    }

    async fn upload_portrait(
        &self,
        image: Vec<u8>,
        file_name: &str,
    ) -> Result<UserProfile, ClientError> {
        let part = reqwest::multipart::Part::bytes(image)
            .file_name(file_name.to_string())
            .mime_str(image_mime(file_name))?;
        let form = reqwest::multipart::Form::new().part("image", part);

        let response = self
            .http
            .post(self.config.profile_url())
            .multipart(form)
            .send()
            .await?;
        Ok(UserProfile::from_response(Self::read_json(response).await?))
    }
}

/// The profile service reports failed updates as `200 {"error": ..}`.
fn profile_or_rejection(body: Value) -> Result<UserProfile, ClientError> {
    match body.get("error") {
        Some(Value::Null) | None => Ok(UserProfile::from_response(body)),
        Some(error) => {
            let reason = error.as_str().map(str::to_string).unwrap_or_else(|| error.to_string());
            tracing::warn!("profile update rejected: {}", reason);
            Err(ClientError::Rejected(reason))
        }
    }
}

fn image_mime(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "heic" => "image/heic",
        _ => "image/jpeg",
    }
}

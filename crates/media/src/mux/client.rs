//! HTTP client for the Mux Video API.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{DirectUpload, MuxAsset, MuxError, VideoPipeline};

const DEFAULT_BASE_URL: &str = "https://api.mux.com";

/// HTTP request timeout for a single call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct MuxConfig {
    pub token_id: String,
    pub token_secret: String,
    pub base_url: String,
}

impl MuxConfig {
    /// Returns `None` unless both `MUX_TOKEN_ID` and `MUX_TOKEN_SECRET` are set.
    pub fn from_env() -> Option<Self> {
        let token_id = std::env::var("MUX_TOKEN_ID").ok().filter(|v| !v.is_empty())?;
        let token_secret = std::env::var("MUX_TOKEN_SECRET")
            .ok()
            .filter(|v| !v.is_empty())?;
        Some(Self {
            token_id,
            token_secret,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }
}

/// Mux responses wrap the resource in `{"data": ...}`.
#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

pub struct MuxClient {
    client: reqwest::Client,
    config: MuxConfig,
}

impl MuxClient {
    pub fn new(config: MuxConfig) -> Result<Self, MuxError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/video/v1{path}", self.config.base_url.trim_end_matches('/'))
    }

    /// Request body for `POST /video/v1/uploads`.
    pub fn upload_request_body(cors_origin: &str, passthrough: Option<&str>) -> serde_json::Value {
        let mut settings = serde_json::json!({ "playback_policy": ["public"] });
        if let Some(passthrough) = passthrough {
            settings["passthrough"] = passthrough.into();
        }
        serde_json::json!({
            "cors_origin": cors_origin,
            "new_asset_settings": settings,
        })
    }

    async fn read<T: DeserializeOwned>(
        response: reqwest::Response,
        resource: &str,
    ) -> Result<T, MuxError> {
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(MuxError::NotFound(resource.to_string()));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), resource, "Mux request failed");
            return Err(MuxError::Api {
                status: status.as_u16(),
                message,
            });
        }
        let envelope: Envelope<T> = response.json().await?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl VideoPipeline for MuxClient {
    async fn create_direct_upload(
        &self,
        cors_origin: &str,
        passthrough: Option<&str>,
    ) -> Result<DirectUpload, MuxError> {
        let response = self
            .client
            .post(self.url("/uploads"))
            .basic_auth(&self.config.token_id, Some(&self.config.token_secret))
            .json(&Self::upload_request_body(cors_origin, passthrough))
            .send()
            .await?;
        let upload: DirectUpload = Self::read(response, "upload").await?;
        tracing::info!(upload_id = %upload.id, "Created Mux direct upload");
        Ok(upload)
    }

    async fn get_upload(&self, upload_id: &str) -> Result<DirectUpload, MuxError> {
        let response = self
            .client
            .get(self.url(&format!("/uploads/{upload_id}")))
            .basic_auth(&self.config.token_id, Some(&self.config.token_secret))
            .send()
            .await?;
        Self::read(response, upload_id).await
    }

    async fn get_asset(&self, asset_id: &str) -> Result<MuxAsset, MuxError> {
        let response = self
            .client
            .get(self.url(&format!("/assets/{asset_id}")))
            .basic_auth(&self.config.token_id, Some(&self.config.token_secret))
            .send()
            .await?;
        Self::read(response, asset_id).await
    }
}

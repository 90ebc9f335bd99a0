//! Mux video pipeline.
//!
//! Browsers upload video straight to Mux through a direct-upload URL; Mux
//! transcodes it and reports progress through webhooks. Handlers talk to
//! Mux through the [`VideoPipeline`] trait so tests can swap in a fake.

mod client;
pub mod webhook;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use client::{MuxClient, MuxConfig};

/// HLS playback URL for a public playback id.
pub fn playback_url(playback_id: &str) -> String {
    format!("https://stream.mux.com/{playback_id}.m3u8")
}

/// Poster frame URL for a public playback id.
pub fn thumbnail_url(playback_id: &str) -> String {
    format!("https://image.mux.com/{playback_id}/thumbnail.jpg")
}

#[derive(Debug, thiserror::Error)]
pub enum MuxError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Mux returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Mux resource not found: {0}")]
    NotFound(String),

    #[error("Invalid webhook signature: {0}")]
    InvalidSignature(String),

    #[error("Malformed webhook payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// A direct upload as Mux reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectUpload {
    pub id: String,
    /// Signed PUT URL. Only present while the upload is waiting.
    #[serde(default)]
    pub url: Option<String>,
    /// `waiting`, `asset_created`, `errored`, `cancelled` or `timed_out`.
    pub status: String,
    #[serde(default)]
    pub asset_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackId {
    pub id: String,
    pub policy: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MuxAsset {
    pub id: String,
    /// `preparing`, `ready` or `errored`.
    pub status: String,
    #[serde(default)]
    pub playback_ids: Vec<PlaybackId>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub upload_id: Option<String>,
    #[serde(default)]
    pub passthrough: Option<String>,
}

impl MuxAsset {
    pub fn public_playback_id(&self) -> Option<&str> {
        self.playback_ids
            .iter()
            .find(|p| p.policy == "public")
            .map(|p| p.id.as_str())
    }
}

/// Operations the API needs from the video pipeline.
#[async_trait]
pub trait VideoPipeline: Send + Sync {
    /// Create a direct upload whose asset gets a public playback policy.
    /// `passthrough` is echoed back on the resulting asset.
    async fn create_direct_upload(
        &self,
        cors_origin: &str,
        passthrough: Option<&str>,
    ) -> Result<DirectUpload, MuxError>;

    async fn get_upload(&self, upload_id: &str) -> Result<DirectUpload, MuxError>;

    async fn get_asset(&self, asset_id: &str) -> Result<MuxAsset, MuxError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls() {
        assert_eq!(playback_url("abc"), "https://stream.mux.com/abc.m3u8");
        assert_eq!(thumbnail_url("abc"), "https://image.mux.com/abc/thumbnail.jpg");
    }

    #[test]
    fn public_playback_id_skips_signed() {
        let asset: MuxAsset = serde_json::from_value(serde_json::json!({
            "id": "asset1",
            "status": "ready",
            "playback_ids": [
                {"id": "signed1", "policy": "signed"},
                {"id": "pub1", "policy": "public"}
            ]
        }))
        .unwrap();
        assert_eq!(asset.public_playback_id(), Some("pub1"));
        assert!(asset.duration.is_none());
    }
}

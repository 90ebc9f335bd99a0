//! Mux webhook parsing and signature verification.
//!
//! Mux signs each delivery with a `mux-signature: t=<unix>,v1=<hex>` header,
//! where `v1` is HMAC-SHA256 of `"{t}.{raw body}"` keyed by the webhook
//! signing secret.

use serde::Deserialize;
use studio_core::hashing::{constant_time_eq, hmac_sha256_hex};

use super::MuxError;

/// Maximum age of a signed delivery.
pub const SIGNATURE_TOLERANCE_SECS: u64 = 300;

pub const SIGNATURE_HEADER: &str = "mux-signature";

/// Verify a `mux-signature` header against the raw request body.
pub fn verify_signature(
    header: &str,
    body: &[u8],
    secret: &str,
    now_unix: i64,
) -> Result<(), MuxError> {
    let mut timestamp: Option<&str> = None;
    let mut signatures: Vec<&str> = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp =
        timestamp.ok_or_else(|| MuxError::InvalidSignature("missing timestamp".into()))?;
    if signatures.is_empty() {
        return Err(MuxError::InvalidSignature("missing v1 signature".into()));
    }
    let issued: i64 = timestamp
        .parse()
        .map_err(|_| MuxError::InvalidSignature("timestamp is not a number".into()))?;
    if now_unix.abs_diff(issued) > SIGNATURE_TOLERANCE_SECS {
        return Err(MuxError::InvalidSignature("timestamp outside tolerance".into()));
    }

    let mut signed = Vec::with_capacity(timestamp.len() + 1 + body.len());
    signed.extend_from_slice(timestamp.as_bytes());
    signed.push(b'.');
    signed.extend_from_slice(body);
    let expected = hmac_sha256_hex(secret.as_bytes(), &signed);

    if signatures.iter().any(|s| constant_time_eq(s, &expected)) {
        Ok(())
    } else {
        Err(MuxError::InvalidSignature("signature mismatch".into()))
    }
}

/// The envelope of every webhook delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// What a delivery asks the studio to do.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookAction {
    /// `video.upload.asset_created`: the upload produced a Mux asset.
    UploadAssetCreated { upload_id: String, asset_id: String },
    /// `video.asset.ready`
    AssetReady {
        asset_id: String,
        upload_id: Option<String>,
        passthrough: Option<String>,
        playback_id: Option<String>,
        duration: Option<f64>,
    },
    /// `video.asset.errored`
    AssetErrored {
        asset_id: String,
        upload_id: Option<String>,
        passthrough: Option<String>,
        message: Option<String>,
    },
    /// `video.upload.cancelled`
    UploadCancelled { upload_id: String },
    /// Any other type, or a known type missing its ids.
    Ignored(String),
}

impl WebhookEvent {
    pub fn parse(body: &[u8]) -> Result<Self, MuxError> {
        Ok(serde_json::from_slice(body)?)
    }

    fn data_str(&self, key: &str) -> Option<String> {
        self.data
            .get(key)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    pub fn action(&self) -> WebhookAction {
        let ignored = || WebhookAction::Ignored(self.event_type.clone());
        match self.event_type.as_str() {
            "video.upload.asset_created" => match (self.data_str("id"), self.data_str("asset_id")) {
                (Some(upload_id), Some(asset_id)) => {
                    WebhookAction::UploadAssetCreated { upload_id, asset_id }
                }
                _ => ignored(),
            },
            "video.asset.ready" => match self.data_str("id") {
                Some(asset_id) => {
                    let playback_id = self
                        .data
                        .get("playback_ids")
                        .and_then(|ids| ids.as_array())
                        .and_then(|ids| {
                            ids.iter()
                                .find(|p| p.get("policy").and_then(|v| v.as_str()) == Some("public"))
                        })
                        .and_then(|p| p.get("id"))
                        .and_then(|v| v.as_str())
                        .map(str::to_string);
                    WebhookAction::AssetReady {
                        asset_id,
                        upload_id: self.data_str("upload_id"),
                        passthrough: self.data_str("passthrough"),
                        playback_id,
                        duration: self.data.get("duration").and_then(|v| v.as_f64()),
                    }
                }
                None => ignored(),
            },
            "video.asset.errored" => match self.data_str("id") {
                Some(asset_id) => WebhookAction::AssetErrored {
                    asset_id,
                    upload_id: self.data_str("upload_id"),
                    passthrough: self.data_str("passthrough"),
                    message: self
                        .data
                        .pointer("/errors/messages/0")
                        .and_then(|v| v.as_str())
                        .map(str::to_string),
                },
                None => ignored(),
            },
            "video.upload.cancelled" => match self.data_str("id") {
                Some(upload_id) => WebhookAction::UploadCancelled { upload_id },
                None => ignored(),
            },
            _ => ignored(),
        }
    }
}

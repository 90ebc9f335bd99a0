//! Share-link tokens, link types and access evaluation.
//!
//! A share link grants an external client or editor scoped access to one
//! project. Access is only granted while the link is active and unexpired.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::asset_status::AssetStatus;
use crate::error::CoreError;
use crate::types::Timestamp;

/// Length of a generated share token (alphanumeric characters).
pub const TOKEN_LENGTH: usize = 32;

/// Kind of external collaborator a link is issued to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareLinkType {
    Client,
    Editor,
}

/// Something a share-link holder may do besides viewing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareCapability {
    Comment,
    Select,
    ConfirmSelection,
    UpdateStatus,
    ResolveFeedback,
}

impl ShareLinkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Editor => "editor",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "client" => Ok(Self::Client),
            "editor" => Ok(Self::Editor),
            _ => Err(CoreError::Validation(format!(
                "Invalid share link type '{s}'. Must be one of: client, editor"
            ))),
        }
    }

    pub fn allows(&self, capability: ShareCapability) -> bool {
        use ShareCapability::*;
        match self {
            Self::Client => matches!(capability, Comment | Select | ConfirmSelection),
            Self::Editor => matches!(capability, Comment | UpdateStatus | ResolveFeedback),
        }
    }

    /// Statuses an editor link may set on an asset.
    pub fn settable_statuses(&self) -> &'static [AssetStatus] {
        match self {
            Self::Client => &[],
            Self::Editor => &[AssetStatus::InProgress, AssetStatus::ReviewReady],
        }
    }
}

/// Generate a new random share token.
pub fn generate_token() -> String {
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Cheap shape check before touching the database.
pub fn is_well_formed_token(token: &str) -> bool {
    token.len() == TOKEN_LENGTH && token.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Public URL a share link resolves to in the web client.
pub fn share_url(app_url: &str, token: &str) -> String {
    format!("{}/share/{token}", app_url.trim_end_matches('/'))
}

/// Decide whether a link may be used at `now`.
///
/// Inactive links are forbidden; links past `expires_at` are gone.
pub fn check_access(
    is_active: bool,
    expires_at: Option<Timestamp>,
    now: Timestamp,
) -> Result<(), CoreError> {
    if !is_active {
        return Err(CoreError::Forbidden("This share link has been disabled".into()));
    }
    if let Some(expires_at) = expires_at {
        if expires_at <= now {
            return Err(CoreError::Gone("This share link has expired".into()));
        }
    }
    Ok(())
}

/// Require a capability for a link type.
pub fn require_capability(
    link_type: &str,
    capability: ShareCapability,
) -> Result<ShareLinkType, CoreError> {
    let link_type = ShareLinkType::parse(link_type)?;
    if link_type.allows(capability) {
        Ok(link_type)
    } else {
        Err(CoreError::Forbidden(format!(
            "A {} link cannot perform this action",
            link_type.as_str()
        )))
    }
}

/// A new link's expiry, when given, must lie in the future.
pub fn validate_expiry(expires_at: Option<Timestamp>, now: Timestamp) -> Result<(), CoreError> {
    match expires_at {
        Some(at) if at <= now => Err(CoreError::Validation(
            "expires_at must be in the future".into(),
        )),
        _ => Ok(()),
    }
}

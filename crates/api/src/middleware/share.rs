//! Public share-link resolution.
//!
//! Share routes carry the token in the path instead of an `Authorization`
//! header. Every successful resolution counts as an access.

use chrono::Utc;
use studio_core::share::{check_access, is_well_formed_token, require_capability, ShareCapability, ShareLinkType};
use studio_db::models::share_link::ShareLink;
use studio_db::repositories::ShareLinkRepo;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Look up a share token and check it is active and unexpired.
///
/// Unknown tokens are 404, disabled links 403 and expired links 410.
pub async fn resolve_share_link(state: &AppState, token: &str) -> AppResult<ShareLink> {
    if !is_well_formed_token(token) {
        return Err(AppError::NotFound("Share link not found".into()));
    }
    let link = ShareLinkRepo::find_by_token(&state.pool, token)
        .await?
        .ok_or_else(|| AppError::NotFound("Share link not found".into()))?;

    check_access(link.is_active, link.expires_at, Utc::now())?;
    ShareLinkRepo::record_access(&state.pool, link.id).await?;

    tracing::debug!(share_link_id = link.id, project_id = link.project_id, "Share link accessed");
    Ok(link)
}

/// Resolve a token and require that its link type grants `capability`.
pub async fn resolve_with_capability(
    state: &AppState,
    token: &str,
    capability: ShareCapability,
) -> AppResult<(ShareLink, ShareLinkType)> {
    let link = resolve_share_link(state, token).await?;
    let link_type = require_capability(&link.link_type, capability)?;
    Ok((link, link_type))
}

/// Actor label recorded for actions taken through a link.
pub fn visitor_label(link: &ShareLink, author_name: Option<&str>) -> String {
    match author_name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => name.to_string(),
        None if !link.name.trim().is_empty() => link.name.trim().to_string(),
        None => format!("{} link", link.link_type),
    }
}

//! Share link entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use studio_core::types::{DbId, Timestamp};

/// A row from the `share_links` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ShareLink {
    pub id: DbId,
    pub project_id: DbId,
    pub token: String,
    pub link_type: String,
    pub name: String,
    pub expires_at: Option<Timestamp>,
    pub is_active: bool,
    pub created_by: Option<DbId>,
    pub last_accessed_at: Option<Timestamp>,
    pub access_count: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a share link. The token is generated server-side.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateShareLink {
    pub link_type: String,
    #[serde(default)]
    pub name: String,
    pub expires_at: Option<Timestamp>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateShareLink {
    pub name: Option<String>,
    pub is_active: Option<bool>,
    pub expires_at: Option<Timestamp>,
}

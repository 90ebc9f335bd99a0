//! Project activity log entries.

use serde::Serialize;
use sqlx::FromRow;
use studio_core::types::{DbId, Timestamp};

/// A row from the `activity_log` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ActivityEntry {
    pub id: DbId,
    pub project_id: DbId,
    pub actor_user_id: Option<DbId>,
    pub actor_label: String,
    pub action: String,
    pub details: serde_json::Value,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateActivity {
    pub project_id: DbId,
    pub actor_user_id: Option<DbId>,
    pub actor_label: String,
    pub action: String,
    pub details: serde_json::Value,
}

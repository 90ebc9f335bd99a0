//! Feedback comments on assets.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use studio_core::types::{DbId, Timestamp};

/// A row from the `asset_feedback` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Feedback {
    pub id: DbId,
    pub asset_id: DbId,
    pub text: String,
    pub author_name: String,
    pub author_user_id: Option<DbId>,
    pub share_link_id: Option<DbId>,
    pub video_timestamp: Option<f64>,
    pub is_done: bool,
    pub mentions: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting feedback. Author fields are filled in by the handler.
#[derive(Debug, Clone)]
pub struct CreateFeedback {
    pub asset_id: DbId,
    pub text: String,
    pub author_name: String,
    pub author_user_id: Option<DbId>,
    pub share_link_id: Option<DbId>,
    pub video_timestamp: Option<f64>,
    pub mentions: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateFeedback {
    pub text: Option<String>,
    pub is_done: Option<bool>,
}

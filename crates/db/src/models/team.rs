//! Project team membership.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use studio_core::types::{DbId, Timestamp};

/// A team member joined with the user's name, email and role.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TeamMember {
    pub id: DbId,
    pub project_id: DbId,
    pub user_id: DbId,
    pub role_label: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddTeamMember {
    pub user_id: DbId,
    #[serde(default)]
    pub role_label: String,
}

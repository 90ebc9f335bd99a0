//! Project entity model and DTOs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use studio_core::types::{DbId, Timestamp};

/// A project row from the `projects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    pub name: String,
    pub client: String,
    pub project_type: String,
    pub status: String,
    pub categories: Vec<String>,
    pub workflow_phase: String,
    pub selection_confirmed: bool,
    pub due_date: Option<NaiveDate>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new project.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProject {
    pub name: String,
    #[serde(default)]
    pub client: String,
    #[serde(default)]
    pub project_type: String,
    #[serde(default)]
    pub categories: Vec<String>,
    pub due_date: Option<NaiveDate>,
    #[serde(skip)]
    pub created_by: Option<DbId>,
}

/// DTO for updating an existing project. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub client: Option<String>,
    pub project_type: Option<String>,
    pub status: Option<String>,
    pub due_date: Option<NaiveDate>,
}

/// Project list row with aggregate asset counts.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProjectSummary {
    pub id: DbId,
    pub name: String,
    pub client: String,
    pub project_type: String,
    pub status: String,
    pub workflow_phase: String,
    pub due_date: Option<NaiveDate>,
    pub asset_count: i64,
    pub approved_count: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

//! Asset entity model and DTOs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use studio_core::asset_status::AssetStatus;
use studio_core::error::CoreError;
use studio_core::types::{DbId, Timestamp};
use studio_core::views::AssetCard;

/// An asset row from the `assets` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Asset {
    pub id: DbId,
    pub project_id: DbId,
    pub name: String,
    pub asset_type: String,
    pub category: String,
    pub url: Option<String>,
    pub thumbnail: Option<String>,
    pub storage_path: Option<String>,
    pub status: String,
    pub rating: i16,
    pub assigned_to: Option<DbId>,
    pub tags: Vec<String>,
    pub due_date: Option<NaiveDate>,
    pub current_version: i32,
    pub mux_upload_id: Option<String>,
    pub mux_asset_id: Option<String>,
    pub mux_playback_id: Option<String>,
    pub mux_status: Option<String>,
    pub file_size_bytes: Option<i64>,
    pub mime_type: Option<String>,
    pub uploaded_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting an asset. Built by handlers after validation.
#[derive(Debug, Clone, Default)]
pub struct CreateAsset {
    pub project_id: DbId,
    pub name: String,
    pub asset_type: String,
    pub category: String,
    pub url: Option<String>,
    pub thumbnail: Option<String>,
    pub storage_path: Option<String>,
    pub tags: Vec<String>,
    pub due_date: Option<NaiveDate>,
    pub file_size_bytes: Option<i64>,
    pub mime_type: Option<String>,
    pub uploaded_by: Option<DbId>,
    pub mux_upload_id: Option<String>,
}

/// DTO for updating asset metadata. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAsset {
    pub name: Option<String>,
    pub category: Option<String>,
    pub rating: Option<i16>,
    pub tags: Option<Vec<String>>,
    pub due_date: Option<NaiveDate>,
    pub url: Option<String>,
    pub thumbnail: Option<String>,
}

/// Values copied from a Mux asset onto a studio asset.
#[derive(Debug, Clone, Default)]
pub struct MuxAssetUpdate {
    pub mux_asset_id: Option<String>,
    pub mux_playback_id: Option<String>,
    pub mux_status: String,
    pub url: Option<String>,
    pub thumbnail: Option<String>,
}

/// Optional list filters for a project's assets.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetFilter {
    pub status: Option<String>,
    pub category: Option<String>,
    pub asset_type: Option<String>,
}

/// Asset joined with its project name, for dashboard/task/calendar views.
#[derive(Debug, Clone, FromRow)]
pub struct AssetCardRow {
    pub id: DbId,
    pub project_id: DbId,
    pub project_name: String,
    pub name: String,
    pub asset_type: String,
    pub category: String,
    pub status: String,
    pub assigned_to: Option<DbId>,
    pub due_date: Option<NaiveDate>,
    pub thumbnail: Option<String>,
}

impl TryFrom<AssetCardRow> for AssetCard {
    type Error = CoreError;

    fn try_from(row: AssetCardRow) -> Result<Self, Self::Error> {
        Ok(AssetCard {
            id: row.id,
            project_id: row.project_id,
            project_name: row.project_name,
            name: row.name,
            asset_type: row.asset_type,
            category: row.category,
            status: AssetStatus::parse(&row.status)?,
            assigned_to: row.assigned_to,
            due_date: row.due_date,
            thumbnail: row.thumbnail,
        })
    }
}

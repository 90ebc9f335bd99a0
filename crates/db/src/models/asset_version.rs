//! Asset version history.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use studio_core::types::{DbId, Timestamp};

/// A row from the `asset_versions` table. `created_at` is the upload time.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AssetVersion {
    pub id: DbId,
    pub asset_id: DbId,
    pub version: i32,
    pub url: String,
    pub storage_path: Option<String>,
    pub file_size_bytes: Option<i64>,
    pub notes: Option<String>,
    pub uploaded_by: Option<DbId>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAssetVersion {
    pub url: String,
    pub notes: Option<String>,
    #[serde(skip)]
    pub storage_path: Option<String>,
    #[serde(skip)]
    pub file_size_bytes: Option<i64>,
}

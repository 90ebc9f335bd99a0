//! Repository for the `asset_versions` table.

use sqlx::PgPool;
use studio_core::types::DbId;

use crate::models::asset_version::{AssetVersion, CreateAssetVersion};

const COLUMNS: &str =
    "id, asset_id, version, url, storage_path, file_size_bytes, notes, uploaded_by, created_at";

pub struct AssetVersionRepo;

impl AssetVersionRepo {
    /// Insert the next version number for an asset.
    ///
    /// The number is one past the highest existing version, or past the
    /// asset's `current_version` when no history rows exist yet.
    pub async fn create_next(
        pool: &PgPool,
        asset_id: DbId,
        input: &CreateAssetVersion,
        uploaded_by: Option<DbId>,
    ) -> Result<AssetVersion, sqlx::Error> {
        let query = format!(
            "INSERT INTO asset_versions (asset_id, version, url, storage_path, file_size_bytes, notes, uploaded_by)
             VALUES (
                $1,
                GREATEST(
                    (SELECT COALESCE(MAX(version), 0) FROM asset_versions WHERE asset_id = $1),
                    (SELECT current_version FROM assets WHERE id = $1)
                ) + 1,
                $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AssetVersion>(&query)
            .bind(asset_id)
            .bind(&input.url)
            .bind(&input.storage_path)
            .bind(input.file_size_bytes)
            .bind(&input.notes)
            .bind(uploaded_by)
            .fetch_one(pool)
            .await
    }

    /// Version history, newest first.
    pub async fn list_for_asset(
        pool: &PgPool,
        asset_id: DbId,
    ) -> Result<Vec<AssetVersion>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM asset_versions WHERE asset_id = $1 ORDER BY version DESC");
        sqlx::query_as::<_, AssetVersion>(&query)
            .bind(asset_id)
            .fetch_all(pool)
            .await
    }
}

//! Repository for the `asset_annotations` table.

use sqlx::PgPool;
use studio_core::types::DbId;

use crate::models::annotation::AnnotationSet;

const COLUMNS: &str = "id, asset_id, annotations, updated_by, created_at, updated_at";

pub struct AnnotationRepo;

impl AnnotationRepo {
    pub async fn find_for_asset(
        pool: &PgPool,
        asset_id: DbId,
    ) -> Result<Option<AnnotationSet>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM asset_annotations WHERE asset_id = $1");
        sqlx::query_as::<_, AnnotationSet>(&query)
            .bind(asset_id)
            .fetch_optional(pool)
            .await
    }

    /// Replace the stored annotation array for an asset.
    pub async fn upsert(
        pool: &PgPool,
        asset_id: DbId,
        annotations: &serde_json::Value,
        updated_by: Option<DbId>,
    ) -> Result<AnnotationSet, sqlx::Error> {
        let query = format!(
            "INSERT INTO asset_annotations (asset_id, annotations, updated_by)
             VALUES ($1, $2, $3)
             ON CONFLICT ON CONSTRAINT uq_asset_annotations_asset_id
             DO UPDATE SET annotations = EXCLUDED.annotations, updated_by = EXCLUDED.updated_by
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AnnotationSet>(&query)
            .bind(asset_id)
            .bind(annotations)
            .bind(updated_by)
            .fetch_one(pool)
            .await
    }
}

//! Repository for the `assets` table.

use sqlx::PgPool;
use studio_core::types::DbId;

use crate::models::asset::{
    Asset, AssetCardRow, AssetFilter, CreateAsset, MuxAssetUpdate, UpdateAsset,
};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, project_id, name, asset_type, category, url, thumbnail, storage_path, \
                       status, rating, assigned_to, tags, due_date, current_version, \
                       mux_upload_id, mux_asset_id, mux_playback_id, mux_status, \
                       file_size_bytes, mime_type, uploaded_by, created_at, updated_at";

const CARD_SELECT: &str = "SELECT a.id, a.project_id, p.name AS project_name, a.name, \
                           a.asset_type, a.category, a.status, a.assigned_to, a.due_date, a.thumbnail \
                           FROM assets a JOIN projects p ON p.id = a.project_id";

/// Provides CRUD operations for assets.
pub struct AssetRepo;

impl AssetRepo {
    /// Insert a new asset in `pending` status, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateAsset) -> Result<Asset, sqlx::Error> {
        let query = format!(
            "INSERT INTO assets (project_id, name, asset_type, category, url, thumbnail,
                                 storage_path, tags, due_date, file_size_bytes, mime_type,
                                 uploaded_by, mux_upload_id, mux_status)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                     CASE WHEN $13::TEXT IS NULL THEN NULL ELSE 'waiting' END)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Asset>(&query)
            .bind(input.project_id)
            .bind(&input.name)
            .bind(&input.asset_type)
            .bind(&input.category)
            .bind(&input.url)
            .bind(&input.thumbnail)
            .bind(&input.storage_path)
            .bind(&input.tags)
            .bind(input.due_date)
            .bind(input.file_size_bytes)
            .bind(&input.mime_type)
            .bind(input.uploaded_by)
            .bind(&input.mux_upload_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Asset>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM assets WHERE id = $1");
        sqlx::query_as::<_, Asset>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find an asset that belongs to the given project.
    pub async fn find_in_project(
        pool: &PgPool,
        project_id: DbId,
        id: DbId,
    ) -> Result<Option<Asset>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM assets WHERE id = $1 AND project_id = $2");
        sqlx::query_as::<_, Asset>(&query)
            .bind(id)
            .bind(project_id)
            .fetch_optional(pool)
            .await
    }

    /// List a project's assets, optionally filtered, ordered by category then name.
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: DbId,
        filter: &AssetFilter,
    ) -> Result<Vec<Asset>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM assets
             WHERE project_id = $1
               AND ($2::TEXT IS NULL OR status = $2)
               AND ($3::TEXT IS NULL OR category = $3)
               AND ($4::TEXT IS NULL OR asset_type = $4)
             ORDER BY category, name, id"
        );
        sqlx::query_as::<_, Asset>(&query)
            .bind(project_id)
            .bind(&filter.status)
            .bind(&filter.category)
            .bind(&filter.asset_type)
            .fetch_all(pool)
            .await
    }

    /// Update asset metadata. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateAsset,
    ) -> Result<Option<Asset>, sqlx::Error> {
        let query = format!(
            "UPDATE assets SET
                name = COALESCE($2, name),
                category = COALESCE($3, category),
                rating = COALESCE($4, rating),
                tags = COALESCE($5, tags),
                due_date = COALESCE($6, due_date),
                url = COALESCE($7, url),
                thumbnail = COALESCE($8, thumbnail)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Asset>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.category)
            .bind(input.rating)
            .bind(&input.tags)
            .bind(input.due_date)
            .bind(&input.url)
            .bind(&input.thumbnail)
            .fetch_optional(pool)
            .await
    }

    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        status: &str,
    ) -> Result<Option<Asset>, sqlx::Error> {
        let query = format!("UPDATE assets SET status = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Asset>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(pool)
            .await
    }

    /// Set or clear the assignee, optionally moving the status in the same write.
    pub async fn set_assignee(
        pool: &PgPool,
        id: DbId,
        assigned_to: Option<DbId>,
        status: Option<&str>,
    ) -> Result<Option<Asset>, sqlx::Error> {
        let query = format!(
            "UPDATE assets SET assigned_to = $2, status = COALESCE($3, status)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Asset>(&query)
            .bind(id)
            .bind(assigned_to)
            .bind(status)
            .fetch_optional(pool)
            .await
    }

    /// Point the asset at a newly uploaded version.
    pub async fn set_current_version(
        pool: &PgPool,
        id: DbId,
        version: i32,
        url: &str,
        status: Option<&str>,
    ) -> Result<Option<Asset>, sqlx::Error> {
        let query = format!(
            "UPDATE assets SET current_version = $2, url = $3, status = COALESCE($4, status)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Asset>(&query)
            .bind(id)
            .bind(version)
            .bind(url)
            .bind(status)
            .fetch_optional(pool)
            .await
    }

    /// Count a project's assets in a given status.
    pub async fn count_by_status(
        pool: &PgPool,
        project_id: DbId,
        status: &str,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM assets WHERE project_id = $1 AND status = $2")
            .bind(project_id)
            .bind(status)
            .fetch_one(pool)
            .await
    }

    /// Count a project's assets filed under a category (case-insensitive).
    pub async fn count_in_category(
        pool: &PgPool,
        project_id: DbId,
        category: &str,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM assets WHERE project_id = $1 AND LOWER(category) = LOWER($2)",
        )
        .bind(project_id)
        .bind(category)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM assets WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -- Mux ---------------------------------------------------------------

    /// Record a Mux direct-upload id and reset the Mux status to `waiting`.
    pub async fn set_mux_upload(
        pool: &PgPool,
        id: DbId,
        upload_id: &str,
    ) -> Result<Option<Asset>, sqlx::Error> {
        let query = format!(
            "UPDATE assets SET mux_upload_id = $2, mux_status = 'waiting'
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Asset>(&query)
            .bind(id)
            .bind(upload_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_mux_upload_id(
        pool: &PgPool,
        upload_id: &str,
    ) -> Result<Option<Asset>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM assets WHERE mux_upload_id = $1");
        sqlx::query_as::<_, Asset>(&query)
            .bind(upload_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_mux_asset_id(
        pool: &PgPool,
        mux_asset_id: &str,
    ) -> Result<Option<Asset>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM assets WHERE mux_asset_id = $1");
        sqlx::query_as::<_, Asset>(&query)
            .bind(mux_asset_id)
            .fetch_optional(pool)
            .await
    }

    /// Copy Mux asset state onto a studio asset. Absent fields keep their value.
    pub async fn apply_mux_update(
        pool: &PgPool,
        id: DbId,
        update: &MuxAssetUpdate,
    ) -> Result<Option<Asset>, sqlx::Error> {
        let query = format!(
            "UPDATE assets SET
                mux_asset_id = COALESCE($2, mux_asset_id),
                mux_playback_id = COALESCE($3, mux_playback_id),
                mux_status = $4,
                url = COALESCE($5, url),
                thumbnail = COALESCE($6, thumbnail)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Asset>(&query)
            .bind(id)
            .bind(&update.mux_asset_id)
            .bind(&update.mux_playback_id)
            .bind(&update.mux_status)
            .bind(&update.url)
            .bind(&update.thumbnail)
            .fetch_optional(pool)
            .await
    }

    // -- Views -------------------------------------------------------------

    /// Cards for every asset visible to a user (`None` = all projects).
    pub async fn list_cards(
        pool: &PgPool,
        member_id: Option<DbId>,
    ) -> Result<Vec<AssetCardRow>, sqlx::Error> {
        let query = format!(
            "{CARD_SELECT}
             WHERE $1::BIGINT IS NULL OR a.assigned_to = $1 OR EXISTS (
                SELECT 1 FROM project_team t WHERE t.project_id = a.project_id AND t.user_id = $1)
             ORDER BY a.id"
        );
        sqlx::query_as::<_, AssetCardRow>(&query)
            .bind(member_id)
            .fetch_all(pool)
            .await
    }

    /// Cards for one project.
    pub async fn list_cards_for_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<AssetCardRow>, sqlx::Error> {
        let query = format!("{CARD_SELECT} WHERE a.project_id = $1 ORDER BY a.name, a.id");
        sqlx::query_as::<_, AssetCardRow>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Cards for assets assigned to a user.
    pub async fn list_cards_assigned_to(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<AssetCardRow>, sqlx::Error> {
        let query = format!("{CARD_SELECT} WHERE a.assigned_to = $1");
        sqlx::query_as::<_, AssetCardRow>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }
}

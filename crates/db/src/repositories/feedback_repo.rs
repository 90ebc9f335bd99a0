//! Repository for the `asset_feedback` table.

use sqlx::PgPool;
use studio_core::types::DbId;

use crate::models::feedback::{CreateFeedback, Feedback, UpdateFeedback};

const COLUMNS: &str = "id, asset_id, text, author_name, author_user_id, share_link_id, \
                       video_timestamp, is_done, mentions, created_at, updated_at";

pub struct FeedbackRepo;

impl FeedbackRepo {
    pub async fn create(pool: &PgPool, input: &CreateFeedback) -> Result<Feedback, sqlx::Error> {
        let query = format!(
            "INSERT INTO asset_feedback
                (asset_id, text, author_name, author_user_id, share_link_id, video_timestamp, mentions)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Feedback>(&query)
            .bind(input.asset_id)
            .bind(&input.text)
            .bind(&input.author_name)
            .bind(input.author_user_id)
            .bind(input.share_link_id)
            .bind(input.video_timestamp)
            .bind(&input.mentions)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Feedback>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM asset_feedback WHERE id = $1");
        sqlx::query_as::<_, Feedback>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Feedback on an asset, oldest first (conversation order).
    pub async fn list_for_asset(pool: &PgPool, asset_id: DbId) -> Result<Vec<Feedback>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM asset_feedback WHERE asset_id = $1 ORDER BY created_at, id"
        );
        sqlx::query_as::<_, Feedback>(&query)
            .bind(asset_id)
            .fetch_all(pool)
            .await
    }

    /// Feedback on every asset of a project, oldest first.
    pub async fn list_for_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<Feedback>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM asset_feedback
             WHERE asset_id IN (SELECT id FROM assets WHERE project_id = $1)
             ORDER BY created_at, id"
        );
        sqlx::query_as::<_, Feedback>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Update text and/or done flag. `mentions` is replaced when text changes.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateFeedback,
        mentions: Option<&[String]>,
    ) -> Result<Option<Feedback>, sqlx::Error> {
        let query = format!(
            "UPDATE asset_feedback SET
                text = COALESCE($2, text),
                is_done = COALESCE($3, is_done),
                mentions = COALESCE($4, mentions)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Feedback>(&query)
            .bind(id)
            .bind(&input.text)
            .bind(input.is_done)
            .bind(mentions)
            .fetch_optional(pool)
            .await
    }

    pub async fn set_done(pool: &PgPool, id: DbId, is_done: bool) -> Result<Option<Feedback>, sqlx::Error> {
        let query =
            format!("UPDATE asset_feedback SET is_done = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Feedback>(&query)
            .bind(id)
            .bind(is_done)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM asset_feedback WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

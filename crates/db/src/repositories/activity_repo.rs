//! Repository for the `activity_log` table.

use sqlx::PgPool;
use studio_core::types::DbId;

use crate::models::activity::{ActivityEntry, CreateActivity};

const COLUMNS: &str = "id, project_id, actor_user_id, actor_label, action, details, created_at";

pub struct ActivityRepo;

impl ActivityRepo {
    /// Append an entry, returning the generated ID.
    pub async fn create(pool: &PgPool, input: &CreateActivity) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO activity_log (project_id, actor_user_id, actor_label, action, details)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id",
        )
        .bind(input.project_id)
        .bind(input.actor_user_id)
        .bind(&input.actor_label)
        .bind(&input.action)
        .bind(&input.details)
        .fetch_one(pool)
        .await
    }

    /// A project's activity, newest first.
    pub async fn list_for_project(
        pool: &PgPool,
        project_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ActivityEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM activity_log
             WHERE project_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, ActivityEntry>(&query)
            .bind(project_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}

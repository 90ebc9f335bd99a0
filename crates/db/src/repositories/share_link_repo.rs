//! Repository for the `share_links` table.

use sqlx::PgPool;
use studio_core::types::DbId;

use crate::models::share_link::{CreateShareLink, ShareLink, UpdateShareLink};

const COLUMNS: &str = "id, project_id, token, link_type, name, expires_at, is_active, \
                       created_by, last_accessed_at, access_count, created_at, updated_at";

pub struct ShareLinkRepo;

impl ShareLinkRepo {
    pub async fn create(
        pool: &PgPool,
        project_id: DbId,
        token: &str,
        input: &CreateShareLink,
        created_by: Option<DbId>,
    ) -> Result<ShareLink, sqlx::Error> {
        let query = format!(
            "INSERT INTO share_links (project_id, token, link_type, name, expires_at, created_by)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ShareLink>(&query)
            .bind(project_id)
            .bind(token)
            .bind(&input.link_type)
            .bind(&input.name)
            .bind(input.expires_at)
            .bind(created_by)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ShareLink>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM share_links WHERE id = $1");
        sqlx::query_as::<_, ShareLink>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_token(pool: &PgPool, token: &str) -> Result<Option<ShareLink>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM share_links WHERE token = $1");
        sqlx::query_as::<_, ShareLink>(&query)
            .bind(token)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<ShareLink>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM share_links WHERE project_id = $1 ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, ShareLink>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateShareLink,
    ) -> Result<Option<ShareLink>, sqlx::Error> {
        let query = format!(
            "UPDATE share_links SET
                name = COALESCE($2, name),
                is_active = COALESCE($3, is_active),
                expires_at = COALESCE($4, expires_at)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ShareLink>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(input.is_active)
            .bind(input.expires_at)
            .fetch_optional(pool)
            .await
    }

    /// Count a successful access.
    pub async fn record_access(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE share_links SET access_count = access_count + 1, last_accessed_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM share_links WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

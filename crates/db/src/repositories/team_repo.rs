//! Repository for the `project_team` table.

use sqlx::PgPool;
use studio_core::types::DbId;

use crate::models::team::TeamMember;

const MEMBER_SELECT: &str = "SELECT t.id, t.project_id, t.user_id, t.role_label, \
                             u.name, u.email, u.role, t.created_at \
                             FROM project_team t JOIN users u ON u.id = t.user_id";

pub struct TeamRepo;

impl TeamRepo {
    /// Add a user to a project team, or update their role label if already present.
    pub async fn upsert(
        pool: &PgPool,
        project_id: DbId,
        user_id: DbId,
        role_label: &str,
    ) -> Result<TeamMember, sqlx::Error> {
        let id: DbId = sqlx::query_scalar(
            "INSERT INTO project_team (project_id, user_id, role_label)
             VALUES ($1, $2, $3)
             ON CONFLICT ON CONSTRAINT uq_project_team_project_user
             DO UPDATE SET role_label = EXCLUDED.role_label
             RETURNING id",
        )
        .bind(project_id)
        .bind(user_id)
        .bind(role_label)
        .fetch_one(pool)
        .await?;

        let query = format!("{MEMBER_SELECT} WHERE t.id = $1");
        sqlx::query_as::<_, TeamMember>(&query)
            .bind(id)
            .fetch_one(pool)
            .await
    }

    pub async fn list_for_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<TeamMember>, sqlx::Error> {
        let query = format!("{MEMBER_SELECT} WHERE t.project_id = $1 ORDER BY u.name, t.id");
        sqlx::query_as::<_, TeamMember>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    pub async fn is_member(
        pool: &PgPool,
        project_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM project_team WHERE project_id = $1 AND user_id = $2)",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    /// Remove a user from a project team. Returns `true` if a row was removed.
    pub async fn remove(pool: &PgPool, project_id: DbId, user_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM project_team WHERE project_id = $1 AND user_id = $2")
            .bind(project_id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

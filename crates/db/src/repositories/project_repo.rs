//! Repository for the `projects` table.

use sqlx::PgPool;
use studio_core::types::DbId;

use crate::models::project::{CreateProject, Project, ProjectSummary, UpdateProject};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, client, project_type, status, categories, workflow_phase, \
                       selection_confirmed, due_date, created_by, created_at, updated_at";

/// Provides CRUD operations for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new project, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateProject) -> Result<Project, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects (name, client, project_type, categories, due_date, created_by)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(&input.name)
            .bind(&input.client)
            .bind(&input.project_type)
            .bind(&input.categories)
            .bind(input.due_date)
            .bind(input.created_by)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List projects with asset counts, newest first.
    ///
    /// `member_id` restricts the list to projects that user is on the team of.
    pub async fn list_summaries(
        pool: &PgPool,
        status: Option<&str>,
        member_id: Option<DbId>,
    ) -> Result<Vec<ProjectSummary>, sqlx::Error> {
        sqlx::query_as::<_, ProjectSummary>(
            "SELECT p.id, p.name, p.client, p.project_type, p.status, p.workflow_phase,
                    p.due_date,
                    COUNT(a.id) AS asset_count,
                    COUNT(a.id) FILTER (WHERE a.status IN ('approved', 'delivered')) AS approved_count,
                    p.created_at, p.updated_at
             FROM projects p
             LEFT JOIN assets a ON a.project_id = p.id
             WHERE ($1::TEXT IS NULL OR p.status = $1)
               AND ($2::BIGINT IS NULL OR EXISTS (
                    SELECT 1 FROM project_team t WHERE t.project_id = p.id AND t.user_id = $2))
             GROUP BY p.id
             ORDER BY p.created_at DESC, p.id DESC",
        )
        .bind(status)
        .bind(member_id)
        .fetch_all(pool)
        .await
    }

    /// Status of every visible project, for dashboard counts.
    pub async fn list_statuses(
        pool: &PgPool,
        member_id: Option<DbId>,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT p.status FROM projects p
             WHERE $1::BIGINT IS NULL OR EXISTS (
                SELECT 1 FROM project_team t WHERE t.project_id = p.id AND t.user_id = $1)",
        )
        .bind(member_id)
        .fetch_all(pool)
        .await
    }

    /// Update a project. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProject,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET
                name = COALESCE($2, name),
                client = COALESCE($3, client),
                project_type = COALESCE($4, project_type),
                status = COALESCE($5, status),
                due_date = COALESCE($6, due_date)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.client)
            .bind(&input.project_type)
            .bind(&input.status)
            .bind(input.due_date)
            .fetch_optional(pool)
            .await
    }

    /// Replace the category list.
    pub async fn set_categories(
        pool: &PgPool,
        id: DbId,
        categories: &[String],
    ) -> Result<Option<Project>, sqlx::Error> {
        let query =
            format!("UPDATE projects SET categories = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(categories)
            .fetch_optional(pool)
            .await
    }

    pub async fn set_phase(
        pool: &PgPool,
        id: DbId,
        phase: &str,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query =
            format!("UPDATE projects SET workflow_phase = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(phase)
            .fetch_optional(pool)
            .await
    }

    /// Mark the selection confirmed and move an early-phase project to editing.
    pub async fn confirm_selection(pool: &PgPool, id: DbId) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET
                selection_confirmed = true,
                workflow_phase = CASE
                    WHEN workflow_phase IN ('upload', 'selection') THEN 'editing'
                    ELSE workflow_phase
                END
             WHERE id = $1 AND selection_confirmed = false
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Permanently delete a project and, by cascade, everything under it.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

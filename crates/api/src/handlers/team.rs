//! Handlers for project team membership (`/projects/{id}/team`).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;
use studio_core::error::CoreError;
use studio_core::types::DbId;
use studio_db::models::team::{AddTeamMember, TeamMember};
use studio_db::repositories::{ProjectRepo, TeamRepo, UserRepo};
use studio_events::{event_types, StudioEvent};

use crate::error::{AppError, AppResult};
use crate::handlers::project_for_user;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireStaff;
use crate::response::DataResponse;
use crate::state::AppState;

const MAX_ROLE_LABEL_LENGTH: usize = 64;

/// GET /api/v1/projects/{id}/team
pub async fn list_team(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<TeamMember>>>> {
    project_for_user(&state, &auth, project_id).await?;
    let members = TeamRepo::list_for_project(&state.pool, project_id).await?;
    Ok(Json(DataResponse { data: members }))
}

/// POST /api/v1/projects/{id}/team
///
/// Adds a user, or updates their role label when already on the team.
pub async fn add_member(
    State(state): State<AppState>,
    RequireStaff(auth): RequireStaff,
    Path(project_id): Path<DbId>,
    Json(input): Json<AddTeamMember>,
) -> AppResult<(StatusCode, Json<DataResponse<TeamMember>>)> {
    let role_label = input.role_label.trim();
    if role_label.chars().count() > MAX_ROLE_LABEL_LENGTH {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Role label must be at most {MAX_ROLE_LABEL_LENGTH} characters"
        ))));
    }

    let project = ProjectRepo::find_by_id(&state.pool, project_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id: project_id,
        }))?;
    let user = UserRepo::find_by_id(&state.pool, input.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: input.user_id,
        }))?;
    if !user.is_active {
        return Err(AppError::Core(CoreError::Validation(
            "Cannot add a deactivated user to a team".into(),
        )));
    }

    let member = TeamRepo::upsert(&state.pool, project_id, user.id, role_label).await?;

    state.event_bus.publish(
        StudioEvent::new(event_types::TEAM_MEMBER_ADDED)
            .in_project(project_id)
            .with_source("user", user.id)
            .with_actor(auth.user_id, &auth.name)
            .with_payload(json!({
                "project_name": project.name,
                "user_name": user.name,
                "role_label": member.role_label,
            })),
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: member })))
}

/// DELETE /api/v1/projects/{id}/team/{user_id}
pub async fn remove_member(
    State(state): State<AppState>,
    RequireStaff(auth): RequireStaff,
    Path((project_id, user_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    if !TeamRepo::remove(&state.pool, project_id, user_id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "TeamMember",
            id: user_id,
        }));
    }

    state.event_bus.publish(
        StudioEvent::new(event_types::TEAM_MEMBER_REMOVED)
            .in_project(project_id)
            .with_source("user", user_id)
            .with_actor(auth.user_id, &auth.name),
    );

    Ok(StatusCode::NO_CONTENT)
}

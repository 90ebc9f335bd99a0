//! Handlers for the `/projects` resource: CRUD, categories, workflow phase,
//! selection confirmation, activity feed and kanban board.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use studio_core::asset_status::AssetStatus;
use studio_core::error::CoreError;
use studio_core::project::{
    find_category, prepare_category, validate_name, validate_phase_change,
    validate_project_status, validate_selection_confirmation,
};
use studio_core::types::DbId;
use studio_core::views::{build_kanban, AssetCard, KanbanColumn};
use studio_db::models::activity::ActivityEntry;
use studio_db::models::project::{CreateProject, Project, ProjectSummary, UpdateProject};
use studio_db::repositories::{ActivityRepo, AssetRepo, ProjectRepo};
use studio_events::{event_types, StudioEvent};

use crate::error::{AppError, AppResult};
use crate::handlers::{project_for_user, Actor};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireStaff;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct ProjectListQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddCategoryRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct PhaseRequest {
    pub phase: String,
}

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Project",
        id,
    })
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// GET /api/v1/projects
///
/// Staff see every project; other users see the projects they are on.
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<ProjectListQuery>,
) -> AppResult<Json<DataResponse<Vec<ProjectSummary>>>> {
    if let Some(status) = &params.status {
        validate_project_status(status)?;
    }
    let member = (!auth.is_staff()).then_some(auth.user_id);
    let projects = ProjectRepo::list_summaries(&state.pool, params.status.as_deref(), member).await?;
    Ok(Json(DataResponse { data: projects }))
}

/// POST /api/v1/projects
pub async fn create(
    State(state): State<AppState>,
    RequireStaff(auth): RequireStaff,
    Json(mut input): Json<CreateProject>,
) -> AppResult<(StatusCode, Json<DataResponse<Project>>)> {
    validate_name("Project name", &input.name)?;
    input.name = input.name.trim().to_string();
    input.client = input.client.trim().to_string();
    input.project_type = input.project_type.trim().to_string();

    let mut categories: Vec<String> = Vec::with_capacity(input.categories.len());
    for category in &input.categories {
        let category = prepare_category(&categories, category)?;
        categories.push(category);
    }
    input.categories = categories;
    input.created_by = Some(auth.user_id);

    let project = ProjectRepo::create(&state.pool, &input).await?;
    tracing::info!(project_id = project.id, user_id = auth.user_id, "Project created");

    state.event_bus.publish(
        StudioEvent::new(event_types::PROJECT_CREATED)
            .in_project(project.id)
            .with_source("project", project.id)
            .with_actor(auth.user_id, &auth.name)
            .with_payload(json!({ "project_name": project.name })),
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: project })))
}

/// GET /api/v1/projects/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = project_for_user(&state, &auth, id).await?;
    Ok(Json(DataResponse { data: project }))
}

/// PUT /api/v1/projects/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireStaff(auth): RequireStaff,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateProject>,
) -> AppResult<Json<DataResponse<Project>>> {
    if let Some(name) = &input.name {
        validate_name("Project name", name)?;
    }
    if let Some(status) = &input.status {
        validate_project_status(status)?;
    }
    input.name = input.name.map(|n| n.trim().to_string());

    let project = ProjectRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found(id))?;

    state.event_bus.publish(
        StudioEvent::new(event_types::PROJECT_UPDATED)
            .in_project(id)
            .with_source("project", id)
            .with_actor(auth.user_id, &auth.name)
            .with_payload(json!({
                "project_name": project.name,
                "status": project.status,
            })),
    );

    Ok(Json(DataResponse { data: project }))
}

/// DELETE /api/v1/projects/{id}
///
/// Cascades to assets, feedback, share links and the activity log.
pub async fn delete(
    State(state): State<AppState>,
    RequireStaff(auth): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !ProjectRepo::delete(&state.pool, id).await? {
        return Err(not_found(id));
    }
    tracing::info!(project_id = id, user_id = auth.user_id, "Project deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// POST /api/v1/projects/{id}/categories
pub async fn add_category(
    State(state): State<AppState>,
    RequireStaff(auth): RequireStaff,
    Path(id): Path<DbId>,
    Json(input): Json<AddCategoryRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Project>>)> {
    let project = ProjectRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    let category = prepare_category(&project.categories, &input.name)?;
    let mut categories = project.categories;
    categories.push(category.clone());

    let project = ProjectRepo::set_categories(&state.pool, id, &categories)
        .await?
        .ok_or_else(|| not_found(id))?;

    state.event_bus.publish(
        StudioEvent::new(event_types::PROJECT_CATEGORY_ADDED)
            .in_project(id)
            .with_source("project", id)
            .with_actor(auth.user_id, &auth.name)
            .with_payload(json!({ "category": category })),
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: project })))
}

/// DELETE /api/v1/projects/{id}/categories/{name}
///
/// Refused while any asset is still filed under the category.
pub async fn remove_category(
    State(state): State<AppState>,
    RequireStaff(auth): RequireStaff,
    Path((id, name)): Path<(DbId, String)>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = ProjectRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    let stored = find_category(&project.categories, &name)
        .ok_or_else(|| {
            AppError::Core(CoreError::Validation(format!(
                "Category '{}' does not exist on this project",
                name.trim()
            )))
        })?
        .to_string();

    let in_use = AssetRepo::count_in_category(&state.pool, id, &stored).await?;
    if in_use > 0 {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Category '{stored}' still has {in_use} asset(s)"
        ))));
    }

    let categories: Vec<String> = project
        .categories
        .into_iter()
        .filter(|c| c != &stored)
        .collect();
    let project = ProjectRepo::set_categories(&state.pool, id, &categories)
        .await?
        .ok_or_else(|| not_found(id))?;

    state.event_bus.publish(
        StudioEvent::new(event_types::PROJECT_CATEGORY_REMOVED)
            .in_project(id)
            .with_source("project", id)
            .with_actor(auth.user_id, &auth.name)
            .with_payload(json!({ "category": stored })),
    );

    Ok(Json(DataResponse { data: project }))
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

/// PUT /api/v1/projects/{id}/phase
pub async fn set_phase(
    State(state): State<AppState>,
    RequireStaff(auth): RequireStaff,
    Path(id): Path<DbId>,
    Json(input): Json<PhaseRequest>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = ProjectRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    let phase = validate_phase_change(&project.workflow_phase, &input.phase)?;
    if phase.as_str() == project.workflow_phase {
        return Ok(Json(DataResponse { data: project }));
    }

    let updated = ProjectRepo::set_phase(&state.pool, id, phase.as_str())
        .await?
        .ok_or_else(|| not_found(id))?;

    state.event_bus.publish(
        StudioEvent::new(event_types::PROJECT_PHASE_CHANGED)
            .in_project(id)
            .with_source("project", id)
            .with_actor(auth.user_id, &auth.name)
            .with_payload(json!({
                "project_name": updated.name,
                "from": project.workflow_phase,
                "to": updated.workflow_phase,
            })),
    );

    Ok(Json(DataResponse { data: updated }))
}

/// Shared by the staff route and the client share-link route.
pub(crate) async fn confirm_selection_for(
    state: &AppState,
    project: Project,
    actor: &Actor,
) -> AppResult<Project> {
    let selected =
        AssetRepo::count_by_status(&state.pool, project.id, AssetStatus::Selected.as_str()).await?;
    validate_selection_confirmation(&project.workflow_phase, project.selection_confirmed, selected)?;

    let updated = ProjectRepo::confirm_selection(&state.pool, project.id)
        .await?
        .ok_or_else(|| not_found(project.id))?;

    state.event_bus.publish(
        actor
            .stamp(StudioEvent::new(event_types::PROJECT_SELECTION_CONFIRMED))
            .in_project(project.id)
            .with_source("project", project.id)
            .with_payload(json!({
                "project_name": updated.name,
                "client_name": updated.client,
                "selected_count": selected,
            })),
    );

    Ok(updated)
}

/// POST /api/v1/projects/{id}/confirm-selection
pub async fn confirm_selection(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = project_for_user(&state, &auth, id).await?;
    let updated = confirm_selection_for(&state, project, &Actor::from(&auth)).await?;
    Ok(Json(DataResponse { data: updated }))
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// GET /api/v1/projects/{id}/activity
pub async fn activity(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<ActivityEntry>>>> {
    project_for_user(&state, &auth, id).await?;
    let (limit, offset) = params.resolve();
    let entries = ActivityRepo::list_for_project(&state.pool, id, limit, offset).await?;
    Ok(Json(DataResponse { data: entries }))
}

/// GET /api/v1/projects/{id}/kanban
pub async fn kanban(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<KanbanColumn>>>> {
    project_for_user(&state, &auth, id).await?;
    let cards = AssetRepo::list_cards_for_project(&state.pool, id)
        .await?
        .into_iter()
        .map(AssetCard::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(DataResponse {
        data: build_kanban(cards),
    }))
}

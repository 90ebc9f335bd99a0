//! Staff management of share links (`/projects/{id}/share-links`,
//! `/share-links/{id}`).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use studio_core::error::CoreError;
use studio_core::share::{generate_token, share_url, validate_expiry, ShareLinkType};
use studio_core::types::DbId;
use studio_db::models::share_link::{CreateShareLink, ShareLink, UpdateShareLink};
use studio_db::repositories::{ProjectRepo, ShareLinkRepo};
use studio_events::{event_types, StudioEvent};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireStaff;
use crate::response::DataResponse;
use crate::state::AppState;

const MAX_LINK_NAME_LENGTH: usize = 120;

/// A share link plus the public URL it resolves to.
#[derive(Debug, Serialize)]
pub struct ShareLinkResponse {
    #[serde(flatten)]
    pub link: ShareLink,
    pub url: String,
}

impl ShareLinkResponse {
    fn new(link: ShareLink, app_url: &str) -> Self {
        let url = share_url(app_url, &link.token);
        Self { link, url }
    }
}

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "ShareLink",
        id,
    })
}

fn validate_link_name(name: &str) -> Result<(), AppError> {
    if name.trim().chars().count() > MAX_LINK_NAME_LENGTH {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Link name must be at most {MAX_LINK_NAME_LENGTH} characters"
        ))));
    }
    Ok(())
}

/// GET /api/v1/projects/{id}/share-links
pub async fn list_links(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<ShareLinkResponse>>>> {
    let links = ShareLinkRepo::list_for_project(&state.pool, project_id).await?;
    Ok(Json(DataResponse {
        data: links
            .into_iter()
            .map(|l| ShareLinkResponse::new(l, &state.config.app_url))
            .collect(),
    }))
}

/// POST /api/v1/projects/{id}/share-links
pub async fn create_link(
    State(state): State<AppState>,
    RequireStaff(auth): RequireStaff,
    Path(project_id): Path<DbId>,
    Json(mut input): Json<CreateShareLink>,
) -> AppResult<(StatusCode, Json<DataResponse<ShareLinkResponse>>)> {
    let link_type = ShareLinkType::parse(&input.link_type)?;
    validate_expiry(input.expires_at, Utc::now())?;
    validate_link_name(&input.name)?;
    input.name = input.name.trim().to_string();

    let project = ProjectRepo::find_by_id(&state.pool, project_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id: project_id,
        }))?;

    let token = generate_token();
    let link =
        ShareLinkRepo::create(&state.pool, project_id, &token, &input, Some(auth.user_id)).await?;
    let response = ShareLinkResponse::new(link, &state.config.app_url);

    tracing::info!(share_link_id = response.link.id, project_id, link_type = link_type.as_str(), "Share link created");

    state.event_bus.publish(
        StudioEvent::new(event_types::SHARE_LINK_CREATED)
            .in_project(project_id)
            .with_source("share_link", response.link.id)
            .with_actor(auth.user_id, &auth.name)
            .with_payload(json!({
                "project_name": project.name,
                "link_type": link_type.as_str(),
                "name": response.link.name,
                "expires_at": response.link.expires_at,
            })),
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: response })))
}

/// PUT /api/v1/share-links/{id}
pub async fn update_link(
    State(state): State<AppState>,
    RequireStaff(auth): RequireStaff,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateShareLink>,
) -> AppResult<Json<DataResponse<ShareLinkResponse>>> {
    if let Some(name) = &input.name {
        validate_link_name(name)?;
        input.name = Some(name.trim().to_string());
    }
    validate_expiry(input.expires_at, Utc::now())?;

    let before = ShareLinkRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    let link = ShareLinkRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found(id))?;

    if before.is_active && !link.is_active {
        state.event_bus.publish(
            StudioEvent::new(event_types::SHARE_LINK_REVOKED)
                .in_project(link.project_id)
                .with_source("share_link", id)
                .with_actor(auth.user_id, &auth.name)
                .with_payload(json!({ "name": link.name, "link_type": link.link_type })),
        );
    }

    Ok(Json(DataResponse {
        data: ShareLinkResponse::new(link, &state.config.app_url),
    }))
}

/// DELETE /api/v1/share-links/{id}
pub async fn delete_link(
    State(state): State<AppState>,
    RequireStaff(auth): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let link = ShareLinkRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    ShareLinkRepo::delete(&state.pool, id).await?;

    state.event_bus.publish(
        StudioEvent::new(event_types::SHARE_LINK_REVOKED)
            .in_project(link.project_id)
            .with_source("share_link", id)
            .with_actor(auth.user_id, &auth.name)
            .with_payload(json!({ "name": link.name, "link_type": link.link_type, "deleted": true })),
    );

    Ok(StatusCode::NO_CONTENT)
}

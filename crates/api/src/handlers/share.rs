//! Public share-link routes (`/share/{token}`).
//!
//! No login is required; the token is the credential. What a visitor may
//! do depends on the link type: client links comment, select and confirm;
//! editor links comment, move assets between `in-progress` and
//! `review-ready`, and mark feedback done.

use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use studio_core::asset_status::AssetStatus;
use studio_core::error::CoreError;
use studio_core::feedback::validate_author_name;
use studio_core::share::{ShareCapability, ShareLinkType};
use studio_core::types::DbId;
use studio_db::models::asset::{Asset, AssetFilter};
use studio_db::models::feedback::Feedback;
use studio_db::models::project::Project;
use studio_db::models::share_link::ShareLink;
use studio_db::repositories::{AssetRepo, FeedbackRepo, ProjectRepo};

use crate::error::{AppError, AppResult};
use crate::handlers::assets::change_status;
use crate::handlers::feedback::{
    feedback_on_asset, post_feedback, set_feedback_done, CreateFeedbackRequest,
};
use crate::handlers::projects::confirm_selection_for;
use crate::handlers::Actor;
use crate::middleware::share::{resolve_share_link, resolve_with_capability, visitor_label};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// An asset as a share-link visitor sees it. Internal assignment data is omitted.
#[derive(Debug, Serialize)]
pub struct SharedAsset {
    pub id: DbId,
    pub name: String,
    pub asset_type: String,
    pub category: String,
    pub url: Option<String>,
    pub thumbnail: Option<String>,
    pub status: String,
    pub rating: i16,
    pub due_date: Option<NaiveDate>,
    pub current_version: i32,
    pub mux_playback_id: Option<String>,
    pub feedback: Vec<Feedback>,
}

impl SharedAsset {
    fn new(asset: Asset, feedback: Vec<Feedback>) -> Self {
        Self {
            id: asset.id,
            name: asset.name,
            asset_type: asset.asset_type,
            category: asset.category,
            url: asset.url,
            thumbnail: asset.thumbnail,
            status: asset.status,
            rating: asset.rating,
            due_date: asset.due_date,
            current_version: asset.current_version,
            mux_playback_id: asset.mux_playback_id,
            feedback,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SharedProject {
    pub project_name: String,
    pub client: String,
    pub categories: Vec<String>,
    pub workflow_phase: String,
    pub selection_confirmed: bool,
    pub link_type: String,
    pub link_name: String,
    /// Statuses this link may set through `PUT .../status`.
    pub settable_statuses: Vec<AssetStatus>,
    pub assets: Vec<SharedAsset>,
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ShareFeedbackRequest {
    /// Display name typed by the visitor. Falls back to the link name.
    pub author_name: Option<String>,
    pub text: String,
    pub video_timestamp: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct SelectionRequest {
    pub selected: bool,
}

#[derive(Debug, Deserialize)]
pub struct ShareStatusRequest {
    pub status: String,
    pub author_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DoneRequest {
    pub is_done: Option<bool>,
    pub author_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConfirmRequest {
    pub author_name: Option<String>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn link_project(state: &AppState, link: &ShareLink) -> AppResult<Project> {
    ProjectRepo::find_by_id(&state.pool, link.project_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id: link.project_id,
        }))
}

/// An asset reachable through the link, i.e. one in the link's project.
async fn link_asset(state: &AppState, link: &ShareLink, asset_id: DbId) -> AppResult<Asset> {
    AssetRepo::find_in_project(&state.pool, link.project_id, asset_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Asset",
            id: asset_id,
        }))
}

fn visitor(link: &ShareLink, author_name: Option<&str>) -> AppResult<Actor> {
    if let Some(name) = author_name.filter(|n| !n.trim().is_empty()) {
        validate_author_name(name)?;
    }
    Ok(Actor::Visitor {
        label: visitor_label(link, author_name),
    })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/share/{token}
pub async fn view(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Json<DataResponse<SharedProject>>> {
    let link = resolve_share_link(&state, &token).await?;
    let link_type = ShareLinkType::parse(&link.link_type)?;
    let project = link_project(&state, &link).await?;

    let assets = AssetRepo::list_by_project(&state.pool, project.id, &AssetFilter::default()).await?;
    let mut feedback: HashMap<DbId, Vec<Feedback>> = HashMap::new();
    for item in FeedbackRepo::list_for_project(&state.pool, project.id).await? {
        feedback.entry(item.asset_id).or_default().push(item);
    }

    let assets = assets
        .into_iter()
        .map(|asset| {
            let items = feedback.remove(&asset.id).unwrap_or_default();
            SharedAsset::new(asset, items)
        })
        .collect();

    Ok(Json(DataResponse {
        data: SharedProject {
            project_name: project.name,
            client: project.client,
            categories: project.categories,
            workflow_phase: project.workflow_phase,
            selection_confirmed: project.selection_confirmed,
            link_type: link.link_type,
            link_name: link.name,
            settable_statuses: link_type.settable_statuses().to_vec(),
            assets,
        },
    }))
}

/// POST /api/v1/share/{token}/assets/{asset_id}/feedback
pub async fn create_feedback(
    State(state): State<AppState>,
    Path((token, asset_id)): Path<(String, DbId)>,
    Json(input): Json<ShareFeedbackRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Feedback>>)> {
    let (link, _) = resolve_with_capability(&state, &token, ShareCapability::Comment).await?;
    let actor = visitor(&link, input.author_name.as_deref())?;
    let asset = link_asset(&state, &link, asset_id).await?;
    let project = link_project(&state, &link).await?;

    let request = CreateFeedbackRequest {
        text: input.text,
        video_timestamp: input.video_timestamp,
    };
    let feedback = post_feedback(&state, &asset, &project, &request, &actor, Some(link.id)).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: feedback })))
}

/// POST /api/v1/share/{token}/assets/{asset_id}/selection
///
/// Selecting moves an asset to `selected`; unselecting returns it to `pending`.
pub async fn set_selection(
    State(state): State<AppState>,
    Path((token, asset_id)): Path<(String, DbId)>,
    Json(input): Json<SelectionRequest>,
) -> AppResult<Json<DataResponse<SharedAsset>>> {
    let (link, _) = resolve_with_capability(&state, &token, ShareCapability::Select).await?;
    let project = link_project(&state, &link).await?;
    if project.selection_confirmed {
        return Err(AppError::Core(CoreError::Conflict(
            "Selection is already confirmed".into(),
        )));
    }
    let asset = link_asset(&state, &link, asset_id).await?;

    let target = if input.selected {
        AssetStatus::Selected
    } else {
        AssetStatus::Pending
    };
    let actor = visitor(&link, None)?;
    let asset = change_status(&state, asset, &project, target.as_str(), &actor).await?;
    Ok(Json(DataResponse {
        data: SharedAsset::new(asset, Vec::new()),
    }))
}

/// PUT /api/v1/share/{token}/assets/{asset_id}/status
pub async fn set_status(
    State(state): State<AppState>,
    Path((token, asset_id)): Path<(String, DbId)>,
    Json(input): Json<ShareStatusRequest>,
) -> AppResult<Json<DataResponse<SharedAsset>>> {
    let (link, link_type) =
        resolve_with_capability(&state, &token, ShareCapability::UpdateStatus).await?;
    let requested = AssetStatus::parse(&input.status)?;
    if !link_type.settable_statuses().contains(&requested) {
        return Err(AppError::Core(CoreError::Forbidden(format!(
            "A {} link cannot set status '{requested}'",
            link_type.as_str()
        ))));
    }

    let actor = visitor(&link, input.author_name.as_deref())?;
    let asset = link_asset(&state, &link, asset_id).await?;
    let project = link_project(&state, &link).await?;
    let asset = change_status(&state, asset, &project, requested.as_str(), &actor).await?;
    Ok(Json(DataResponse {
        data: SharedAsset::new(asset, Vec::new()),
    }))
}

/// PUT /api/v1/share/{token}/feedback/{fid}/done
///
/// Body is optional; `{"is_done": false}` reopens the item.
pub async fn mark_feedback_done(
    State(state): State<AppState>,
    Path((token, feedback_id)): Path<(String, DbId)>,
    input: Option<Json<DoneRequest>>,
) -> AppResult<Json<DataResponse<Feedback>>> {
    let input = input.map(|Json(i)| i).unwrap_or_default();
    let (link, _) =
        resolve_with_capability(&state, &token, ShareCapability::ResolveFeedback).await?;
    let actor = visitor(&link, input.author_name.as_deref())?;

    let feedback = FeedbackRepo::find_by_id(&state.pool, feedback_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Feedback",
            id: feedback_id,
        }))?;
    let asset = link_asset(&state, &link, feedback.asset_id).await?;
    let feedback = feedback_on_asset(&state, asset.id, feedback_id).await?;
    let project = link_project(&state, &link).await?;

    let updated = set_feedback_done(
        &state,
        &asset,
        &project,
        feedback,
        input.is_done.unwrap_or(true),
        &actor,
    )
    .await?;
    Ok(Json(DataResponse { data: updated }))
}

/// POST /api/v1/share/{token}/confirm-selection
pub async fn confirm_selection(
    State(state): State<AppState>,
    Path(token): Path<String>,
    input: Option<Json<ConfirmRequest>>,
) -> AppResult<Json<DataResponse<SharedProject>>> {
    let input = input.map(|Json(i)| i).unwrap_or_default();
    let (link, link_type) =
        resolve_with_capability(&state, &token, ShareCapability::ConfirmSelection).await?;
    let actor = visitor(&link, input.author_name.as_deref())?;
    let project = link_project(&state, &link).await?;

    let project = confirm_selection_for(&state, project, &actor).await?;
    tracing::info!(project_id = project.id, share_link_id = link.id, "Selection confirmed via share link");

    Ok(Json(DataResponse {
        data: SharedProject {
            project_name: project.name,
            client: project.client,
            categories: project.categories,
            workflow_phase: project.workflow_phase,
            selection_confirmed: project.selection_confirmed,
            link_type: link.link_type,
            link_name: link.name,
            settable_statuses: link_type.settable_statuses().to_vec(),
            assets: Vec::new(),
        },
    }))
}

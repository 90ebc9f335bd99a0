//! Handlers for asset feedback (`/assets/{id}/feedback`).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use studio_core::error::CoreError;
use studio_core::feedback::{extract_mentions, validate_feedback};
use studio_core::types::DbId;
use studio_db::models::asset::Asset;
use studio_db::models::feedback::{CreateFeedback, Feedback, UpdateFeedback};
use studio_db::models::project::Project;
use studio_db::repositories::FeedbackRepo;
use studio_events::event_types;

use crate::error::{AppError, AppResult};
use crate::handlers::assets::asset_event;
use crate::handlers::{asset_for_user, Actor};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateFeedbackRequest {
    pub text: String,
    pub video_timestamp: Option<f64>,
}

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Feedback",
        id,
    })
}

/// Load a feedback item, checking it belongs to `asset_id`.
pub(crate) async fn feedback_on_asset(
    state: &AppState,
    asset_id: DbId,
    feedback_id: DbId,
) -> AppResult<Feedback> {
    FeedbackRepo::find_by_id(&state.pool, feedback_id)
        .await?
        .filter(|f| f.asset_id == asset_id)
        .ok_or_else(|| not_found(feedback_id))
}

/// Validate, store and publish a new feedback item.
pub(crate) async fn post_feedback(
    state: &AppState,
    asset: &Asset,
    project: &Project,
    input: &CreateFeedbackRequest,
    actor: &Actor,
    share_link_id: Option<DbId>,
) -> AppResult<Feedback> {
    validate_feedback(&input.text, input.video_timestamp)?;
    let text = input.text.trim().to_string();
    let mentions = extract_mentions(&text);

    let feedback = FeedbackRepo::create(
        &state.pool,
        &CreateFeedback {
            asset_id: asset.id,
            text,
            author_name: actor.label().to_string(),
            author_user_id: actor.user_id(),
            share_link_id,
            video_timestamp: input.video_timestamp,
            mentions,
        },
    )
    .await?;

    state.event_bus.publish(asset_event(
        event_types::FEEDBACK_CREATED,
        asset,
        project,
        actor,
        json!({
            "feedback_id": feedback.id,
            "author_name": feedback.author_name,
            "text": feedback.text,
            "mentions": feedback.mentions,
            "video_timestamp": feedback.video_timestamp,
        }),
    ));

    Ok(feedback)
}

/// Mark a feedback item done or open again, publishing when resolved.
pub(crate) async fn set_feedback_done(
    state: &AppState,
    asset: &Asset,
    project: &Project,
    feedback: Feedback,
    is_done: bool,
    actor: &Actor,
) -> AppResult<Feedback> {
    if feedback.is_done == is_done {
        return Ok(feedback);
    }
    let updated = FeedbackRepo::set_done(&state.pool, feedback.id, is_done)
        .await?
        .ok_or_else(|| not_found(feedback.id))?;
    if is_done {
        state.event_bus.publish(asset_event(
            event_types::FEEDBACK_RESOLVED,
            asset,
            project,
            actor,
            json!({ "feedback_id": updated.id }),
        ));
    }
    Ok(updated)
}

/// GET /api/v1/assets/{id}/feedback
pub async fn list_feedback(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(asset_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Feedback>>>> {
    asset_for_user(&state, &auth, asset_id).await?;
    let items = FeedbackRepo::list_for_asset(&state.pool, asset_id).await?;
    Ok(Json(DataResponse { data: items }))
}

/// POST /api/v1/assets/{id}/feedback
pub async fn create_feedback(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(asset_id): Path<DbId>,
    Json(input): Json<CreateFeedbackRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Feedback>>)> {
    let (asset, project) = asset_for_user(&state, &auth, asset_id).await?;
    let feedback = post_feedback(&state, &asset, &project, &input, &Actor::from(&auth), None).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: feedback })))
}

/// PUT /api/v1/assets/{id}/feedback/{fid}
///
/// Any team member may toggle `is_done`; only the author or staff may
/// edit the text.
pub async fn update_feedback(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((asset_id, feedback_id)): Path<(DbId, DbId)>,
    Json(input): Json<UpdateFeedback>,
) -> AppResult<Json<DataResponse<Feedback>>> {
    let (asset, project) = asset_for_user(&state, &auth, asset_id).await?;
    let existing = feedback_on_asset(&state, asset_id, feedback_id).await?;
    let actor = Actor::from(&auth);

    let Some(text) = &input.text else {
        let feedback = match input.is_done {
            Some(done) => set_feedback_done(&state, &asset, &project, existing, done, &actor).await?,
            None => existing,
        };
        return Ok(Json(DataResponse { data: feedback }));
    };

    if !auth.is_staff() && existing.author_user_id != Some(auth.user_id) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the author can edit this feedback".into(),
        )));
    }
    validate_feedback(text, existing.video_timestamp)?;
    let text = text.trim().to_string();
    let mentions = extract_mentions(&text);
    let update = UpdateFeedback {
        text: Some(text),
        is_done: input.is_done,
    };

    let feedback = FeedbackRepo::update(&state.pool, feedback_id, &update, Some(&mentions))
        .await?
        .ok_or_else(|| not_found(feedback_id))?;

    if input.is_done == Some(true) && !existing.is_done {
        state.event_bus.publish(asset_event(
            event_types::FEEDBACK_RESOLVED,
            &asset,
            &project,
            &actor,
            json!({ "feedback_id": feedback.id }),
        ));
    }

    Ok(Json(DataResponse { data: feedback }))
}

/// DELETE /api/v1/assets/{id}/feedback/{fid}
pub async fn delete_feedback(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((asset_id, feedback_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    asset_for_user(&state, &auth, asset_id).await?;
    let existing = feedback_on_asset(&state, asset_id, feedback_id).await?;
    if !auth.is_staff() && existing.author_user_id != Some(auth.user_id) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the author can delete this feedback".into(),
        )));
    }
    FeedbackRepo::delete(&state.pool, feedback_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

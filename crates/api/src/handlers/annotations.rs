//! Handlers for an asset's drawn annotations (`/assets/{id}/annotations`).
//!
//! The whole set is saved at once; a save replaces whatever was stored.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use studio_core::annotation::{summarize, validate_annotations, Annotation, AnnotationSummary};
use studio_core::types::{DbId, Timestamp};
use studio_db::repositories::AnnotationRepo;
use studio_events::event_types;

use crate::error::{AppError, AppResult};
use crate::handlers::assets::asset_event;
use crate::handlers::{asset_for_user, Actor};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SaveAnnotationsRequest {
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Serialize)]
pub struct AnnotationsResponse {
    pub asset_id: DbId,
    pub annotations: Vec<Annotation>,
    pub summary: AnnotationSummary,
    pub updated_by: Option<DbId>,
    pub updated_at: Option<Timestamp>,
}

fn decode(value: serde_json::Value) -> AppResult<Vec<Annotation>> {
    serde_json::from_value(value)
        .map_err(|e| AppError::InternalError(format!("Stored annotations are malformed: {e}")))
}

/// GET /api/v1/assets/{id}/annotations
///
/// An asset that was never annotated returns an empty set.
pub async fn get_annotations(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(asset_id): Path<DbId>,
) -> AppResult<Json<DataResponse<AnnotationsResponse>>> {
    asset_for_user(&state, &auth, asset_id).await?;

    let response = match AnnotationRepo::find_for_asset(&state.pool, asset_id).await? {
        Some(set) => {
            let annotations = decode(set.annotations)?;
            AnnotationsResponse {
                asset_id,
                summary: summarize(&annotations),
                annotations,
                updated_by: set.updated_by,
                updated_at: Some(set.updated_at),
            }
        }
        None => AnnotationsResponse {
            asset_id,
            annotations: Vec::new(),
            summary: AnnotationSummary::default(),
            updated_by: None,
            updated_at: None,
        },
    };
    Ok(Json(DataResponse { data: response }))
}

/// PUT /api/v1/assets/{id}/annotations
pub async fn save_annotations(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(asset_id): Path<DbId>,
    Json(input): Json<SaveAnnotationsRequest>,
) -> AppResult<Json<DataResponse<AnnotationsResponse>>> {
    let (asset, project) = asset_for_user(&state, &auth, asset_id).await?;
    validate_annotations(&input.annotations)?;

    let value = serde_json::to_value(&input.annotations)
        .map_err(|e| AppError::InternalError(format!("Failed to encode annotations: {e}")))?;
    let set = AnnotationRepo::upsert(&state.pool, asset_id, &value, Some(auth.user_id)).await?;

    let summary = summarize(&input.annotations);
    tracing::debug!(asset_id, total = summary.total, "Annotations saved");

    state.event_bus.publish(asset_event(
        event_types::ANNOTATIONS_SAVED,
        &asset,
        &project,
        &Actor::from(&auth),
        json!({ "count": summary.total }),
    ));

    Ok(Json(DataResponse {
        data: AnnotationsResponse {
            asset_id,
            annotations: input.annotations,
            summary,
            updated_by: set.updated_by,
            updated_at: Some(set.updated_at),
        },
    }))
}

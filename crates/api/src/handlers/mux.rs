//! Mux direct uploads, status polling and the webhook receiver.
//!
//! The studio asset id travels to Mux as the upload's `passthrough`, so
//! webhook deliveries can be matched back even before `mux_asset_id` is
//! stored.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use studio_core::asset::AssetType;
use studio_core::asset::validate_asset_name;
use studio_core::error::CoreError;
use studio_core::project::require_category;
use studio_core::types::DbId;
use studio_db::models::asset::{Asset, CreateAsset, MuxAssetUpdate};
use studio_db::repositories::AssetRepo;
use studio_events::{event_types, StudioEvent};
use studio_media::mux::webhook::{verify_signature, WebhookAction, WebhookEvent, SIGNATURE_HEADER};
use studio_media::mux::{playback_url, thumbnail_url, DirectUpload, MuxAsset};
use studio_media::VideoPipeline;

use crate::error::{AppError, AppResult};
use crate::handlers::assets::asset_event;
use crate::handlers::{asset_for_user, project_for_user, Actor};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Actor label for changes made by webhook deliveries.
const MUX_ACTOR: &str = "Mux";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Either an existing asset, or the project/category/name of a new video asset.
#[derive(Debug, Deserialize)]
pub struct CreateUploadRequest {
    pub asset_id: Option<DbId>,
    pub project_id: Option<DbId>,
    pub category: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateUploadResponse {
    pub upload_id: String,
    pub upload_url: String,
    pub asset_id: DbId,
}

#[derive(Debug, Serialize)]
pub struct UploadStatusResponse {
    pub upload: DirectUpload,
    /// The studio asset after any Mux state was copied onto it.
    pub asset: Asset,
}

#[derive(Debug, Serialize)]
pub struct MuxStatusResponse {
    pub asset_id: DbId,
    pub mux_asset_id: Option<String>,
    pub status: String,
    pub playback_id: Option<String>,
    pub playback_url: Option<String>,
    pub duration: Option<f64>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn pipeline(state: &AppState) -> AppResult<&dyn VideoPipeline> {
    state
        .video
        .as_deref()
        .ok_or_else(|| AppError::Unavailable("Mux is not configured".into()))
}

/// Studio fields for a Mux asset. Playback URLs are only set once a public
/// playback id exists.
pub(crate) fn mux_update(mux_asset: &MuxAsset) -> MuxAssetUpdate {
    let playback = mux_asset.public_playback_id();
    MuxAssetUpdate {
        mux_asset_id: Some(mux_asset.id.clone()),
        mux_playback_id: playback.map(str::to_string),
        mux_status: mux_asset.status.clone(),
        url: playback.map(playback_url),
        thumbnail: playback.map(thumbnail_url),
    }
}

/// Studio status for an upload that ended without producing an asset.
/// Statuses that still expect an asset leave the studio row alone.
fn upload_mux_status(status: &str) -> Option<&'static str> {
    match status {
        "errored" => Some("errored"),
        "cancelled" => Some("cancelled"),
        "timed_out" => Some("timed_out"),
        _ => None,
    }
}

async fn apply_update(
    state: &AppState,
    asset: &Asset,
    update: &MuxAssetUpdate,
) -> AppResult<Asset> {
    AssetRepo::apply_mux_update(&state.pool, asset.id, update)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Asset",
            id: asset.id,
        }))
}

/// Find the studio asset a webhook refers to: passthrough id first, then
/// the Mux asset id, then the upload id.
async fn locate_asset(
    state: &AppState,
    passthrough: Option<&str>,
    mux_asset_id: Option<&str>,
    upload_id: Option<&str>,
) -> AppResult<Option<Asset>> {
    if let Some(id) = passthrough.and_then(|p| p.parse::<DbId>().ok()) {
        if let Some(asset) = AssetRepo::find_by_id(&state.pool, id).await? {
            return Ok(Some(asset));
        }
    }
    if let Some(mux_id) = mux_asset_id {
        if let Some(asset) = AssetRepo::find_by_mux_asset_id(&state.pool, mux_id).await? {
            return Ok(Some(asset));
        }
    }
    if let Some(upload_id) = upload_id {
        return Ok(AssetRepo::find_by_mux_upload_id(&state.pool, upload_id).await?);
    }
    Ok(None)
}

fn mux_event(event_type: &str, asset: &Asset, extra: serde_json::Value) -> StudioEvent {
    let mut payload = json!({
        "asset_id": asset.id,
        "asset_name": asset.name,
        "mux_asset_id": asset.mux_asset_id,
        "mux_status": asset.mux_status,
    });
    if let (Some(base), serde_json::Value::Object(extra)) = (payload.as_object_mut(), extra) {
        base.extend(extra);
    }
    StudioEvent::new(event_type)
        .in_project(asset.project_id)
        .with_source("asset", asset.id)
        .with_actor_label(MUX_ACTOR)
        .with_payload(payload)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/mux/upload
pub async fn create_upload(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreateUploadRequest>,
) -> AppResult<(StatusCode, Json<CreateUploadResponse>)> {
    let video = pipeline(&state)?;

    let asset = match (input.asset_id, input.project_id) {
        (Some(asset_id), _) => asset_for_user(&state, &auth, asset_id).await?.0,
        (None, Some(project_id)) => {
            let project = project_for_user(&state, &auth, project_id).await?;
            let category = input
                .category
                .as_deref()
                .ok_or_else(|| AppError::BadRequest("'category' is required".into()))?;
            let category = require_category(&project.categories, category)?.to_string();
            let name = input
                .name
                .as_deref()
                .ok_or_else(|| AppError::BadRequest("'name' is required".into()))?;
            validate_asset_name(name)?;

            let asset = AssetRepo::create(
                &state.pool,
                &CreateAsset {
                    project_id,
                    name: name.trim().to_string(),
                    asset_type: AssetType::Video.as_str().to_string(),
                    category,
                    uploaded_by: Some(auth.user_id),
                    ..Default::default()
                },
            )
            .await?;
            state.event_bus.publish(asset_event(
                event_types::ASSET_CREATED,
                &asset,
                &project,
                &Actor::from(&auth),
                json!({ "asset_type": asset.asset_type, "via": "mux" }),
            ));
            asset
        }
        (None, None) => {
            return Err(AppError::BadRequest(
                "Provide 'asset_id' or 'project_id' with 'category' and 'name'".into(),
            ))
        }
    };

    let passthrough = asset.id.to_string();
    let upload = video
        .create_direct_upload(&state.config.app_url, Some(&passthrough))
        .await?;
    let upload_url = upload
        .url
        .clone()
        .ok_or_else(|| AppError::Upstream("Mux upload has no URL".into()))?;

    AssetRepo::set_mux_upload(&state.pool, asset.id, &upload.id).await?;
    tracing::info!(asset_id = asset.id, upload_id = %upload.id, "Mux direct upload created");

    Ok((
        StatusCode::CREATED,
        Json(CreateUploadResponse {
            upload_id: upload.id,
            upload_url,
            asset_id: asset.id,
        }),
    ))
}

/// GET /api/v1/mux/upload/{upload_id}
///
/// Poll an upload. Once Mux has created the asset and it has a public
/// playback id, the playback URL and thumbnail are copied onto the studio
/// asset.
pub async fn get_upload(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(upload_id): Path<String>,
) -> AppResult<Json<DataResponse<UploadStatusResponse>>> {
    let video = pipeline(&state)?;

    let asset = AssetRepo::find_by_mux_upload_id(&state.pool, &upload_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No asset for Mux upload '{upload_id}'")))?;
    let (mut asset, _) = asset_for_user(&state, &auth, asset.id).await?;

    let upload = video.get_upload(&upload_id).await?;
    if let Some(mux_asset_id) = &upload.asset_id {
        let mux_asset = video.get_asset(mux_asset_id).await?;
        if mux_asset.public_playback_id().is_some() || asset.mux_asset_id.is_none() {
            asset = apply_update(&state, &asset, &mux_update(&mux_asset)).await?;
        }
    } else if let Some(status) = upload_mux_status(&upload.status) {
        if asset.mux_status.as_deref() != Some(status) {
            let update = MuxAssetUpdate {
                mux_status: status.to_string(),
                ..Default::default()
            };
            asset = apply_update(&state, &asset, &update).await?;
        }
    }

    Ok(Json(DataResponse {
        data: UploadStatusResponse { upload, asset },
    }))
}

/// GET /api/v1/mux/assets/{asset_id}
///
/// Mux state for a studio asset, refreshed from Mux when it has an asset id.
pub async fn get_asset_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(asset_id): Path<DbId>,
) -> AppResult<Json<DataResponse<MuxStatusResponse>>> {
    let video = pipeline(&state)?;
    let (asset, _) = asset_for_user(&state, &auth, asset_id).await?;

    let Some(mux_asset_id) = asset.mux_asset_id.clone() else {
        return Ok(Json(DataResponse {
            data: MuxStatusResponse {
                asset_id,
                mux_asset_id: None,
                status: asset.mux_status.unwrap_or_else(|| "none".to_string()),
                playback_id: None,
                playback_url: None,
                duration: None,
            },
        }));
    };

    let mux_asset = video.get_asset(&mux_asset_id).await?;
    let asset = apply_update(&state, &asset, &mux_update(&mux_asset)).await?;

    Ok(Json(DataResponse {
        data: MuxStatusResponse {
            asset_id,
            mux_asset_id: Some(mux_asset.id.clone()),
            status: mux_asset.status.clone(),
            playback_url: asset.mux_playback_id.as_deref().map(playback_url),
            playback_id: asset.mux_playback_id,
            duration: mux_asset.duration,
        },
    }))
}

/// POST /api/v1/mux/webhook
///
/// Verifies `mux-signature` when a signing secret is configured. Every
/// well-formed delivery is acknowledged, including ones for unknown assets.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<serde_json::Value>> {
    match &state.config.mux_webhook_secret {
        Some(secret) => {
            let header = headers
                .get(SIGNATURE_HEADER)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| {
                    AppError::Core(CoreError::Unauthorized(format!(
                        "Missing {SIGNATURE_HEADER} header"
                    )))
                })?;
            verify_signature(header, &body, secret, chrono::Utc::now().timestamp())?;
        }
        None => {
            tracing::warn!("MUX_WEBHOOK_SECRET is not set, accepting unsigned Mux webhook");
        }
    }

    let event = WebhookEvent::parse(&body)?;
    let action = event.action();
    tracing::info!(event_type = %event.event_type, event_id = ?event.id, "Mux webhook received");

    match action {
        WebhookAction::UploadAssetCreated { upload_id, asset_id } => {
            match AssetRepo::find_by_mux_upload_id(&state.pool, &upload_id).await? {
                Some(asset) => {
                    let update = MuxAssetUpdate {
                        mux_asset_id: Some(asset_id),
                        mux_status: "preparing".to_string(),
                        ..Default::default()
                    };
                    apply_update(&state, &asset, &update).await?;
                }
                None => tracing::warn!(upload_id = %upload_id, "Mux upload does not match any asset"),
            }
        }
        WebhookAction::AssetReady {
            asset_id,
            upload_id,
            passthrough,
            playback_id,
            duration,
        } => {
            let found = locate_asset(
                &state,
                passthrough.as_deref(),
                Some(&asset_id),
                upload_id.as_deref(),
            )
            .await?;
            match found {
                Some(asset) => {
                    let update = MuxAssetUpdate {
                        mux_asset_id: Some(asset_id),
                        mux_playback_id: playback_id.clone(),
                        mux_status: "ready".to_string(),
                        url: playback_id.as_deref().map(playback_url),
                        thumbnail: playback_id.as_deref().map(thumbnail_url),
                    };
                    let asset = apply_update(&state, &asset, &update).await?;
                    state.event_bus.publish(mux_event(
                        event_types::MUX_ASSET_READY,
                        &asset,
                        json!({ "duration": duration, "playback_id": playback_id }),
                    ));
                }
                None => tracing::warn!(mux_asset_id = %asset_id, "Ready Mux asset does not match any asset"),
            }
        }
        WebhookAction::AssetErrored {
            asset_id,
            upload_id,
            passthrough,
            message,
        } => {
            let found = locate_asset(
                &state,
                passthrough.as_deref(),
                Some(&asset_id),
                upload_id.as_deref(),
            )
            .await?;
            match found {
                Some(asset) => {
                    let update = MuxAssetUpdate {
                        mux_asset_id: Some(asset_id),
                        mux_status: "errored".to_string(),
                        ..Default::default()
                    };
                    let asset = apply_update(&state, &asset, &update).await?;
                    tracing::warn!(asset_id = asset.id, error = ?message, "Mux asset errored");
                    state.event_bus.publish(mux_event(
                        event_types::MUX_ASSET_ERRORED,
                        &asset,
                        json!({ "message": message }),
                    ));
                }
                None => tracing::warn!(mux_asset_id = %asset_id, "Errored Mux asset does not match any asset"),
            }
        }
        WebhookAction::UploadCancelled { upload_id } => {
            if let Some(asset) = AssetRepo::find_by_mux_upload_id(&state.pool, &upload_id).await? {
                let update = MuxAssetUpdate {
                    mux_status: "cancelled".to_string(),
                    ..Default::default()
                };
                apply_update(&state, &asset, &update).await?;
            }
        }
        WebhookAction::Ignored(event_type) => {
            tracing::debug!(event_type = %event_type, "Ignoring Mux webhook");
        }
    }

    Ok(Json(json!({ "received": true })))
}

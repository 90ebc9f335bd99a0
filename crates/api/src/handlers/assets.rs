//! Handlers for assets: listing, creation (JSON or multipart upload),
//! metadata edits, status workflow, assignment and version history.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use studio_core::asset::{
    normalize_tags, storage_path, validate_asset_name, validate_rating, AssetType,
};
use studio_core::asset_status::{
    status_after_assignment, status_after_new_version, validate_transition, AssetStatus,
};
use studio_core::error::CoreError;
use studio_core::project::require_category;
use studio_core::types::DbId;
use studio_db::models::asset::{Asset, AssetFilter, CreateAsset, UpdateAsset};
use studio_db::models::asset_version::{AssetVersion, CreateAssetVersion};
use studio_db::models::project::Project;
use studio_db::repositories::{AssetRepo, AssetVersionRepo, TeamRepo, UserRepo};
use studio_events::{event_types, StudioEvent};

use crate::error::{AppError, AppResult};
use crate::handlers::{asset_for_user, project_for_user, Actor};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireStaff;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateAssetRequest {
    pub name: String,
    pub category: String,
    /// Detected from `mime_type`/`url` when omitted.
    pub asset_type: Option<String>,
    pub url: Option<String>,
    pub thumbnail: Option<String>,
    pub mime_type: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct AssigneeRequest {
    /// `null` clears the assignment.
    pub user_id: Option<DbId>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "Asset", id })
}

/// Event payload shared by every asset event, merged with `extra`.
pub(crate) fn asset_payload(asset: &Asset, project: &Project, extra: Value) -> Value {
    let mut payload = json!({
        "asset_id": asset.id,
        "asset_name": asset.name,
        "project_name": project.name,
        "category": asset.category,
    });
    if let (Some(base), Value::Object(extra)) = (payload.as_object_mut(), extra) {
        base.extend(extra);
    }
    payload
}

pub(crate) fn asset_event(
    event_type: &str,
    asset: &Asset,
    project: &Project,
    actor: &Actor,
    extra: Value,
) -> StudioEvent {
    actor
        .stamp(StudioEvent::new(event_type))
        .in_project(project.id)
        .with_source("asset", asset.id)
        .with_payload(asset_payload(asset, project, extra))
}

/// A file and the text fields sent with it in a multipart form.
#[derive(Debug, Default)]
pub(crate) struct UploadForm {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub file: Option<Bytes>,
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    pub(crate) async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = UploadForm::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {e}")))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == "file" {
                form.file_name = field.file_name().map(str::to_string);
                form.content_type = field.content_type().map(str::to_string);
                form.file = Some(field.bytes().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read uploaded file: {e}"))
                })?);
            } else {
                let value = field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("Invalid multipart field '{name}': {e}"))
                })?;
                form.fields.insert(name, value);
            }
        }
        Ok(form)
    }

    pub(crate) fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

/// Apply a status change on behalf of `actor` and publish it.
///
/// Setting the current status again is a successful no-op.
pub(crate) async fn change_status(
    state: &AppState,
    asset: Asset,
    project: &Project,
    requested: &str,
    actor: &Actor,
) -> AppResult<Asset> {
    if AssetStatus::parse(requested)?.as_str() == asset.status {
        return Ok(asset);
    }
    let target = validate_transition(&asset.status, requested)?;

    let updated = AssetRepo::update_status(&state.pool, asset.id, target.as_str())
        .await?
        .ok_or_else(|| not_found(asset.id))?;

    tracing::info!(
        asset_id = asset.id,
        from = %asset.status,
        to = %updated.status,
        actor = actor.label(),
        "Asset status changed"
    );

    let event_type = if matches!(target, AssetStatus::Selected)
        || asset.status == AssetStatus::Selected.as_str()
    {
        event_types::ASSET_SELECTION_CHANGED
    } else {
        event_types::ASSET_STATUS_CHANGED
    };
    state.event_bus.publish(asset_event(
        event_type,
        &updated,
        project,
        actor,
        json!({
            "from": asset.status,
            "to": updated.status,
            "assigned_to": updated.assigned_to,
        }),
    ));

    Ok(updated)
}

async fn store_upload(
    state: &AppState,
    project_id: DbId,
    category: &str,
    file_name: &str,
    bytes: &[u8],
) -> AppResult<studio_media::StoredObject> {
    let key = storage_path(project_id, category, Utc::now().timestamp_millis(), file_name);
    let stored = state.storage.put(&key, bytes).await?;
    tracing::debug!(key = %stored.key, size = stored.size_bytes, "Stored upload");
    Ok(stored)
}

// ---------------------------------------------------------------------------
// Project-scoped handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/projects/{id}/assets
pub async fn list_assets(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<DbId>,
    Query(filter): Query<AssetFilter>,
) -> AppResult<Json<DataResponse<Vec<Asset>>>> {
    project_for_user(&state, &auth, project_id).await?;
    if let Some(status) = &filter.status {
        AssetStatus::parse(status)?;
    }
    let assets = AssetRepo::list_by_project(&state.pool, project_id, &filter).await?;
    Ok(Json(DataResponse { data: assets }))
}

/// POST /api/v1/projects/{id}/assets
///
/// Register an asset whose file already lives elsewhere (a URL).
pub async fn create_asset(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<DbId>,
    Json(input): Json<CreateAssetRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Asset>>)> {
    let project = project_for_user(&state, &auth, project_id).await?;

    validate_asset_name(&input.name)?;
    let category = require_category(&project.categories, &input.category)?.to_string();
    let asset_type = match &input.asset_type {
        Some(t) => AssetType::parse(t)?,
        None => AssetType::detect(
            input.mime_type.as_deref(),
            input.url.as_deref().unwrap_or(&input.name),
        ),
    };
    let tags = normalize_tags(&input.tags)?;

    let asset = AssetRepo::create(
        &state.pool,
        &CreateAsset {
            project_id,
            name: input.name.trim().to_string(),
            asset_type: asset_type.as_str().to_string(),
            category,
            url: input.url,
            thumbnail: input.thumbnail,
            tags,
            due_date: input.due_date,
            mime_type: input.mime_type,
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
        json!({ "asset_type": asset.asset_type }),
    ));

    Ok((StatusCode::CREATED, Json(DataResponse { data: asset })))
}

/// POST /api/v1/projects/{id}/assets/upload
///
/// Multipart form with a `file` part plus `category` and optional `name`,
/// `due_date` (YYYY-MM-DD) and comma-separated `tags`.
pub async fn upload_asset(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<DbId>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<Asset>>)> {
    let project = project_for_user(&state, &auth, project_id).await?;
    let form = UploadForm::read(multipart).await?;

    let bytes = form
        .file
        .as_ref()
        .ok_or_else(|| AppError::BadRequest("Missing 'file' part".into()))?;
    if bytes.is_empty() {
        return Err(AppError::BadRequest("Uploaded file is empty".into()));
    }
    let file_name = form.file_name.clone().unwrap_or_else(|| "upload".to_string());

    let category = require_category(
        &project.categories,
        form.field("category")
            .ok_or_else(|| AppError::BadRequest("Missing 'category' field".into()))?,
    )?
    .to_string();

    let name = form.field("name").unwrap_or(&file_name).to_string();
    validate_asset_name(&name)?;

    let due_date = form
        .field("due_date")
        .map(|d| {
            d.parse::<NaiveDate>()
                .map_err(|_| AppError::BadRequest(format!("Invalid due_date '{d}'")))
        })
        .transpose()?;
    let tags: Vec<String> = form
        .field("tags")
        .map(|t| t.split(',').map(str::to_string).collect())
        .unwrap_or_default();
    let tags = normalize_tags(&tags)?;

    let asset_type = AssetType::detect(form.content_type.as_deref(), &file_name);
    let stored = store_upload(&state, project_id, &category, &file_name, bytes).await?;

    let asset = AssetRepo::create(
        &state.pool,
        &CreateAsset {
            project_id,
            name,
            asset_type: asset_type.as_str().to_string(),
            category,
            url: Some(stored.url.clone()),
            thumbnail: matches!(asset_type, AssetType::Image).then(|| stored.url.clone()),
            storage_path: Some(stored.key.clone()),
            tags,
            due_date,
            file_size_bytes: Some(stored.size_bytes),
            mime_type: form.content_type.clone(),
            uploaded_by: Some(auth.user_id),
            ..Default::default()
        },
    )
    .await?;

    tracing::info!(asset_id = asset.id, project_id, key = %stored.key, "Asset uploaded");

    state.event_bus.publish(asset_event(
        event_types::ASSET_CREATED,
        &asset,
        &project,
        &Actor::from(&auth),
        json!({ "asset_type": asset.asset_type, "uploaded": true }),
    ));

    Ok((StatusCode::CREATED, Json(DataResponse { data: asset })))
}

// ---------------------------------------------------------------------------
// Asset-scoped handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/assets/{id}
pub async fn get_asset(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Asset>>> {
    let (asset, _) = asset_for_user(&state, &auth, id).await?;
    Ok(Json(DataResponse { data: asset }))
}

/// PUT /api/v1/assets/{id}
pub async fn update_asset(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateAsset>,
) -> AppResult<Json<DataResponse<Asset>>> {
    let (_, project) = asset_for_user(&state, &auth, id).await?;

    if let Some(name) = &input.name {
        validate_asset_name(name)?;
        input.name = Some(name.trim().to_string());
    }
    if let Some(category) = &input.category {
        input.category = Some(require_category(&project.categories, category)?.to_string());
    }
    if let Some(rating) = input.rating {
        validate_rating(rating)?;
    }
    if let Some(tags) = &input.tags {
        input.tags = Some(normalize_tags(tags)?);
    }

    let asset = AssetRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found(id))?;

    state.event_bus.publish(asset_event(
        event_types::ASSET_UPDATED,
        &asset,
        &project,
        &Actor::from(&auth),
        json!({}),
    ));

    Ok(Json(DataResponse { data: asset }))
}

/// DELETE /api/v1/assets/{id}
///
/// Removes the row and, for uploaded files, the stored object.
pub async fn delete_asset(
    State(state): State<AppState>,
    RequireStaff(auth): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let (asset, project) = asset_for_user(&state, &auth, id).await?;

    if !AssetRepo::delete(&state.pool, id).await? {
        return Err(not_found(id));
    }
    if let Some(key) = &asset.storage_path {
        if let Err(e) = state.storage.delete(key).await {
            tracing::warn!(error = %e, asset_id = id, key = %key, "Failed to delete stored file");
        }
    }

    state.event_bus.publish(asset_event(
        event_types::ASSET_DELETED,
        &asset,
        &project,
        &Actor::from(&auth),
        json!({}),
    ));

    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/assets/{id}/status
pub async fn set_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<StatusRequest>,
) -> AppResult<Json<DataResponse<Asset>>> {
    let (asset, project) = asset_for_user(&state, &auth, id).await?;
    let asset = change_status(&state, asset, &project, &input.status, &Actor::from(&auth)).await?;
    Ok(Json(DataResponse { data: asset }))
}

/// PUT /api/v1/assets/{id}/assignee
///
/// Assigning a user also puts them on the project team and moves a
/// pending or selected asset to `assigned`.
pub async fn set_assignee(
    State(state): State<AppState>,
    RequireStaff(auth): RequireStaff,
    Path(id): Path<DbId>,
    Json(input): Json<AssigneeRequest>,
) -> AppResult<Json<DataResponse<Asset>>> {
    let (asset, project) = asset_for_user(&state, &auth, id).await?;

    let mut assignee_name: Option<String> = None;
    let mut next_status: Option<AssetStatus> = None;
    if let Some(user_id) = input.user_id {
        let user = UserRepo::find_by_id(&state.pool, user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AppError::Core(CoreError::NotFound {
                entity: "User",
                id: user_id,
            }))?;
        if !TeamRepo::is_member(&state.pool, project.id, user_id).await? {
            TeamRepo::upsert(&state.pool, project.id, user_id, &user.role).await?;
        }
        next_status = status_after_assignment(AssetStatus::parse(&asset.status)?);
        assignee_name = Some(user.name);
    }

    let updated = AssetRepo::set_assignee(
        &state.pool,
        id,
        input.user_id,
        next_status.map(|s| s.as_str()),
    )
    .await?
    .ok_or_else(|| not_found(id))?;

    let actor = Actor::from(&auth);
    state.event_bus.publish(asset_event(
        event_types::ASSET_ASSIGNED,
        &updated,
        &project,
        &actor,
        json!({
            "assigned_to": updated.assigned_to,
            "assignee_name": assignee_name,
            "due_date": updated.due_date,
        }),
    ));
    if updated.status != asset.status {
        state.event_bus.publish(asset_event(
            event_types::ASSET_STATUS_CHANGED,
            &updated,
            &project,
            &actor,
            json!({ "from": asset.status, "to": updated.status, "assigned_to": updated.assigned_to }),
        ));
    }

    Ok(Json(DataResponse { data: updated }))
}

/// GET /api/v1/assets/{id}/versions
pub async fn list_versions(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<AssetVersion>>>> {
    asset_for_user(&state, &auth, id).await?;
    let versions = AssetVersionRepo::list_for_asset(&state.pool, id).await?;
    Ok(Json(DataResponse { data: versions }))
}

/// POST /api/v1/assets/{id}/versions
///
/// Multipart form with either a `file` part or a `url` field, plus
/// optional `notes`. An asset awaiting changes moves to `review-ready`.
pub async fn create_version(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<AssetVersion>>)> {
    let (asset, project) = asset_for_user(&state, &auth, id).await?;
    let form = UploadForm::read(multipart).await?;

    let input = match (&form.file, form.field("url")) {
        (Some(bytes), _) if !bytes.is_empty() => {
            let file_name = form.file_name.as_deref().unwrap_or(&asset.name);
            let stored = store_upload(&state, project.id, &asset.category, file_name, bytes).await?;
            CreateAssetVersion {
                url: stored.url,
                notes: form.field("notes").map(str::to_string),
                storage_path: Some(stored.key),
                file_size_bytes: Some(stored.size_bytes),
            }
        }
        (_, Some(url)) => CreateAssetVersion {
            url: url.to_string(),
            notes: form.field("notes").map(str::to_string),
            storage_path: None,
            file_size_bytes: None,
        },
        _ => {
            return Err(AppError::BadRequest(
                "A version needs a 'file' part or a 'url' field".into(),
            ))
        }
    };

    let version = AssetVersionRepo::create_next(&state.pool, id, &input, Some(auth.user_id)).await?;
    let next_status = status_after_new_version(AssetStatus::parse(&asset.status)?);
    let updated = AssetRepo::set_current_version(
        &state.pool,
        id,
        version.version,
        &version.url,
        next_status.map(|s| s.as_str()),
    )
    .await?
    .ok_or_else(|| not_found(id))?;

    let actor = Actor::from(&auth);
    state.event_bus.publish(asset_event(
        event_types::ASSET_VERSION_UPLOADED,
        &updated,
        &project,
        &actor,
        json!({ "version": version.version, "notes": version.notes }),
    ));
    if updated.status != asset.status {
        state.event_bus.publish(asset_event(
            event_types::ASSET_STATUS_CHANGED,
            &updated,
            &project,
            &actor,
            json!({ "from": asset.status, "to": updated.status, "assigned_to": updated.assigned_to }),
        ));
    }

    Ok((StatusCode::CREATED, Json(DataResponse { data: version })))
}

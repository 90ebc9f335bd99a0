//! Route definitions for the `/assets` resource: detail, workflow status,
//! assignment, versions, feedback and annotations.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, put};
use axum::Router;

use crate::handlers::{annotations, assets, feedback};
use crate::state::AppState;

/// Routes mounted at `/assets`.
///
/// ```text
/// GET    /{id}                    -> get_asset
/// PUT    /{id}                    -> update_asset
/// DELETE /{id}                    -> delete_asset
/// PUT    /{id}/status             -> set_status
/// PUT    /{id}/assignee           -> set_assignee
/// GET    /{id}/versions           -> list_versions
/// POST   /{id}/versions           -> create_version (multipart)
/// GET    /{id}/feedback           -> list_feedback
/// POST   /{id}/feedback           -> create_feedback
/// PUT    /{id}/feedback/{fid}     -> update_feedback
/// DELETE /{id}/feedback/{fid}     -> delete_feedback
/// GET    /{id}/annotations        -> get_annotations
/// PUT    /{id}/annotations        -> save_annotations
/// ```
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/{id}",
            get(assets::get_asset)
                .put(assets::update_asset)
                .delete(assets::delete_asset),
        )
        .route("/{id}/status", put(assets::set_status))
        .route("/{id}/assignee", put(assets::set_assignee))
        .route(
            "/{id}/versions",
            get(assets::list_versions)
                .post(assets::create_version)
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route(
            "/{id}/feedback",
            get(feedback::list_feedback).post(feedback::create_feedback),
        )
        .route(
            "/{id}/feedback/{fid}",
            put(feedback::update_feedback).delete(feedback::delete_feedback),
        )
        .route(
            "/{id}/annotations",
            get(annotations::get_annotations).put(annotations::save_annotations),
        )
}

//! Route definitions for `/mux`. The webhook is unauthenticated and
//! verified by signature instead.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::mux;
use crate::state::AppState;

/// Routes mounted at `/mux`.
///
/// ```text
/// POST   /upload               -> create_upload
/// GET    /upload/{upload_id}   -> get_upload
/// GET    /assets/{asset_id}    -> get_asset_status
/// POST   /webhook              -> webhook
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upload", post(mux::create_upload))
        .route("/upload/{upload_id}", get(mux::get_upload))
        .route("/assets/{asset_id}", get(mux::get_asset_status))
        .route("/webhook", post(mux::webhook))
}

//! Route definitions for the public `/share/{token}` surface.
//!
//! No authentication: the token itself is the credential, and each write
//! checks the link type's capabilities.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::share;
use crate::state::AppState;

/// Routes mounted at `/share`.
///
/// ```text
/// GET    /{token}                                -> view
/// POST   /{token}/assets/{asset_id}/feedback     -> create_feedback
/// POST   /{token}/assets/{asset_id}/selection    -> set_selection
/// PUT    /{token}/assets/{asset_id}/status       -> set_status
/// PUT    /{token}/feedback/{fid}/done            -> mark_feedback_done
/// POST   /{token}/confirm-selection              -> confirm_selection
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{token}", get(share::view))
        .route(
            "/{token}/assets/{asset_id}/feedback",
            post(share::create_feedback),
        )
        .route(
            "/{token}/assets/{asset_id}/selection",
            post(share::set_selection),
        )
        .route("/{token}/assets/{asset_id}/status", put(share::set_status))
        .route("/{token}/feedback/{fid}/done", put(share::mark_feedback_done))
        .route("/{token}/confirm-selection", post(share::confirm_selection))
}

//! Route definitions for the `/notifications` resource.
//!
//! All endpoints require authentication and act on the caller's own
//! notifications.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::notifications;
use crate::state::AppState;

/// Routes mounted at `/notifications`.
///
/// ```text
/// GET    /                 -> list
/// GET    /unread-count     -> unread_count
/// POST   /{id}/read        -> mark_read
/// POST   /read-all         -> mark_all_read
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(notifications::list))
        .route("/read-all", post(notifications::mark_all_read))
        .route("/unread-count", get(notifications::unread_count))
        .route("/{id}/read", post(notifications::mark_read))
}

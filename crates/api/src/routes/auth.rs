//! Route definitions for `/auth`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// GET    /setup-status   -> setup_status (public)
/// POST   /setup          -> setup (public, only while no users exist)
/// POST   /login          -> login (public)
/// POST   /refresh        -> refresh (public)
/// POST   /logout         -> logout
/// GET    /me             -> me
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/setup-status", get(auth::setup_status))
        .route("/setup", post(auth::setup))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

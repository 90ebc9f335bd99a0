pub mod assets;
pub mod auth;
pub mod health;
pub mod mux;
pub mod notifications;
pub mod projects;
pub mod share;
pub mod share_links;
pub mod users;

use axum::routing::{get, post};
use axum::Router;

use crate::config::ServerConfig;
use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/...                       setup, login, refresh, logout, me
/// /users, /users/{id}             user management (staff read, admin write)
/// /projects/...                   projects, categories, phase, team,
///                                 assets, share links, activity, kanban
/// /assets/{id}/...                asset detail, status, assignee,
///                                 versions, feedback, annotations
/// /share-links/{id}               update, delete (staff)
/// /share/{token}/...              public share-link surface
/// /mux/...                        direct uploads, status, webhook
/// /send-email                     templated email (staff)
/// /dashboard, /tasks, /calendar   overview screens
/// /notifications/...              the caller's notifications
/// ```
pub fn api_routes(config: &ServerConfig) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/projects", projects::router(config.max_upload_bytes))
        .nest("/assets", assets::router(config.max_upload_bytes))
        .nest("/share-links", share_links::router())
        // Public share-link access (token is the credential).
        .nest("/share", share::router())
        .nest("/mux", mux::router())
        .route("/send-email", post(handlers::email::send_email))
        .route("/dashboard", get(handlers::views::dashboard))
        .route("/tasks", get(handlers::views::tasks))
        .route("/calendar", get(handlers::views::calendar))
        .nest("/notifications", notifications::router())
}

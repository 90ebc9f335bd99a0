//! Route definitions for the `/projects` resource and everything scoped
//! to a single project.

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::handlers::{assets, projects, share_links, team};
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET    /                               -> list
/// POST   /                               -> create
/// GET    /{id}                           -> get_by_id
/// PUT    /{id}                           -> update
/// DELETE /{id}                           -> delete
///
/// POST   /{id}/categories                -> add_category
/// DELETE /{id}/categories/{name}         -> remove_category
/// PUT    /{id}/phase                     -> set_phase
/// POST   /{id}/confirm-selection         -> confirm_selection
/// GET    /{id}/activity                  -> activity
/// GET    /{id}/kanban                    -> kanban
///
/// GET    /{id}/team                      -> list_team
/// POST   /{id}/team                      -> add_member
/// DELETE /{id}/team/{user_id}            -> remove_member
///
/// GET    /{id}/assets                    -> list_assets
/// POST   /{id}/assets                    -> create_asset
/// POST   /{id}/assets/upload             -> upload_asset (multipart)
///
/// GET    /{id}/share-links               -> list_links
/// POST   /{id}/share-links               -> create_link
/// ```
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(projects::list).post(projects::create))
        .route(
            "/{id}",
            get(projects::get_by_id)
                .put(projects::update)
                .delete(projects::delete),
        )
        .route("/{id}/categories", post(projects::add_category))
        .route("/{id}/categories/{name}", delete(projects::remove_category))
        .route("/{id}/phase", put(projects::set_phase))
        .route("/{id}/confirm-selection", post(projects::confirm_selection))
        .route("/{id}/activity", get(projects::activity))
        .route("/{id}/kanban", get(projects::kanban))
        .route("/{id}/team", get(team::list_team).post(team::add_member))
        .route("/{id}/team/{user_id}", delete(team::remove_member))
        .route(
            "/{id}/assets",
            get(assets::list_assets).post(assets::create_asset),
        )
        .route(
            "/{id}/assets/upload",
            post(assets::upload_asset).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route(
            "/{id}/share-links",
            get(share_links::list_links).post(share_links::create_link),
        )
}

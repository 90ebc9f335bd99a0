//! Route definitions for `/share-links` (staff management of one link).

use axum::routing::put;
use axum::Router;

use crate::handlers::share_links;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/{id}",
        put(share_links::update_link).delete(share_links::delete_link),
    )
}

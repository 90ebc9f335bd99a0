//! HTTP handlers, one module per resource.
//!
//! Staff (admin/producer) may act on every project. Everyone else only
//! reaches projects whose team they belong to; the lookups below enforce
//! that before a handler touches the row.

pub mod annotations;
pub mod assets;
pub mod auth;
pub mod email;
pub mod feedback;
pub mod mux;
pub mod notifications;
pub mod projects;
pub mod share;
pub mod share_links;
pub mod team;
pub mod users;
pub mod views;

use studio_core::error::CoreError;
use studio_core::types::DbId;
use studio_db::models::asset::Asset;
use studio_db::models::project::Project;
use studio_db::repositories::{AssetRepo, ProjectRepo, TeamRepo};
use studio_events::StudioEvent;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Load a project the caller is allowed to see.
pub(crate) async fn project_for_user(
    state: &AppState,
    user: &AuthUser,
    project_id: DbId,
) -> AppResult<Project> {
    let project = ProjectRepo::find_by_id(&state.pool, project_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id: project_id,
        }))?;

    if !user.is_staff() && !TeamRepo::is_member(&state.pool, project_id, user.user_id).await? {
        return Err(AppError::Core(CoreError::Forbidden(
            "You are not a member of this project".into(),
        )));
    }
    Ok(project)
}

/// Load an asset and its project, checking project access.
pub(crate) async fn asset_for_user(
    state: &AppState,
    user: &AuthUser,
    asset_id: DbId,
) -> AppResult<(Asset, Project)> {
    let asset = AssetRepo::find_by_id(&state.pool, asset_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Asset",
            id: asset_id,
        }))?;
    let project = project_for_user(state, user, asset.project_id).await?;
    Ok((asset, project))
}

/// Who performed an action, for event attribution.
#[derive(Debug, Clone)]
pub(crate) enum Actor {
    User { id: DbId, name: String },
    /// A share-link visitor, identified only by a label.
    Visitor { label: String },
}

impl Actor {
    pub(crate) fn stamp(&self, event: StudioEvent) -> StudioEvent {
        match self {
            Actor::User { id, name } => event.with_actor(*id, name.as_str()),
            Actor::Visitor { label } => event.with_actor_label(label.as_str()),
        }
    }

    pub(crate) fn user_id(&self) -> Option<DbId> {
        match self {
            Actor::User { id, .. } => Some(*id),
            Actor::Visitor { .. } => None,
        }
    }

    pub(crate) fn label(&self) -> &str {
        match self {
            Actor::User { name, .. } => name,
            Actor::Visitor { label } => label,
        }
    }
}

impl From<&AuthUser> for Actor {
    fn from(user: &AuthUser) -> Self {
        Actor::User {
            id: user.user_id,
            name: user.name.clone(),
        }
    }
}

//! Cross-project overview screens: dashboard, personal task list and
//! due-date calendar.
//!
//! Staff see every project; everyone else sees the projects they are on
//! plus anything assigned to them.

use axum::extract::{Query, State};
use axum::Json;
use chrono::{Duration, NaiveDate, Utc};
use serde::Deserialize;
use studio_core::error::CoreError;
use studio_core::types::DbId;
use studio_core::views::{build_calendar, dashboard_stats, sort_tasks, AssetCard, CalendarDay, DashboardStats};
use studio_db::models::asset::AssetCardRow;
use studio_db::repositories::{AssetRepo, ProjectRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Calendar window used when `from`/`to` are omitted.
const DEFAULT_CALENDAR_DAYS: i64 = 30;

#[derive(Debug, Default, Deserialize)]
pub struct TasksQuery {
    /// Staff may look at someone else's tasks.
    pub user_id: Option<DbId>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CalendarQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// `None` lifts the membership filter.
fn member_filter(user: &AuthUser) -> Option<DbId> {
    (!user.is_staff()).then_some(user.user_id)
}

fn into_cards(rows: Vec<AssetCardRow>) -> Result<Vec<AssetCard>, CoreError> {
    rows.into_iter().map(AssetCard::try_from).collect()
}

/// GET /api/v1/dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<DashboardStats>>> {
    let member = member_filter(&auth);
    let statuses = ProjectRepo::list_statuses(&state.pool, member).await?;
    let cards = into_cards(AssetRepo::list_cards(&state.pool, member).await?)?;
    let today = Utc::now().date_naive();

    Ok(Json(DataResponse {
        data: dashboard_stats(&statuses, &cards, today),
    }))
}

/// GET /api/v1/tasks
///
/// Assets assigned to the caller (or, for staff, to `?user_id=`), open
/// work first and ordered by due date.
pub async fn tasks(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<TasksQuery>,
) -> AppResult<Json<DataResponse<Vec<AssetCard>>>> {
    let user_id = match params.user_id {
        Some(other) if other != auth.user_id => {
            if !auth.is_staff() {
                return Err(AppError::Core(CoreError::Forbidden(
                    "Only staff can view another user's tasks".into(),
                )));
            }
            other
        }
        _ => auth.user_id,
    };

    let mut cards = into_cards(AssetRepo::list_cards_assigned_to(&state.pool, user_id).await?)?;
    sort_tasks(&mut cards);
    Ok(Json(DataResponse { data: cards }))
}

/// GET /api/v1/calendar?from=YYYY-MM-DD&to=YYYY-MM-DD
pub async fn calendar(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<CalendarQuery>,
) -> AppResult<Json<DataResponse<Vec<CalendarDay>>>> {
    let from = params.from.unwrap_or_else(|| Utc::now().date_naive());
    let to = params
        .to
        .unwrap_or_else(|| from + Duration::days(DEFAULT_CALENDAR_DAYS));

    let cards = into_cards(AssetRepo::list_cards(&state.pool, member_filter(&auth)).await?)?;
    Ok(Json(DataResponse {
        data: build_calendar(cards, from, to)?,
    }))
}

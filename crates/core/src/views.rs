//! Dashboard, task list, kanban and calendar grouping.
//!
//! These functions take already-loaded asset cards so they can be tested
//! without a database. Handlers load the rows and hand them in.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::asset_status::{AssetStatus, WORKFLOW_ORDER};
use crate::error::CoreError;
use crate::project::{PROJECT_STATUS_ACTIVE, PROJECT_STATUS_COMPLETED};
use crate::types::DbId;

/// Longest calendar window that can be requested at once.
pub const MAX_CALENDAR_DAYS: i64 = 366;

/// The subset of an asset the overview screens need.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetCard {
    pub id: DbId,
    pub project_id: DbId,
    pub project_name: String,
    pub name: String,
    pub asset_type: String,
    pub category: String,
    pub status: AssetStatus,
    pub assigned_to: Option<DbId>,
    pub due_date: Option<NaiveDate>,
    pub thumbnail: Option<String>,
}

/// An open asset whose due date has passed.
pub fn is_overdue(card: &AssetCard, today: NaiveDate) -> bool {
    !card.status.is_closed() && card.due_date.is_some_and(|due| due < today)
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_projects: usize,
    pub active_projects: usize,
    pub completed_projects: usize,
    pub total_assets: usize,
    /// Count per status, keyed by the status string.
    pub assets_by_status: BTreeMap<&'static str, usize>,
    pub overdue_assets: usize,
    pub awaiting_review: usize,
}

pub fn dashboard_stats(
    project_statuses: &[String],
    assets: &[AssetCard],
    today: NaiveDate,
) -> DashboardStats {
    let mut assets_by_status: BTreeMap<&'static str, usize> =
        WORKFLOW_ORDER.iter().map(|s| (s.as_str(), 0)).collect();
    for card in assets {
        *assets_by_status.entry(card.status.as_str()).or_default() += 1;
    }

    DashboardStats {
        total_projects: project_statuses.len(),
        active_projects: project_statuses
            .iter()
            .filter(|s| s.as_str() == PROJECT_STATUS_ACTIVE)
            .count(),
        completed_projects: project_statuses
            .iter()
            .filter(|s| s.as_str() == PROJECT_STATUS_COMPLETED)
            .count(),
        total_assets: assets.len(),
        overdue_assets: assets.iter().filter(|a| is_overdue(a, today)).count(),
        awaiting_review: assets
            .iter()
            .filter(|a| a.status == AssetStatus::ReviewReady)
            .count(),
        assets_by_status,
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Order a task list: open work first, then by due date (undated last), then name.
pub fn sort_tasks(tasks: &mut [AssetCard]) {
    tasks.sort_by(|a, b| {
        a.status
            .is_closed()
            .cmp(&b.status.is_closed())
            .then_with(|| match (a.due_date, b.due_date) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            })
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
}

// ---------------------------------------------------------------------------
// Kanban
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KanbanColumn {
    pub status: AssetStatus,
    pub assets: Vec<AssetCard>,
}

/// One column per status in workflow order, including empty columns.
pub fn build_kanban(assets: Vec<AssetCard>) -> Vec<KanbanColumn> {
    let mut columns: Vec<KanbanColumn> = WORKFLOW_ORDER
        .iter()
        .map(|status| KanbanColumn {
            status: *status,
            assets: Vec::new(),
        })
        .collect();
    for card in assets {
        if let Some(col) = columns.iter_mut().find(|c| c.status == card.status) {
            col.assets.push(card);
        }
    }
    columns
}

// ---------------------------------------------------------------------------
// Calendar
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub assets: Vec<AssetCard>,
}

pub fn validate_calendar_range(from: NaiveDate, to: NaiveDate) -> Result<(), CoreError> {
    if to < from {
        return Err(CoreError::Validation(
            "Calendar 'to' date must not be before 'from'".into(),
        ));
    }
    if (to - from).num_days() >= MAX_CALENDAR_DAYS {
        return Err(CoreError::Validation(format!(
            "Calendar range must be shorter than {MAX_CALENDAR_DAYS} days"
        )));
    }
    Ok(())
}

/// Group dated assets inside `[from, to]` by day. Days without assets are omitted.
pub fn build_calendar(
    assets: Vec<AssetCard>,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<CalendarDay>, CoreError> {
    validate_calendar_range(from, to)?;

    let mut days: BTreeMap<NaiveDate, Vec<AssetCard>> = BTreeMap::new();
    for card in assets {
        match card.due_date {
            Some(due) if due >= from && due <= to => days.entry(due).or_default().push(card),
            _ => {}
        }
    }

    Ok(days
        .into_iter()
        .map(|(date, mut assets)| {
            assets.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
            CalendarDay { date, assets }
        })
        .collect())
}

//! Asset review status values and the allowed transition graph.
//!
//! Status strings are stored verbatim in `assets.status` and must match the
//! `ck_assets_status` check constraint.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Lifecycle status of a single asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetStatus {
    Pending,
    Assigned,
    InProgress,
    ReviewReady,
    ChangesRequested,
    Selected,
    Approved,
    Delivered,
}

/// Every status, in the order kanban columns are displayed.
pub const WORKFLOW_ORDER: [AssetStatus; 8] = [
    AssetStatus::Pending,
    AssetStatus::Selected,
    AssetStatus::Assigned,
    AssetStatus::InProgress,
    AssetStatus::ReviewReady,
    AssetStatus::ChangesRequested,
    AssetStatus::Approved,
    AssetStatus::Delivered,
];

impl AssetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Assigned => "assigned",
            Self::InProgress => "in-progress",
            Self::ReviewReady => "review-ready",
            Self::ChangesRequested => "changes-requested",
            Self::Selected => "selected",
            Self::Approved => "approved",
            Self::Delivered => "delivered",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        WORKFLOW_ORDER
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = WORKFLOW_ORDER.iter().map(AssetStatus::as_str).collect();
                CoreError::Validation(format!(
                    "Invalid asset status '{s}'. Must be one of: {}",
                    valid.join(", ")
                ))
            })
    }

    /// Statuses reachable in one step from `self`.
    pub fn allowed_next(&self) -> &'static [AssetStatus] {
        use AssetStatus::*;
        match self {
            Pending => &[Assigned, Selected, Approved],
            Assigned => &[Pending, InProgress],
            InProgress => &[Assigned, ReviewReady],
            ReviewReady => &[ChangesRequested, Approved, Selected],
            ChangesRequested => &[InProgress, ReviewReady],
            Selected => &[Pending, Assigned, Approved],
            Approved => &[ChangesRequested, Delivered],
            Delivered => &[Approved],
        }
    }

    pub fn can_transition_to(&self, next: AssetStatus) -> bool {
        *self == next || self.allowed_next().contains(&next)
    }

    /// Work on the asset is finished from the studio's point of view.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Approved | Self::Delivered)
    }
}

impl std::fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check a requested status change, returning the parsed target status.
pub fn validate_transition(current: &str, requested: &str) -> Result<AssetStatus, CoreError> {
    let from = AssetStatus::parse(current)?;
    let to = AssetStatus::parse(requested)?;
    if from.can_transition_to(to) {
        Ok(to)
    } else {
        let allowed: Vec<&str> = from.allowed_next().iter().map(AssetStatus::as_str).collect();
        Err(CoreError::Conflict(format!(
            "Cannot move asset from '{from}' to '{to}'. Allowed: {}",
            allowed.join(", ")
        )))
    }
}

/// Status an asset should move to after a user is assigned to it, if any.
pub fn status_after_assignment(current: AssetStatus) -> Option<AssetStatus> {
    match current {
        AssetStatus::Pending | AssetStatus::Selected => Some(AssetStatus::Assigned),
        _ => None,
    }
}

/// Status an asset should move to after a new version is uploaded, if any.
pub fn status_after_new_version(current: AssetStatus) -> Option<AssetStatus> {
    match current {
        AssetStatus::InProgress | AssetStatus::ChangesRequested => Some(AssetStatus::ReviewReady),
        _ => None,
    }
}

//! Project status, workflow phases and category rules.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Maximum length of a project or client name.
pub const MAX_PROJECT_NAME_LENGTH: usize = 200;

/// Maximum length of a category name.
pub const MAX_CATEGORY_LENGTH: usize = 64;

/// Maximum number of categories per project.
pub const MAX_CATEGORIES: usize = 50;

pub const PROJECT_STATUS_ACTIVE: &str = "active";
pub const PROJECT_STATUS_COMPLETED: &str = "completed";

/// All valid project status values.
pub const VALID_PROJECT_STATUSES: &[&str] = &[PROJECT_STATUS_ACTIVE, PROJECT_STATUS_COMPLETED];

/// Validate that a project status string is one of the accepted values.
pub fn validate_project_status(status: &str) -> Result<(), CoreError> {
    if VALID_PROJECT_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid project status '{status}'. Must be one of: {}",
            VALID_PROJECT_STATUSES.join(", ")
        )))
    }
}

/// Validate a required, length-bounded name field.
pub fn validate_name(field: &str, value: &str) -> Result<(), CoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(format!("{field} must not be empty")));
    }
    if trimmed.chars().count() > MAX_PROJECT_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "{field} must be at most {MAX_PROJECT_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Workflow phases
// ---------------------------------------------------------------------------

/// Production phase a project is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowPhase {
    Upload,
    Selection,
    Editing,
    Review,
    Delivery,
}

const PHASES: [WorkflowPhase; 5] = [
    WorkflowPhase::Upload,
    WorkflowPhase::Selection,
    WorkflowPhase::Editing,
    WorkflowPhase::Review,
    WorkflowPhase::Delivery,
];

impl WorkflowPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Selection => "selection",
            Self::Editing => "editing",
            Self::Review => "review",
            Self::Delivery => "delivery",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        PHASES
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Invalid workflow phase '{s}'. Must be one of: upload, selection, editing, review, delivery"
                ))
            })
    }

    pub fn next(&self) -> Option<Self> {
        let idx = PHASES.iter().position(|p| p == self)?;
        PHASES.get(idx + 1).copied()
    }
}

/// Phases advance one step at a time but may move back any number of steps.
pub fn validate_phase_change(current: &str, requested: &str) -> Result<WorkflowPhase, CoreError> {
    let from = WorkflowPhase::parse(current)?;
    let to = WorkflowPhase::parse(requested)?;
    if to <= from || from.next() == Some(to) {
        Ok(to)
    } else {
        Err(CoreError::Conflict(format!(
            "Cannot jump from phase '{}' to '{}'",
            from.as_str(),
            to.as_str()
        )))
    }
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// Validate and normalise a category to add, returning the trimmed name.
pub fn prepare_category(existing: &[String], category: &str) -> Result<String, CoreError> {
    let trimmed = category.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Category must not be empty".into()));
    }
    if trimmed.chars().count() > MAX_CATEGORY_LENGTH {
        return Err(CoreError::Validation(format!(
            "Category must be at most {MAX_CATEGORY_LENGTH} characters"
        )));
    }
    if find_category(existing, trimmed).is_some() {
        return Err(CoreError::Conflict(format!(
            "Category '{trimmed}' already exists"
        )));
    }
    if existing.len() >= MAX_CATEGORIES {
        return Err(CoreError::Validation(format!(
            "A project can have at most {MAX_CATEGORIES} categories"
        )));
    }
    Ok(trimmed.to_string())
}

/// Case-insensitive lookup of a category, returning the stored spelling.
///
/// Folds with Unicode lowercasing so it agrees with the `LOWER()` used when
/// counting assets per category.
pub fn find_category<'a>(existing: &'a [String], category: &str) -> Option<&'a str> {
    let needle = category.trim().to_lowercase();
    existing
        .iter()
        .find(|c| c.to_lowercase() == needle)
        .map(String::as_str)
}

/// An asset can only be filed under a category that already exists on its project.
pub fn require_category<'a>(existing: &'a [String], category: &str) -> Result<&'a str, CoreError> {
    find_category(existing, category).ok_or_else(|| {
        CoreError::Validation(format!(
            "Category '{}' does not exist on this project",
            category.trim()
        ))
    })
}

/// Confirming a selection requires at least one selected asset and the selection phase.
pub fn validate_selection_confirmation(
    phase: &str,
    already_confirmed: bool,
    selected_count: i64,
) -> Result<(), CoreError> {
    if already_confirmed {
        return Err(CoreError::Conflict("Selection is already confirmed".into()));
    }
    let phase = WorkflowPhase::parse(phase)?;
    if phase > WorkflowPhase::Selection {
        return Err(CoreError::Conflict(format!(
            "Selection cannot be confirmed during the '{}' phase",
            phase.as_str()
        )));
    }
    if selected_count < 1 {
        return Err(CoreError::Validation(
            "Select at least one asset before confirming".into(),
        ));
    }
    Ok(())
}

//! Per-asset annotation document.

use serde::Serialize;
use sqlx::FromRow;
use studio_core::types::{DbId, Timestamp};

/// A row from `asset_annotations`; `annotations` is the stored shape array.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AnnotationSet {
    pub id: DbId,
    pub asset_id: DbId,
    pub annotations: serde_json::Value,
    pub updated_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

//! Project activity log recorder.
//!
//! [`ActivityRecorder`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! and appends every project-scoped [`StudioEvent`] to `activity_log`.
//! Events without a project (logins, user administration) are skipped.

use tokio::sync::broadcast;
use studio_core::types::DbId;
use studio_db::models::activity::CreateActivity;
use studio_db::repositories::ActivityRepo;
use studio_db::DbPool;

use crate::bus::StudioEvent;

/// Label used when an event carries no actor at all.
const SYSTEM_ACTOR: &str = "System";

/// Background service that writes the project activity feed.
pub struct ActivityRecorder;

impl ActivityRecorder {
    /// Run the recorder loop until the bus is dropped.
    pub async fn run(pool: DbPool, mut receiver: broadcast::Receiver<StudioEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    let Some(entry) = Self::entry_for(&event) else {
                        continue;
                    };
                    if let Err(e) = ActivityRepo::create(&pool, &entry).await {
                        tracing::error!(
                            error = %e,
                            event_type = %event.event_type,
                            project_id = entry.project_id,
                            "Failed to record activity"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Activity recorder lagged, some events were not recorded");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, activity recorder shutting down");
                    break;
                }
            }
        }
    }

    /// Build the activity row for an event, or `None` when it has no project.
    pub fn entry_for(event: &StudioEvent) -> Option<CreateActivity> {
        let project_id: DbId = event.project_id?;

        let mut details = match &event.payload {
            serde_json::Value::Object(map) => map.clone(),
            other => {
                let mut map = serde_json::Map::new();
                map.insert("value".into(), other.clone());
                map
            }
        };
        if let (Some(kind), Some(id)) = (&event.source_entity_type, event.source_entity_id) {
            details.insert("entity_type".into(), kind.clone().into());
            details.insert("entity_id".into(), id.into());
        }

        Some(CreateActivity {
            project_id,
            actor_user_id: event.actor_user_id,
            actor_label: event
                .actor_label
                .clone()
                .unwrap_or_else(|| SYSTEM_ACTOR.to_string()),
            action: event.event_type.clone(),
            details: serde_json::Value::Object(details),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::event_types;

    #[test]
    fn events_without_project_are_skipped() {
        let event = StudioEvent::new("user.login").with_actor(1, "Ana");
        assert!(ActivityRecorder::entry_for(&event).is_none());
    }

    #[test]
    fn entry_merges_source_into_details() {
        let event = StudioEvent::new(event_types::ASSET_STATUS_CHANGED)
            .in_project(4)
            .with_source("asset", 11)
            .with_actor(2, "Ana")
            .with_payload(serde_json::json!({"from": "in-progress", "to": "review-ready"}));

        let entry = ActivityRecorder::entry_for(&event).unwrap();
        assert_eq!(entry.project_id, 4);
        assert_eq!(entry.actor_user_id, Some(2));
        assert_eq!(entry.actor_label, "Ana");
        assert_eq!(entry.action, "asset.status_changed");
        assert_eq!(entry.details["to"], "review-ready");
        assert_eq!(entry.details["entity_type"], "asset");
        assert_eq!(entry.details["entity_id"], 11);
    }

    #[test]
    fn missing_actor_falls_back_to_system() {
        let event = StudioEvent::new(event_types::MUX_ASSET_READY)
            .in_project(1)
            .with_payload(serde_json::json!("ready"));
        let entry = ActivityRecorder::entry_for(&event).unwrap();
        assert_eq!(entry.actor_label, "System");
        assert_eq!(entry.details["value"], "ready");
    }
}

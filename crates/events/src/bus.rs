//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the central publish/subscribe hub for [`StudioEvent`]s.
//! It is shared via `Arc<EventBus>` across the application.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use studio_core::types::DbId;
use tokio::sync::broadcast;

/// Event type names published by the API.
pub mod event_types {
    pub const PROJECT_CREATED: &str = "project.created";
    pub const PROJECT_UPDATED: &str = "project.updated";
    pub const PROJECT_PHASE_CHANGED: &str = "project.phase_changed";
    pub const PROJECT_CATEGORY_ADDED: &str = "project.category_added";
    pub const PROJECT_CATEGORY_REMOVED: &str = "project.category_removed";
    pub const PROJECT_SELECTION_CONFIRMED: &str = "project.selection_confirmed";
    pub const TEAM_MEMBER_ADDED: &str = "team.member_added";
    pub const TEAM_MEMBER_REMOVED: &str = "team.member_removed";
    pub const ASSET_CREATED: &str = "asset.created";
    pub const ASSET_UPDATED: &str = "asset.updated";
    pub const ASSET_DELETED: &str = "asset.deleted";
    pub const ASSET_ASSIGNED: &str = "asset.assigned";
    pub const ASSET_STATUS_CHANGED: &str = "asset.status_changed";
    pub const ASSET_SELECTION_CHANGED: &str = "asset.selection_changed";
    pub const ASSET_VERSION_UPLOADED: &str = "asset.version_uploaded";
    pub const ANNOTATIONS_SAVED: &str = "annotations.saved";
    pub const FEEDBACK_CREATED: &str = "feedback.created";
    pub const FEEDBACK_RESOLVED: &str = "feedback.resolved";
    pub const SHARE_LINK_CREATED: &str = "share_link.created";
    pub const SHARE_LINK_REVOKED: &str = "share_link.revoked";
    pub const MUX_ASSET_READY: &str = "mux.asset_ready";
    pub const MUX_ASSET_ERRORED: &str = "mux.asset_errored";
}

// ---------------------------------------------------------------------------
// StudioEvent
// ---------------------------------------------------------------------------

/// A domain event.
///
/// Constructed via [`StudioEvent::new`] and enriched with the builder
/// methods [`in_project`](StudioEvent::in_project),
/// [`with_source`](StudioEvent::with_source),
/// [`with_actor`](StudioEvent::with_actor) and
/// [`with_payload`](StudioEvent::with_payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudioEvent {
    /// Dot-separated event name, e.g. `"asset.status_changed"`.
    pub event_type: String,

    /// Project the event belongs to. Only project-scoped events reach the activity log.
    pub project_id: Option<DbId>,

    /// Optional source entity kind (e.g. `"asset"`, `"share_link"`).
    pub source_entity_type: Option<String>,

    pub source_entity_id: Option<DbId>,

    /// Id of the signed-in user that triggered the event, if any.
    pub actor_user_id: Option<DbId>,

    /// Display name of whoever triggered the event (a user or a share-link visitor).
    pub actor_label: Option<String>,

    /// Free-form JSON payload carrying event-specific data.
    pub payload: serde_json::Value,

    pub timestamp: DateTime<Utc>,
}

impl StudioEvent {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            project_id: None,
            source_entity_type: None,
            source_entity_id: None,
            actor_user_id: None,
            actor_label: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn in_project(mut self, project_id: DbId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn with_source(mut self, entity_type: impl Into<String>, entity_id: DbId) -> Self {
        self.source_entity_type = Some(entity_type.into());
        self.source_entity_id = Some(entity_id);
        self
    }

    /// Attach the acting user.
    pub fn with_actor(mut self, user_id: DbId, label: impl Into<String>) -> Self {
        self.actor_user_id = Some(user_id);
        self.actor_label = Some(label.into());
        self
    }

    /// Attach an actor that is not a user (share-link visitor, webhook).
    pub fn with_actor_label(mut self, label: impl Into<String>) -> Self {
        self.actor_label = Some(label.into());
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// ```rust
/// use studio_events::bus::{EventBus, StudioEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(StudioEvent::new("project.created"));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<StudioEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: StudioEvent) {
        tracing::debug!(event_type = %event.event_type, project_id = ?event.project_id, "Publishing event");
        // A SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StudioEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

use std::sync::Arc;

use studio_events::{EmailSender, EventBus};
use studio_media::{StorageProvider, VideoPipeline};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind an `Arc` or already `Clone`.
#[derive(Clone)]
pub struct AppState {
    pub pool: studio_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Centralized event bus for publishing domain events.
    pub event_bus: Arc<EventBus>,
    pub storage: Arc<dyn StorageProvider>,
    /// `None` when Mux credentials are not configured.
    pub video: Option<Arc<dyn VideoPipeline>>,
    /// `None` when neither Resend nor SMTP is configured.
    pub email: Option<Arc<dyn EmailSender>>,
}

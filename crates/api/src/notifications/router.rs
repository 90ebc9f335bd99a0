//! Event-to-notification routing engine.
//!
//! [`NotificationRouter`] subscribes to the studio event bus and, for each
//! event it cares about, works out which users are affected, writes one
//! notification row per user and optionally sends a templated email.

use std::sync::Arc;

use serde_json::{Map, Value};
use studio_core::asset_status::AssetStatus;
use studio_core::feedback::mention_matches_name;
use studio_core::roles::is_staff;
use studio_core::types::DbId;
use studio_db::models::notification::CreateNotification;
use studio_db::repositories::{NotificationRepo, TeamRepo, UserRepo};
use studio_db::DbPool;
use studio_events::bus::event_types;
use studio_events::{EmailSender, EmailTemplate, OutgoingEmail, StudioEvent};
use tokio::sync::broadcast;

type RouteError = Box<dyn std::error::Error + Send + Sync>;

/// Who an event should reach.
#[derive(Debug, Clone, PartialEq)]
pub enum Audience {
    /// One specific user.
    User(DbId),
    /// Every admin/producer on the project's team.
    ProjectStaff,
    /// Team members whose name matches one of these `@` handles.
    Mentioned(Vec<String>),
}

/// What to deliver for one event.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub audience: Audience,
    pub kind: &'static str,
    pub title: String,
    pub body: String,
    /// Email sent alongside the in-app notification, if any.
    pub email: Option<EmailTemplate>,
}

fn payload_str<'a>(event: &'a StudioEvent, key: &str) -> Option<&'a str> {
    event.payload.get(key).and_then(Value::as_str)
}

fn payload_id(event: &StudioEvent, key: &str) -> Option<DbId> {
    event.payload.get(key).and_then(Value::as_i64)
}

/// Decide the delivery for an event. `None` means nobody is notified.
pub fn plan_delivery(event: &StudioEvent) -> Option<Delivery> {
    let asset = payload_str(event, "asset_name").unwrap_or("An asset");
    let project = payload_str(event, "project_name").unwrap_or("a project");
    let actor = event.actor_label.as_deref().unwrap_or("Someone");

    match event.event_type.as_str() {
        event_types::ASSET_ASSIGNED => Some(Delivery {
            audience: Audience::User(payload_id(event, "assigned_to")?),
            kind: "assignment",
            title: format!("You were assigned {asset}"),
            body: format!("{actor} assigned {asset} in {project} to you."),
            email: Some(EmailTemplate::AssetAssigned),
        }),
        event_types::ASSET_STATUS_CHANGED => {
            let to = AssetStatus::parse(payload_str(event, "to")?).ok()?;
            match to {
                AssetStatus::ReviewReady => Some(Delivery {
                    audience: Audience::ProjectStaff,
                    kind: "review_ready",
                    title: format!("{asset} is ready for review"),
                    body: format!("{actor} marked {asset} in {project} as ready for review."),
                    email: None,
                }),
                AssetStatus::ChangesRequested => Some(Delivery {
                    audience: Audience::User(payload_id(event, "assigned_to")?),
                    kind: "changes_requested",
                    title: format!("Changes requested on {asset}"),
                    body: format!("{actor} requested changes on {asset} in {project}."),
                    email: Some(EmailTemplate::ChangesRequested),
                }),
                _ => None,
            }
        }
        event_types::FEEDBACK_CREATED => {
            let mentions: Vec<String> = event
                .payload
                .get("mentions")
                .and_then(|v| serde_json::from_value(v.clone()).ok())
                .unwrap_or_default();
            if mentions.is_empty() {
                return None;
            }
            Some(Delivery {
                audience: Audience::Mentioned(mentions),
                kind: "mention",
                title: format!("{actor} mentioned you"),
                body: format!("{actor} mentioned you in feedback on {asset}."),
                email: None,
            })
        }
        event_types::PROJECT_SELECTION_CONFIRMED => Some(Delivery {
            audience: Audience::ProjectStaff,
            kind: "selection_confirmed",
            title: format!("Selection confirmed for {project}"),
            body: format!("{actor} confirmed the selection for {project}."),
            email: None,
        }),
        _ => None,
    }
}

/// Routes studio events to user notifications.
pub struct NotificationRouter {
    pool: DbPool,
    email: Option<Arc<dyn EmailSender>>,
}

impl NotificationRouter {
    pub fn new(pool: DbPool, email: Option<Arc<dyn EmailSender>>) -> Self {
        Self { pool, email }
    }

    /// Run the main routing loop.
    ///
    /// The loop exits when the channel is closed (i.e. the
    /// [`EventBus`](studio_events::EventBus) is dropped).
    pub async fn run(self, mut receiver: broadcast::Receiver<StudioEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = self.route_event(&event).await {
                        tracing::error!(
                            error = %e,
                            event_type = %event.event_type,
                            "Failed to route event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification router lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification router shutting down");
                    break;
                }
            }
        }
    }

    async fn route_event(&self, event: &StudioEvent) -> Result<(), RouteError> {
        let Some(delivery) = plan_delivery(event) else {
            return Ok(());
        };

        let mut targets = self.determine_targets(event, &delivery.audience).await?;
        // Nobody is notified about their own action.
        targets.retain(|id| Some(*id) != event.actor_user_id);
        targets.sort_unstable();
        targets.dedup();

        for user_id in targets {
            NotificationRepo::create(
                &self.pool,
                &CreateNotification {
                    user_id,
                    kind: delivery.kind.to_string(),
                    title: delivery.title.clone(),
                    body: delivery.body.clone(),
                    project_id: event.project_id,
                    asset_id: payload_id(event, "asset_id"),
                },
            )
            .await?;

            if let Some(template) = delivery.email {
                self.send_email(user_id, template, event).await;
            }
        }

        Ok(())
    }

    async fn determine_targets(
        &self,
        event: &StudioEvent,
        audience: &Audience,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        match audience {
            Audience::User(id) => Ok(vec![*id]),
            Audience::ProjectStaff => {
                let Some(project_id) = event.project_id else {
                    return Ok(vec![]);
                };
                let team = TeamRepo::list_for_project(&self.pool, project_id).await?;
                Ok(team
                    .into_iter()
                    .filter(|m| is_staff(&m.role))
                    .map(|m| m.user_id)
                    .collect())
            }
            Audience::Mentioned(handles) => {
                let Some(project_id) = event.project_id else {
                    return Ok(vec![]);
                };
                let team = TeamRepo::list_for_project(&self.pool, project_id).await?;
                Ok(team
                    .into_iter()
                    .filter(|m| handles.iter().any(|h| mention_matches_name(h, &m.name)))
                    .map(|m| m.user_id)
                    .collect())
            }
        }
    }

    /// Email failures are logged and never fail the notification.
    async fn send_email(&self, user_id: DbId, template: EmailTemplate, event: &StudioEvent) {
        let Some(sender) = &self.email else {
            return;
        };
        let user = match UserRepo::find_by_id(&self.pool, user_id).await {
            Ok(Some(user)) if user.is_active => user,
            Ok(_) => return,
            Err(e) => {
                tracing::error!(error = %e, user_id, "Failed to load email recipient");
                return;
            }
        };

        let mut data: Map<String, Value> = match &event.payload {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        data.insert("recipient_name".into(), Value::String(user.name.clone()));

        let rendered = match template.render(&data) {
            Ok(rendered) => rendered,
            Err(e) => {
                tracing::warn!(error = %e, template = template.name(), "Skipping notification email");
                return;
            }
        };

        let email = OutgoingEmail {
            to: vec![user.email],
            subject: rendered.subject,
            html: rendered.html,
        };
        match sender.send(&email).await {
            Ok(id) => tracing::debug!(user_id, email_id = %id, template = template.name(), "Notification email sent"),
            Err(e) => tracing::error!(error = %e, user_id, template = template.name(), "Failed to send notification email"),
        }
    }
}

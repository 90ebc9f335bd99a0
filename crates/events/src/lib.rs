//! Studio event bus, activity log recorder and email delivery.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`StudioEvent`]: the domain event envelope.
//! - [`ActivityRecorder`]: background service that appends every
//!   project-scoped event to the project's activity log.
//! - [`delivery`]: transactional email (Resend or SMTP) and templates.

pub mod activity;
pub mod bus;
pub mod delivery;

pub use activity::ActivityRecorder;
pub use bus::{event_types, EventBus, StudioEvent};
pub use delivery::email::{EmailConfig, EmailError, EmailSender, OutgoingEmail};
pub use delivery::templates::{EmailTemplate, RenderedEmail, TemplateError};

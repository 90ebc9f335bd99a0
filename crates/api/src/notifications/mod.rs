//! Notification routing infrastructure.
//!
//! The [`NotificationRouter`] subscribes to the event bus and turns
//! assignment, review and mention events into in-app notifications and,
//! when email is configured, outgoing emails.

pub mod router;

pub use router::NotificationRouter;

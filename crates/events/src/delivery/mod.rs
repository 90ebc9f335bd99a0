//! Outbound email delivery.
//!
//! [`email`] holds the transports (Resend HTTP API, SMTP fallback) and
//! [`templates`] renders the transactional messages they carry.

pub mod email;
pub mod templates;

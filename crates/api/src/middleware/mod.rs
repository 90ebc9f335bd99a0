//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated user from a JWT Bearer token.
//! - [`rbac::RequireAdmin`] -- Requires the `admin` role.
//! - [`rbac::RequireStaff`] -- Requires `admin` or `producer`.
//! - [`share::resolve_share_link`] -- Validates a public share token.

pub mod auth;
pub mod rbac;
pub mod share;

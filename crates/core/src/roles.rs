//! Well-known role name constants.
//!
//! These must match the `ck_users_role` check constraint in
//! `20260301000001_create_users.sql`.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_PRODUCER: &str = "producer";
pub const ROLE_EDITOR: &str = "editor";
pub const ROLE_CLIENT: &str = "client";

/// All valid role names.
pub const VALID_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_PRODUCER, ROLE_EDITOR, ROLE_CLIENT];

/// Staff roles manage projects, share links and team assignments.
pub fn is_staff(role: &str) -> bool {
    role == ROLE_ADMIN || role == ROLE_PRODUCER
}

/// Validate that a role string is one of the accepted values.
pub fn validate_role(role: &str) -> Result<(), crate::error::CoreError> {
    if VALID_ROLES.contains(&role) {
        Ok(())
    } else {
        Err(crate::error::CoreError::Validation(format!(
            "Invalid role '{role}'. Must be one of: {}",
            VALID_ROLES.join(", ")
        )))
    }
}

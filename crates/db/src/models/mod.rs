//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - A `Deserialize` update DTO (all `Option` fields) for patches

pub mod activity;
pub mod annotation;
pub mod asset;
pub mod asset_version;
pub mod feedback;
pub mod notification;
pub mod project;
pub mod session;
pub mod share_link;
pub mod team;
pub mod user;

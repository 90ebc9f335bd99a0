//! Domain rules for the studio production hub.
//!
//! Pure logic only: validation, status workflows, annotation geometry and
//! view grouping. Nothing in this crate touches the database or network.

pub mod annotation;
pub mod asset;
pub mod asset_status;
pub mod canvas;
pub mod error;
pub mod feedback;
pub mod hashing;
pub mod pagination;
pub mod project;
pub mod roles;
pub mod share;
pub mod types;
pub mod views;

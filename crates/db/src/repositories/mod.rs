//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod activity_repo;
pub mod annotation_repo;
pub mod asset_repo;
pub mod asset_version_repo;
pub mod feedback_repo;
pub mod notification_repo;
pub mod project_repo;
pub mod session_repo;
pub mod share_link_repo;
pub mod team_repo;
pub mod user_repo;

pub use activity_repo::ActivityRepo;
pub use annotation_repo::AnnotationRepo;
pub use asset_repo::AssetRepo;
pub use asset_version_repo::AssetVersionRepo;
pub use feedback_repo::FeedbackRepo;
pub use notification_repo::NotificationRepo;
pub use project_repo::ProjectRepo;
pub use session_repo::SessionRepo;
pub use share_link_repo::ShareLinkRepo;
pub use team_repo::TeamRepo;
pub use user_repo::UserRepo;

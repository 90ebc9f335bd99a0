//! File storage and the Mux video pipeline.
//!
//! - [`storage`]: the [`StorageProvider`] trait and the local filesystem
//!   implementation that backs `/files/*`.
//! - [`mux`]: Mux direct uploads, asset lookups and webhook parsing behind
//!   the [`VideoPipeline`] trait.

pub mod mux;
pub mod storage;

pub use mux::{MuxClient, MuxConfig, MuxError, VideoPipeline};
pub use storage::{LocalStorage, StorageError, StorageProvider, StoredObject};

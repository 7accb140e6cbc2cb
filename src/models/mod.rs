//! Data models for the project sync client.
//!
//! These models represent the sync request as built from caller parameters,
//! the remote job being watched, and the terminal result handed back to the
//! caller. All models derive Serialize so embedding runners can persist them.

pub mod job;
pub mod request;
pub mod result;

// Re-exports for convenient access
pub use job::{JobState, SyncJob};
pub use request::{SyncParams, SyncRequest};
pub use result::SyncResult;

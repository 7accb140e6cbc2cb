//! Client services for driving a project sync.
//!
//! The submit → poll → report cycle lives here, along with the controller
//! API client, credential resolution, and the log sink machinery. Services
//! are written against the [`tower_client::ProjectSyncApi`] trait so they can
//! be tested without a live controller.

pub mod credentials;
pub mod logs;
pub mod poller;
pub mod reporter;
pub mod runner;
pub mod submitter;
pub mod tower_client;

#[cfg(test)]
pub(crate) mod test_api;

pub use credentials::{Credential, CredentialResolver, KeyringCredentials, StaticCredentials};
pub use logs::{LogSink, MemorySink, WriterSink};
pub use poller::PollConfig;
pub use runner::ProjectSyncRunner;
pub use tower_client::{ProjectSyncApi, TowerClient, TowerClientConfig};

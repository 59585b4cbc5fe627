//! JupiterOne connector: deferred J1QL queries and alert webhooks
//!
//! The core is the deferred query client: a query is submitted with a forced
//! deferred response, its result location is polled until the job finishes,
//! and further jobs are submitted with the returned cursor until the
//! requested number of rows has been gathered.

pub mod config;
pub mod deferred;
pub mod error;
pub mod network;
pub mod query;
pub mod secret;
pub mod web;
pub mod webhook;

pub use config::{Credentials, Settings};
pub use deferred::{Outcome, QueryClient, ResultEnvelope};
pub use error::ConnectorError;
pub use query::QuerySpec;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

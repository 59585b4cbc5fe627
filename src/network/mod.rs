//! HTTP networking module
//!
//! Provides the transport used to talk to the JupiterOne API.

mod client;
#[cfg(test)]
pub(crate) mod mock;
mod types;

pub use client::HttpClient;
pub use types::*;

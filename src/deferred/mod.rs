//! Deferred query execution
//!
//! A J1QL query is submitted with a forced deferred response, the returned
//! result location is polled until the job finishes, and the cycle repeats
//! with the job's cursor until the requested cap is reached.

mod assembler;
mod client;
mod models;
mod pager;
mod poller;
mod submitter;

pub use assembler::assemble;
pub use client::QueryClient;
pub use models::*;
pub use pager::fetch_pages;
pub use poller::{poll, PollPolicy};
pub use submitter::{check_credentials, parse_submission, submission_body, submit};

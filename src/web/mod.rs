//! Web server module
//!
//! Exposes the query pipeline and the alert webhook to the workflow host.

mod handlers;
mod routes;
mod state;

pub use handlers::{QueryBatch, QueryItem};
pub use routes::create_router;
pub use state::AppState;

//! HTTP surface over the workflow, registry and job runner.

pub mod error;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod state;

pub use routes::router;
pub use state::AppState;

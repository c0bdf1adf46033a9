//! Reviewer API - HTTP surface for the PR reviewer service
//!
//! Exposes team, user and pull request use cases as JSON endpoints and
//! translates service errors into `{"error": {"code", "message"}}` bodies.

pub mod dto;
pub mod error;
mod handlers;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use routes::{router, AppState};
pub use server::serve;

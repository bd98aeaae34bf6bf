//! HTTP layer: axum router, shared state, request logging, and the
//! OpenAI-compatible endpoints.

pub mod error;
pub mod handlers;
pub mod server;
pub mod state;

pub use server::{build_router, start};
pub use state::AppState;

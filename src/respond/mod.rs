//! Suggested-response generation and shared response state.

pub mod api;
pub mod engine;
pub mod prompt;
pub mod state;

pub use api::{ApiResponseConfig, ApiResponseEngine};
pub use engine::{MockResponseEngine, ResponseEngine};
pub use state::ResponseState;

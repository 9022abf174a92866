//! REST API implementation
//!
//! - types: Request/response type definitions and application state
//! - extractors: JSON and multipart extractors using the error envelope
//! - handlers: API endpoint handlers
//! - router: Router creation and configuration

mod extractors;
mod handlers;
mod router;
mod tests;
pub mod types;

// Re-export public API
pub use extractors::{BotForm, JsonExtractor};
pub use router::create_router;
pub use types::{AppState, BotOptions, HealthResponse, QuestionInput};

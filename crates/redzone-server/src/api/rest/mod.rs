//! REST API implementation
//!
//! - types: application state and request/response bodies
//! - extractors: JSON body and caller identity extractors
//! - handlers: API endpoint handlers
//! - router: route table

mod extractors;
mod handlers;
mod router;
pub mod types;

// Re-export public API
pub use extractors::{Caller, JsonExtractor, USER_ID_HEADER};
pub use router::create_router;
pub use types::{AppState, HealthResponse, SweepRequest, SweepResponse};

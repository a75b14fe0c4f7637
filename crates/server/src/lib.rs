//! HTTP server for over-the-air application updates.
//!
//! This crate provides:
//! - The device-facing manifest endpoint and its update resolver
//! - Multipart encoding of manifests and directives
//! - Publish endpoints for upload path allocation and record sync
//! - Health and Prometheus metrics endpoints

pub mod error;
pub mod handlers;
pub mod metrics;
pub mod resolver;
pub mod response;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use resolver::{UpdateDecision, UpdateRequest, UpdateResponse};
pub use routes::create_router;
pub use state::AppState;

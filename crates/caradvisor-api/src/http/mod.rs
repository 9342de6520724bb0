//! HTTP/REST API layer for Car Advisor.
//!
//! Axum-based REST API with envelope response format and CORS support.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod router;

//! HTTP request handlers for the REST API.

pub mod car;
pub mod chat;
pub mod health;

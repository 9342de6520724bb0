//! Shared domain types for Car Advisor.
//!
//! This crate contains the domain types used across the Car Advisor backend:
//! cars, filter predicate sets, conversation history, LLM message shapes,
//! configuration, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod car;
pub mod chat;
pub mod compare;
pub mod config;
pub mod error;
pub mod filter;
pub mod llm;

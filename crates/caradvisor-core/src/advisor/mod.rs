//! The conversational car advisor.
//!
//! A straight-line pipeline per chat message:
//!
//! 1. [`extractor`]: LLM turns the message into a filter set
//! 2. [`combine`]: manual filters override extracted ones
//! 3. catalog query through [`CarRepository`](crate::repository::car::CarRepository)
//! 4. [`heuristics`]: satisfaction check and comparison column order
//! 5. [`responder`]: LLM writes the answer and the history grows by one turn
//!
//! [`service::AdvisorService`] wires the steps together.

pub mod combine;
pub mod extractor;
pub mod heuristics;
pub mod responder;
pub mod service;

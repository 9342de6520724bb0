//! Business logic and repository traits for Car Advisor.
//!
//! This crate defines the "ports" (repository and LLM provider traits) that
//! the infrastructure layer implements, plus the chat advisor pipeline and the
//! catalog service. It depends only on `caradvisor-types`, never on
//! `caradvisor-infra` or any database/IO crate.

pub mod advisor;
pub mod llm;
pub mod repository;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;

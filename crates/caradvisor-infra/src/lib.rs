//! Infrastructure layer for Car Advisor.
//!
//! Contains implementations of the traits defined in `caradvisor-core`:
//! the SQLite and PostgREST car catalogs, the OpenAI-compatible LLM provider,
//! and the layered configuration loader.

pub mod catalog;
pub mod config;
pub mod llm;
pub mod rest;
pub mod sqlite;

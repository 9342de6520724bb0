//! Hosted catalog over a PostgREST endpoint (e.g. Supabase).

pub mod car;
pub mod query;

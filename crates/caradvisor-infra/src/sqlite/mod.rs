//! SQLite storage layer.
//!
//! The embedded car catalog, backed by SQLite with WAL mode and split
//! read/write connection pools.

pub mod car;
pub mod pool;

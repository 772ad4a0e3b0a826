//! sl-db - Execution layer for Swapline
//!
//! This crate provides the `DdlExecutor` trait that runs DDL intents and
//! answers catalog questions, a DuckDB implementation, and (behind the
//! `test-support` feature) an in-memory catalog with failure injection.

pub mod duckdb;
pub mod error;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod traits;

pub use duckdb::DuckDbBackend;
pub use error::{DbError, DbResult};
#[cfg(any(test, feature = "test-support"))]
pub use memory::MemoryCatalog;
pub use traits::DdlExecutor;

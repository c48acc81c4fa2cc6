//! Adapters layer: Concrete implementations of ports.
//!
//! - `rules`: keyword-matching symptom analyzer
//! - `sqlite`: SQLite for local storage
//! - `sanitize`: PII filtering for logs

pub mod rules;
pub mod sanitize;
pub mod sqlite;

// Re-export storage error for lib.rs
pub use sqlite::StorageError;

//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and external systems (analysis backend, storage).

mod profile_store;
mod symptom_analyzer;

pub use profile_store::{ProfileStore, SymptomPage};
pub use symptom_analyzer::{AnalyzerError, SymptomAnalyzer};

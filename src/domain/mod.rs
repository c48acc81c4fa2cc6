//! Domain layer: Core types and rules.
//!
//! Pure Rust types with no I/O beyond reading a taxonomy data file.
//! All records are serializable and validate their own invariants.

pub mod analysis;
mod profile;
pub mod strategy;
mod taxonomy;

pub use analysis::{AnalysisResult, DocumentAnalysis, ExtractedSymptom};
pub use profile::{
    AnalysisSource, Demographics, NewFeedback, NewSymptom, RecoveryFeedback, SymptomLogEntry,
    UserProfile, MAX_SEVERITY, MIN_SEVERITY,
};
pub use strategy::RecoveryStrategy;
pub use taxonomy::{SymptomCategory, SymptomDefinition, Taxonomy, TaxonomyError, RED_FLAG_MARKER};

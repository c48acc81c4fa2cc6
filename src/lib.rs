//! # Headway
//!
//! Local-first concussion recovery companion.
//!
//! This crate provides:
//! - A versioned concussion symptom taxonomy with red-flag markers
//! - Rule-based extraction of symptoms, advice and red flags from free text
//! - A local symptom log with recovery-progress summaries
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types (Taxonomy, AnalysisResult, profile records)
//! - `ports`: Trait definitions for external operations
//! - `adapters`: Concrete implementations (rule-based analyzer, SQLite)
//! - `application`: Use cases orchestrating domain and ports
//! - `config`: Environment-driven process configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use domain::{AnalysisResult, ExtractedSymptom, SymptomCategory, SymptomDefinition, Taxonomy};

/// Result type for Headway operations
pub type Result<T> = std::result::Result<T, HeadwayError>;

/// Main error type for Headway
#[derive(Debug, thiserror::Error)]
pub enum HeadwayError {
    #[error("Storage operation failed: {0}")]
    Storage(#[from] adapters::StorageError),

    #[error("Taxonomy error: {0}")]
    Taxonomy(#[from] domain::TaxonomyError),

    #[error("Analysis failed: {0}")]
    Analyzer(#[from] ports::AnalyzerError),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Background analysis failed: {0}")]
    Worker(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

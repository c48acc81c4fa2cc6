//! Symptom analyzer port: Trait for turning free text into structured symptoms.
//!
//! The bundled implementation is rule-based (`adapters::rules`). A language-model
//! backend can replace it without changing callers.

use crate::domain::{AnalysisResult, DocumentAnalysis};

/// Errors an analyzer backend may report.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AnalyzerError {
    #[error("Analyzer unavailable: {0}")]
    Unavailable(String),
}

/// Trait for symptom extraction backends.
pub trait SymptomAnalyzer: Send + Sync {
    /// Short identifier for logs.
    fn backend_name(&self) -> &'static str;

    /// Extract symptoms, advice and red flags from a free-text description.
    ///
    /// Text that names no known symptom is not an error; the result then
    /// holds the "Unspecified Symptoms" placeholder.
    ///
    /// # Errors
    /// Returns error only when the backend itself cannot run.
    fn analyze(&self, text: &str) -> Result<AnalysisResult, AnalyzerError>;

    /// Same as [`SymptomAnalyzer::analyze`] with a summary of the document.
    ///
    /// # Errors
    /// Returns error only when the backend itself cannot run.
    fn analyze_document(&self, text: &str) -> Result<DocumentAnalysis, AnalyzerError>;
}

//! Analysis service: Orchestrates symptom extraction and logging.
//!
//! This service coordinates:
//! - Running the analyzer backend on a description or document
//! - Merging extracted symptoms into the profile's symptom log
//! - Finishing onboarding with the first analysis

use std::sync::Arc;
use std::time::Duration;

use super::worker::{AnalysisWorker, AnalysisWorkerHandle};
use crate::domain::{AnalysisResult, AnalysisSource, DocumentAnalysis, NewSymptom, SymptomLogEntry};
use crate::ports::{ProfileStore, SymptomAnalyzer};
use crate::HeadwayError;

/// Service for analyzing symptom text and recording the outcome.
pub struct AnalysisService<A, S>
where
    A: SymptomAnalyzer,
    S: ProfileStore,
{
    analyzer: Arc<A>,
    store: Arc<S>,
}

impl<A, S> AnalysisService<A, S>
where
    A: SymptomAnalyzer,
    S: ProfileStore,
    S::Error: Into<crate::adapters::StorageError>,
{
    pub fn new(analyzer: Arc<A>, store: Arc<S>) -> Self {
        Self { analyzer, store }
    }

    /// Analyze a description on a background thread after `latency`.
    pub fn spawn_text(&self, text: String, latency: Duration) -> AnalysisWorkerHandle
    where
        A: 'static,
    {
        AnalysisWorker::spawn(Arc::clone(&self.analyzer), text, latency)
    }

    /// Analyze document text on a background thread after `latency`.
    ///
    /// # Errors
    /// Returns a validation error for blank text.
    pub fn spawn_document(
        &self,
        text: String,
        latency: Duration,
    ) -> Result<AnalysisWorkerHandle<DocumentAnalysis>, HeadwayError>
    where
        A: 'static,
    {
        require_document_text(&text)?;
        Ok(AnalysisWorker::spawn_document(Arc::clone(&self.analyzer), text, latency))
    }

    /// Analyze a free-text symptom description.
    ///
    /// Blank text is accepted and yields the unspecified placeholder.
    ///
    /// # Errors
    /// Returns error if the analyzer backend fails.
    pub fn analyze_text(&self, text: &str) -> Result<AnalysisResult, HeadwayError> {
        tracing::debug!(
            "Analyzing description ({} chars) with {}",
            text.chars().count(),
            self.analyzer.backend_name()
        );

        let result = self.analyzer.analyze(text)?;
        log_outcome(&result);
        Ok(result)
    }

    /// Analyze text extracted from a medical document.
    ///
    /// # Errors
    /// Returns a validation error for blank text, or the analyzer's error.
    pub fn analyze_document(&self, text: &str) -> Result<DocumentAnalysis, HeadwayError> {
        require_document_text(text)?;

        tracing::debug!(
            "Analyzing document ({} chars) with {}",
            text.chars().count(),
            self.analyzer.backend_name()
        );

        let analysis = self.analyzer.analyze_document(text)?;
        log_outcome(&analysis.result);
        Ok(analysis)
    }

    /// Append every extracted symptom to the symptom log.
    ///
    /// # Errors
    /// Returns error if a symptom is invalid or storage fails.
    pub fn save_to_profile(
        &self,
        result: &AnalysisResult,
        source: AnalysisSource,
        notes: Option<&str>,
    ) -> Result<Vec<SymptomLogEntry>, HeadwayError> {
        let symptoms: Vec<NewSymptom> = result
            .extracted_symptoms
            .iter()
            .map(|symptom| NewSymptom::from_extracted(symptom, source, notes))
            .collect();

        for symptom in &symptoms {
            symptom
                .validate()
                .map_err(|errors| HeadwayError::Validation(errors.join("; ")))?;
        }

        let entries = symptoms
            .iter()
            .map(|symptom| {
                self.store
                    .append_symptom(symptom)
                    .map_err(|e| HeadwayError::Storage(e.into()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::info!("Recorded {} symptom(s) from {:?}", entries.len(), source);
        Ok(entries)
    }

    /// Record the onboarding analysis and mark onboarding complete.
    ///
    /// # Errors
    /// Returns error if storage fails.
    pub fn complete_onboarding(&self, result: &AnalysisResult) -> Result<Vec<SymptomLogEntry>, HeadwayError> {
        let entries = self.save_to_profile(result, AnalysisSource::Description, None)?;
        self.store
            .complete_onboarding()
            .map_err(|e| HeadwayError::Storage(e.into()))?;
        Ok(entries)
    }
}

fn require_document_text(text: &str) -> Result<(), HeadwayError> {
    if text.trim().is_empty() {
        return Err(HeadwayError::Validation("No document text".to_string()));
    }
    Ok(())
}

/// Log counts only; the analyzed text never reaches the log.
fn log_outcome(result: &AnalysisResult) {
    if result.is_unspecified() {
        tracing::info!("Analysis complete: no specific symptoms identified");
    } else {
        tracing::info!(
            "Analysis complete: {} symptom(s), {} red flag(s)",
            result.extracted_symptoms.len(),
            result.red_flags.len()
        );
    }
    if result.has_red_flags() {
        tracing::warn!("Red-flag symptoms detected; urgent-care advice issued");
    }
}

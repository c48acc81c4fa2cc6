//! Rule-based adapter: Implementation of SymptomAnalyzer.
//!
//! Keyword matching against the shared taxonomy. Severity draws come from a
//! ChaCha20 generator owned by the adapter; seed it for reproducible output.

use std::sync::{Arc, Mutex};

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::domain::{analysis, AnalysisResult, DocumentAnalysis, Taxonomy};
use crate::ports::{AnalyzerError, SymptomAnalyzer};

/// Keyword-matching analyzer.
pub struct RuleBasedAnalyzer {
    taxonomy: Arc<Taxonomy>,
    rng: Mutex<ChaCha20Rng>,
}

impl RuleBasedAnalyzer {
    /// Create an analyzer seeded from OS entropy.
    #[must_use]
    pub fn new(taxonomy: Arc<Taxonomy>) -> Self {
        Self {
            taxonomy,
            rng: Mutex::new(ChaCha20Rng::from_entropy()),
        }
    }

    /// Create an analyzer with a fixed seed (reproducible severities).
    #[must_use]
    pub fn with_seed(taxonomy: Arc<Taxonomy>, seed: u64) -> Self {
        Self {
            taxonomy,
            rng: Mutex::new(ChaCha20Rng::seed_from_u64(seed)),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut ChaCha20Rng) -> T) -> Result<T, AnalyzerError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| AnalyzerError::Unavailable("Severity RNG lock poisoned".to_string()))?;
        Ok(f(&mut *rng))
    }
}

impl SymptomAnalyzer for RuleBasedAnalyzer {
    fn backend_name(&self) -> &'static str {
        "rule-based"
    }

    fn analyze(&self, text: &str) -> Result<AnalysisResult, AnalyzerError> {
        self.with_rng(|rng| analysis::analyze(text, &self.taxonomy, rng))
    }

    fn analyze_document(&self, text: &str) -> Result<DocumentAnalysis, AnalyzerError> {
        self.with_rng(|rng| analysis::analyze_document(text, &self.taxonomy, rng))
    }
}

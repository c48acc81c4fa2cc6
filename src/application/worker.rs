//! Background analysis worker.
//!
//! Runs the analyzer on its own thread after a fixed latency, standing in for
//! a round-trip to a remote inference backend. Callers poll or block on the
//! returned handle; dropping the handle discards the result.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::domain::{AnalysisResult, DocumentAnalysis};
use crate::ports::{AnalyzerError, SymptomAnalyzer};
use crate::HeadwayError;

/// Default simulated backend latency.
pub const DEFAULT_LATENCY: Duration = Duration::from_millis(800);

/// Progress updates from the analysis worker.
#[derive(Debug, Clone)]
pub enum AnalysisProgress<T = AnalysisResult> {
    /// Request accepted, waiting on the backend
    Analyzing,
    /// Analysis finished
    Complete(T),
    /// Backend reported an error
    Failed(String),
}

/// Handle to a running analysis.
pub struct AnalysisWorkerHandle<T = AnalysisResult> {
    progress_rx: Receiver<AnalysisProgress<T>>,
    _handle: JoinHandle<()>,
}

impl<T> AnalysisWorkerHandle<T> {
    /// Try to receive the next progress update (non-blocking).
    #[must_use]
    pub fn try_recv(&self) -> Option<AnalysisProgress<T>> {
        self.progress_rx.try_recv().ok()
    }

    /// Block until the analysis finishes.
    ///
    /// # Errors
    /// Returns `HeadwayError::Worker` if the backend failed or the worker
    /// exited without reporting.
    pub fn wait(self) -> Result<T, HeadwayError> {
        loop {
            match self.progress_rx.recv() {
                Ok(AnalysisProgress::Analyzing) => continue,
                Ok(AnalysisProgress::Complete(value)) => return Ok(value),
                Ok(AnalysisProgress::Failed(message)) => return Err(HeadwayError::Worker(message)),
                Err(_) => {
                    return Err(HeadwayError::Worker(
                        "Analysis worker exited without a result".to_string(),
                    ))
                }
            }
        }
    }
}

/// Spawns analyses on background threads.
pub struct AnalysisWorker;

impl AnalysisWorker {
    /// Analyze a free-text description in the background.
    pub fn spawn<A>(analyzer: Arc<A>, text: String, latency: Duration) -> AnalysisWorkerHandle
    where
        A: SymptomAnalyzer + 'static,
    {
        Self::spawn_with(latency, move || analyzer.analyze(&text))
    }

    /// Analyze document text in the background.
    pub fn spawn_document<A>(
        analyzer: Arc<A>,
        text: String,
        latency: Duration,
    ) -> AnalysisWorkerHandle<DocumentAnalysis>
    where
        A: SymptomAnalyzer + 'static,
    {
        Self::spawn_with(latency, move || analyzer.analyze_document(&text))
    }

    fn spawn_with<T, F>(latency: Duration, job: F) -> AnalysisWorkerHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, AnalyzerError> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            Self::run_with_progress(latency, job, tx);
        });

        AnalysisWorkerHandle {
            progress_rx: rx,
            _handle: handle,
        }
    }

    fn run_with_progress<T, F>(latency: Duration, job: F, tx: Sender<AnalysisProgress<T>>)
    where
        F: FnOnce() -> Result<T, AnalyzerError>,
    {
        // Sends fail only when the handle was dropped; the result is discarded then.
        let _ = tx.send(AnalysisProgress::Analyzing);

        thread::sleep(latency);

        match job() {
            Ok(value) => {
                let _ = tx.send(AnalysisProgress::Complete(value));
            }
            Err(e) => {
                tracing::warn!("Background analysis failed: {}", e);
                let _ = tx.send(AnalysisProgress::Failed(e.to_string()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::rules::RuleBasedAnalyzer;
    use crate::domain::Taxonomy;

    fn seeded(seed: u64) -> Arc<RuleBasedAnalyzer> {
        Arc::new(RuleBasedAnalyzer::with_seed(
            Arc::new(Taxonomy::builtin().clone()),
            seed,
        ))
    }

    struct OfflineAnalyzer;

    impl SymptomAnalyzer for OfflineAnalyzer {
        fn backend_name(&self) -> &'static str {
            "offline"
        }

        fn analyze(&self, _text: &str) -> Result<AnalysisResult, AnalyzerError> {
            Err(AnalyzerError::Unavailable("backend offline".to_string()))
        }

        fn analyze_document(&self, _text: &str) -> Result<DocumentAnalysis, AnalyzerError> {
            Err(AnalyzerError::Unavailable("backend offline".to_string()))
        }
    }

    #[test]
    fn test_worker_matches_direct_call() {
        let text = "headache and repeated vomiting";
        let expected = seeded(5).analyze(text).expect("Should analyze");

        let handle = AnalysisWorker::spawn(seeded(5), text.to_string(), Duration::ZERO);
        let result = handle.wait().expect("Should complete");

        assert_eq!(result, expected);
        assert_eq!(result.red_flags, ["Repeated vomiting"]);
    }

    #[test]
    fn test_worker_reports_analyzing_first() {
        let handle = AnalysisWorker::spawn(
            seeded(1),
            "insomnia".to_string(),
            Duration::from_millis(50),
        );

        let first = handle.progress_rx.recv().expect("Should receive progress");
        assert!(matches!(first, AnalysisProgress::Analyzing));
        let result = handle.wait().expect("Should complete");
        assert_eq!(result.extracted_symptoms[0].name, "Insomnia");
    }

    #[test]
    fn test_poll_until_complete() {
        let handle = AnalysisWorker::spawn(
            seeded(3),
            "persistent nausea".to_string(),
            Duration::from_millis(20),
        );

        let mut updates = Vec::new();
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while std::time::Instant::now() < deadline {
            match handle.try_recv() {
                Some(AnalysisProgress::Complete(result)) => {
                    assert_eq!(result.extracted_symptoms[0].name, "Nausea");
                    updates.push("complete");
                    break;
                }
                Some(AnalysisProgress::Analyzing) => updates.push("analyzing"),
                Some(AnalysisProgress::Failed(message)) => panic!("Analysis failed: {message}"),
                None => thread::sleep(Duration::from_millis(5)),
            }
        }

        assert_eq!(updates, ["analyzing", "complete"]);
        assert!(handle.try_recv().is_none());
    }

    #[test]
    fn test_document_worker() {
        let handle = AnalysisWorker::spawn_document(
            seeded(2),
            "Mild neck pain reported.".to_string(),
            Duration::ZERO,
        );
        let doc = handle.wait().expect("Should complete");
        assert_eq!(doc.result.red_flags, ["Neck pain"]);
        assert!(!doc.document_summary.is_empty());
    }

    #[test]
    fn test_worker_failure() {
        let handle = AnalysisWorker::spawn(Arc::new(OfflineAnalyzer), "headache".to_string(), Duration::ZERO);
        let err = handle.wait().expect_err("Should fail");
        assert!(matches!(err, HeadwayError::Worker(msg) if msg.contains("backend offline")));
    }
}

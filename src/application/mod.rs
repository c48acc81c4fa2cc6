//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the core use cases of the application.

mod analysis;
mod progress;
mod worker;

pub use analysis::AnalysisService;
pub use progress::{Dashboard, FeedbackSummary, ProgressService, SeverityTrend, SymptomFrequency};
pub use worker::{AnalysisProgress, AnalysisWorker, AnalysisWorkerHandle, DEFAULT_LATENCY};

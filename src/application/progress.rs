//! Progress service: Recovery tracking over the stored symptom log.
//!
//! Aggregates the log into per-symptom frequencies and severity trends,
//! and records feedback on the recovery strategies.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::strategy::{self, RECOVERY_STRATEGIES};
use crate::domain::{Demographics, NewFeedback, NewSymptom, RecoveryFeedback, SymptomLogEntry, UserProfile};
use crate::ports::ProfileStore;
use crate::HeadwayError;

/// How often a symptom name appears in the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymptomFrequency {
    pub name: String,
    pub count: usize,
}

/// Severity history of one symptom name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeverityTrend {
    pub name: String,
    pub count: usize,
    pub average_severity: f64,
    pub first_severity: u8,
    pub latest_severity: u8,
    pub last_recorded: chrono::DateTime<chrono::Utc>,
}

impl SeverityTrend {
    /// Negative when the symptom is easing.
    #[must_use]
    pub fn change(&self) -> i16 {
        i16::from(self.latest_severity) - i16::from(self.first_severity)
    }
}

/// Helpful / not-helpful votes for one strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackSummary {
    pub strategy_id: String,
    pub strategy_name: String,
    pub helpful: usize,
    pub not_helpful: usize,
}

/// Everything the recovery dashboard shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub onboarding_complete: bool,
    pub total_symptoms: usize,
    pub frequencies: Vec<SymptomFrequency>,
    pub trends: Vec<SeverityTrend>,
    pub feedback: Vec<FeedbackSummary>,
}

/// Service for recovery-progress queries.
pub struct ProgressService<S>
where
    S: ProfileStore,
{
    store: Arc<S>,
}

impl<S> ProgressService<S>
where
    S: ProfileStore,
    S::Error: Into<crate::adapters::StorageError>,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    fn symptoms(&self) -> Result<Vec<SymptomLogEntry>, HeadwayError> {
        self.store
            .list_symptoms()
            .map_err(|e| HeadwayError::Storage(e.into()))
    }

    /// Validate and store the onboarding demographics.
    ///
    /// # Errors
    /// Returns a validation error listing every malformed field, or storage errors.
    pub fn save_demographics(&self, demographics: &Demographics) -> Result<(), HeadwayError> {
        demographics
            .validate()
            .map_err(|errors| HeadwayError::Validation(errors.join("; ")))?;

        self.store
            .save_demographics(demographics)
            .map_err(|e| HeadwayError::Storage(e.into()))
    }

    /// # Errors
    /// Returns error if storage fails.
    pub fn profile(&self) -> Result<UserProfile, HeadwayError> {
        self.store
            .load_profile()
            .map_err(|e| HeadwayError::Storage(e.into()))
    }

    /// Record a manually entered symptom.
    ///
    /// # Errors
    /// Returns a validation error for a blank name or out-of-range severity.
    pub fn log_symptom(&self, symptom: &NewSymptom) -> Result<SymptomLogEntry, HeadwayError> {
        symptom
            .validate()
            .map_err(|errors| HeadwayError::Validation(errors.join("; ")))?;

        self.store
            .append_symptom(symptom)
            .map_err(|e| HeadwayError::Storage(e.into()))
    }

    /// Count per symptom name, in first-seen order.
    ///
    /// # Errors
    /// Returns error if storage fails.
    pub fn symptom_frequency(&self) -> Result<Vec<SymptomFrequency>, HeadwayError> {
        let mut frequencies: Vec<SymptomFrequency> = Vec::new();

        for entry in self.symptoms()? {
            match frequencies.iter_mut().find(|f| f.name == entry.name) {
                Some(existing) => existing.count += 1,
                None => frequencies.push(SymptomFrequency {
                    name: entry.name,
                    count: 1,
                }),
            }
        }

        Ok(frequencies)
    }

    /// Severity history per symptom name, in first-seen order.
    ///
    /// # Errors
    /// Returns error if storage fails.
    pub fn severity_trends(&self) -> Result<Vec<SeverityTrend>, HeadwayError> {
        let mut grouped: Vec<(String, Vec<SymptomLogEntry>)> = Vec::new();

        for entry in self.symptoms()? {
            match grouped.iter_mut().find(|(name, _)| *name == entry.name) {
                Some((_, entries)) => entries.push(entry),
                None => grouped.push((entry.name.clone(), vec![entry])),
            }
        }

        let trends = grouped
            .into_iter()
            .filter_map(|(name, entries)| {
                let first = entries.first()?;
                let latest = entries.last()?;
                let total: u32 = entries.iter().map(|e| u32::from(e.severity)).sum();

                Some(SeverityTrend {
                    count: entries.len(),
                    average_severity: f64::from(total) / entries.len() as f64,
                    first_severity: first.severity,
                    latest_severity: latest.severity,
                    last_recorded: latest.recorded_at,
                    name,
                })
            })
            .collect();

        Ok(trends)
    }

    /// Record whether a recovery strategy helped.
    ///
    /// # Errors
    /// Returns a validation error for an unknown strategy id, or storage errors.
    pub fn record_feedback(&self, feedback: &NewFeedback) -> Result<RecoveryFeedback, HeadwayError> {
        if strategy::find(&feedback.strategy_id).is_none() {
            return Err(HeadwayError::Validation(format!(
                "Unknown recovery strategy: {}",
                feedback.strategy_id
            )));
        }

        let stored = self
            .store
            .add_recovery_feedback(feedback)
            .map_err(|e| HeadwayError::Storage(e.into()))?;

        tracing::info!(
            "Feedback recorded for {} (helpful: {})",
            stored.strategy_id,
            stored.helpful
        );
        Ok(stored)
    }

    /// Vote counts for every catalog strategy, in catalog order.
    ///
    /// # Errors
    /// Returns error if storage fails.
    pub fn feedback_summary(&self) -> Result<Vec<FeedbackSummary>, HeadwayError> {
        let feedback = self
            .store
            .list_recovery_feedback()
            .map_err(|e| HeadwayError::Storage(e.into()))?;

        let summary = RECOVERY_STRATEGIES
            .iter()
            .map(|strategy| {
                let votes = feedback.iter().filter(|f| f.strategy_id == strategy.id);
                let helpful = votes.clone().filter(|f| f.helpful).count();
                FeedbackSummary {
                    strategy_id: strategy.id.to_string(),
                    strategy_name: strategy.name.to_string(),
                    helpful,
                    not_helpful: votes.count() - helpful,
                }
            })
            .collect();

        Ok(summary)
    }

    /// # Errors
    /// Returns error if storage fails.
    pub fn dashboard(&self) -> Result<Dashboard, HeadwayError> {
        let onboarding_complete = self
            .store
            .is_onboarding_complete()
            .map_err(|e| HeadwayError::Storage(e.into()))?;
        let frequencies = self.symptom_frequency()?;

        Ok(Dashboard {
            onboarding_complete,
            total_symptoms: frequencies.iter().map(|f| f.count).sum(),
            frequencies,
            trends: self.severity_trends()?,
            feedback: self.feedback_summary()?,
        })
    }
}

//! Profile store port: Trait for persisting the user's profile.
//!
//! This trait abstracts the storage backend (SQLite) from the application logic.
//! The store owns identifiers and timestamps of everything it records.

use crate::domain::{
    Demographics, NewFeedback, NewSymptom, RecoveryFeedback, SymptomLogEntry, UserProfile,
};

/// A page of symptom log entries with pagination metadata.
#[derive(Debug, Clone)]
pub struct SymptomPage {
    /// Entries in this page, newest first
    pub items: Vec<SymptomLogEntry>,
    /// Total count of all entries
    pub total_count: usize,
    /// Current page offset
    pub offset: usize,
    /// Page size limit
    pub limit: usize,
    /// Whether there are more pages
    pub has_more: bool,
}

impl SymptomPage {
    #[must_use]
    pub fn new(items: Vec<SymptomLogEntry>, total_count: usize, offset: usize, limit: usize) -> Self {
        // An empty page size never advances, so it has no next page.
        let has_more = limit > 0 && offset + items.len() < total_count;
        Self {
            items,
            total_count,
            offset,
            limit,
            has_more,
        }
    }

    #[must_use]
    pub fn next_offset(&self) -> Option<usize> {
        if self.has_more {
            Some(self.offset + self.limit)
        } else {
            None
        }
    }

    #[must_use]
    pub fn prev_offset(&self) -> Option<usize> {
        if self.offset > 0 {
            Some(self.offset.saturating_sub(self.limit))
        } else {
            None
        }
    }
}

/// Trait for local profile storage.
///
/// All data is stored locally and never transmitted.
pub trait ProfileStore: Send + Sync {
    /// Error type for storage operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Save (replace) the demographic answers.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn save_demographics(&self, demographics: &Demographics) -> Result<(), Self::Error>;

    /// Load the demographic answers.
    ///
    /// # Returns
    /// `None` if onboarding never stored any.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn load_demographics(&self) -> Result<Option<Demographics>, Self::Error>;

    /// Append a symptom to the log, assigning its id and timestamp.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn append_symptom(&self, symptom: &NewSymptom) -> Result<SymptomLogEntry, Self::Error>;

    /// Replace an existing entry (matched by id).
    ///
    /// # Errors
    /// Returns error if the entry does not exist or storage fails.
    fn update_symptom(&self, entry: &SymptomLogEntry) -> Result<(), Self::Error>;

    /// Remove an entry by id.
    ///
    /// # Errors
    /// Returns error if the entry does not exist or storage fails.
    fn remove_symptom(&self, id: &str) -> Result<(), Self::Error>;

    /// All entries, oldest first.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn list_symptoms(&self) -> Result<Vec<SymptomLogEntry>, Self::Error>;

    /// Most recent entries (up to `limit`), newest first.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn load_recent_symptoms(&self, limit: usize) -> Result<Vec<SymptomLogEntry>, Self::Error>;

    /// Entries with pagination, newest first.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn load_symptoms_paginated(&self, offset: usize, limit: usize) -> Result<SymptomPage, Self::Error>;

    /// # Errors
    /// Returns error if storage operation fails.
    fn count_symptoms(&self) -> Result<usize, Self::Error>;

    /// Record feedback on a recovery strategy.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn add_recovery_feedback(&self, feedback: &NewFeedback) -> Result<RecoveryFeedback, Self::Error>;

    /// All feedback, oldest first.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn list_recovery_feedback(&self) -> Result<Vec<RecoveryFeedback>, Self::Error>;

    /// # Errors
    /// Returns error if storage operation fails.
    fn complete_onboarding(&self) -> Result<(), Self::Error>;

    /// # Errors
    /// Returns error if storage operation fails.
    fn is_onboarding_complete(&self) -> Result<bool, Self::Error>;

    /// Load the whole profile; missing demographics come back as defaults.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn load_profile(&self) -> Result<UserProfile, Self::Error> {
        Ok(UserProfile {
            demographics: self.load_demographics()?.unwrap_or_default(),
            symptoms: self.list_symptoms()?,
            recovery_feedback: self.list_recovery_feedback()?,
            onboarding_complete: self.is_onboarding_complete()?,
        })
    }

    /// Reset the profile to its defaults.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn clear_all(&self) -> Result<(), Self::Error>;
}

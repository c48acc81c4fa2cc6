//! User profile records: demographics, the symptom log and strategy feedback.

use chrono::{NaiveDate, SubsecRound};
use serde::{Deserialize, Serialize};

use super::analysis::ExtractedSymptom;

/// Lowest severity accepted in the symptom log.
pub const MIN_SEVERITY: u8 = 1;
/// Highest severity accepted in the symptom log.
pub const MAX_SEVERITY: u8 = 5;

/// Demographic answers from onboarding. Every field is free text and may be blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Demographics {
    pub age: String,
    pub gender: String,
    /// YYYY-MM-DD
    pub injury_date: String,
    pub injury_cause: String,
    pub previous_concussions: String,
}

impl Demographics {
    /// Validate the fields that have a fixed format.
    ///
    /// # Errors
    /// Returns validation errors as a vector of strings.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        let age = self.age.trim();
        if !age.is_empty() {
            match age.parse::<u8>() {
                Ok(years) if (1..=120).contains(&years) => {}
                _ => errors.push(format!("Age {age:?} out of range [1, 120]")),
            }
        }

        let injury_date = self.injury_date.trim();
        if !injury_date.is_empty() && NaiveDate::parse_from_str(injury_date, "%Y-%m-%d").is_err() {
            errors.push(format!("Injury date {injury_date:?} is not YYYY-MM-DD"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Where a set of extracted symptoms came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisSource {
    /// Free-text description typed by the user
    Description,
    /// Text extracted from an uploaded medical document
    Document,
}

/// A symptom about to be written to the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSymptom {
    pub name: String,
    pub severity: u8,
    pub notes: String,
}

impl NewSymptom {
    #[must_use]
    pub fn new(name: impl Into<String>, severity: u8, notes: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            severity,
            notes: notes.into(),
        }
    }

    /// Build a log entry from an analysis match, recording its category in the notes.
    #[must_use]
    pub fn from_extracted(
        symptom: &ExtractedSymptom,
        source: AnalysisSource,
        user_notes: Option<&str>,
    ) -> Self {
        let category = symptom.possible_category;
        let notes = match (source, user_notes.map(str::trim)) {
            (AnalysisSource::Document, _) => {
                format!("From document analysis. Category: {category}")
            }
            (AnalysisSource::Description, Some(user)) if !user.is_empty() => {
                format!("{user}\nCategory: {category}")
            }
            (AnalysisSource::Description, _) => format!("Category: {category}"),
        };
        Self::new(symptom.name.clone(), symptom.severity, notes)
    }

    /// # Errors
    /// Returns validation errors as a vector of strings.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push("Symptom name must not be empty".to_string());
        }
        if !(MIN_SEVERITY..=MAX_SEVERITY).contains(&self.severity) {
            errors.push(format!(
                "Severity {} out of range [{MIN_SEVERITY}, {MAX_SEVERITY}]",
                self.severity
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// A persisted symptom log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymptomLogEntry {
    pub id: String,
    pub name: String,
    pub severity: u8,
    pub notes: String,
    pub recorded_at: chrono::DateTime<chrono::Utc>,
}

impl SymptomLogEntry {
    /// Assign a fresh identifier and the current time to a new symptom.
    #[must_use]
    pub fn record(symptom: &NewSymptom) -> Self {
        Self {
            id: uuid_v4(),
            name: symptom.name.clone(),
            severity: symptom.severity,
            notes: symptom.notes.clone(),
            recorded_at: recorded_now(),
        }
    }
}

/// Feedback on a recovery strategy, before it is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFeedback {
    pub strategy_id: String,
    pub helpful: bool,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryFeedback {
    pub strategy_id: String,
    pub helpful: bool,
    pub notes: String,
    pub recorded_at: chrono::DateTime<chrono::Utc>,
}

impl RecoveryFeedback {
    #[must_use]
    pub fn record(feedback: &NewFeedback) -> Self {
        Self {
            strategy_id: feedback.strategy_id.clone(),
            helpful: feedback.helpful,
            notes: feedback.notes.clone(),
            recorded_at: recorded_now(),
        }
    }
}

/// Current time at microsecond precision, the resolution stores keep.
fn recorded_now() -> chrono::DateTime<chrono::Utc> {
    chrono::Utc::now().trunc_subsecs(6)
}

/// Everything stored for the local user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub demographics: Demographics,
    pub symptoms: Vec<SymptomLogEntry>,
    pub recovery_feedback: Vec<RecoveryFeedback>,
    pub onboarding_complete: bool,
}

/// Generate a random UUID v4 string.
///
/// Uses ChaCha20Rng seeded from OS entropy.
fn uuid_v4() -> String {
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    let mut rng = ChaCha20Rng::from_entropy();
    let bytes: [u8; 16] = rng.gen();

    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3],
        bytes[4], bytes[5],
        (bytes[6] & 0x0f) | 0x40, bytes[7],
        (bytes[8] & 0x3f) | 0x80, bytes[9],
        bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15]
    )
}

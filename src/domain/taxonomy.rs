//! Symptom taxonomy: the closed catalog of known concussion symptoms.
//!
//! The catalog is read-only once built. The bundled table is initialized the
//! first time [`Taxonomy::builtin`] is called; deployments may instead load a
//! versioned data file at startup with [`Taxonomy::load`].

use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Version stamped on the bundled table and on exported data files.
pub const BUILTIN_VERSION: u32 = 1;

/// Marker appended to red-flag symptom names for display.
pub const RED_FLAG_MARKER: &str = "⚠️";

static BUILTIN: OnceLock<Taxonomy> = OnceLock::new();

/// Errors raised while building or loading a taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum TaxonomyError {
    #[error("Duplicate symptom id: {0}")]
    DuplicateId(String),

    #[error("Symptom definition has an empty {0}")]
    EmptyField(&'static str),

    #[error("Unknown symptom category: {0}")]
    UnknownCategory(String),

    #[error("Invalid taxonomy file: {0}")]
    Format(#[from] serde_json::Error),

    #[error("Cannot read taxonomy file: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level symptom category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymptomCategory {
    Physical,
    Cognitive,
    Emotional,
    Sleep,
    Behavioral,
    Other,
}

impl SymptomCategory {
    /// All categories, in display order.
    pub const ALL: [SymptomCategory; 6] = [
        Self::Physical,
        Self::Cognitive,
        Self::Emotional,
        Self::Sleep,
        Self::Behavioral,
        Self::Other,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Physical => "Physical",
            Self::Cognitive => "Cognitive",
            Self::Emotional => "Emotional",
            Self::Sleep => "Sleep",
            Self::Behavioral => "Behavioral",
            Self::Other => "Other",
        }
    }
}

impl std::fmt::Display for SymptomCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SymptomCategory {
    type Err = TaxonomyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| TaxonomyError::UnknownCategory(s.to_string()))
    }
}

/// One entry of the taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymptomDefinition {
    /// Stable identifier, unique across the taxonomy
    pub id: String,

    /// Canonical display name
    pub name: String,

    pub category: SymptomCategory,

    /// Finer-grained grouping such as "Vision" or "Hearing"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Symptom that warrants urgent-care guidance
    #[serde(default)]
    pub is_red_flag: bool,
}

impl SymptomDefinition {
    /// Create a plain (non red-flag) definition.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, category: SymptomCategory) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            subcategory: None,
            description: None,
            is_red_flag: false,
        }
    }

    #[must_use]
    pub fn with_subcategory(mut self, subcategory: impl Into<String>) -> Self {
        self.subcategory = Some(subcategory.into());
        self
    }

    #[must_use]
    pub fn red_flag(mut self) -> Self {
        self.is_red_flag = true;
        self
    }

    /// Name with the warning marker appended for red-flag symptoms.
    #[must_use]
    pub fn format_display_name(&self) -> String {
        if self.is_red_flag {
            format!("{} {RED_FLAG_MARKER}", self.name)
        } else {
            self.name.clone()
        }
    }

    /// Lower-cased whitespace-separated words of the name.
    pub(crate) fn keywords(&self) -> impl Iterator<Item = String> + '_ {
        self.name.split_whitespace().map(str::to_lowercase)
    }
}

/// On-disk layout of a taxonomy data file.
#[derive(Debug, Serialize, Deserialize)]
struct TaxonomyFile {
    version: u32,
    symptoms: Vec<SymptomDefinition>,
}

/// Validated, ordered symptom catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Taxonomy {
    version: u32,
    entries: Vec<SymptomDefinition>,
}

impl Taxonomy {
    /// The bundled concussion symptom catalog.
    pub fn builtin() -> &'static Taxonomy {
        BUILTIN.get_or_init(|| Taxonomy {
            version: BUILTIN_VERSION,
            entries: builtin_definitions(),
        })
    }

    /// Build a taxonomy from definitions, checking identifiers and names.
    ///
    /// # Errors
    /// Returns error on empty ids/names or duplicate ids.
    pub fn from_definitions(
        version: u32,
        entries: Vec<SymptomDefinition>,
    ) -> Result<Self, TaxonomyError> {
        let mut seen = HashSet::with_capacity(entries.len());
        for def in &entries {
            if def.id.trim().is_empty() {
                return Err(TaxonomyError::EmptyField("id"));
            }
            if def.name.trim().is_empty() {
                return Err(TaxonomyError::EmptyField("name"));
            }
            if !seen.insert(def.id.as_str()) {
                return Err(TaxonomyError::DuplicateId(def.id.clone()));
            }
        }
        Ok(Self { version, entries })
    }

    /// Parse a taxonomy data file.
    ///
    /// # Errors
    /// Returns error if the JSON is malformed, names an unknown category,
    /// or fails validation.
    pub fn from_json(json: &str) -> Result<Self, TaxonomyError> {
        let file: TaxonomyFile = serde_json::from_str(json)?;
        Self::from_definitions(file.version, file.symptoms)
    }

    /// Load a taxonomy data file from disk.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TaxonomyError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let taxonomy = Self::from_json(&json)?;
        tracing::info!(
            "Loaded taxonomy v{} with {} symptoms from {:?}",
            taxonomy.version,
            taxonomy.len(),
            path.as_ref()
        );
        Ok(taxonomy)
    }

    /// Serialize in the data file format.
    ///
    /// # Errors
    /// Returns error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, TaxonomyError> {
        let file = TaxonomyFile {
            version: self.version,
            symptoms: self.entries.clone(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    #[must_use]
    pub fn version(&self) -> u32 {
        self.version
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Definitions in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, SymptomDefinition> {
        self.entries.iter()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&SymptomDefinition> {
        self.entries.iter().find(|d| d.id == id)
    }

    /// All definitions of a category, in declaration order.
    #[must_use]
    pub fn list_by_category(&self, category: SymptomCategory) -> Vec<&SymptomDefinition> {
        self.entries
            .iter()
            .filter(|d| d.category == category)
            .collect()
    }

    /// All red-flag definitions, in declaration order.
    #[must_use]
    pub fn list_red_flags(&self) -> Vec<&SymptomDefinition> {
        self.entries.iter().filter(|d| d.is_red_flag).collect()
    }
}

impl<'a> IntoIterator for &'a Taxonomy {
    type Item = &'a SymptomDefinition;
    type IntoIter = std::slice::Iter<'a, SymptomDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn builtin_definitions() -> Vec<SymptomDefinition> {
    use SymptomCategory::{Behavioral, Cognitive, Emotional, Other, Physical, Sleep};
    let def = SymptomDefinition::new;

    vec![
        // Physical
        def("headache", "Headache", Physical),
        def("dizziness", "Dizziness or light headedness", Physical),
        def("vertigo", "Vertigo or dizzy spells", Physical),
        def("balance-problems", "Balance problems", Physical),
        def("blurred-vision", "Blurred vision", Physical).with_subcategory("Vision"),
        def("double-vision", "Double vision", Physical).with_subcategory("Vision"),
        def("eye-strain", "Eye strain", Physical).with_subcategory("Vision"),
        def("light-sensitivity", "Sensitivity to bright light", Physical).with_subcategory("Vision"),
        def("distance-judgment", "Trouble judging distances", Physical).with_subcategory("Vision"),
        def("vision-change", "Change in vision generally", Physical).with_subcategory("Vision"),
        def("noise-sensitivity", "Sensitivity to noise", Physical).with_subcategory("Hearing"),
        def("tinnitus", "Ringing in the ears", Physical).with_subcategory("Hearing"),
        def("hearing-problems", "Problems hearing", Physical).with_subcategory("Hearing"),
        def("fatigue", "Fatigue or low energy", Physical),
        def("weakness", "Weakness", Physical),
        def("nausea", "Nausea", Physical),
        def("neck-pain", "Neck pain", Physical).red_flag(),
        def("general-pain", "General pain", Physical),
        // Cognitive
        def("attention-problems", "Difficulties with attention or concentration", Cognitive),
        def("processing-speed", "Processing speed issues", Cognitive),
        def("learning-difficulties", "Learning difficulties", Cognitive),
        def("memory-problems", "Memory problems or forgetfulness", Cognitive),
        def("executive-function", "Executive function problems", Cognitive),
        def("mental-state-change", "Alteration in mental state", Cognitive),
        def("confusion", "Confusion", Cognitive),
        def("disorientation", "Disorientation", Cognitive),
        def("slowed-thinking", "Slowed thinking", Cognitive),
        def("foggy-feeling", "Feeling in a fog or dazed", Cognitive),
        def("word-finding", "Difficulty finding words", Cognitive),
        def("general-cognition", "Impaired cognition generally", Cognitive),
        // Emotional
        def("emotional", "Feeling more emotional", Emotional),
        def("sadness", "Sadness", Emotional),
        def("nervousness", "Nervousness or anxiety", Emotional),
        def("worry", "Excessive worry", Emotional),
        def("stress", "Feeling stressed out", Emotional),
        def("tension", "Tension", Emotional),
        def("overwhelmed", "Feeling overwhelmed", Emotional),
        def("irritability", "Irritability", Emotional),
        def("anger", "Anger or frustration", Emotional),
        def("not-yourself", "Feeling not yourself", Emotional),
        def("mood-disturbances", "Disturbances in mood", Emotional),
        // Sleep
        def("insomnia", "Insomnia", Sleep),
        def("hypersomnia", "Hypersomnia (excessive sleeping)", Sleep),
        def("sleep-apnea", "Sleep apnea", Sleep),
        def("poor-sleep", "Poor sleep maintenance", Sleep),
        def("early-awakening", "Early awakening", Sleep),
        def("delayed-sleep", "Delayed sleep onset", Sleep),
        def("circadian-changes", "Alterations in circadian cycle", Sleep),
        def("increased-sleep", "Sleeping more than usual", Sleep),
        def("drowsiness", "Drowsiness", Sleep),
        def("falling-asleep", "Problems falling asleep", Sleep),
        def("staying-asleep", "Problems staying asleep", Sleep),
        // Behavioral
        def("behavioral-changes", "Behavioral changes", Behavioral),
        def("lability", "Emotional lability", Behavioral),
        def("agitation", "Agitation", Behavioral),
        // Other indicators
        def("consciousness-loss", "Loss of consciousness", Other).red_flag(),
        def("amnesia", "Post-traumatic amnesia", Other),
        def("delusions", "Delusions", Other),
        def("hallucinations", "Hallucinations", Other),
        def("perceptual-issues", "Perceptual disturbances", Other),
        def("confabulation", "Confabulation", Other),
        def("convulsions", "Convulsions", Other).red_flag(),
        def("worsening-headaches", "Worsening headaches", Other).red_flag(),
        def("repeated-vomiting", "Repeated vomiting", Other).red_flag(),
    ]
}

//! Rule-based symptom analysis.
//!
//! Scans free text against the taxonomy with case-insensitive substring
//! matching and derives category-based advice. This stands in for a real
//! language-model backend; see `ports::SymptomAnalyzer` for the seam.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::taxonomy::{SymptomCategory, Taxonomy};

/// Name of the placeholder symptom returned when nothing matched.
pub const UNSPECIFIED_SYMPTOMS: &str = "Unspecified Symptoms";

/// Severity of the placeholder symptom.
pub const UNSPECIFIED_SEVERITY: u8 = 1;

/// Keywords of this length or shorter never count as a match.
const MIN_KEYWORD_LEN: usize = 3;

pub const URGENT_CARE_ADVICE: &str = "Some of your symptoms may need urgent medical attention. \
     Contact a healthcare provider or seek emergency care right away";
pub const PHYSICAL_ADVICE: &str =
    "Limit physical exertion and return to activity gradually as symptoms allow";
pub const HEADACHE_ADVICE: &str = "Consider rest in a dark, quiet room for headache relief";
pub const BALANCE_ADVICE: &str =
    "Avoid sudden movements, stay hydrated and use handrails on stairs";
pub const SLEEP_ADVICE: &str = "Prioritize regular sleep and take brief naps if needed";
pub const COGNITIVE_ADVICE: &str =
    "Try breaking tasks into smaller steps and take frequent breaks";
pub const EMOTIONAL_ADVICE: &str = "Talk to someone you trust about your feelings";
pub const MONITOR_ADVICE: &str =
    "Continue to monitor your symptoms and report any changes to your doctor";
pub const REST_ADVICE: &str = "Make sure to get adequate rest and stay hydrated";

/// A symptom recognized in free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedSymptom {
    pub name: String,

    /// 1 for the placeholder, 2..=4 for real matches
    pub severity: u8,

    pub possible_category: SymptomCategory,
}

impl ExtractedSymptom {
    /// The placeholder returned when the text matched no definition.
    #[must_use]
    pub fn unspecified() -> Self {
        Self {
            name: UNSPECIFIED_SYMPTOMS.to_string(),
            severity: UNSPECIFIED_SEVERITY,
            possible_category: SymptomCategory::Other,
        }
    }
}

/// Output of one analysis call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Matches in taxonomy order; never empty
    pub extracted_symptoms: Vec<ExtractedSymptom>,

    /// Advice strings in priority order; never empty
    pub recommendations: Vec<String>,

    /// Names of matched red-flag symptoms
    pub red_flags: Vec<String>,
}

impl AnalysisResult {
    /// Whether the text matched nothing and only the placeholder is present.
    #[must_use]
    pub fn is_unspecified(&self) -> bool {
        matches!(self.extracted_symptoms.as_slice(), [only] if *only == ExtractedSymptom::unspecified())
    }

    #[must_use]
    pub fn has_red_flags(&self) -> bool {
        !self.red_flags.is_empty()
    }

    /// Group symptoms by category, categories in order of first appearance.
    #[must_use]
    pub fn symptoms_by_category(&self) -> Vec<(SymptomCategory, Vec<&ExtractedSymptom>)> {
        let mut groups: Vec<(SymptomCategory, Vec<&ExtractedSymptom>)> = Vec::new();
        for symptom in &self.extracted_symptoms {
            match groups
                .iter_mut()
                .find(|(category, _)| *category == symptom.possible_category)
            {
                Some((_, members)) => members.push(symptom),
                None => groups.push((symptom.possible_category, vec![symptom])),
            }
        }
        groups
    }
}

/// Analysis of an uploaded document: the regular result plus a short summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentAnalysis {
    #[serde(flatten)]
    pub result: AnalysisResult,

    pub document_summary: String,
}

/// Match `text` against every definition and derive advice.
///
/// Severity of each match is drawn uniformly from 2..=4 using `rng`.
pub fn analyze<R: Rng + ?Sized>(text: &str, taxonomy: &Taxonomy, rng: &mut R) -> AnalysisResult {
    let normalized = text.to_lowercase();
    let mut extracted_symptoms = Vec::new();
    let mut red_flags = Vec::new();

    for definition in taxonomy {
        let matched = definition.keywords().any(|keyword| {
            keyword.chars().count() > MIN_KEYWORD_LEN && normalized.contains(&keyword)
        });
        if !matched {
            continue;
        }

        extracted_symptoms.push(ExtractedSymptom {
            name: definition.name.clone(),
            severity: rng.gen_range(2..=4),
            possible_category: definition.category,
        });
        if definition.is_red_flag {
            red_flags.push(definition.name.clone());
        }
    }

    let mut recommendations = category_advice(&extracted_symptoms);
    if recommendations.is_empty() {
        recommendations.push(MONITOR_ADVICE.to_string());
        recommendations.push(REST_ADVICE.to_string());
    }
    if !red_flags.is_empty() {
        recommendations.insert(0, URGENT_CARE_ADVICE.to_string());
    }

    if extracted_symptoms.is_empty() {
        extracted_symptoms.push(ExtractedSymptom::unspecified());
    }

    tracing::debug!(
        matched = extracted_symptoms.len(),
        red_flags = red_flags.len(),
        "Symptom analysis complete"
    );

    AnalysisResult {
        extracted_symptoms,
        recommendations,
        red_flags,
    }
}

/// Analyze a document's text and attach a summary of the findings.
pub fn analyze_document<R: Rng + ?Sized>(
    text: &str,
    taxonomy: &Taxonomy,
    rng: &mut R,
) -> DocumentAnalysis {
    let result = analyze(text, taxonomy, rng);
    let document_summary = summarize(&result);
    DocumentAnalysis {
        result,
        document_summary,
    }
}

/// One-paragraph description of an analysis result.
#[must_use]
pub fn summarize(result: &AnalysisResult) -> String {
    if result.is_unspecified() {
        return "No specific concussion symptoms were identified in this document.".to_string();
    }

    let count = result.extracted_symptoms.len();
    let categories: Vec<String> = result
        .symptoms_by_category()
        .iter()
        .map(|(category, _)| category.as_str().to_lowercase())
        .collect();

    let mut summary = format!(
        "Identified {count} potential symptom{} across {} categor{}: {}.",
        if count == 1 { "" } else { "s" },
        categories.len(),
        if categories.len() == 1 { "y" } else { "ies" },
        categories.join(", ")
    );
    match result.red_flags.len() {
        0 => {}
        1 => summary.push_str(" 1 symptom may require immediate medical attention."),
        n => summary.push_str(&format!(" {n} symptoms may require immediate medical attention.")),
    }
    summary
}

// Checks run in a fixed order; each contributes at most one string.
fn category_advice(symptoms: &[ExtractedSymptom]) -> Vec<String> {
    let in_category = |category: SymptomCategory| {
        symptoms.iter().any(|s| s.possible_category == category)
    };
    let name_contains = |needles: &[&str]| {
        symptoms.iter().any(|s| {
            let name = s.name.to_lowercase();
            needles.iter().any(|needle| name.contains(needle))
        })
    };

    let checks = [
        (in_category(SymptomCategory::Physical), PHYSICAL_ADVICE),
        (name_contains(&["headache", "pain"][..]), HEADACHE_ADVICE),
        (name_contains(&["dizz", "balance"][..]), BALANCE_ADVICE),
        (in_category(SymptomCategory::Sleep), SLEEP_ADVICE),
        (in_category(SymptomCategory::Cognitive), COGNITIVE_ADVICE),
        (in_category(SymptomCategory::Emotional), EMOTIONAL_ADVICE),
    ];

    checks
        .into_iter()
        .filter(|(fired, _)| *fired)
        .map(|(_, advice)| advice.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::taxonomy::SymptomDefinition;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    fn run(text: &str) -> AnalysisResult {
        analyze(text, Taxonomy::builtin(), &mut rng())
    }

    fn names(result: &AnalysisResult) -> Vec<&str> {
        result
            .extracted_symptoms
            .iter()
            .map(|s| s.name.as_str())
            .collect()
    }

    #[test]
    fn test_headache_and_dizziness() {
        let result = run("I have a bad headache and feel dizzy");

        assert_eq!(names(&result), ["Headache", "Vertigo or dizzy spells"]);
        assert!(result
            .extracted_symptoms
            .iter()
            .all(|s| s.possible_category == SymptomCategory::Physical));
        assert_eq!(
            result.recommendations,
            [PHYSICAL_ADVICE, HEADACHE_ADVICE, BALANCE_ADVICE]
        );
        assert!(result.red_flags.is_empty());
    }

    #[test]
    fn test_empty_text_returns_placeholder() {
        let result = run("");

        assert_eq!(result.extracted_symptoms, vec![ExtractedSymptom::unspecified()]);
        assert!(result.is_unspecified());
        assert_eq!(result.recommendations, [MONITOR_ADVICE, REST_ADVICE]);
        assert!(result.red_flags.is_empty());
    }

    #[test]
    fn test_unmatched_text_returns_placeholder() {
        for text in ["ok", "the cat sat on a mat", "nothing to report", "I had a convulsion"] {
            let result = run(text);
            assert!(result.is_unspecified(), "{text:?} should not match");
            assert_eq!(result.recommendations.len(), 2);
            assert!(!result.has_red_flags());
        }
    }

    #[test]
    fn test_repeated_vomiting_is_red_flag() {
        let result = run("I've had repeated vomiting since the fall");

        assert_eq!(result.red_flags, ["Repeated vomiting"]);
        assert_eq!(result.recommendations[0], URGENT_CARE_ADVICE);
        assert_eq!(
            result.extracted_symptoms[0].possible_category,
            SymptomCategory::Other
        );
        // Other-category matches trigger no category advice, so the fallback follows.
        assert_eq!(
            result.recommendations,
            [URGENT_CARE_ADVICE, MONITOR_ADVICE, REST_ADVICE]
        );
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(names(&run("NAUSEA all morning")), ["Nausea"]);
    }

    #[test]
    fn test_short_keywords_ignored() {
        // "eye" from "Eye strain" is too short to count on its own.
        let result = run("my eye is red");
        assert!(result.is_unspecified());
    }

    #[test]
    fn test_substring_false_positive_preserved() {
        // "than" (from "Sleeping more than usual") occurs inside "thanks".
        assert_eq!(names(&run("I am fine thanks")), ["Sleeping more than usual"]);
    }

    #[test]
    fn test_pain_triggers_headache_advice() {
        let result = run("My neck hurts and there is pain");

        assert_eq!(names(&result), ["Neck pain", "General pain"]);
        assert_eq!(result.red_flags, ["Neck pain"]);
        assert_eq!(
            result.recommendations,
            [URGENT_CARE_ADVICE, PHYSICAL_ADVICE, HEADACHE_ADVICE]
        );
    }

    #[test]
    fn test_recommendation_priority_order() {
        let result = run("trouble with memory and focus, can't sleep, feeling stressed");

        assert_eq!(
            result.recommendations,
            [PHYSICAL_ADVICE, SLEEP_ADVICE, COGNITIVE_ADVICE, EMOTIONAL_ADVICE]
        );
    }

    #[test]
    fn test_severity_range_and_determinism() {
        let text = "headache, nausea, confusion, insomnia, agitation and sadness";
        let first = analyze(text, Taxonomy::builtin(), &mut ChaCha8Rng::seed_from_u64(42));
        let second = analyze(text, Taxonomy::builtin(), &mut ChaCha8Rng::seed_from_u64(42));

        assert_eq!(first, second);
        assert!(first
            .extracted_symptoms
            .iter()
            .all(|s| (2..=4).contains(&s.severity)));
    }

    #[test]
    fn test_matches_follow_taxonomy_order() {
        // Text mentions cognition before headache; output follows the table.
        let result = run("confusion first, then a headache");
        assert_eq!(names(&result), ["Headache", "Confusion"]);
    }

    #[test]
    fn test_custom_taxonomy() {
        let taxonomy = Taxonomy::from_definitions(
            1,
            vec![SymptomDefinition::new("seizure", "Seizure activity", SymptomCategory::Other)
                .red_flag()],
        )
        .expect("Should build");
        let result = analyze("possible seizure", &taxonomy, &mut rng());

        assert_eq!(result.red_flags, ["Seizure activity"]);
        assert_eq!(result.recommendations[0], URGENT_CARE_ADVICE);
    }

    #[test]
    fn test_keyword_length_counts_characters() {
        // "été" is three characters but five bytes.
        let taxonomy = Taxonomy::from_definitions(
            1,
            vec![SymptomDefinition::new("fievre", "Fièvre été", SymptomCategory::Physical)],
        )
        .expect("Should build");

        assert!(analyze("un été chaud", &taxonomy, &mut rng()).is_unspecified());
        let result = analyze("une fièvre légère", &taxonomy, &mut rng());
        assert_eq!(names(&result), ["Fièvre été"]);
    }

    #[test]
    fn test_symptoms_by_category_groups_in_first_seen_order() {
        let result = run("headache, confusion and nausea");
        let groups: Vec<(SymptomCategory, usize)> = result
            .symptoms_by_category()
            .iter()
            .map(|(c, members)| (*c, members.len()))
            .collect();

        assert_eq!(
            groups,
            [(SymptomCategory::Physical, 2), (SymptomCategory::Cognitive, 1)]
        );
    }

    #[test]
    fn test_document_summary() {
        let doc = analyze_document("Reports neck pain and confusion", Taxonomy::builtin(), &mut rng());
        assert_eq!(
            doc.document_summary,
            "Identified 3 potential symptoms across 2 categories: physical, cognitive. \
             1 symptom may require immediate medical attention."
        );

        let empty = analyze_document("", Taxonomy::builtin(), &mut rng());
        assert!(empty.document_summary.starts_with("No specific"));
    }

    #[test]
    fn test_serialized_field_names() {
        let json = serde_json::to_value(run("")).expect("Should serialize");
        assert_eq!(json["extractedSymptoms"][0]["possibleCategory"], "Other");
        assert!(json["redFlags"].as_array().is_some());
    }
}

//! Classification Types
//!
//! Modes, phases and the result value handed to the result sink.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::metadata::ValidationOutcome;
use crate::ontology::RequiredField;
use crate::risk::RiskLevel;

/// Class id of a document no phase could place
pub const UNCLASSIFIED: &str = "UNCLASSIFIED";
pub const UNCLASSIFIED_LABEL: &str = "Unclassified";

/// Method tags
pub const METHOD_TAXONOMY: &str = "taxonomy";
pub const METHOD_ML: &str = "ml";
pub const METHOD_ONTOLOGY: &str = "ontology";
pub const METHOD_ERROR: &str = "error";
pub const METHOD_NO_MATCH: &str = "no_match";

/// Which phases run for a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationMode {
    /// Taxonomy keywords only
    Fast,
    /// Taxonomy, then the ML classifier
    Ml,
    /// Taxonomy, ML and ontology, with validation and risk inference
    Precise,
    /// Taxonomy first; stops there when confident, otherwise as `Precise`
    #[default]
    Intelligent,
}

impl ClassificationMode {
    pub const ALL: [ClassificationMode; 4] = [
        ClassificationMode::Fast,
        ClassificationMode::Ml,
        ClassificationMode::Precise,
        ClassificationMode::Intelligent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClassificationMode::Fast => "fast",
            ClassificationMode::Ml => "ml",
            ClassificationMode::Precise => "precise",
            ClassificationMode::Intelligent => "intelligent",
        }
    }
}

impl fmt::Display for ClassificationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClassificationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fast" => Ok(ClassificationMode::Fast),
            "ml" => Ok(ClassificationMode::Ml),
            "precise" => Ok(ClassificationMode::Precise),
            "intelligent" => Ok(ClassificationMode::Intelligent),
            other => Err(format!(
                "unknown classification mode '{}' (expected fast, ml, precise or intelligent)",
                other
            )),
        }
    }
}

/// One stage of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Taxonomy,
    Ml,
    Ontology,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Taxonomy => "taxonomy",
            Phase::Ml => "ml",
            Phase::Ontology => "ontology",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A phase failure caught during classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseFailure {
    pub phase: Phase,
    pub message: String,
}

/// Outcome of classifying one document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub class_id: String,
    pub label: String,
    /// Always within [0.0, 1.0]
    pub confidence: f64,
    /// e.g. "taxonomy", "taxonomy+ml", "taxonomy+ml+ontology"
    pub method: String,
    /// Phases that executed, in order
    pub phases_used: Vec<Phase>,
    pub classification_mode: ClassificationMode,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_keywords: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taxonomy_path: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ml_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ml_confidence: Option<f64>,

    /// Present only when the ontology phase ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ontology_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ontology_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ontology_confidence: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_validation: Option<ValidationOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_fields: Option<Vec<RequiredField>>,
    /// Present only when risk inference ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inferred_risk_level: Option<RiskLevel>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub phase_errors: Vec<PhaseFailure>,
}

impl ClassificationResult {
    pub fn is_unclassified(&self) -> bool {
        self.class_id == UNCLASSIFIED
    }

    pub fn used(&self, phase: Phase) -> bool {
        self.phases_used.contains(&phase)
    }
}

/// A keyword located in the document text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Evidence {
    pub keyword: String,
    /// Up to 50 characters either side of the keyword
    pub excerpt: String,
}

/// Why a document received its class
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    pub class_id: String,
    pub label: String,
    pub confidence: f64,
    pub method: String,
    pub matched_keywords: Vec<String>,
    pub evidence: Vec<Evidence>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parse_and_display() {
        for mode in ClassificationMode::ALL {
            assert_eq!(mode.to_string().parse::<ClassificationMode>().unwrap(), mode);
        }
        assert_eq!("PRECISE".parse::<ClassificationMode>().unwrap(), ClassificationMode::Precise);
        assert!("turbo".parse::<ClassificationMode>().is_err());
        assert_eq!(ClassificationMode::default(), ClassificationMode::Intelligent);
    }

    #[test]
    fn test_wire_forms() {
        assert_eq!(serde_json::to_string(&ClassificationMode::Ml).unwrap(), "\"ml\"");
        assert_eq!(serde_json::to_string(&Phase::Ontology).unwrap(), "\"ontology\"");
    }
}

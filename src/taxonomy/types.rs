//! Taxonomy Type Definitions
//!
//! Node definitions as they appear in the taxonomy document, plus the
//! read-model shapes returned by the index.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::risk::RiskLevel;

/// A class in the document taxonomy (from YAML/JSON)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonomyNode {
    /// Class identifier (e.g., "PRESTAMO_PERSONAL"); taken from the map key
    #[serde(default)]
    pub id: String,

    /// Human-readable label
    pub label: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Depth in the tree (root = 0)
    #[serde(default)]
    pub level: u32,

    /// Parent class id (None only for the root)
    #[serde(default)]
    pub parent: Option<String>,

    /// Child class ids; empty for leaves
    #[serde(default)]
    pub children: Vec<String>,

    #[serde(default)]
    pub required_fields: Vec<String>,

    #[serde(default)]
    pub optional_fields: Vec<String>,

    #[serde(default = "default_retention_years")]
    pub retention_years: u32,

    #[serde(default)]
    pub risk_level: RiskLevel,

    #[serde(default)]
    pub is_sensitive: bool,

    /// Keywords used by the fast classification phase
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Applicable regulations (e.g., "GDPR", "Ley 5/2019")
    #[serde(default)]
    pub compliance_regulations: Vec<String>,

    #[serde(default)]
    pub validation_rules: ValidationRules,

    /// Classes whose documents typically accompany this one
    #[serde(default, alias = "related_document_ids")]
    pub related_documents: Vec<String>,

    /// Lowercased keywords, computed at load
    #[serde(skip)]
    pub(crate) keywords_lower: Vec<String>,
}

impl TaxonomyNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

pub(crate) fn default_retention_years() -> u32 {
    5
}

/// Numeric bounds checked against document metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationRules {
    #[serde(default, alias = "amount_min", skip_serializing_if = "Option::is_none")]
    pub importe_minimo: Option<f64>,

    #[serde(default, alias = "amount_max", skip_serializing_if = "Option::is_none")]
    pub importe_maximo: Option<f64>,

    #[serde(default, alias = "term_min", skip_serializing_if = "Option::is_none")]
    pub plazo_minimo_meses: Option<f64>,

    #[serde(default, alias = "term_max", skip_serializing_if = "Option::is_none")]
    pub plazo_maximo_meses: Option<f64>,
}

impl ValidationRules {
    pub fn is_empty(&self) -> bool {
        self.importe_minimo.is_none()
            && self.importe_maximo.is_none()
            && self.plazo_minimo_meses.is_none()
            && self.plazo_maximo_meses.is_none()
    }
}

/// The `metadata` block describing the taxonomy itself
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxonomyMetadata {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub max_depth: u32,

    #[serde(default)]
    pub description: Option<String>,
}

// =============================================================================
// READ MODELS
// =============================================================================

/// Search hit with its full path
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub label: String,
    pub level: u32,
    pub description: Option<String>,
    pub path: String,
}

/// A field requirement of a class
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: String,
    pub required: bool,
}

/// Required + optional fields of a class
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassFields {
    pub required: Vec<FieldSpec>,
    pub optional: Vec<FieldSpec>,
}

/// Nested view of the taxonomy
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HierarchyNode {
    pub id: String,
    pub label: String,
    pub level: u32,
    pub description: Option<String>,
    pub children: Vec<HierarchyNode>,
}

/// A leaf class scored by keyword overlap with a text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordMatch {
    pub class_id: String,
    pub label: String,
    pub path: String,
    pub confidence: f64,
    pub matches: usize,
    pub matched_keywords: Vec<String>,
}

/// Aggregate counts over the taxonomy
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaxonomyStatistics {
    pub total_classes: usize,
    pub classes_by_level: BTreeMap<u32, usize>,
    pub classes_by_risk: BTreeMap<RiskLevel, usize>,
    pub sensitive_classes: usize,
    pub max_depth: u32,
    pub leaf_classes: usize,
}

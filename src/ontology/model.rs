//! Ontology data model
//!
//! Terms and triples as read from the Turtle source, plus the class records
//! and read models exposed by the reasoner.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// RDF TERMS
// =============================================================================

/// A node in the graph, detached from the parser's borrowed representation
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RdfTerm {
    Iri(String),
    BlankNode(String),
    Literal {
        value: String,
        datatype: Option<String>,
        language: Option<String>,
    },
}

impl RdfTerm {
    pub fn as_iri(&self) -> Option<&str> {
        match self {
            RdfTerm::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, RdfTerm::BlankNode(_))
    }

    /// String form used in query bindings
    pub fn lexical(&self) -> &str {
        match self {
            RdfTerm::Iri(s) | RdfTerm::BlankNode(s) => s,
            RdfTerm::Literal { value, .. } => value,
        }
    }
}

impl fmt::Display for RdfTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RdfTerm::Iri(iri) => write!(f, "<{}>", iri),
            RdfTerm::BlankNode(id) => write!(f, "_:{}", id),
            RdfTerm::Literal {
                value,
                language: Some(lang),
                ..
            } => write!(f, "\"{}\"@{}", value, lang),
            RdfTerm::Literal {
                value,
                datatype: Some(dt),
                ..
            } => write!(f, "\"{}\"^^<{}>", value, dt),
            RdfTerm::Literal { value, .. } => write!(f, "\"{}\"", value),
        }
    }
}

/// One statement of the loaded graph. Predicates are always IRIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphTriple {
    pub subject: RdfTerm,
    pub predicate: String,
    pub object: RdfTerm,
}

// =============================================================================
// CLASS RECORDS
// =============================================================================

/// Typed value of a custom class property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
}

impl PropertyValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Integer(i) => Some(*i as f64),
            PropertyValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Booleans, plus the string forms "true"/"false"
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Boolean(b) => Some(*b),
            PropertyValue::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Integer(i) => write!(f, "{}", i),
            PropertyValue::Float(x) => write!(f, "{}", x),
            PropertyValue::Boolean(b) => write!(f, "{}", b),
            PropertyValue::String(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RestrictionKind {
    MinCardinality,
    ExactCardinality,
    MinInclusive,
    MaxInclusive,
    /// Existential restriction; the value is the filler class IRI
    SomeValuesFrom,
}

/// Constraint attached to a class through an anonymous `owl:Restriction`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Restriction {
    /// Restricted property IRI
    pub property: String,
    /// Local name of the property, used as the metadata key
    pub property_name: String,
    pub kind: RestrictionKind,
    pub value: PropertyValue,
}

/// Literal with an optional language tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LangString {
    pub value: String,
    pub language: Option<String>,
}

/// A class of the ontology, as indexed at load
#[derive(Debug, Clone, Default)]
pub struct OntologyClass {
    pub uri: String,
    pub name: String,
    /// Declared with `rdf:type owl:Class`
    pub declared: bool,
    pub labels: Vec<LangString>,
    pub comments: Vec<LangString>,
    /// Direct `rdfs:subClassOf` targets that are IRIs
    pub parents: Vec<String>,
    /// Custom namespace properties with a single typed value
    pub properties: BTreeMap<String, PropertyValue>,
    pub keywords: Vec<String>,
    pub(crate) keywords_lower: Vec<String>,
    pub regulations: Vec<String>,
    pub restrictions: Vec<Restriction>,
}

impl OntologyClass {
    pub(crate) fn new(uri: &str) -> Self {
        Self {
            uri: uri.to_string(),
            name: local_name(uri).to_string(),
            ..Default::default()
        }
    }

    /// Preferred text: Spanish, then untagged
    pub(crate) fn preferred(values: &[LangString]) -> Option<&str> {
        values
            .iter()
            .find(|l| l.language.as_deref() == Some("es"))
            .or_else(|| values.iter().find(|l| l.language.is_none()))
            .map(|l| l.value.as_str())
    }
}

/// Local part of an IRI: after the last `#`, else after the last `/`.
pub fn local_name(iri: &str) -> &str {
    iri.rsplit_once('#')
        .or_else(|| iri.rsplit_once('/'))
        .map(|(_, local)| local)
        .unwrap_or(iri)
}

// =============================================================================
// READ MODELS
// =============================================================================

/// Reference to a class with its display label
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassRef {
    pub uri: String,
    pub name: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassInfo {
    pub uri: String,
    pub label: String,
    pub comment: Option<String>,
    pub parent_classes: Vec<ClassRef>,
    pub properties: BTreeMap<String, PropertyValue>,
    pub restrictions: Vec<Restriction>,
}

/// Field required by a cardinality restriction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequiredField {
    pub name: String,
    pub uri: String,
    pub cardinality: i64,
    /// `owl:cardinality` rather than `owl:minCardinality`
    pub exact: bool,
}

/// Outcome of ontology keyword classification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OntologyCandidate {
    pub uri: String,
    pub name: String,
    pub label: String,
    pub confidence: f64,
    pub matches: usize,
    pub matched_keywords: Vec<String>,
    pub method: String,
    pub properties: BTreeMap<String, PropertyValue>,
}

/// Class related through an existential restriction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelatedDocument {
    pub uri: String,
    pub name: String,
    pub label: String,
    /// Local name of the restricted property
    pub relation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OntologyTreeNode {
    pub uri: String,
    pub name: String,
    pub label: String,
    pub children: Vec<OntologyTreeNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OntologyStatistics {
    pub total_triples: usize,
    pub total_classes: usize,
    pub total_object_properties: usize,
    pub total_datatype_properties: usize,
}

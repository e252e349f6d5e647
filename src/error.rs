//! Error types for the classification core
//!
//! Navigation lookups never error: an unknown class id or URI is an absent
//! (`None` / empty) result. Metadata validation never errors either: violations
//! are returned as a populated error list. The enums below cover the remaining
//! cases: source loading, ad-hoc graph queries and per-phase failures caught by
//! the orchestrator.

use thiserror::Error;

/// Errors raised while loading or checking a taxonomy document
#[derive(Error, Debug)]
pub enum TaxonomyError {
    #[error("IO error reading taxonomy {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse taxonomy document: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid taxonomy node '{id}': {reason}")]
    InvalidNode { id: String, reason: String },

    #[error("Taxonomy node '{id}' references missing {relation} '{target}'")]
    MissingReference {
        id: String,
        relation: &'static str,
        target: String,
    },

    #[error("Cycle detected in taxonomy while walking parents of '{id}'")]
    Cycle { id: String },
}

/// Errors raised while loading the ontology graph
#[derive(Error, Debug)]
pub enum OntologyError {
    #[error("IO error reading ontology {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Turtle parse error: {0}")]
    Turtle(String),

    #[error("Subclass cycle detected at {uri}")]
    Cycle { uri: String },
}

/// Malformed ad-hoc graph pattern
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Empty graph pattern")]
    Empty,

    #[error("Unexpected token '{token}' at offset {offset}")]
    UnexpectedToken { token: String, offset: usize },

    #[error("Triple pattern {index} has {found} terms, expected 3")]
    WrongArity { index: usize, found: usize },

    #[error("Unknown prefix '{0}'")]
    UnknownPrefix(String),

    #[error("Predicate position in pattern {index} must be an IRI or variable")]
    InvalidPredicate { index: usize },
}

/// A failure inside a single classification phase.
///
/// Always caught by the orchestrator and recorded on the result; never
/// propagated to the caller.
#[derive(Error, Debug, Clone)]
pub enum PhaseError {
    #[error("Taxonomy phase failed: {0}")]
    Taxonomy(String),

    #[error("ML phase failed: {0}")]
    Ml(String),

    #[error("Ontology phase failed: {0}")]
    Ontology(String),

    #[error("{phase} phase panicked")]
    Panicked { phase: &'static str },
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid config value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

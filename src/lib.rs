//! Document Classification Core
//!
//! Classifies an ingested document into a node of a controlled class taxonomy,
//! validates its declared metadata against the formal restrictions attached to
//! that class, and infers a qualitative risk level.
//!
//! ## Components
//!
//! - [`taxonomy::TaxonomyIndex`] - hierarchical class tree with business metadata
//!   (required fields, retention, risk, regulations) and fast keyword classification.
//! - [`ontology::OntologyReasoner`] - formal class graph loaded from Turtle:
//!   subclass closure, restriction-based validation and risk inference.
//! - [`classification::ClassificationOrchestrator`] - the adaptive pipeline that
//!   sequences taxonomy, an external ML classifier and the ontology according to
//!   a [`classification::ClassificationMode`].
//!
//! Both indices are built once at startup and shared read-only (`Arc`) across
//! concurrent classification calls.

pub mod classification;
pub mod config;
pub mod error;
pub mod metadata;
pub mod ontology;
pub mod risk;
pub mod taxonomy;

pub use classification::{
    ClassificationMode, ClassificationOrchestrator, ClassificationResult, MlPrediction,
    OrchestratorBuilder, Phase, RuleBasedClassifier, TextClassifier,
};
pub use config::ClassifierConfig;
pub use error::{ConfigError, OntologyError, PhaseError, QueryError, TaxonomyError};
pub use metadata::{DocumentMetadata, MetadataValue};
pub use ontology::OntologyReasoner;
pub use risk::RiskLevel;
pub use taxonomy::TaxonomyIndex;

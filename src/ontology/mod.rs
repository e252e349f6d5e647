//! Formal document ontology
//!
//! Classes, subclass edges, typed properties and OWL restrictions loaded from
//! Turtle. Used for stricter validation and inference than the taxonomy alone.

pub mod loader;
pub mod model;
pub mod query;
pub mod reasoner;

pub use model::{
    ClassInfo, ClassRef, OntologyCandidate, OntologyClass, OntologyStatistics, OntologyTreeNode,
    PropertyValue, RelatedDocument, RequiredField, Restriction, RestrictionKind,
};
pub use query::Binding;
pub use reasoner::OntologyReasoner;

/// Namespace of the document ontology's classes and properties
pub const DEFAULT_NAMESPACE: &str = "http://tefinancia.es/ontology#";
/// Local name of the root document class
pub const DEFAULT_ROOT: &str = "Documento";

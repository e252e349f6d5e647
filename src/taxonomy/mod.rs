//! Document taxonomy
//!
//! Hierarchical classes with keywords, validation rules and compliance
//! attributes, loaded from a YAML/JSON document.

pub mod index;
pub mod types;

pub use index::TaxonomyIndex;
pub use types::*;

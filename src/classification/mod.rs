//! Document classification pipeline
//!
//! - `types` - modes, phases and the result value
//! - `ml` - the external text classifier seam and the keyword rule fallback
//! - `orchestrator` - the adaptive multi-phase state machine

pub mod ml;
pub mod orchestrator;
pub mod types;

pub use ml::{FallbackClassifier, KeywordRule, MlPrediction, RuleBasedClassifier, TextClassifier};
pub use orchestrator::{
    blend_taxonomy_ml, blend_with_ontology, ClassificationOrchestrator, OrchestratorBuilder,
};
pub use types::{
    ClassificationMode, ClassificationResult, Evidence, Explanation, Phase, PhaseFailure,
    UNCLASSIFIED,
};

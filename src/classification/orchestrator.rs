//! Classification Orchestrator
//!
//! Sequences the taxonomy, the external ML classifier and the ontology
//! according to a [`ClassificationMode`], blends their confidences and
//! assembles the [`ClassificationResult`].
//!
//! ```text
//! taxonomy ──► [FAST: done] ──► [INTELLIGENT, conf ≥ 0.85: done]
//!    │
//!    ▼
//!   ml ──► [ML: done]
//!    │
//!    ▼
//! ontology ──► validation + risk ──► done
//! ```
//!
//! A failing phase never aborts the pipeline: it is recorded on the result
//! and the next phase works from the best candidate so far.

use futures::FutureExt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::ml::{FallbackClassifier, MlPrediction, RuleBasedClassifier, TextClassifier};
use super::types::*;
use crate::config::ClassifierConfig;
use crate::error::{ConfigError, PhaseError};
use crate::metadata::DocumentMetadata;
use crate::ontology::{OntologyCandidate, OntologyReasoner};
use crate::taxonomy::{KeywordMatch, TaxonomyIndex};

/// Weight of the taxonomy confidence in the taxonomy/ML blend
pub const TAXONOMY_WEIGHT: f64 = 0.5;
/// Weight of the ML confidence in the taxonomy/ML blend
pub const ML_WEIGHT: f64 = 0.5;
/// Weight of the prior confidence in the ontology blend
pub const PRIOR_WEIGHT: f64 = 0.4;
/// Weight of the ontology confidence in the ontology blend
pub const ONTOLOGY_WEIGHT: f64 = 0.6;

/// Keywords quoted by [`ClassificationOrchestrator::explain`]
const MAX_EVIDENCE: usize = 5;
/// Characters of context either side of an evidence keyword
const EVIDENCE_CONTEXT: usize = 50;

/// `0.5 * taxonomy + 0.5 * ml`
pub fn blend_taxonomy_ml(taxonomy: f64, ml: f64) -> f64 {
    TAXONOMY_WEIGHT * taxonomy + ML_WEIGHT * ml
}

/// `0.4 * prior + 0.6 * ontology`
pub fn blend_with_ontology(prior: f64, ontology: f64) -> f64 {
    PRIOR_WEIGHT * prior + ONTOLOGY_WEIGHT * ontology
}

/// Current best class while phases run
#[derive(Debug, Clone)]
struct Candidate {
    class_id: String,
    label: String,
    confidence: f64,
    method: String,
}

/// Per-call pipeline state; discarded once the result is assembled
struct PipelineRun {
    mode: ClassificationMode,
    candidate: Option<Candidate>,
    phases_used: Vec<Phase>,
    failures: Vec<PhaseFailure>,
    result: ClassificationResult,
}

impl PipelineRun {
    fn new(mode: ClassificationMode) -> Self {
        Self {
            mode,
            candidate: None,
            phases_used: Vec::new(),
            failures: Vec::new(),
            result: ClassificationResult {
                class_id: UNCLASSIFIED.to_string(),
                label: UNCLASSIFIED_LABEL.to_string(),
                confidence: 0.0,
                method: METHOD_NO_MATCH.to_string(),
                phases_used: Vec::new(),
                classification_mode: mode,
                matched_keywords: None,
                taxonomy_path: None,
                ml_category: None,
                ml_confidence: None,
                ontology_class: None,
                ontology_label: None,
                ontology_confidence: None,
                metadata_validation: None,
                required_fields: None,
                inferred_risk_level: None,
                phase_errors: Vec::new(),
            },
        }
    }

    fn fail(&mut self, phase: Phase, error: PhaseError) {
        warn!(%phase, error = %error, "Classification phase failed");
        self.failures.push(PhaseFailure {
            phase,
            message: error.to_string(),
        });
    }
}

/// Adaptive classification pipeline over shared, read-only indices
pub struct ClassificationOrchestrator {
    taxonomy: Arc<TaxonomyIndex>,
    ontology: Arc<OntologyReasoner>,
    ml: Arc<dyn TextClassifier>,
    config: ClassifierConfig,
}

impl ClassificationOrchestrator {
    /// Orchestrator over already-built indices with default settings
    pub fn new(
        taxonomy: Arc<TaxonomyIndex>,
        ontology: Arc<OntologyReasoner>,
        ml: Arc<dyn TextClassifier>,
    ) -> Self {
        Self {
            taxonomy,
            ontology,
            ml,
            config: ClassifierConfig::default(),
        }
    }

    /// Load both indices from the configured paths (degrading to empty
    /// indices when a source is unavailable).
    pub fn from_config(
        config: ClassifierConfig,
        ml: Arc<dyn TextClassifier>,
    ) -> Result<Self, ConfigError> {
        OrchestratorBuilder::new(ml).config(config).build()
    }

    pub fn taxonomy(&self) -> &Arc<TaxonomyIndex> {
        &self.taxonomy
    }

    pub fn ontology(&self) -> &Arc<OntologyReasoner> {
        &self.ontology
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify one document.
    pub async fn classify(
        &self,
        text: &str,
        metadata: &DocumentMetadata,
        mode: ClassificationMode,
    ) -> ClassificationResult {
        let mut run = PipelineRun::new(mode);

        self.taxonomy_phase(&mut run, text);

        let early_exit = match mode {
            ClassificationMode::Fast => true,
            ClassificationMode::Intelligent => run
                .candidate
                .as_ref()
                .is_some_and(|c| c.confidence >= self.config.intelligent_threshold),
            ClassificationMode::Ml | ClassificationMode::Precise => false,
        };

        if early_exit {
            if mode == ClassificationMode::Intelligent {
                debug!("Taxonomy confidence above threshold, skipping ML and ontology");
            }
        } else {
            self.ml_phase(&mut run, text).await;

            if mode != ClassificationMode::Ml {
                self.ontology_phase(&mut run, text, metadata);
            }
        }

        self.finish(run, metadata)
    }

    /// Classify several documents in order, one result per input.
    pub async fn classify_batch(
        &self,
        items: &[(String, DocumentMetadata)],
        mode: ClassificationMode,
    ) -> Vec<ClassificationResult> {
        let mut results = Vec::with_capacity(items.len());
        for (text, metadata) in items {
            results.push(self.classify(text, metadata, mode).await);
        }
        info!(documents = results.len(), %mode, "Batch classified");
        results
    }

    // =========================================================================
    // Phases
    // =========================================================================

    fn taxonomy_phase(&self, run: &mut PipelineRun, text: &str) {
        run.phases_used.push(Phase::Taxonomy);

        let outcome = catch_unwind(AssertUnwindSafe(|| self.taxonomy_candidates(text)))
            .unwrap_or(Err(PhaseError::Panicked { phase: "taxonomy" }));

        match outcome {
            Ok(matches) => match matches.into_iter().next() {
                Some(top) => {
                    info!(
                        class = %top.class_id,
                        confidence = top.confidence,
                        matches = top.matches,
                        "Taxonomy classification"
                    );
                    run.candidate = Some(Candidate {
                        class_id: top.class_id.clone(),
                        label: top.label.clone(),
                        confidence: top.confidence,
                        method: METHOD_TAXONOMY.to_string(),
                    });
                    run.result.taxonomy_path = Some(top.path);
                    run.result.matched_keywords = Some(top.matched_keywords);
                }
                None => debug!("Taxonomy produced no candidate"),
            },
            Err(e) => run.fail(Phase::Taxonomy, e),
        }
    }

    fn taxonomy_candidates(&self, text: &str) -> Result<Vec<KeywordMatch>, PhaseError> {
        if self.taxonomy.is_empty() {
            return Err(PhaseError::Taxonomy("taxonomy not loaded".to_string()));
        }
        Ok(self
            .taxonomy
            .classify_by_keywords(text, self.config.taxonomy_top_n))
    }

    async fn ml_phase(&self, run: &mut PipelineRun, text: &str) {
        run.phases_used.push(Phase::Ml);

        let sample = truncate_chars(text, self.config.ml_text_limit);
        let outcome = match AssertUnwindSafe(self.ml.classify(sample)).catch_unwind().await {
            Ok(Ok(prediction)) => check_prediction(prediction),
            Ok(Err(e)) => Err(PhaseError::Ml(e.to_string())),
            Err(_) => Err(PhaseError::Panicked { phase: "ml" }),
        };

        let prediction = match outcome {
            Ok(prediction) => prediction,
            Err(e) => return run.fail(Phase::Ml, e),
        };

        info!(
            classifier = self.ml.name(),
            category = %prediction.category,
            confidence = prediction.confidence,
            "ML classification"
        );

        run.result.ml_category = Some(prediction.category.clone());
        run.result.ml_confidence = Some(prediction.confidence);

        match run.candidate.as_mut() {
            Some(candidate) => {
                candidate.confidence = blend_taxonomy_ml(candidate.confidence, prediction.confidence);
                candidate.method = format!("{}+{}", candidate.method, METHOD_ML);
            }
            None => {
                let label = self
                    .taxonomy
                    .get_class(&prediction.category)
                    .map(|n| n.label.clone())
                    .unwrap_or_else(|| prediction.category.clone());
                run.candidate = Some(Candidate {
                    class_id: prediction.category,
                    label,
                    confidence: prediction.confidence,
                    method: METHOD_ML.to_string(),
                });
            }
        }
    }

    fn ontology_phase(&self, run: &mut PipelineRun, text: &str, metadata: &DocumentMetadata) {
        run.phases_used.push(Phase::Ontology);

        let outcome = catch_unwind(AssertUnwindSafe(|| self.ontology_candidate(text, metadata)))
            .unwrap_or(Err(PhaseError::Panicked { phase: "ontology" }));

        let candidate = match outcome {
            Ok(candidate) => candidate,
            Err(e) => return run.fail(Phase::Ontology, e),
        };

        info!(
            class = %candidate.name,
            confidence = candidate.confidence,
            method = %candidate.method,
            "Ontology classification"
        );

        match run.candidate.as_mut() {
            Some(prior) => {
                prior.confidence = blend_with_ontology(prior.confidence, candidate.confidence);
                prior.method = format!("{}+{}", prior.method, METHOD_ONTOLOGY);
            }
            None => {
                run.candidate = Some(Candidate {
                    class_id: candidate.name.clone(),
                    label: candidate.label.clone(),
                    confidence: candidate.confidence,
                    method: METHOD_ONTOLOGY.to_string(),
                });
            }
        }

        let validation = self.ontology.validate_metadata(&candidate.uri, metadata);
        if !validation.is_valid {
            warn!(
                class = %candidate.name,
                errors = validation.errors.len(),
                "Metadata validation failed"
            );
        }
        let risk = self.ontology.infer_risk_level(&candidate.uri, metadata);
        info!(class = %candidate.name, %risk, "Risk inference");

        if !candidate.matched_keywords.is_empty() {
            run.result.matched_keywords = Some(candidate.matched_keywords.clone());
        }
        run.result.required_fields = Some(self.ontology.get_required_fields(&candidate.uri));
        run.result.metadata_validation = Some(validation);
        run.result.inferred_risk_level = Some(risk);
        run.result.ontology_confidence = Some(candidate.confidence);
        run.result.ontology_label = Some(candidate.label);
        run.result.ontology_class = Some(candidate.name);
    }

    fn ontology_candidate(
        &self,
        text: &str,
        metadata: &DocumentMetadata,
    ) -> Result<OntologyCandidate, PhaseError> {
        if self.ontology.is_empty() {
            return Err(PhaseError::Ontology("ontology not loaded".to_string()));
        }
        Ok(self.ontology.classify_document(text, metadata))
    }

    // =========================================================================
    // Assembly
    // =========================================================================

    fn finish(&self, run: PipelineRun, metadata: &DocumentMetadata) -> ClassificationResult {
        let PipelineRun {
            mode,
            candidate,
            phases_used,
            failures,
            mut result,
        } = run;

        match candidate {
            Some(c) => {
                result.class_id = c.class_id;
                result.label = c.label;
                result.confidence = c.confidence.clamp(0.0, 1.0);
                result.method = c.method;

                if result.ontology_class.is_none() && self.taxonomy.get_class(&result.class_id).is_some() {
                    result.metadata_validation =
                        Some(self.taxonomy.validate_metadata(&result.class_id, metadata));
                }
            }
            None => {
                result.method = if !phases_used.is_empty() && failures.len() == phases_used.len() {
                    METHOD_ERROR.to_string()
                } else {
                    METHOD_NO_MATCH.to_string()
                };
            }
        }

        result.phases_used = phases_used;
        result.phase_errors = failures;

        info!(
            class = %result.class_id,
            confidence = result.confidence,
            method = %result.method,
            %mode,
            risk = ?result.inferred_risk_level,
            "Document classified"
        );

        result
    }

    /// Evidence for a result: up to five matched keywords, each quoted with
    /// 50 characters of surrounding text.
    pub fn explain(&self, result: &ClassificationResult, text: &str) -> Explanation {
        let keywords: Vec<String> = match &result.matched_keywords {
            Some(keywords) => keywords.clone(),
            None => {
                let lower = text.to_lowercase();
                self.taxonomy
                    .get_class(&result.class_id)
                    .map(|node| {
                        node.keywords
                            .iter()
                            .filter(|k| lower.contains(&k.to_lowercase()))
                            .cloned()
                            .collect()
                    })
                    .unwrap_or_default()
            }
        };

        let evidence = keywords
            .iter()
            .take(MAX_EVIDENCE)
            .filter_map(|keyword| {
                excerpt(text, keyword, EVIDENCE_CONTEXT).map(|excerpt| Evidence {
                    keyword: keyword.clone(),
                    excerpt,
                })
            })
            .collect();

        Explanation {
            class_id: result.class_id.clone(),
            label: result.label.clone(),
            confidence: result.confidence,
            method: result.method.clone(),
            matched_keywords: keywords,
            evidence,
        }
    }
}

/// Reject predictions outside the collaborator contract; clamp the rest.
fn check_prediction(prediction: MlPrediction) -> Result<MlPrediction, PhaseError> {
    if prediction.confidence.is_nan() {
        return Err(PhaseError::Ml(format!(
            "classifier returned NaN confidence for '{}'",
            prediction.category
        )));
    }
    Ok(MlPrediction {
        confidence: prediction.confidence.clamp(0.0, 1.0),
        ..prediction
    })
}

/// First `limit` characters of `text`
fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Case-insensitive keyword search returning the keyword with `context`
/// characters either side.
fn excerpt(text: &str, keyword: &str, context: usize) -> Option<String> {
    let lower = |c: char| c.to_lowercase().next().unwrap_or(c);
    let chars: Vec<char> = text.chars().collect();
    let haystack: Vec<char> = chars.iter().map(|c| lower(*c)).collect();
    let needle: Vec<char> = keyword.chars().map(lower).collect();

    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }

    let start = haystack.windows(needle.len()).position(|w| w == needle.as_slice())?;
    let from = start.saturating_sub(context);
    let to = (start + needle.len() + context).min(chars.len());

    Some(chars[from..to].iter().collect::<String>().trim().to_string())
}

// =============================================================================
// BUILDER
// =============================================================================

/// Builder for [`ClassificationOrchestrator`]
pub struct OrchestratorBuilder {
    ml: Arc<dyn TextClassifier>,
    config: ClassifierConfig,
    taxonomy: Option<Arc<TaxonomyIndex>>,
    ontology: Option<Arc<OntologyReasoner>>,
    rule_fallback: bool,
}

impl OrchestratorBuilder {
    pub fn new(ml: Arc<dyn TextClassifier>) -> Self {
        Self {
            ml,
            config: ClassifierConfig::default(),
            taxonomy: None,
            ontology: None,
            rule_fallback: false,
        }
    }

    pub fn config(mut self, config: ClassifierConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a pre-built, shared taxonomy instead of loading one
    pub fn taxonomy(mut self, taxonomy: Arc<TaxonomyIndex>) -> Self {
        self.taxonomy = Some(taxonomy);
        self
    }

    /// Use a pre-built, shared ontology instead of loading one
    pub fn ontology(mut self, ontology: Arc<OntologyReasoner>) -> Self {
        self.ontology = Some(ontology);
        self
    }

    /// Back the ML classifier with the keyword rules when it is unsure
    /// (confidence below `ml_fallback_threshold`) or fails.
    pub fn with_rule_fallback(mut self) -> Self {
        self.rule_fallback = true;
        self
    }

    /// Build the orchestrator
    pub fn build(self) -> Result<ClassificationOrchestrator, ConfigError> {
        self.config.validate()?;
        let config = self.config;

        let taxonomy = self
            .taxonomy
            .unwrap_or_else(|| Arc::new(TaxonomyIndex::load_or_empty(&config.taxonomy_path)));
        let ontology = self.ontology.unwrap_or_else(|| {
            Arc::new(OntologyReasoner::load_or_empty(
                &config.ontology_path,
                &config.ontology_namespace,
                &config.ontology_root,
            ))
        });

        let ml: Arc<dyn TextClassifier> = if self.rule_fallback {
            Arc::new(
                FallbackClassifier::new(self.ml, RuleBasedClassifier::default())
                    .with_threshold(config.ml_fallback_threshold),
            )
        } else {
            self.ml
        };

        info!(
            taxonomy_classes = taxonomy.len(),
            ontology_classes = ontology.len(),
            classifier = ml.name(),
            "Classification orchestrator ready"
        );

        Ok(ClassificationOrchestrator {
            taxonomy,
            ontology,
            ml,
            config,
        })
    }
}

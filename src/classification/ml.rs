//! ML Classifier Seam
//!
//! The pretrained text classifier is an external collaborator consumed
//! through [`TextClassifier`]. A keyword rule classifier ships as the default
//! implementation and as the low-confidence fallback.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use super::types::UNCLASSIFIED;

/// Prediction returned by a text classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlPrediction {
    pub category: String,
    /// Expected within [0, 1]
    pub confidence: f64,
}

impl MlPrediction {
    pub fn new(category: impl Into<String>, confidence: f64) -> Self {
        Self {
            category: category.into(),
            confidence,
        }
    }

    pub fn unclassified() -> Self {
        Self::new(UNCLASSIFIED, 0.0)
    }
}

/// External text classifier
#[async_trait]
pub trait TextClassifier: Send + Sync {
    /// Predict a category for the text
    async fn classify(&self, text: &str) -> Result<MlPrediction>;

    /// Classifier name for logging
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: TextClassifier + ?Sized> TextClassifier for Arc<T> {
    async fn classify(&self, text: &str) -> Result<MlPrediction> {
        (**self).classify(text).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

// =============================================================================
// RULE-BASED CLASSIFIER
// =============================================================================

/// Rule confidence never exceeds this
pub const RULE_MAX_CONFIDENCE: f64 = 0.8;
/// Keyword hits that would reach full confidence
const RULE_SCORE_SCALE: f64 = 20.0;

/// Keyword rule: a category and the keywords voting for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub category: String,
    pub keywords: Vec<String>,
}

/// Classifies by counting rule keywords present in the lowercased text.
///
/// The category with the most hits wins (earlier rules win ties), with
/// `confidence = min(0.8, hits / 20)`.
#[derive(Debug, Clone)]
pub struct RuleBasedClassifier {
    rules: Vec<KeywordRule>,
}

impl RuleBasedClassifier {
    pub fn new(rules: Vec<KeywordRule>) -> Self {
        let rules = rules
            .into_iter()
            .map(|rule| KeywordRule {
                category: rule.category,
                keywords: rule.keywords.iter().map(|k| k.to_lowercase()).collect(),
            })
            .collect();
        Self { rules }
    }

    pub fn rules(&self) -> &[KeywordRule] {
        &self.rules
    }

    pub fn predict(&self, text: &str) -> MlPrediction {
        let text_lower = text.to_lowercase();
        let mut best: Option<(&KeywordRule, usize)> = None;

        for rule in &self.rules {
            let score = rule
                .keywords
                .iter()
                .filter(|k| text_lower.contains(k.as_str()))
                .count();
            if score > 0 && best.map_or(true, |(_, top)| score > top) {
                best = Some((rule, score));
            }
        }

        match best {
            Some((rule, score)) => {
                let confidence = (score as f64 / RULE_SCORE_SCALE).min(RULE_MAX_CONFIDENCE);
                MlPrediction::new(rule.category.clone(), confidence)
            }
            None => MlPrediction::unclassified(),
        }
    }
}

impl Default for RuleBasedClassifier {
    fn default() -> Self {
        let rule = |category: &str, keywords: &[&str]| KeywordRule {
            category: category.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        };

        Self::new(vec![
            rule(
                "CONTRATO_PRESTAMO_PERSONAL",
                &[
                    "contrato", "préstamo", "personal", "crédito", "financiación",
                    "acuerdo", "firmante", "notario", "cláusula", "condiciones",
                ],
            ),
            rule(
                "CONTRATO_PROVEEDOR",
                &[
                    "proveedor", "suministro", "servicios", "compra", "venta",
                    "contrato comercial", "términos", "especificaciones",
                ],
            ),
            rule(
                "DOCUMENTO_IDENTIDAD",
                &[
                    "dni", "nif", "pasaporte", "identidad", "carnet", "cedula",
                    "documento nacional", "identificación personal",
                ],
            ),
            rule(
                "RECIBO_FACTURA",
                &[
                    "factura", "recibo", "presupuesto", "balance", "cuenta", "iva",
                    "importe", "precio", "coste", "pago", "cobro",
                ],
            ),
            rule(
                "POLIZA_SEGURO",
                &[
                    "póliza", "seguro", "aseguradora", "prima", "cobertura",
                    "siniestro", "indemnización", "beneficiario",
                ],
            ),
            rule(
                "TRANSCRIPCION_LLAMADA",
                &[
                    "transcripción", "llamada", "conversación", "audio", "grabación",
                    "diálogo", "comunicación telefónica",
                ],
            ),
            rule(
                "INFORME_INTERNO",
                &[
                    "informe", "reporte", "análisis", "estudio", "evaluación",
                    "memoria", "resumen ejecutivo", "conclusiones",
                ],
            ),
            rule(
                "OTRO",
                &[
                    "documento", "archivo", "texto", "información", "otros",
                    "misceláneo", "general",
                ],
            ),
        ])
    }
}

#[async_trait]
impl TextClassifier for RuleBasedClassifier {
    async fn classify(&self, text: &str) -> Result<MlPrediction> {
        Ok(self.predict(text))
    }

    fn name(&self) -> &str {
        "rule-based"
    }
}

// =============================================================================
// FALLBACK DECORATOR
// =============================================================================

pub const DEFAULT_FALLBACK_THRESHOLD: f64 = 0.6;

/// Consults `fallback` when `primary` is unsure (confidence below the
/// threshold) or fails, keeping the more confident prediction.
#[derive(Debug, Clone)]
pub struct FallbackClassifier<P, F> {
    primary: P,
    fallback: F,
    threshold: f64,
}

impl<P: TextClassifier, F: TextClassifier> FallbackClassifier<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self {
            primary,
            fallback,
            threshold: DEFAULT_FALLBACK_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }
}

#[async_trait]
impl<P: TextClassifier, F: TextClassifier> TextClassifier for FallbackClassifier<P, F> {
    async fn classify(&self, text: &str) -> Result<MlPrediction> {
        let primary = match self.primary.classify(text).await {
            Ok(prediction) if prediction.confidence >= self.threshold => return Ok(prediction),
            Ok(prediction) => Some(prediction),
            Err(e) => {
                debug!(classifier = self.primary.name(), error = %e, "Primary classifier failed, using fallback");
                None
            }
        };

        let fallback = self.fallback.classify(text).await?;

        Ok(match primary {
            Some(p) if p.confidence >= fallback.confidence => p,
            _ => fallback,
        })
    }

    fn name(&self) -> &str {
        self.primary.name()
    }
}

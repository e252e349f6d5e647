//! Ontology Reasoner
//!
//! Read-only service over the indexed class graph: class info, subclass
//! closure, keyword inference, restriction validation and risk inference.
//! Built once at startup and shared behind an `Arc`.

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, info, warn};

use super::loader::{parse_turtle, OntologyGraph};
use super::model::{
    local_name, ClassInfo, ClassRef, OntologyCandidate, OntologyClass, OntologyStatistics,
    OntologyTreeNode, PropertyValue, RelatedDocument, RequiredField, Restriction,
    RestrictionKind,
};
use super::query::{self, Binding};
use crate::error::{OntologyError, QueryError};
use crate::metadata::{DocumentMetadata, ValidationOutcome};
use crate::risk::RiskLevel;

/// Method tag of a keyword-matched candidate
pub const METHOD_KEYWORDS: &str = "keyword_matching";
/// Method tag of the root fallback candidate
pub const METHOD_FALLBACK: &str = "fallback";
/// Confidence of the root fallback candidate
pub const FALLBACK_CONFIDENCE: f64 = 0.1;

const DEFAULT_RETENTION_YEARS: u32 = 5;

/// Metadata keys holding the financed amount (canonical name first)
pub const AMOUNT_KEYS: &[&str] = &["importeFinanciado", "importe_financiado", "amount"];
/// Metadata keys holding the term in months (canonical name first)
pub const TERM_KEYS: &[&str] = &["plazoMeses", "plazo_meses", "term_months"];
pub const RATE_KEYS: &[&str] = &["tae"];
pub const LTV_KEYS: &[&str] = &["ltv"];

// Class properties
const BASE_RISK: &str = "nivelRiesgoBase";
const SENSITIVE: &str = "esSensible";
const RETENTION: &str = "retencionAnios";

// Risk rule thresholds
const MORTGAGE_CLASS: &str = "PrestamoHipotecario";
const CREDIT_LINE_CLASS: &str = "LineaCredito";
const LTV_LIMIT: f64 = 80.0;
const TAE_LIMIT: f64 = 10.0;
const LONG_TERM_MONTHS: f64 = 240.0;

/// A metadata field checked against a pair of class properties
struct NumericBound {
    keys: &'static [&'static str],
    min_property: Option<&'static str>,
    max_property: Option<&'static str>,
}

const NUMERIC_BOUNDS: &[NumericBound] = &[
    NumericBound {
        keys: AMOUNT_KEYS,
        min_property: Some("importeMinimo"),
        max_property: Some("importeMaximo"),
    },
    NumericBound {
        keys: TERM_KEYS,
        min_property: Some("plazoMinimoMeses"),
        max_property: Some("plazoMaximoMeses"),
    },
    NumericBound {
        keys: RATE_KEYS,
        min_property: None,
        max_property: Some("taeMaximo"),
    },
];

/// Reasoner over a Turtle ontology
#[derive(Debug, Clone)]
pub struct OntologyReasoner {
    namespace: String,
    root_uri: String,
    graph: OntologyGraph,
}

impl OntologyReasoner {
    /// Empty reasoner: no classes, every lookup absent.
    pub fn new(namespace: &str, root: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            root_uri: format!("{}{}", namespace, root),
            graph: OntologyGraph::default(),
        }
    }

    pub fn load<P: AsRef<Path>>(path: P, namespace: &str, root: &str) -> Result<Self, OntologyError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| OntologyError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let reasoner = Self::from_turtle(&content, namespace, root)?;
        info!(
            path = %path.display(),
            triples = reasoner.graph.triples.len(),
            classes = reasoner.len(),
            "Loaded ontology"
        );
        Ok(reasoner)
    }

    /// Load, degrading to an empty reasoner on a missing or corrupt source.
    pub fn load_or_empty<P: AsRef<Path>>(path: P, namespace: &str, root: &str) -> Self {
        let path = path.as_ref();
        match Self::load(path, namespace, root) {
            Ok(reasoner) => reasoner,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ontology unavailable, using empty reasoner");
                Self::new(namespace, root)
            }
        }
    }

    pub fn from_turtle(content: &str, namespace: &str, root: &str) -> Result<Self, OntologyError> {
        let triples = parse_turtle(content)?;
        let graph = OntologyGraph::from_triples(triples, namespace)?;

        let reasoner = Self {
            namespace: namespace.to_string(),
            root_uri: format!("{}{}", namespace, root),
            graph,
        };
        if reasoner.get_class(&reasoner.root_uri).is_none() {
            warn!(root = %reasoner.root_uri, "Ontology root class is not defined");
        }
        Ok(reasoner)
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn root_uri(&self) -> &str {
        &self.root_uri
    }

    /// Number of indexed classes
    pub fn len(&self) -> usize {
        self.graph.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.classes.is_empty()
    }

    /// URI of a class from its local name (e.g. "PrestamoHipotecario").
    pub fn class_uri(&self, name: &str) -> String {
        format!("{}{}", self.namespace, name)
    }

    pub fn get_class(&self, uri: &str) -> Option<&OntologyClass> {
        self.graph.classes.get(uri)
    }

    /// Display label: Spanish, then untagged, then the local name.
    pub fn get_label(&self, uri: &str) -> String {
        self.get_class(uri)
            .and_then(|c| OntologyClass::preferred(&c.labels))
            .unwrap_or_else(|| local_name(uri))
            .to_string()
    }

    fn class_ref(&self, uri: &str) -> ClassRef {
        ClassRef {
            uri: uri.to_string(),
            name: local_name(uri).to_string(),
            label: self.get_label(uri),
        }
    }

    /// Label, comment, direct parents and directly attached properties.
    pub fn get_class_info(&self, uri: &str) -> Option<ClassInfo> {
        let class = self.get_class(uri)?;

        Some(ClassInfo {
            uri: class.uri.clone(),
            label: self.get_label(uri),
            comment: OntologyClass::preferred(&class.comments).map(str::to_string),
            parent_classes: class.parents.iter().map(|p| self.class_ref(p)).collect(),
            properties: class.properties.clone(),
            restrictions: class.restrictions.clone(),
        })
    }

    /// Direct subclasses, or the full descendant set when `direct_only` is
    /// false. Never includes `uri` itself.
    pub fn get_subclasses(&self, uri: &str, direct_only: bool) -> Vec<ClassRef> {
        let source = if direct_only {
            self.graph.children.get(uri)
        } else {
            self.graph.descendants.get(uri)
        };

        source
            .map(|uris| uris.iter().map(|u| self.class_ref(u)).collect())
            .unwrap_or_default()
    }

    /// Declared classes under the root (inclusive) with no subclasses,
    /// sorted by URI. The only valid classification targets.
    pub fn get_leaf_classes(&self) -> Vec<&OntologyClass> {
        let Some(under_root) = self.graph.descendants.get(&self.root_uri) else {
            return Vec::new();
        };
        let under_root: HashSet<&str> = under_root
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.root_uri.as_str()))
            .collect();

        self.graph
            .class_order
            .iter()
            .filter(|uri| under_root.contains(uri.as_str()))
            .filter(|uri| self.graph.children.get(uri.as_str()).map_or(true, Vec::is_empty))
            .filter_map(|uri| self.graph.classes.get(uri))
            .filter(|class| class.declared)
            .collect()
    }

    /// Nested tree from the root class.
    pub fn get_hierarchy(&self) -> Option<OntologyTreeNode> {
        self.get_class(&self.root_uri)?;
        Some(self.build_tree(&self.root_uri))
    }

    fn build_tree(&self, uri: &str) -> OntologyTreeNode {
        let ClassRef { uri, name, label } = self.class_ref(uri);
        let children = self
            .graph
            .children
            .get(&uri)
            .map(|kids| kids.iter().map(|k| self.build_tree(k)).collect())
            .unwrap_or_default();

        OntologyTreeNode {
            uri,
            name,
            label,
            children,
        }
    }

    // =========================================================================
    // Class attributes
    // =========================================================================

    pub fn get_restrictions(&self, uri: &str) -> &[Restriction] {
        self.get_class(uri)
            .map(|c| c.restrictions.as_slice())
            .unwrap_or_default()
    }

    fn property(&self, uri: &str, name: &str) -> Option<&PropertyValue> {
        self.get_class(uri).and_then(|c| c.properties.get(name))
    }

    /// Fields required by `minCardinality >= 1` restrictions, then by
    /// `cardinality` restrictions.
    pub fn get_required_fields(&self, uri: &str) -> Vec<RequiredField> {
        let restrictions = self.get_restrictions(uri);
        let field = |r: &Restriction, cardinality: i64, exact: bool| RequiredField {
            name: r.property_name.clone(),
            uri: r.property.clone(),
            cardinality,
            exact,
        };

        let minimum = restrictions.iter().filter_map(|r| match (r.kind, &r.value) {
            (RestrictionKind::MinCardinality, PropertyValue::Integer(n)) if *n >= 1 => {
                Some(field(r, *n, false))
            }
            _ => None,
        });
        let exact = restrictions.iter().filter_map(|r| match (r.kind, &r.value) {
            (RestrictionKind::ExactCardinality, PropertyValue::Integer(n)) => Some(field(r, *n, true)),
            _ => None,
        });

        minimum.chain(exact).collect()
    }

    /// Classes linked through `owl:someValuesFrom` restrictions.
    pub fn get_related_documents(&self, uri: &str) -> Vec<RelatedDocument> {
        self.get_restrictions(uri)
            .iter()
            .filter(|r| r.kind == RestrictionKind::SomeValuesFrom)
            .filter_map(|r| {
                let target = r.value.as_str()?;
                target.starts_with(&self.namespace).then(|| RelatedDocument {
                    uri: target.to_string(),
                    name: local_name(target).to_string(),
                    label: self.get_label(target),
                    relation: r.property_name.clone(),
                })
            })
            .collect()
    }

    pub fn get_compliance_regulations(&self, uri: &str) -> &[String] {
        self.get_class(uri)
            .map(|c| c.regulations.as_slice())
            .unwrap_or_default()
    }

    pub fn get_retention_years(&self, uri: &str) -> u32 {
        match self.property(uri, RETENTION) {
            Some(PropertyValue::Integer(years)) => u32::try_from(*years).unwrap_or(DEFAULT_RETENTION_YEARS),
            _ => DEFAULT_RETENTION_YEARS,
        }
    }

    /// Declared `nivelRiesgoBase`, MEDIO when absent or unrecognized.
    pub fn base_risk_level(&self, uri: &str) -> RiskLevel {
        self.property(uri, BASE_RISK)
            .and_then(PropertyValue::as_str)
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    pub fn is_sensitive(&self, uri: &str) -> bool {
        self.property(uri, SENSITIVE)
            .and_then(PropertyValue::as_bool)
            .unwrap_or(false)
    }

    // =========================================================================
    // Inference
    // =========================================================================

    /// Best leaf class by keyword overlap with `text`.
    ///
    /// `confidence = min(matches / |keywords|, 1.0)`. Leaves are scanned in URI
    /// order and only a strictly greater confidence replaces the current best,
    /// so ties go to the lexicographically smallest URI. With no match at all
    /// the root class is returned with confidence 0.1. Metadata does not
    /// influence keyword inference.
    pub fn classify_document(&self, text: &str, _metadata: &DocumentMetadata) -> OntologyCandidate {
        let text_lower = text.to_lowercase();
        let mut best: Option<(&OntologyClass, f64, Vec<String>)> = None;

        for class in self.get_leaf_classes() {
            if class.keywords.is_empty() {
                continue;
            }

            let matched: Vec<String> = class
                .keywords
                .iter()
                .zip(&class.keywords_lower)
                .filter(|(_, lower)| text_lower.contains(lower.as_str()))
                .map(|(original, _)| original.clone())
                .collect();
            if matched.is_empty() {
                continue;
            }

            let confidence = (matched.len() as f64 / class.keywords.len() as f64).min(1.0);
            if best.as_ref().map_or(true, |(_, score, _)| confidence > *score) {
                best = Some((class, confidence, matched));
            }
        }

        match best {
            Some((class, confidence, matched_keywords)) => {
                debug!(class = %class.name, confidence, "Ontology keyword match");
                OntologyCandidate {
                    uri: class.uri.clone(),
                    name: class.name.clone(),
                    label: self.get_label(&class.uri),
                    confidence,
                    matches: matched_keywords.len(),
                    matched_keywords,
                    method: METHOD_KEYWORDS.to_string(),
                    properties: class.properties.clone(),
                }
            }
            None => OntologyCandidate {
                uri: self.root_uri.clone(),
                name: local_name(&self.root_uri).to_string(),
                label: self.get_label(&self.root_uri),
                confidence: FALLBACK_CONFIDENCE,
                matches: 0,
                matched_keywords: Vec::new(),
                method: METHOD_FALLBACK.to_string(),
                properties: Default::default(),
            },
        }
    }

    /// Validate metadata against the class's cardinality restrictions, its
    /// amount/term/rate bounds and its inclusive range restrictions.
    pub fn validate_metadata(&self, uri: &str, metadata: &DocumentMetadata) -> ValidationOutcome {
        let Some(class) = self.get_class(uri) else {
            return ValidationOutcome::from_errors(vec![format!("Clase no encontrada: {}", uri)]);
        };

        let mut errors: Vec<String> = self
            .get_required_fields(uri)
            .into_iter()
            .filter(|field| !metadata.has_value(&field.name))
            .map(|field| format!("Campo obligatorio faltante: {}", field.name))
            .collect();

        for bound in NUMERIC_BOUNDS {
            let Some((key, value, raw)) = metadata.first_number(bound.keys) else {
                continue;
            };
            let limit = |property: Option<&str>| {
                property.and_then(|p| class.properties.get(p).and_then(|v| v.as_f64().map(|n| (n, v))))
            };

            if let Some((min, shown)) = limit(bound.min_property).filter(|(min, _)| value < *min) {
                errors.push(below_minimum(key, raw, shown));
                debug!(field = key, min, "Below class minimum");
            }
            if let Some((max, shown)) = limit(bound.max_property).filter(|(max, _)| value > *max) {
                errors.push(above_maximum(key, raw, shown));
                debug!(field = key, max, "Above class maximum");
            }
        }

        for r in &class.restrictions {
            let Some(limit) = r.value.as_f64() else {
                continue;
            };
            let Some(raw) = metadata.get(&r.property_name) else {
                continue;
            };
            let Some(value) = raw.as_f64() else {
                continue;
            };
            match r.kind {
                RestrictionKind::MinInclusive if value < limit => {
                    errors.push(below_minimum(&r.property_name, raw, &r.value))
                }
                RestrictionKind::MaxInclusive if value > limit => {
                    errors.push(above_maximum(&r.property_name, raw, &r.value))
                }
                _ => {}
            }
        }

        ValidationOutcome::from_errors(errors)
    }

    /// Risk level by rule cascade; the first rule that fires wins:
    ///
    /// 1. mortgage class with `ltv > 80` -> ALTO
    /// 2. credit-line class -> ALTO
    /// 3. sensitive class -> ALTO
    /// 4. `tae > 10` -> ALTO
    /// 5. term over 240 months on a BAJO class -> MEDIO
    /// 6. the class's base risk (MEDIO when undeclared)
    pub fn infer_risk_level(&self, uri: &str, metadata: &DocumentMetadata) -> RiskLevel {
        let base = self.base_risk_level(uri);
        let number = |keys: &[&str]| metadata.first_number(keys).map(|(_, n, _)| n);

        let (risk, rule) = if uri.contains(MORTGAGE_CLASS)
            && number(LTV_KEYS).is_some_and(|ltv| ltv > LTV_LIMIT)
        {
            (RiskLevel::Alto, "mortgage_ltv")
        } else if uri.contains(CREDIT_LINE_CLASS) {
            (RiskLevel::Alto, "credit_line")
        } else if self.is_sensitive(uri) {
            (RiskLevel::Alto, "sensitive")
        } else if number(RATE_KEYS).is_some_and(|tae| tae > TAE_LIMIT) {
            (RiskLevel::Alto, "high_tae")
        } else if base == RiskLevel::Bajo
            && number(TERM_KEYS).is_some_and(|term| term > LONG_TERM_MONTHS)
        {
            (RiskLevel::Medio, "long_term")
        } else {
            (base, "base")
        };

        debug!(class = local_name(uri), %risk, rule, "Inferred risk level");
        risk
    }

    // =========================================================================
    // Statistics & queries
    // =========================================================================

    pub fn get_statistics(&self) -> OntologyStatistics {
        OntologyStatistics {
            total_triples: self.graph.triples.len(),
            total_classes: self.graph.classes.values().filter(|c| c.declared).count(),
            total_object_properties: self.graph.object_properties,
            total_datatype_properties: self.graph.datatype_properties,
        }
    }

    /// Evaluate an ad-hoc basic graph pattern over the loaded triples.
    pub fn query(&self, pattern: &str) -> Result<Vec<Binding>, QueryError> {
        query::evaluate(pattern, &self.graph.triples, &self.namespace)
    }
}

fn below_minimum(field: &str, value: impl std::fmt::Display, min: impl std::fmt::Display) -> String {
    format!("{} ({}) menor que mínimo permitido ({})", field, value, min)
}

fn above_maximum(field: &str, value: impl std::fmt::Display, max: impl std::fmt::Display) -> String {
    format!("{} ({}) mayor que máximo permitido ({})", field, value, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const NS: &str = "http://tefinancia.es/ontology#";

    const TEST_TTL: &str = r#"
@prefix tf: <http://tefinancia.es/ontology#> .
@prefix owl: <http://www.w3.org/2002/07/owl#> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
@prefix xsd: <http://www.w3.org/2001/XMLSchema#> .

tf:Documento a owl:Class ; rdfs:label "Documento"@es .

tf:Prestamo a owl:Class ;
    rdfs:subClassOf tf:Documento ;
    rdfs:label "Préstamo"@es .

tf:PrestamoPersonal a owl:Class ;
    rdfs:subClassOf tf:Prestamo ;
    rdfs:label "Préstamo Personal"@es ;
    tf:nivelRiesgoBase "BAJO" ;
    tf:taeMaximo 9.5 ;
    tf:keyword "préstamo personal" , "consumo" .

tf:PrestamoHipotecario a owl:Class ;
    rdfs:subClassOf tf:Prestamo ;
    rdfs:label "Préstamo Hipotecario"@es ;
    tf:nivelRiesgoBase "MEDIO" ;
    tf:importeMinimo 30000 ;
    tf:keyword "hipoteca" , "vivienda" ;
    rdfs:subClassOf [ a owl:Restriction ; owl:onProperty tf:tasacion ; owl:minCardinality 1 ] ,
        [ a owl:Restriction ; owl:onProperty tf:requiereTasacion ; owl:someValuesFrom tf:InformeTasacion ] .

tf:LineaCredito a owl:Class ;
    rdfs:subClassOf tf:Prestamo ;
    tf:keyword "línea de crédito" .

tf:Nomina a owl:Class ;
    rdfs:subClassOf tf:Documento ;
    tf:esSensible true ;
    tf:retencionAnios 10 ;
    tf:keyword "nómina" , "salario" .

tf:InformeTasacion a owl:Class ;
    rdfs:subClassOf tf:Documento ;
    rdfs:label "Informe de Tasación"@es .
"#;

    fn reasoner() -> OntologyReasoner {
        OntologyReasoner::from_turtle(TEST_TTL, NS, "Documento").unwrap()
    }

    fn uri(name: &str) -> String {
        format!("{}{}", NS, name)
    }

    #[test]
    fn test_subclasses_direct_and_transitive() {
        let r = reasoner();
        let direct: Vec<String> = r
            .get_subclasses(&uri("Documento"), true)
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(direct, vec!["Prestamo", "Nomina", "InformeTasacion"]);

        let all = r.get_subclasses(&uri("Documento"), false);
        assert_eq!(all.len(), 6);
        assert!(all.iter().all(|c| c.uri != uri("Documento")));
    }

    #[test]
    fn test_leaf_classes_sorted() {
        let names: Vec<String> = reasoner()
            .get_leaf_classes()
            .into_iter()
            .map(|c| c.name.clone())
            .collect();
        assert_eq!(
            names,
            vec!["InformeTasacion", "LineaCredito", "Nomina", "PrestamoHipotecario", "PrestamoPersonal"]
        );
    }

    #[test]
    fn test_classify_ties_go_to_smallest_uri() {
        // One keyword each of Nomina (1/2) and PrestamoHipotecario (1/2)
        let candidate = reasoner().classify_document("nómina y vivienda", &DocumentMetadata::new());
        assert_eq!(candidate.name, "Nomina");
        assert_eq!(candidate.confidence, 0.5);
        assert_eq!(candidate.method, METHOD_KEYWORDS);
    }

    #[test]
    fn test_classify_fallback_to_root() {
        let candidate = reasoner().classify_document("texto genérico", &DocumentMetadata::new());
        assert_eq!(candidate.uri, uri("Documento"));
        assert_eq!(candidate.confidence, FALLBACK_CONFIDENCE);
        assert_eq!(candidate.method, METHOD_FALLBACK);
    }

    #[test]
    fn test_validate_amount_and_rate() {
        let r = reasoner();
        let meta = DocumentMetadata::new().with("amount", 20000).with("tasacion", "sí");
        let outcome = r.validate_metadata(&uri("PrestamoHipotecario"), &meta);
        assert_eq!(
            outcome.errors,
            vec!["amount (20000) menor que mínimo permitido (30000)".to_string()]
        );

        let meta = DocumentMetadata::new().with("tae", 12.5);
        let outcome = r.validate_metadata(&uri("PrestamoPersonal"), &meta);
        assert_eq!(
            outcome.errors,
            vec!["tae (12.5) mayor que máximo permitido (9.5)".to_string()]
        );
    }

    #[test]
    fn test_validate_missing_required_field() {
        let outcome = reasoner().validate_metadata(
            &uri("PrestamoHipotecario"),
            &DocumentMetadata::new().with("importeFinanciado", 150000),
        );
        assert!(!outcome.is_valid);
        assert_eq!(outcome.errors, vec!["Campo obligatorio faltante: tasacion".to_string()]);
    }

    #[test]
    fn test_risk_cascade_order() {
        let r = reasoner();
        let hip = uri("PrestamoHipotecario");

        assert_eq!(r.infer_risk_level(&hip, &DocumentMetadata::new().with("ltv", 85)), RiskLevel::Alto);
        assert_eq!(r.infer_risk_level(&hip, &DocumentMetadata::new().with("ltv", 70)), RiskLevel::Medio);
        assert_eq!(r.infer_risk_level(&uri("LineaCredito"), &DocumentMetadata::new()), RiskLevel::Alto);
        assert_eq!(r.infer_risk_level(&uri("Nomina"), &DocumentMetadata::new()), RiskLevel::Alto);

        let personal = uri("PrestamoPersonal");
        assert_eq!(r.infer_risk_level(&personal, &DocumentMetadata::new()), RiskLevel::Bajo);
        assert_eq!(
            r.infer_risk_level(&personal, &DocumentMetadata::new().with("plazo_meses", 300)),
            RiskLevel::Medio
        );
        assert_eq!(
            r.infer_risk_level(&personal, &DocumentMetadata::new().with("tae", 10.5)),
            RiskLevel::Alto
        );
    }

    #[test]
    fn test_attributes() {
        let r = reasoner();
        assert_eq!(r.get_retention_years(&uri("Nomina")), 10);
        assert_eq!(r.get_retention_years(&uri("Prestamo")), 5);
        assert_eq!(r.get_label(&uri("LineaCredito")), "LineaCredito");

        let related = r.get_related_documents(&uri("PrestamoHipotecario"));
        assert_eq!(related.len(), 1);
        assert_eq!(related[0].label, "Informe de Tasación");
        assert_eq!(related[0].relation, "requiereTasacion");

        let info = r.get_class_info(&uri("PrestamoHipotecario")).unwrap();
        assert_eq!(info.parent_classes[0].label, "Préstamo");
        assert!(r.get_class_info(&uri("NoExiste")).is_none());
    }

    #[test]
    fn test_hierarchy_and_statistics() {
        let r = reasoner();
        let tree = r.get_hierarchy().unwrap();
        assert_eq!(tree.name, "Documento");
        assert_eq!(tree.children[0].children.len(), 3);

        let stats = r.get_statistics();
        assert_eq!(stats.total_classes, 7);
    }

    #[test]
    fn test_empty_reasoner() {
        let r = OntologyReasoner::new(NS, "Documento");
        assert!(r.is_empty());
        assert!(r.get_leaf_classes().is_empty());
        assert!(r.get_hierarchy().is_none());
        assert_eq!(r.infer_risk_level(&uri("Prestamo"), &DocumentMetadata::new()), RiskLevel::Medio);
    }
}

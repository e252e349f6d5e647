//! Integration tests for OntologyReasoner
//!
//! Run against the ontology shipped under `config/ontology/`.
//!
//! Run with: cargo test --test ontology_reasoner

use doc_classifier::ontology::{DEFAULT_NAMESPACE, DEFAULT_ROOT};
use doc_classifier::{DocumentMetadata, OntologyReasoner, QueryError, RiskLevel};
use pretty_assertions::assert_eq;
use std::path::PathBuf;

fn shipped() -> OntologyReasoner {
    let path =
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config/ontology/document_ontology.ttl");
    OntologyReasoner::load(path, DEFAULT_NAMESPACE, DEFAULT_ROOT)
        .expect("shipped ontology should load")
}

fn uri(name: &str) -> String {
    format!("{}{}", DEFAULT_NAMESPACE, name)
}

fn sorted_names(refs: Vec<doc_classifier::ontology::ClassRef>) -> Vec<String> {
    let mut names: Vec<String> = refs.into_iter().map(|c| c.name).collect();
    names.sort();
    names
}

// =============================================================================
// STRUCTURE
// =============================================================================

#[test]
fn test_statistics() {
    let stats = shipped().get_statistics();
    assert_eq!(stats.total_classes, 15);
    assert_eq!(stats.total_object_properties, 4);
    assert_eq!(stats.total_datatype_properties, 19);
    assert!(stats.total_triples > 100);
}

#[test]
fn test_leaf_classes_sorted_by_uri() {
    let reasoner = shipped();
    let names: Vec<&str> = reasoner
        .get_leaf_classes()
        .into_iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(
        names,
        vec![
            "DNI",
            "ExtractoBancario",
            "InformeTasacion",
            "LineaCredito",
            "Nomina",
            "Pasaporte",
            "PrestamoHipotecario",
            "PrestamoPersonal",
            "TarjetaCredito",
            "TranscripcionLlamada",
        ]
    );
}

#[test]
fn test_subclasses_direct_and_transitive() {
    let reasoner = shipped();

    assert_eq!(
        sorted_names(reasoner.get_subclasses(&uri("Prestamo"), true)),
        vec!["LineaCredito", "PrestamoHipotecario", "PrestamoPersonal", "TarjetaCredito"]
    );

    let contractual = sorted_names(reasoner.get_subclasses(&uri("DocumentoContractual"), false));
    assert_eq!(
        contractual,
        vec![
            "LineaCredito",
            "Prestamo",
            "PrestamoHipotecario",
            "PrestamoPersonal",
            "TarjetaCredito"
        ]
    );

    let everything = reasoner.get_subclasses(&uri("Documento"), false);
    assert_eq!(everything.len(), 14);
    assert!(everything.iter().all(|c| c.uri != uri("Documento")));

    assert!(reasoner.get_subclasses(&uri("NoExiste"), false).is_empty());
}

#[test]
fn test_class_info() {
    let reasoner = shipped();
    let info = reasoner
        .get_class_info(&uri("PrestamoHipotecario"))
        .expect("mortgage class exists");

    assert_eq!(info.label, "Préstamo Hipotecario");
    assert_eq!(
        info.comment.as_deref(),
        Some("Préstamo con garantía hipotecaria sobre un inmueble")
    );
    assert_eq!(info.parent_classes.len(), 1);
    assert_eq!(info.parent_classes[0].name, "Prestamo");
    assert_eq!(
        info.properties.get("importeMinimo").and_then(|v| v.as_f64()),
        Some(30000.0)
    );
    assert!(!info.properties.contains_key("keyword"));

    assert!(reasoner.get_class_info(&uri("NoExiste")).is_none());
}

#[test]
fn test_hierarchy_rooted_at_documento() {
    let tree = shipped().get_hierarchy().expect("root class exists");
    assert_eq!(tree.name, "Documento");
    let mut top: Vec<&str> = tree.children.iter().map(|c| c.name.as_str()).collect();
    top.sort();
    assert_eq!(
        top,
        vec!["DocumentoContractual", "DocumentoFinanciero", "DocumentoIdentidad", "TranscripcionLlamada"]
    );
}

// =============================================================================
// ATTRIBUTES
// =============================================================================

#[test]
fn test_required_fields_from_restrictions() {
    let reasoner = shipped();

    let mut mortgage: Vec<String> = reasoner
        .get_required_fields(&uri("PrestamoHipotecario"))
        .into_iter()
        .map(|f| f.name)
        .collect();
    mortgage.sort();
    assert_eq!(mortgage, vec!["tasacion", "titular"]);

    let credit_line = reasoner.get_required_fields(&uri("LineaCredito"));
    assert_eq!(credit_line.len(), 1);
    assert_eq!(credit_line[0].name, "limiteCredito");
    assert_eq!(credit_line[0].cardinality, 1);
    assert!(credit_line[0].exact);
}

#[test]
fn test_related_documents() {
    let related = shipped().get_related_documents(&uri("PrestamoHipotecario"));
    assert_eq!(related.len(), 1);
    assert_eq!(related[0].name, "InformeTasacion");
    assert_eq!(related[0].label, "Informe de Tasación");
    assert_eq!(related[0].relation, "requiereTasacion");
}

#[test]
fn test_retention_sensitivity_and_regulations() {
    let reasoner = shipped();

    assert_eq!(reasoner.get_retention_years(&uri("PrestamoHipotecario")), 30);
    assert_eq!(reasoner.get_retention_years(&uri("TarjetaCredito")), 5);
    assert_eq!(reasoner.get_retention_years(&uri("NoExiste")), 5);

    assert!(reasoner.is_sensitive(&uri("Nomina")));
    assert!(!reasoner.is_sensitive(&uri("PrestamoPersonal")));

    assert_eq!(
        reasoner.get_compliance_regulations(&uri("PrestamoHipotecario")),
        ["Ley 5/2019".to_string(), "GDPR".to_string()]
    );
}

// =============================================================================
// CLASSIFICATION
// =============================================================================

#[test]
fn test_classify_mortgage_text() {
    let candidate = shipped().classify_document(
        "Escritura de hipoteca sobre la vivienda con tasación firmada ante notario",
        &DocumentMetadata::new(),
    );

    assert_eq!(candidate.name, "PrestamoHipotecario");
    assert_eq!(candidate.label, "Préstamo Hipotecario");
    assert_eq!(candidate.matches, 4);
    assert!((candidate.confidence - 4.0 / 6.0).abs() < 1e-9);
    assert_eq!(candidate.method, "keyword_matching");
    assert!(candidate.properties.contains_key("importeMinimo"));
}

#[test]
fn test_classify_without_match_falls_back_to_root() {
    let candidate = shipped().classify_document("texto sin relación", &DocumentMetadata::new());

    assert_eq!(candidate.uri, uri("Documento"));
    assert_eq!(candidate.confidence, 0.1);
    assert_eq!(candidate.method, "fallback");
    assert!(candidate.matched_keywords.is_empty());
}

// =============================================================================
// VALIDATION
// =============================================================================

#[test]
fn test_mortgage_below_minimum_amount() {
    let metadata = DocumentMetadata::new()
        .with("titular", "Ana García")
        .with("tasacion", "TAS-001")
        .with("importeFinanciado", 20000);

    let outcome = shipped().validate_metadata(&uri("PrestamoHipotecario"), &metadata);

    assert!(!outcome.is_valid);
    assert_eq!(outcome.errors.len(), 1);
    let error = &outcome.errors[0];
    assert!(error.contains("importeFinanciado"), "{}", error);
    assert!(error.contains("20000"), "{}", error);
    assert!(error.contains("30000"), "{}", error);
}

#[test]
fn test_missing_required_fields_and_rate_ceiling() {
    let metadata = DocumentMetadata::new()
        .with("importeFinanciado", 12000)
        .with("tae", 14.2);

    let outcome = shipped().validate_metadata(&uri("PrestamoPersonal"), &metadata);

    assert!(!outcome.is_valid);
    assert_eq!(outcome.errors.len(), 2);
    assert_eq!(outcome.errors[0], "Campo obligatorio faltante: titular");
    assert!(outcome.errors[1].starts_with("tae (14.2)"), "{}", outcome.errors[1]);
    assert!(outcome.errors[1].contains("12.5"));
}

#[test]
fn test_range_restriction_on_ltv() {
    let metadata = DocumentMetadata::new()
        .with("titular", "Ana García")
        .with("tasacion", "TAS-001")
        .with("importeFinanciado", 180000)
        .with("ltv", 120);

    let outcome = shipped().validate_metadata(&uri("PrestamoHipotecario"), &metadata);

    assert_eq!(outcome.errors.len(), 1);
    assert!(outcome.errors[0].starts_with("ltv (120)"), "{}", outcome.errors[0]);
}

#[test]
fn test_valid_metadata() {
    let metadata = DocumentMetadata::new()
        .with("titular", "Ana García")
        .with("tasacion", "TAS-001")
        .with("importeFinanciado", 180000)
        .with("plazoMeses", 360)
        .with("ltv", 75.5);

    let outcome = shipped().validate_metadata(&uri("PrestamoHipotecario"), &metadata);
    assert!(outcome.is_valid, "{:?}", outcome.errors);
}

#[test]
fn test_validate_unknown_class() {
    let outcome = shipped().validate_metadata(&uri("NoExiste"), &DocumentMetadata::new());
    assert!(!outcome.is_valid);
    assert!(outcome.errors[0].starts_with("Clase no encontrada"));
}

// =============================================================================
// RISK
// =============================================================================

#[test]
fn test_mortgage_with_high_ltv_is_high_risk() {
    let risk = shipped().infer_risk_level(
        &uri("PrestamoHipotecario"),
        &DocumentMetadata::new().with("ltv", 85),
    );
    assert_eq!(risk, RiskLevel::Alto);
}

#[test]
fn test_credit_line_is_always_high_risk() {
    let reasoner = shipped();
    assert_eq!(
        reasoner.infer_risk_level(&uri("LineaCredito"), &DocumentMetadata::new()),
        RiskLevel::Alto
    );
    assert_eq!(
        reasoner.infer_risk_level(
            &uri("LineaCredito"),
            &DocumentMetadata::new().with("tae", 1.0).with("plazoMeses", 12)
        ),
        RiskLevel::Alto
    );
}

#[test]
fn test_long_mortgage_never_low_risk() {
    let metadata = DocumentMetadata::new()
        .with("ltv", 70)
        .with("tae", 3.5)
        .with("term_months", 300);

    let risk = shipped().infer_risk_level(&uri("PrestamoHipotecario"), &metadata);
    assert_ne!(risk, RiskLevel::Bajo);
    assert_eq!(risk, RiskLevel::Medio);
}

#[test]
fn test_risk_rules() {
    let reasoner = shipped();
    let none = DocumentMetadata::new();

    // sensitive
    assert_eq!(reasoner.infer_risk_level(&uri("Nomina"), &none), RiskLevel::Alto);
    // base
    assert_eq!(reasoner.infer_risk_level(&uri("PrestamoPersonal"), &none), RiskLevel::Bajo);
    // high TAE
    assert_eq!(
        reasoner.infer_risk_level(&uri("PrestamoPersonal"), &none.clone().with("tae", 10.5)),
        RiskLevel::Alto
    );
    // long term on a BAJO class
    assert_eq!(
        reasoner.infer_risk_level(&uri("PrestamoPersonal"), &none.clone().with("plazoMeses", 300)),
        RiskLevel::Medio
    );
    // undeclared base risk
    assert_eq!(
        reasoner.infer_risk_level(&uri("DocumentoContractual"), &none),
        RiskLevel::Medio
    );
}

// =============================================================================
// QUERIES & LOADING
// =============================================================================

#[test]
fn test_query_subclasses_with_labels() {
    let rows = shipped()
        .query("?c rdfs:subClassOf tf:Prestamo . ?c rdfs:label ?label")
        .unwrap();

    // Spanish and English label per loan class
    assert_eq!(rows.len(), 8);
    let labels: Vec<&str> = rows.iter().map(|row| row["label"].as_str()).collect();
    assert!(labels.contains(&"Préstamo Hipotecario"));
    assert!(labels.contains(&"Credit Line"));
    assert!(rows.iter().all(|row| row["c"].starts_with(DEFAULT_NAMESPACE)));
}

#[test]
fn test_malformed_query_is_an_error() {
    let reasoner = shipped();
    assert_eq!(reasoner.query(""), Err(QueryError::Empty));
    assert!(matches!(
        reasoner.query("?c ex:foo ?d"),
        Err(QueryError::UnknownPrefix(_))
    ));
    // state untouched
    assert_eq!(reasoner.get_statistics().total_classes, 15);
}

#[test]
fn test_degraded_load_yields_empty_reasoner() {
    let dir = tempfile::tempdir().unwrap();

    let missing = OntologyReasoner::load_or_empty(
        dir.path().join("missing.ttl"),
        DEFAULT_NAMESPACE,
        DEFAULT_ROOT,
    );
    assert!(missing.is_empty());
    assert!(missing.get_leaf_classes().is_empty());

    let broken = dir.path().join("broken.ttl");
    std::fs::write(&broken, "@prefix tf: <http://tefinancia.es/ontology#> .\ntf:A a ").unwrap();
    assert!(OntologyReasoner::load(&broken, DEFAULT_NAMESPACE, DEFAULT_ROOT).is_err());
    assert!(OntologyReasoner::load_or_empty(&broken, DEFAULT_NAMESPACE, DEFAULT_ROOT).is_empty());
}

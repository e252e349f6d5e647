//! Integration tests for TaxonomyIndex
//!
//! Exercise the taxonomy shipped under `config/taxonomy/` plus a few inline
//! fixtures for load failures.
//!
//! Run with: cargo test --test taxonomy_index

use doc_classifier::taxonomy::TaxonomyIndex;
use doc_classifier::{DocumentMetadata, RiskLevel, TaxonomyError};
use pretty_assertions::assert_eq;
use std::io::Write;
use std::path::PathBuf;

fn shipped_taxonomy_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config/taxonomy/document_taxonomy.yaml")
}

fn shipped() -> TaxonomyIndex {
    TaxonomyIndex::load(shipped_taxonomy_path()).expect("shipped taxonomy should load")
}

// =============================================================================
// SHIPPED TAXONOMY
// =============================================================================

#[test]
fn test_shipped_taxonomy_loads_as_single_tree() {
    let index = shipped();

    assert_eq!(index.root().map(|n| n.id.as_str()), Some("DOCUMENTO"));
    assert_eq!(index.len(), 19);
    assert_eq!(index.get_leaf_classes().len(), 13);
    assert_eq!(index.metadata().max_depth, 3);

    let stats = index.get_statistics();
    assert_eq!(stats.total_classes, 19);
    assert_eq!(stats.leaf_classes, 13);
    assert_eq!(stats.max_depth, 3);
    assert_eq!(stats.classes_by_level.get(&0), Some(&1));
}

#[test]
fn test_personal_loan_path_and_ancestors() {
    let index = shipped();

    assert_eq!(
        index.get_path("PRESTAMO_PERSONAL"),
        "Documento > Documento Contractual > Contrato de Financiación > Préstamo Personal"
    );

    let ancestors: Vec<&str> = index
        .get_ancestors("PRESTAMO_PERSONAL")
        .into_iter()
        .map(|n| n.id.as_str())
        .collect();
    assert_eq!(ancestors, vec!["CONTRATO_FINANCIACION", "DOC_CONTRACTUAL", "DOCUMENTO"]);

    let children: Vec<&str> = index
        .get_children("CONTRATO_FINANCIACION")
        .into_iter()
        .map(|n| n.id.as_str())
        .collect();
    assert_eq!(
        children,
        vec!["PRESTAMO_PERSONAL", "PRESTAMO_HIPOTECARIO", "LINEA_CREDITO", "TARJETA_CREDITO"]
    );
}

#[test]
fn test_mortgage_attributes() {
    let index = shipped();

    assert_eq!(index.get_risk_level("PRESTAMO_HIPOTECARIO"), Some(RiskLevel::Alto));
    assert_eq!(index.get_retention_years("PRESTAMO_HIPOTECARIO"), 30);
    assert!(index.is_sensitive("PRESTAMO_HIPOTECARIO"));
    assert_eq!(
        index.get_compliance_regulations("PRESTAMO_HIPOTECARIO"),
        ["Ley 5/2019".to_string(), "GDPR".to_string()]
    );
    assert_eq!(
        index.get_related_documents("PRESTAMO_HIPOTECARIO"),
        ["DNI".to_string(), "NOMINA".to_string(), "INFORME_TASACION".to_string()]
    );

    let fields = index.get_all_fields("PRESTAMO_HIPOTECARIO");
    assert_eq!(fields.required.len(), 5);
    assert!(fields.required.iter().all(|f| f.required));
    assert!(fields.optional.iter().all(|f| !f.required));
}

#[test]
fn test_unknown_class_defaults() {
    let index = shipped();

    assert_eq!(index.get_risk_level("NO_EXISTE"), None);
    assert_eq!(index.get_retention_years("NO_EXISTE"), 5);
    assert!(!index.is_sensitive("NO_EXISTE"));
    assert!(index.get_compliance_regulations("NO_EXISTE").is_empty());
    assert!(index.get_required_fields("NO_EXISTE").is_empty());
    assert_eq!(index.get_path("NO_EXISTE"), "");
}

#[test]
fn test_mortgage_below_minimum_amount() {
    let index = shipped();
    let metadata = DocumentMetadata::new()
        .with("titular", "Ana García")
        .with("dni_titular", "12345678Z")
        .with("importe_financiado", 20000)
        .with("plazo_meses", 240)
        .with("tasacion", "TAS-2024-001");

    let outcome = index.validate_metadata("PRESTAMO_HIPOTECARIO", &metadata);

    assert!(!outcome.is_valid);
    assert_eq!(
        outcome.errors,
        vec!["importe_financiado 20000 menor que mínimo permitido 30000".to_string()]
    );
}

#[test]
fn test_missing_and_null_required_fields() {
    let index = shipped();
    let metadata = DocumentMetadata::from_json(serde_json::json!({
        "titular": "Luis Pérez",
        "dni_titular": null,
        "importe_financiado": 15000,
        "plazo_meses": 48,
    }));

    let outcome = index.validate_metadata("PRESTAMO_PERSONAL", &metadata);

    assert!(!outcome.is_valid);
    assert_eq!(
        outcome.errors,
        vec![
            "Campo obligatorio faltante: dni_titular".to_string(),
            "Campo obligatorio faltante: tae".to_string(),
        ]
    );
}

#[test]
fn test_validate_unknown_class() {
    let outcome = shipped().validate_metadata("NO_EXISTE", &DocumentMetadata::new());
    assert!(!outcome.is_valid);
    assert_eq!(outcome.errors, vec!["Clase no encontrada: NO_EXISTE".to_string()]);
}

#[test]
fn test_keyword_classification_of_mortgage_deed() {
    let index = shipped();
    let text = "Escritura de préstamo hipotecario con garantía hipotecaria sobre la vivienda \
                habitual. La tasación fue aportada y el documento se firmó ante notario.";

    let matches = index.classify_by_keywords(text, 3);

    let top = &matches[0];
    assert_eq!(top.class_id, "PRESTAMO_HIPOTECARIO");
    assert_eq!(top.matches, 7);
    assert!((top.confidence - 0.7).abs() < 1e-9);
    assert_eq!(
        top.path,
        "Documento > Documento Contractual > Contrato de Financiación > Préstamo Hipotecario"
    );
    assert!(matches.len() <= 3);
    assert!(matches.iter().all(|m| (0.0..=1.0).contains(&m.confidence)));
}

#[test]
fn test_keyword_classification_without_matches() {
    assert!(shipped().classify_by_keywords("zzz qqq", 5).is_empty());
}

#[test]
fn test_search_by_keyword_case_insensitive() {
    let index = shipped();
    let hits = index.search_by_keyword("TASACIÓN");
    let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
    assert!(ids.contains(&"PRESTAMO_HIPOTECARIO"));
    assert!(ids.contains(&"INFORME_TASACION"));
}

#[test]
fn test_hierarchy_covers_every_class() {
    fn count(node: &doc_classifier::taxonomy::HierarchyNode) -> usize {
        1 + node.children.iter().map(count).sum::<usize>()
    }

    let index = shipped();
    let tree = index.get_hierarchy().expect("non-empty taxonomy has a hierarchy");
    assert_eq!(tree.id, "DOCUMENTO");
    assert_eq!(count(&tree), index.len());
}

// =============================================================================
// LOAD FAILURES
// =============================================================================

#[test]
fn test_missing_parent_rejected() {
    let yaml = r#"
taxonomy:
  RAIZ:
    label: "Raíz"
  HUERFANO:
    label: "Huérfano"
    parent: NO_EXISTE
"#;
    match TaxonomyIndex::from_yaml(yaml) {
        Err(TaxonomyError::MissingReference { id, relation, target }) => {
            assert_eq!(id, "HUERFANO");
            assert_eq!(relation, "parent");
            assert_eq!(target, "NO_EXISTE");
        }
        other => panic!("expected MissingReference, got {:?}", other.map(|i| i.len())),
    }
}

#[test]
fn test_two_roots_rejected() {
    let yaml = r#"
taxonomy:
  A:
    label: "A"
  B:
    label: "B"
"#;
    assert!(matches!(
        TaxonomyIndex::from_yaml(yaml),
        Err(TaxonomyError::InvalidNode { .. })
    ));
}

#[test]
fn test_cycle_rejected() {
    let yaml = r#"
taxonomy:
  RAIZ:
    label: "Raíz"
  A:
    label: "A"
    parent: B
  B:
    label: "B"
    parent: A
"#;
    assert!(matches!(
        TaxonomyIndex::from_yaml(yaml),
        Err(TaxonomyError::Cycle { .. })
    ));
}

#[test]
fn test_degraded_load_yields_empty_index() {
    let dir = tempfile::tempdir().unwrap();

    let missing = TaxonomyIndex::load_or_empty(dir.path().join("missing.yaml"));
    assert!(missing.is_empty());
    assert!(missing.classify_by_keywords("hipoteca", 3).is_empty());

    let path = dir.path().join("broken.yaml");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "taxonomy: [this is: not a map").unwrap();

    assert!(TaxonomyIndex::load(&path).is_err());
    assert!(TaxonomyIndex::load_or_empty(&path).is_empty());
}

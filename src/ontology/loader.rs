//! Ontology loader
//!
//! Parses Turtle with sophia and indexes the result into plain adjacency maps:
//! class records, direct subclass lists and a precomputed descendant closure.
//! Every structural query the reasoner answers is a lookup into these maps.

use std::collections::{HashMap, HashSet};

use sophia_api::prelude::*;
use sophia_api::term::TermKind;
use sophia_turtle::parser::turtle;
use tracing::debug;

use super::model::{
    local_name, GraphTriple, LangString, OntologyClass, PropertyValue, RdfTerm, Restriction,
    RestrictionKind,
};
use crate::error::OntologyError;

/// Vocabulary IRIs recognized by the loader
pub mod vocab {
    pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
    pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
    pub const OWL: &str = "http://www.w3.org/2002/07/owl#";
    pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";
    pub const SKOS: &str = "http://www.w3.org/2004/02/skos/core#";

    pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
    pub const RDF_FIRST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#first";
    pub const RDF_REST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest";

    pub const RDFS_SUBCLASS_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subClassOf";
    pub const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
    pub const RDFS_COMMENT: &str = "http://www.w3.org/2000/01/rdf-schema#comment";

    pub const OWL_CLASS: &str = "http://www.w3.org/2002/07/owl#Class";
    pub const OWL_RESTRICTION: &str = "http://www.w3.org/2002/07/owl#Restriction";
    pub const OWL_OBJECT_PROPERTY: &str = "http://www.w3.org/2002/07/owl#ObjectProperty";
    pub const OWL_DATATYPE_PROPERTY: &str = "http://www.w3.org/2002/07/owl#DatatypeProperty";
    pub const OWL_ON_PROPERTY: &str = "http://www.w3.org/2002/07/owl#onProperty";
    pub const OWL_MIN_CARDINALITY: &str = "http://www.w3.org/2002/07/owl#minCardinality";
    pub const OWL_CARDINALITY: &str = "http://www.w3.org/2002/07/owl#cardinality";
    pub const OWL_SOME_VALUES_FROM: &str = "http://www.w3.org/2002/07/owl#someValuesFrom";
    pub const OWL_WITH_RESTRICTIONS: &str = "http://www.w3.org/2002/07/owl#withRestrictions";

    pub const XSD_MIN_INCLUSIVE: &str = "http://www.w3.org/2001/XMLSchema#minInclusive";
    pub const XSD_MAX_INCLUSIVE: &str = "http://www.w3.org/2001/XMLSchema#maxInclusive";
}

use vocab::*;

/// Namespace properties holding multiple values, kept out of `properties`
const KEYWORD: &str = "keyword";
const REGULATION: &str = "regulacionAplicable";

// =============================================================================
// PARSING
// =============================================================================

/// Parse a Turtle document into owned triples.
pub fn parse_turtle(content: &str) -> Result<Vec<GraphTriple>, OntologyError> {
    let mut triples = Vec::new();
    let mut skipped = 0usize;

    turtle::parse_str(content)
        .for_each_triple(|t| {
            let p = t.p();
            let converted = (convert_term(t.s()), p.iri(), convert_term(t.o()));
            match converted {
                (Some(subject), Some(predicate), Some(object)) => triples.push(GraphTriple {
                    subject,
                    predicate: predicate.as_str().to_string(),
                    object,
                }),
                _ => skipped += 1,
            }
        })
        .map_err(|e| OntologyError::Turtle(e.to_string()))?;

    if skipped > 0 {
        debug!(skipped, "Skipped triples with unsupported terms");
    }

    Ok(triples)
}

fn convert_term<T: Term>(term: T) -> Option<RdfTerm> {
    match term.kind() {
        TermKind::Iri => term.iri().map(|iri| RdfTerm::Iri(iri.as_str().to_string())),
        TermKind::BlankNode => term
            .bnode_id()
            .map(|id| RdfTerm::BlankNode(id.as_str().to_string())),
        TermKind::Literal => term.lexical_form().map(|value| RdfTerm::Literal {
            value: String::from(&*value),
            datatype: term.datatype().map(|dt| dt.as_str().to_string()),
            language: term.language_tag().map(|tag| tag.as_str().to_string()),
        }),
        _ => None,
    }
}

/// Typed value of a literal from its datatype.
///
/// `xsd:integer|int|long` -> Integer, `xsd:decimal|float|double` -> Float,
/// `xsd:boolean` -> Boolean, anything else (or an unparsable lexical form)
/// -> String.
pub fn literal_value(value: &str, datatype: Option<&str>) -> PropertyValue {
    let fallback = || PropertyValue::String(value.to_string());

    match datatype.and_then(|dt| dt.strip_prefix(XSD)) {
        Some("integer" | "int" | "long") => value
            .trim()
            .parse()
            .map(PropertyValue::Integer)
            .unwrap_or_else(|_| fallback()),
        Some("decimal" | "float" | "double") => value
            .trim()
            .parse()
            .map(PropertyValue::Float)
            .unwrap_or_else(|_| fallback()),
        Some("boolean") => match value.trim() {
            "true" | "1" => PropertyValue::Boolean(true),
            "false" | "0" => PropertyValue::Boolean(false),
            _ => fallback(),
        },
        _ => fallback(),
    }
}

fn term_value(term: &RdfTerm) -> Option<PropertyValue> {
    match term {
        RdfTerm::Literal {
            value, datatype, ..
        } => Some(literal_value(value, datatype.as_deref())),
        RdfTerm::Iri(iri) => Some(PropertyValue::String(iri.clone())),
        RdfTerm::BlankNode(_) => None,
    }
}

/// Numeric facet or cardinality. Accepts any numeric lexical form regardless
/// of datatype (e.g. `xsd:nonNegativeInteger`).
fn numeric_value(term: &RdfTerm) -> Option<PropertyValue> {
    let RdfTerm::Literal { value, .. } = term else {
        return None;
    };
    let value = value.trim();
    value
        .parse::<i64>()
        .map(PropertyValue::Integer)
        .or_else(|_| value.parse::<f64>().map(PropertyValue::Float))
        .ok()
}

// =============================================================================
// INDEXING
// =============================================================================

/// Subject -> statement lookup over the parsed triples
struct SubjectIndex<'a> {
    by_subject: HashMap<&'a RdfTerm, Vec<&'a GraphTriple>>,
}

impl<'a> SubjectIndex<'a> {
    fn new(triples: &'a [GraphTriple]) -> Self {
        let mut by_subject: HashMap<&RdfTerm, Vec<&GraphTriple>> = HashMap::new();
        for t in triples {
            by_subject.entry(&t.subject).or_default().push(t);
        }
        Self { by_subject }
    }

    fn statements(&self, subject: &RdfTerm) -> &[&'a GraphTriple] {
        self.by_subject
            .get(subject)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn object(&self, subject: &RdfTerm, predicate: &str) -> Option<&'a RdfTerm> {
        self.statements(subject)
            .iter()
            .copied()
            .find(|t| t.predicate == predicate)
            .map(|t| &t.object)
    }

    fn has_type(&self, subject: &RdfTerm, class: &str) -> bool {
        self.statements(subject)
            .iter()
            .any(|t| t.predicate == RDF_TYPE && t.object.as_iri() == Some(class))
    }

    /// Members of an RDF collection
    fn list(&self, head: &RdfTerm) -> Vec<&'a RdfTerm> {
        let mut items = Vec::new();
        let mut seen = HashSet::new();
        let mut current = head;

        while current.is_blank() && seen.insert(current.clone()) {
            if let Some(first) = self.object(current, RDF_FIRST) {
                items.push(first);
            }
            match self.object(current, RDF_REST) {
                Some(rest) => current = rest,
                None => break,
            }
        }

        items
    }
}

/// Indexed ontology graph
#[derive(Debug, Clone, Default)]
pub struct OntologyGraph {
    pub(crate) triples: Vec<GraphTriple>,
    /// Namespace classes by URI
    pub(crate) classes: HashMap<String, OntologyClass>,
    /// Class URIs, sorted
    pub(crate) class_order: Vec<String>,
    /// Direct namespace subclasses, in statement order
    pub(crate) children: HashMap<String, Vec<String>>,
    /// Transitive subclasses (closure cache), excluding the class itself
    pub(crate) descendants: HashMap<String, Vec<String>>,
    pub(crate) object_properties: usize,
    pub(crate) datatype_properties: usize,
}

impl OntologyGraph {
    /// Index parsed triples. Classes are the IRIs under `namespace` that are
    /// declared `owl:Class` or take part in an `rdfs:subClassOf` edge.
    pub fn from_triples(triples: Vec<GraphTriple>, namespace: &str) -> Result<Self, OntologyError> {
        let index = SubjectIndex::new(&triples);

        let mut uris: Vec<String> = Vec::new();
        let mut seen = HashSet::new();
        let mut object_properties = 0;
        let mut datatype_properties = 0;

        for t in &triples {
            let Some(subject) = in_namespace(&t.subject, namespace) else {
                continue;
            };
            match (t.predicate.as_str(), t.object.as_iri()) {
                (RDF_TYPE, Some(OWL_CLASS)) | (RDFS_SUBCLASS_OF, _) => {
                    if seen.insert(subject) {
                        uris.push(subject.to_string());
                    }
                }
                (RDF_TYPE, Some(OWL_OBJECT_PROPERTY)) => object_properties += 1,
                (RDF_TYPE, Some(OWL_DATATYPE_PROPERTY)) => datatype_properties += 1,
                _ => {}
            }
            if t.predicate == RDFS_SUBCLASS_OF {
                if let Some(parent) = in_namespace(&t.object, namespace) {
                    if seen.insert(parent) {
                        uris.push(parent.to_string());
                    }
                }
            }
        }

        let mut classes = HashMap::new();
        let mut children: HashMap<String, Vec<String>> = HashMap::new();

        for uri in &uris {
            let class = build_class(uri, namespace, &index);
            for parent in &class.parents {
                if parent.starts_with(namespace) {
                    children.entry(parent.clone()).or_default().push(uri.clone());
                }
            }
            classes.insert(uri.clone(), class);
        }

        let mut class_order = uris;
        class_order.sort();

        let descendants = closure(&class_order, &children)?;

        debug!(
            triples = triples.len(),
            classes = classes.len(),
            object_properties,
            datatype_properties,
            "Indexed ontology graph"
        );

        Ok(Self {
            triples,
            classes,
            class_order,
            children,
            descendants,
            object_properties,
            datatype_properties,
        })
    }
}

fn in_namespace<'t>(term: &'t RdfTerm, namespace: &str) -> Option<&'t str> {
    term.as_iri().filter(|iri| iri.starts_with(namespace))
}

fn build_class(uri: &str, namespace: &str, index: &SubjectIndex<'_>) -> OntologyClass {
    let subject = RdfTerm::Iri(uri.to_string());
    let mut class = OntologyClass::new(uri);

    for t in index.statements(&subject) {
        match (t.predicate.as_str(), &t.object) {
            (RDF_TYPE, object) if object.as_iri() == Some(OWL_CLASS) => class.declared = true,
            (RDFS_LABEL, RdfTerm::Literal { value, language, .. }) => class.labels.push(LangString {
                value: value.clone(),
                language: language.clone(),
            }),
            (RDFS_COMMENT, RdfTerm::Literal { value, language, .. }) => {
                class.comments.push(LangString {
                    value: value.clone(),
                    language: language.clone(),
                })
            }
            (RDFS_SUBCLASS_OF, RdfTerm::Iri(parent)) => {
                if parent != uri && !class.parents.contains(parent) {
                    class.parents.push(parent.clone());
                }
            }
            (RDFS_SUBCLASS_OF, node @ RdfTerm::BlankNode(_)) => {
                class.restrictions.extend(read_restriction(node, index));
            }
            (predicate, object) if predicate.starts_with(namespace) => {
                let name = local_name(predicate);
                match name {
                    KEYWORD => {
                        let keyword = object.lexical().to_string();
                        // An empty keyword is a substring of every text
                        if keyword.trim().is_empty() {
                            continue;
                        }
                        class.keywords_lower.push(keyword.to_lowercase());
                        class.keywords.push(keyword);
                    }
                    REGULATION => class.regulations.push(object.lexical().to_string()),
                    _ => {
                        if let Some(value) = term_value(object) {
                            class.properties.entry(name.to_string()).or_insert(value);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    class
}

/// Restrictions described by an anonymous `owl:Restriction` node
fn read_restriction(node: &RdfTerm, index: &SubjectIndex<'_>) -> Vec<Restriction> {
    if !index.has_type(node, OWL_RESTRICTION) {
        return Vec::new();
    }
    let Some(property) = index.object(node, OWL_ON_PROPERTY).and_then(RdfTerm::as_iri) else {
        return Vec::new();
    };

    let make = |kind: RestrictionKind, value: PropertyValue| Restriction {
        property: property.to_string(),
        property_name: local_name(property).to_string(),
        kind,
        value,
    };

    let mut restrictions = Vec::new();

    for t in index.statements(node) {
        match t.predicate.as_str() {
            OWL_MIN_CARDINALITY => {
                if let Some(v) = numeric_value(&t.object) {
                    restrictions.push(make(RestrictionKind::MinCardinality, v));
                }
            }
            OWL_CARDINALITY => {
                if let Some(v) = numeric_value(&t.object) {
                    restrictions.push(make(RestrictionKind::ExactCardinality, v));
                }
            }
            OWL_SOME_VALUES_FROM => match &t.object {
                RdfTerm::Iri(filler) => restrictions.push(make(
                    RestrictionKind::SomeValuesFrom,
                    PropertyValue::String(filler.clone()),
                )),
                datatype @ RdfTerm::BlankNode(_) => {
                    // [ owl:withRestrictions ( [ xsd:minInclusive n ] ... ) ]
                    if let Some(list) = index.object(datatype, OWL_WITH_RESTRICTIONS) {
                        for facet in index.list(list) {
                            restrictions.extend(
                                read_facets(facet, index)
                                    .into_iter()
                                    .map(|(kind, v)| make(kind, v)),
                            );
                        }
                    }
                }
                RdfTerm::Literal { .. } => {}
            },
            _ => {}
        }
    }

    restrictions.extend(
        read_facets(node, index)
            .into_iter()
            .map(|(kind, v)| make(kind, v)),
    );

    restrictions
}

fn read_facets(node: &RdfTerm, index: &SubjectIndex<'_>) -> Vec<(RestrictionKind, PropertyValue)> {
    index
        .statements(node)
        .iter()
        .filter_map(|t| {
            let kind = match t.predicate.as_str() {
                XSD_MIN_INCLUSIVE => RestrictionKind::MinInclusive,
                XSD_MAX_INCLUSIVE => RestrictionKind::MaxInclusive,
                _ => return None,
            };
            numeric_value(&t.object).map(|v| (kind, v))
        })
        .collect()
}

/// Descendant closure for every class, failing on a subclass cycle.
fn closure(
    classes: &[String],
    children: &HashMap<String, Vec<String>>,
) -> Result<HashMap<String, Vec<String>>, OntologyError> {
    fn visit(
        uri: &str,
        children: &HashMap<String, Vec<String>>,
        memo: &mut HashMap<String, Vec<String>>,
        in_progress: &mut HashSet<String>,
    ) -> Result<(), OntologyError> {
        if memo.contains_key(uri) {
            return Ok(());
        }
        if !in_progress.insert(uri.to_string()) {
            return Err(OntologyError::Cycle {
                uri: uri.to_string(),
            });
        }

        let mut all = Vec::new();
        let mut seen = HashSet::new();
        for child in children.get(uri).map(Vec::as_slice).unwrap_or_default() {
            visit(child, children, memo, in_progress)?;
            if seen.insert(child.clone()) {
                all.push(child.clone());
            }
            for d in memo.get(child.as_str()).map(Vec::as_slice).unwrap_or_default() {
                if seen.insert(d.clone()) {
                    all.push(d.clone());
                }
            }
        }

        in_progress.remove(uri);
        memo.insert(uri.to_string(), all);
        Ok(())
    }

    let mut memo = HashMap::new();
    let mut in_progress = HashSet::new();
    for uri in classes {
        visit(uri, children, &mut memo, &mut in_progress)?;
    }
    Ok(memo)
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

tf:Prestamo a owl:Class ; rdfs:subClassOf tf:Documento .

tf:PrestamoHipotecario a owl:Class ;
    rdfs:subClassOf tf:Prestamo ;
    rdfs:label "Mortgage"@en , "Préstamo Hipotecario"@es ;
    tf:importeMinimo 30000 ;
    tf:taeMaximo 7.5 ;
    tf:esSensible false ;
    tf:nivelRiesgoBase "MEDIO" ;
    tf:keyword "hipoteca" , "vivienda" ;
    tf:regulacionAplicable "Ley 5/2019" ;
    rdfs:subClassOf [
        a owl:Restriction ;
        owl:onProperty tf:tasacion ;
        owl:minCardinality "1"^^xsd:nonNegativeInteger
    ] , [
        a owl:Restriction ;
        owl:onProperty tf:ltv ;
        owl:someValuesFrom [ a rdfs:Datatype ; owl:withRestrictions ( [ xsd:minInclusive 0 ] [ xsd:maxInclusive 100 ] ) ]
    ] .

tf:tasacion a owl:ObjectProperty .
tf:importeMinimo a owl:DatatypeProperty .
"#;

    fn graph() -> OntologyGraph {
        OntologyGraph::from_triples(parse_turtle(TEST_TTL).unwrap(), NS).unwrap()
    }

    #[test]
    fn test_literal_typing() {
        let int = format!("{}integer", XSD);
        let dec = format!("{}decimal", XSD);
        let boolean = format!("{}boolean", XSD);
        assert_eq!(literal_value("30000", Some(&int)), PropertyValue::Integer(30000));
        assert_eq!(literal_value("7.5", Some(&dec)), PropertyValue::Float(7.5));
        assert_eq!(literal_value("true", Some(&boolean)), PropertyValue::Boolean(true));
        assert_eq!(literal_value("ALTO", None), PropertyValue::String("ALTO".into()));
        assert_eq!(literal_value("abc", Some(&int)), PropertyValue::String("abc".into()));
    }

    #[test]
    fn test_class_properties() {
        let graph = graph();
        let class = &graph.classes[&format!("{}PrestamoHipotecario", NS)];

        assert!(class.declared);
        assert_eq!(class.parents, vec![format!("{}Prestamo", NS)]);
        assert_eq!(class.properties["importeMinimo"], PropertyValue::Integer(30000));
        assert_eq!(class.properties["taeMaximo"], PropertyValue::Float(7.5));
        assert_eq!(class.properties["esSensible"], PropertyValue::Boolean(false));
        assert_eq!(class.keywords, vec!["hipoteca".to_string(), "vivienda".to_string()]);
        assert_eq!(class.regulations, vec!["Ley 5/2019".to_string()]);
        assert!(!class.properties.contains_key("keyword"));
    }

    #[test]
    fn test_restrictions() {
        let graph = graph();
        let class = &graph.classes[&format!("{}PrestamoHipotecario", NS)];
        let kinds: Vec<(&str, RestrictionKind)> = class
            .restrictions
            .iter()
            .map(|r| (r.property_name.as_str(), r.kind))
            .collect();

        assert!(kinds.contains(&("tasacion", RestrictionKind::MinCardinality)));
        assert!(kinds.contains(&("ltv", RestrictionKind::MinInclusive)));
        assert!(kinds.contains(&("ltv", RestrictionKind::MaxInclusive)));
    }

    #[test]
    fn test_closure_and_counts() {
        let graph = graph();
        let root = format!("{}Documento", NS);
        assert_eq!(
            graph.descendants[&root],
            vec![format!("{}Prestamo", NS), format!("{}PrestamoHipotecario", NS)]
        );
        assert_eq!(graph.object_properties, 1);
        assert_eq!(graph.datatype_properties, 1);
    }

    #[test]
    fn test_cycle_rejected() {
        let ttl = r#"
@prefix tf: <http://tefinancia.es/ontology#> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
tf:A rdfs:subClassOf tf:B .
tf:B rdfs:subClassOf tf:A .
"#;
        let err = OntologyGraph::from_triples(parse_turtle(ttl).unwrap(), NS).unwrap_err();
        assert!(matches!(err, OntologyError::Cycle { .. }));
    }

    #[test]
    fn test_parse_turtle_expands_predicates() {
        let ttl = r#"
@prefix tf: <http://tefinancia.es/ontology#> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
tf:Nomina rdfs:subClassOf tf:DocumentoFinanciero ;
    tf:importeMinimo 0 .
"#;
        let triples = parse_turtle(ttl).unwrap();
        assert_eq!(
            triples[0],
            GraphTriple {
                subject: RdfTerm::Iri(format!("{}Nomina", NS)),
                predicate: RDFS_SUBCLASS_OF.to_string(),
                object: RdfTerm::Iri(format!("{}DocumentoFinanciero", NS)),
            }
        );
        assert_eq!(triples[1].predicate, format!("{}importeMinimo", NS));
        assert_eq!(triples.len(), 2);
    }

    #[test]
    fn test_blank_keywords_dropped() {
        let ttl = r#"
@prefix tf: <http://tefinancia.es/ontology#> .
@prefix owl: <http://www.w3.org/2002/07/owl#> .
tf:Documento a owl:Class .
tf:Nomina a owl:Class ;
    tf:keyword "nómina" , "" , "   " .
"#;
        let graph = OntologyGraph::from_triples(parse_turtle(ttl).unwrap(), NS).unwrap();
        let class = &graph.classes[&format!("{}Nomina", NS)];
        assert_eq!(class.keywords, vec!["nómina".to_string()]);
        assert_eq!(class.keywords_lower, vec!["nómina".to_string()]);
    }

    #[test]
    fn test_malformed_turtle() {
        assert!(matches!(
            parse_turtle("tf:A rdfs:subClassOf ."),
            Err(OntologyError::Turtle(_))
        ));
    }
}

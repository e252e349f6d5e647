//! Taxonomy Index
//!
//! In-memory index over the document class tree, loaded once from a taxonomy
//! document. Answers navigation, path, search and keyword classification
//! queries; read-only after construction.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info, warn};

use super::types::{
    ClassFields, FieldSpec, HierarchyNode, KeywordMatch, SearchHit, TaxonomyMetadata,
    TaxonomyNode, TaxonomyStatistics,
};
use crate::error::TaxonomyError;
use crate::metadata::{DocumentMetadata, ValidationOutcome};
use crate::risk::RiskLevel;

/// Separator used by [`TaxonomyIndex::get_path`]
pub const PATH_SEPARATOR: &str = " > ";

/// Metadata keys holding the financed amount (canonical name first)
pub const AMOUNT_KEYS: &[&str] = &["importe_financiado", "importeFinanciado", "amount"];
/// Metadata keys holding the term in months (canonical name first)
pub const TERM_KEYS: &[&str] = &["plazo_meses", "plazoMeses", "term_months"];

/// Taxonomy loaded from configuration
#[derive(Debug, Clone, Default)]
pub struct TaxonomyIndex {
    /// Nodes indexed by class id
    nodes: HashMap<String, TaxonomyNode>,

    /// Class ids in document order
    order: Vec<String>,

    /// Root class id (None for an empty index)
    root: Option<String>,

    metadata: TaxonomyMetadata,
}

/// Document structure: `metadata` block + `taxonomy` map keyed by class id
#[derive(Debug, Deserialize)]
struct TaxonomyFile {
    #[serde(default)]
    metadata: TaxonomyMetadata,

    // Kept as a raw mapping so document order survives deserialization
    #[serde(default)]
    taxonomy: serde_yaml::Mapping,
}

impl TaxonomyIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a taxonomy document (YAML or JSON).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TaxonomyError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| TaxonomyError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let index = Self::from_yaml(&content)?;
        info!(
            path = %path.display(),
            classes = index.len(),
            version = %index.metadata.version,
            "Loaded taxonomy"
        );
        Ok(index)
    }

    /// Load, degrading to an empty index when the source is missing or corrupt.
    ///
    /// Other document types must still be served when the taxonomy is broken,
    /// so a load failure is a startup warning rather than a crash.
    pub fn load_or_empty<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(index) => index,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Taxonomy unavailable, using empty index");
                Self::new()
            }
        }
    }

    /// Parse a taxonomy document. JSON documents are accepted as YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, TaxonomyError> {
        let file: TaxonomyFile = serde_yaml::from_str(yaml)?;

        let mut nodes = HashMap::new();
        let mut order = Vec::new();

        for (key, value) in file.taxonomy {
            let id = match key.as_str() {
                Some(id) => id.to_string(),
                None => {
                    return Err(TaxonomyError::InvalidNode {
                        id: format!("{:?}", key),
                        reason: "class id must be a string".to_string(),
                    })
                }
            };

            let mut node: TaxonomyNode = serde_yaml::from_value(value)?;
            node.id = id.clone();
            // An empty keyword is a substring of every text
            node.keywords.retain(|k| !k.trim().is_empty());
            node.keywords_lower = node.keywords.iter().map(|k| k.to_lowercase()).collect();

            if nodes.insert(id.clone(), node).is_some() {
                return Err(TaxonomyError::InvalidNode {
                    id,
                    reason: "duplicate class id".to_string(),
                });
            }
            order.push(id);
        }

        let root = Self::check_tree(&nodes, &order)?;

        debug!(classes = order.len(), root = ?root, "Taxonomy tree checked");

        Ok(Self {
            nodes,
            order,
            root,
            metadata: file.metadata,
        })
    }

    /// Verify the node set forms a single rooted tree. Returns the root id.
    fn check_tree(
        nodes: &HashMap<String, TaxonomyNode>,
        order: &[String],
    ) -> Result<Option<String>, TaxonomyError> {
        let mut roots = Vec::new();

        for id in order {
            let node = &nodes[id];

            match &node.parent {
                Some(parent) if !nodes.contains_key(parent) => {
                    return Err(TaxonomyError::MissingReference {
                        id: id.clone(),
                        relation: "parent",
                        target: parent.clone(),
                    });
                }
                Some(_) => {}
                None => roots.push(id.clone()),
            }

            for child in &node.children {
                let child_node = nodes.get(child).ok_or_else(|| TaxonomyError::MissingReference {
                    id: id.clone(),
                    relation: "child",
                    target: child.clone(),
                })?;
                if child_node.parent.as_deref() != Some(id.as_str()) {
                    return Err(TaxonomyError::InvalidNode {
                        id: child.clone(),
                        reason: format!("listed as child of '{}' but its parent differs", id),
                    });
                }
            }

            // Walk up to the root; a repeat means a cycle
            let mut visited = HashSet::new();
            let mut current = id.as_str();
            while let Some(parent) = nodes.get(current).and_then(|n| n.parent.as_deref()) {
                if !visited.insert(current) {
                    return Err(TaxonomyError::Cycle { id: id.clone() });
                }
                current = parent;
            }

            // Parent and children links must agree both ways
            if let Some(parent) = &node.parent {
                if !nodes[parent].children.contains(id) {
                    return Err(TaxonomyError::InvalidNode {
                        id: id.clone(),
                        reason: format!("parent '{}' does not list it as a child", parent),
                    });
                }
            }
        }

        match roots.len() {
            0 if order.is_empty() => Ok(None),
            0 => Err(TaxonomyError::Cycle {
                id: order[0].clone(),
            }),
            1 => Ok(roots.pop()),
            _ => Err(TaxonomyError::InvalidNode {
                id: roots.join(", "),
                reason: "taxonomy has more than one root".to_string(),
            }),
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Get a class by id.
    pub fn get_class(&self, class_id: &str) -> Option<&TaxonomyNode> {
        self.nodes.get(class_id)
    }

    pub fn root(&self) -> Option<&TaxonomyNode> {
        self.root.as_deref().and_then(|id| self.nodes.get(id))
    }

    pub fn metadata(&self) -> &TaxonomyMetadata {
        &self.metadata
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All classes in document order
    pub fn classes(&self) -> impl Iterator<Item = &TaxonomyNode> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn get_children(&self, class_id: &str) -> Vec<&TaxonomyNode> {
        self.nodes
            .get(class_id)
            .map(|node| {
                node.children
                    .iter()
                    .filter_map(|child| self.nodes.get(child))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn get_parent(&self, class_id: &str) -> Option<&TaxonomyNode> {
        self.nodes
            .get(class_id)
            .and_then(|node| node.parent.as_deref())
            .and_then(|parent| self.nodes.get(parent))
    }

    /// All ancestors, nearest first.
    pub fn get_ancestors(&self, class_id: &str) -> Vec<&TaxonomyNode> {
        let mut ancestors = Vec::new();
        let mut current = class_id;

        while let Some(parent) = self.get_parent(current) {
            ancestors.push(parent);
            current = &parent.id;
        }

        ancestors
    }

    /// Full path from the root, e.g.
    /// "Documento > Documento Contractual > Contrato de Financiación > Préstamo Personal".
    ///
    /// Empty string for an unknown class.
    pub fn get_path(&self, class_id: &str) -> String {
        let Some(node) = self.nodes.get(class_id) else {
            return String::new();
        };

        let mut parts: Vec<&str> = self
            .get_ancestors(class_id)
            .into_iter()
            .rev()
            .map(|a| a.label.as_str())
            .collect();
        parts.push(&node.label);

        parts.join(PATH_SEPARATOR)
    }

    /// Nested tree from the root.
    pub fn get_hierarchy(&self) -> Option<HierarchyNode> {
        self.root.as_deref().map(|root| self.build_tree(root))
    }

    fn build_tree(&self, class_id: &str) -> HierarchyNode {
        let node = &self.nodes[class_id];
        HierarchyNode {
            id: node.id.clone(),
            label: node.label.clone(),
            level: node.level,
            description: node.description.clone(),
            children: node
                .children
                .iter()
                .filter(|c| self.nodes.contains_key(c.as_str()))
                .map(|c| self.build_tree(c))
                .collect(),
        }
    }

    /// Leaf classes in document order
    pub fn get_leaf_classes(&self) -> Vec<&TaxonomyNode> {
        self.classes().filter(|n| n.is_leaf()).collect()
    }

    // =========================================================================
    // Class attributes
    // =========================================================================

    pub fn get_required_fields(&self, class_id: &str) -> Vec<FieldSpec> {
        self.fields(class_id, |n| &n.required_fields, true)
    }

    pub fn get_optional_fields(&self, class_id: &str) -> Vec<FieldSpec> {
        self.fields(class_id, |n| &n.optional_fields, false)
    }

    pub fn get_all_fields(&self, class_id: &str) -> ClassFields {
        ClassFields {
            required: self.get_required_fields(class_id),
            optional: self.get_optional_fields(class_id),
        }
    }

    fn fields(
        &self,
        class_id: &str,
        select: impl Fn(&TaxonomyNode) -> &Vec<String>,
        required: bool,
    ) -> Vec<FieldSpec> {
        self.nodes
            .get(class_id)
            .map(|node| {
                select(node)
                    .iter()
                    .map(|name| FieldSpec {
                        name: name.clone(),
                        required,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Declared risk level; None for an unknown class.
    pub fn get_risk_level(&self, class_id: &str) -> Option<RiskLevel> {
        self.nodes.get(class_id).map(|n| n.risk_level)
    }

    pub fn get_retention_years(&self, class_id: &str) -> u32 {
        self.nodes
            .get(class_id)
            .map(|n| n.retention_years)
            .unwrap_or_else(super::types::default_retention_years)
    }

    pub fn is_sensitive(&self, class_id: &str) -> bool {
        self.nodes.get(class_id).is_some_and(|n| n.is_sensitive)
    }

    pub fn get_compliance_regulations(&self, class_id: &str) -> &[String] {
        self.nodes
            .get(class_id)
            .map(|n| n.compliance_regulations.as_slice())
            .unwrap_or_default()
    }

    pub fn get_related_documents(&self, class_id: &str) -> &[String] {
        self.nodes
            .get(class_id)
            .map(|n| n.related_documents.as_slice())
            .unwrap_or_default()
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Validate document metadata against a class's required fields and
    /// numeric bounds.
    pub fn validate_metadata(&self, class_id: &str, metadata: &DocumentMetadata) -> ValidationOutcome {
        let Some(node) = self.nodes.get(class_id) else {
            return ValidationOutcome::from_errors(vec![format!(
                "Clase no encontrada: {}",
                class_id
            )]);
        };

        let mut errors: Vec<String> = node
            .required_fields
            .iter()
            .filter(|field| !metadata.has_value(field))
            .map(|field| format!("Campo obligatorio faltante: {}", field))
            .collect();

        let rules = &node.validation_rules;

        if let Some((key, amount, raw)) = metadata.first_number(AMOUNT_KEYS) {
            if let Some(min) = rules.importe_minimo.filter(|min| amount < *min) {
                errors.push(format!("{} {} menor que mínimo permitido {}", key, raw, min));
            }
            if let Some(max) = rules.importe_maximo.filter(|max| amount > *max) {
                errors.push(format!("{} {} mayor que máximo permitido {}", key, raw, max));
            }
        }

        if let Some((key, term, raw)) = metadata.first_number(TERM_KEYS) {
            if let Some(min) = rules.plazo_minimo_meses.filter(|min| term < *min) {
                errors.push(format!("{} {} menor que mínimo permitido {}", key, raw, min));
            }
            if let Some(max) = rules.plazo_maximo_meses.filter(|max| term > *max) {
                errors.push(format!("{} {} mayor que máximo permitido {}", key, raw, max));
            }
        }

        ValidationOutcome::from_errors(errors)
    }

    // =========================================================================
    // Search & classification
    // =========================================================================

    /// Case-insensitive substring search over label, description and keywords.
    /// Results follow document order.
    pub fn search_by_keyword(&self, keyword: &str) -> Vec<SearchHit> {
        let needle = keyword.to_lowercase();

        self.classes()
            .filter(|node| {
                node.label.to_lowercase().contains(&needle)
                    || node
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&needle))
                    || node.keywords_lower.iter().any(|k| k.contains(&needle))
            })
            .map(|node| SearchHit {
                id: node.id.clone(),
                label: node.label.clone(),
                level: node.level,
                description: node.description.clone(),
                path: self.get_path(&node.id),
            })
            .collect()
    }

    /// Score leaf classes by keyword overlap with `text`.
    ///
    /// `confidence = min(matches / |keywords|, 1.0)`; leaves with no match are
    /// dropped. Sorted by (matches, confidence) descending, document order on
    /// ties, truncated to `top_n`.
    pub fn classify_by_keywords(&self, text: &str, top_n: usize) -> Vec<KeywordMatch> {
        let text_lower = text.to_lowercase();

        let mut scores: Vec<KeywordMatch> = self
            .get_leaf_classes()
            .into_iter()
            .filter(|leaf| !leaf.keywords.is_empty())
            .filter_map(|leaf| {
                let matched_keywords: Vec<String> = leaf
                    .keywords
                    .iter()
                    .zip(&leaf.keywords_lower)
                    .filter(|(_, lower)| text_lower.contains(lower.as_str()))
                    .map(|(original, _)| original.clone())
                    .collect();

                let matches = matched_keywords.len();
                if matches == 0 {
                    return None;
                }

                let confidence = (matches as f64 / leaf.keywords.len() as f64).min(1.0);

                Some(KeywordMatch {
                    class_id: leaf.id.clone(),
                    label: leaf.label.clone(),
                    path: self.get_path(&leaf.id),
                    confidence,
                    matches,
                    matched_keywords,
                })
            })
            .collect();

        scores.sort_by(|a, b| {
            b.matches
                .cmp(&a.matches)
                .then_with(|| b.confidence.total_cmp(&a.confidence))
        });
        scores.truncate(top_n);
        scores
    }

    /// Aggregate counts.
    pub fn get_statistics(&self) -> TaxonomyStatistics {
        let mut stats = TaxonomyStatistics {
            total_classes: self.nodes.len(),
            classes_by_risk: RiskLevel::ALL.iter().map(|r| (*r, 0)).collect(),
            ..Default::default()
        };

        for node in self.nodes.values() {
            *stats.classes_by_level.entry(node.level).or_insert(0) += 1;
            *stats.classes_by_risk.entry(node.risk_level).or_insert(0) += 1;
            if node.is_sensitive {
                stats.sensitive_classes += 1;
            }
            if node.is_leaf() {
                stats.leaf_classes += 1;
            }
        }

        stats.max_depth = stats.classes_by_level.keys().max().copied().unwrap_or(0);
        stats
    }
}

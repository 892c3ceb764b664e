//! Graph nodes and the deduplicating node registry.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::resolve::ResolvedNode;

/// A node keyed by its canonical identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub categories: BTreeSet<String>,
    #[serde(default)]
    pub equivalent_identifiers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub information_content: Option<f64>,
}

impl GraphNode {
    /// Build a node from a resolver answer plus schema-declared categories.
    pub fn from_resolved(id: impl Into<String>, resolved: ResolvedNode, extra_categories: &[String]) -> Self {
        let mut categories: BTreeSet<String> = resolved.categories.into_iter().collect();
        categories.extend(extra_categories.iter().cloned());

        Self {
            id: id.into(),
            name: resolved.name,
            categories,
            equivalent_identifiers: resolved.equivalent_identifiers,
            information_content: resolved.information_content,
        }
    }
}

/// Accumulates nodes across all processed pairs.
///
/// The first node stored under an identifier keeps its name, equivalents and
/// information content; later encounters only add categories.
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    nodes: IndexMap<String, GraphNode>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node or union its categories into the existing one.
    pub fn upsert(&mut self, node: GraphNode) {
        match self.nodes.get_mut(&node.id) {
            Some(existing) => existing.categories.extend(node.categories),
            None => {
                self.nodes.insert(node.id.clone(), node);
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in first-encounter order.
    pub fn into_nodes(self) -> Vec<GraphNode> {
        self.nodes.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, name: &str, categories: &[&str]) -> GraphNode {
        GraphNode::from_resolved(
            id,
            ResolvedNode::new(name).with_categories(categories.iter().copied()),
            &[],
        )
    }

    #[test]
    fn test_schema_categories_are_unioned() {
        let resolved = ResolvedNode::new("asthma").with_categories(["biolink:Disease"]);
        let n = GraphNode::from_resolved(
            "MONDO:0004979",
            resolved,
            &["biolink:Disease".to_string(), "biolink:DiseaseOrPhenotypicFeature".to_string()],
        );
        assert_eq!(n.categories.len(), 2);
    }

    #[test]
    fn test_upsert_unions_categories_and_keeps_first_name() {
        let mut registry = NodeRegistry::new();
        registry.upsert(node("X:1", "first", &["a"]));
        registry.upsert(node("X:2", "other", &[]));
        registry.upsert(node("X:1", "second", &["b", "a"]));

        assert_eq!(registry.len(), 2);
        let merged = registry.get("X:1").unwrap();
        assert_eq!(merged.name, "first");
        assert_eq!(merged.categories.iter().collect::<Vec<_>>(), vec!["a", "b"]);

        let ids: Vec<String> = registry.into_nodes().into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec!["X:1", "X:2"]);
    }
}

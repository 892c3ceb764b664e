//! Merging many cohort graphs into one release.
//!
//! Edges from different cohorts that share subject, predicate and object are
//! folded into one release edge. Attributes common to every cohort are kept
//! once; each cohort's statistics are nested under an
//! `icees_cohort_identifier` attribute. Nodes are deduplicated by id, first
//! occurrence wins.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{CohortGraphError, Result};
use crate::graph::{read_lines, write_jsonl, EdgeStatistics, GraphEdge, GraphNode};
use crate::stats::Predicate;

/// Release version used when none is given.
pub const DEFAULT_RELEASE_VERSION: &str = "1.5.0";

/// Attribute type under which per-cohort statistics are nested.
pub const COHORT_ATTRIBUTE: &str = "icees_cohort_identifier";

/// A typed attribute, possibly carrying nested attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub attribute_type_id: String,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Attribute>,
}

impl Attribute {
    pub fn new(attribute_type_id: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            attribute_type_id: attribute_type_id.into(),
            value: value.into(),
            attributes: Vec::new(),
        }
    }
}

/// One merged edge of a release.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseEdge {
    pub subject: String,
    pub predicate: Predicate,
    pub object: String,
    pub attributes: Vec<Attribute>,
}

impl ReleaseEdge {
    /// Cohort attributes of this edge, in merge order.
    pub fn cohorts(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes
            .iter()
            .filter(|a| a.attribute_type_id == COHORT_ATTRIBUTE)
    }
}

/// Paths and counts of a written release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseFiles {
    pub nodes_path: PathBuf,
    pub edges_path: PathBuf,
    pub node_count: usize,
    pub edge_count: usize,
}

/// Accumulates cohort graph files into a release.
#[derive(Debug, Clone, Default)]
pub struct ReleaseBuilder {
    edges: IndexMap<String, ReleaseEdge>,
    nodes: IndexMap<String, GraphNode>,
}

impl ReleaseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one cohort edge into the release.
    pub fn add_edge(&mut self, edge: &GraphEdge) {
        let key = format!("{}-{}>{}", edge.subject, edge.predicate, edge.object);
        let provenance = &edge.properties.provenance;

        let merged = self.edges.entry(key).or_insert_with(|| ReleaseEdge {
            subject: edge.subject.clone(),
            predicate: edge.predicate,
            object: edge.object.clone(),
            attributes: vec![
                Attribute::new("biolink:primary_knowledge_source", edge.primary_knowledge_source.as_str()),
                Attribute::new("biolink:supporting_data_source", provenance.supporting_data_source.as_str()),
                Attribute::new(
                    "terms_and_conditions_of_use",
                    provenance.terms_and_conditions_of_use.as_str(),
                ),
                Attribute::new("subject_feature_name", provenance.subject_feature_name.as_str()),
                Attribute::new("object_feature_name", provenance.object_feature_name.as_str()),
            ],
        });

        let stats = statistics_attributes(&edge.properties.statistics);
        let cohort = provenance.cohort_identifier.as_str();
        match merged
            .attributes
            .iter_mut()
            .find(|a| a.attribute_type_id == COHORT_ATTRIBUTE && a.value == cohort)
        {
            Some(existing) => existing.attributes.extend(stats),
            None => merged.attributes.push(Attribute {
                attributes: stats,
                ..Attribute::new(COHORT_ATTRIBUTE, cohort)
            }),
        }
    }

    /// Keep a node unless one with the same id was already added.
    pub fn add_node(&mut self, node: GraphNode) {
        self.nodes.entry(node.id.clone()).or_insert(node);
    }

    /// Fold every edge of a `*_edges.jsonl` file. Returns the number read.
    pub fn add_edges_file(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let lines = read_lines(path.as_ref())?;
        for line in &lines {
            let edge: GraphEdge = serde_json::from_str(line)?;
            self.add_edge(&edge);
        }
        debug!(path = %path.as_ref().display(), edges = lines.len(), "Merged edges file");
        Ok(lines.len())
    }

    /// Add every node of a `*_nodes.jsonl` file. Returns the number read.
    pub fn add_nodes_file(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let lines = read_lines(path.as_ref())?;
        for line in &lines {
            self.add_node(serde_json::from_str(line)?);
        }
        debug!(path = %path.as_ref().display(), nodes = lines.len(), "Merged nodes file");
        Ok(lines.len())
    }

    /// Add every `*_edges.jsonl` and `*_nodes.jsonl` file of a build
    /// directory, in file name order.
    pub fn add_directory(&mut self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(|e| CohortGraphError::io(dir, e))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        paths.sort();

        for path in &paths {
            let name = path.file_name().unwrap_or_default().to_string_lossy();
            if name.ends_with("_edges.jsonl") {
                self.add_edges_file(path)?;
            } else if name.ends_with("_nodes.jsonl") {
                self.add_nodes_file(path)?;
            }
        }
        Ok(())
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge(&self, subject: &str, predicate: Predicate, object: &str) -> Option<&ReleaseEdge> {
        self.edges.get(&format!("{}-{}>{}", subject, predicate, object))
    }

    /// Write `edges.jsonl` and `nodes.jsonl` into `dir`.
    pub fn write(&self, dir: impl AsRef<Path>) -> Result<ReleaseFiles> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| CohortGraphError::io(dir, e))?;

        let edges: Vec<&ReleaseEdge> = self.edges.values().collect();
        let nodes: Vec<&GraphNode> = self.nodes.values().collect();
        let edges_path = dir.join("edges.jsonl");
        let nodes_path = dir.join("nodes.jsonl");
        write_jsonl(&edges_path, &edges)?;
        write_jsonl(&nodes_path, &nodes)?;

        info!(
            edges = edges.len(),
            nodes = nodes.len(),
            path = %dir.display(),
            "Wrote release"
        );

        Ok(ReleaseFiles {
            nodes_path,
            edges_path,
            node_count: nodes.len(),
            edge_count: edges.len(),
        })
    }
}

/// `{root}/releases/{version}`.
pub fn release_dir(root: impl AsRef<Path>, version: &str) -> PathBuf {
    root.as_ref().join("releases").join(version)
}

fn statistics_attributes(stats: &EdgeStatistics) -> Vec<Attribute> {
    let mut attributes = vec![
        Attribute::new("chi_squared_statistic", stats.chi_squared_statistic),
        Attribute::new("chi_squared_dof", stats.chi_squared_dof),
        Attribute::new("chi_squared_p", stats.chi_squared_p),
        Attribute::new("total_sample_size", stats.total_sample_size),
    ];
    if let (Some(odds_ratio), Some(p), Some(log_or), Some(ci)) = (
        stats.fisher_exact_odds_ratio,
        stats.fisher_exact_p,
        stats.log_odds_ratio,
        stats.log_odds_ratio_95_ci,
    ) {
        attributes.extend([
            Attribute::new("fisher_exact_odds_ratio", odds_ratio),
            Attribute::new("fisher_exact_p", p),
            Attribute::new("log_odds_ratio", log_or),
            Attribute::new("log_odds_ratio_95_ci", ci.to_vec()),
        ]);
    }
    attributes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeProperties, EdgeProvenance};
    use crate::resolve::ResolvedNode;
    use tempfile::TempDir;

    fn edge(subject: &str, object: &str, cohort: &str, odds: bool) -> GraphEdge {
        GraphEdge {
            subject: subject.to_string(),
            predicate: Predicate::CorrelatedWith,
            object: object.to_string(),
            primary_knowledge_source: "infores:test".to_string(),
            properties: EdgeProperties {
                provenance: EdgeProvenance {
                    supporting_data_source: "src".to_string(),
                    terms_and_conditions_of_use: "terms".to_string(),
                    cohort_identifier: cohort.to_string(),
                    subject_feature_name: "A".to_string(),
                    object_feature_name: "B".to_string(),
                },
                statistics: EdgeStatistics {
                    chi_squared_statistic: 2.0,
                    chi_squared_dof: 1,
                    chi_squared_p: 0.15,
                    total_sample_size: 20,
                    fisher_exact_odds_ratio: odds.then_some(2.5),
                    fisher_exact_p: odds.then_some(0.2),
                    log_odds_ratio: odds.then_some(0.9),
                    log_odds_ratio_95_ci: odds.then_some([-0.3, 2.1]),
                },
                contingency: None,
            },
        }
    }

    #[test]
    fn test_cohorts_nest_under_one_edge() {
        let mut release = ReleaseBuilder::new();
        release.add_edge(&edge("X:1", "Y:1", "c1|n|2010|t", true));
        release.add_edge(&edge("X:1", "Y:1", "c2|n|2011|t", false));
        release.add_edge(&edge("X:1", "Y:2", "c1|n|2010|t", false));

        assert_eq!(release.edge_count(), 2);
        let merged = release.edge("X:1", Predicate::CorrelatedWith, "Y:1").unwrap();
        assert_eq!(merged.attributes.len(), 7);
        assert_eq!(merged.attributes[0].attribute_type_id, "biolink:primary_knowledge_source");
        assert_eq!(merged.attributes[1].attribute_type_id, "biolink:supporting_data_source");

        let cohorts: Vec<&Attribute> = merged.cohorts().collect();
        assert_eq!(cohorts.len(), 2);
        assert_eq!(cohorts[0].attribute_type_id, "icees_cohort_identifier");
        assert_eq!(cohorts[0].value, "c1|n|2010|t");
        assert_eq!(cohorts[0].attributes.len(), 8);
        assert_eq!(cohorts[1].attributes.len(), 4);
    }

    #[test]
    fn test_same_cohort_appends_statistics() {
        let mut release = ReleaseBuilder::new();
        release.add_edge(&edge("X:1", "Y:1", "c1", false));
        release.add_edge(&edge("X:1", "Y:1", "c1", false));

        let merged = release.edge("X:1", Predicate::CorrelatedWith, "Y:1").unwrap();
        let cohorts: Vec<&Attribute> = merged.cohorts().collect();
        assert_eq!(cohorts.len(), 1);
        assert_eq!(cohorts[0].attributes.len(), 8);
    }

    #[test]
    fn test_directory_merge_and_write() {
        let build = TempDir::new().unwrap();
        let a = edge("X:1", "Y:1", "c1", false);
        let b = edge("X:1", "Y:1", "c2", false);
        let node = GraphNode::from_resolved("X:1", ResolvedNode::new("first"), &[]);
        let dup = GraphNode::from_resolved("X:1", ResolvedNode::new("second"), &[]);

        write_jsonl(&build.path().join("c1_edges.jsonl"), &[a]).unwrap();
        write_jsonl(&build.path().join("c2_edges.jsonl"), &[b]).unwrap();
        write_jsonl(&build.path().join("c1_nodes.jsonl"), &[node]).unwrap();
        write_jsonl(&build.path().join("c2_nodes.jsonl"), &[dup]).unwrap();
        fs::write(build.path().join("notes.txt"), "ignored").unwrap();

        let mut release = ReleaseBuilder::new();
        release.add_directory(build.path()).unwrap();
        assert_eq!(release.edge_count(), 1);
        assert_eq!(release.node_count(), 1);

        let out = release_dir(build.path(), DEFAULT_RELEASE_VERSION);
        let files = release.write(&out).unwrap();
        assert!(files.edges_path.ends_with("releases/1.5.0/edges.jsonl"));

        let nodes = fs::read_to_string(&files.nodes_path).unwrap();
        assert!(nodes.contains("\"first\""));
        assert!(!nodes.contains("\"second\""));

        let line = fs::read_to_string(&files.edges_path).unwrap();
        let parsed: ReleaseEdge = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(parsed.cohorts().count(), 2);
    }
}

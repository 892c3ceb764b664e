//! Cohort graph builder and public API.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::encoding::{EncodedColumn, EncodingGap, FeatureEncoder};
use crate::error::{CohortGraphError, Result};
use crate::graph::{
    synthesize_edges, ContingencyDetail, EdgeProperties, EdgeProvenance, EdgeStatistics, GraphEdge,
    GraphFiles, GraphNode, GraphWriter, NodeRegistry,
};
use crate::input::{CohortId, CohortSource, DataTable, Parser, ParserConfig};
use crate::resolve::{merge_resolved, IdentityResolver, ResolvedNodes};
use crate::schema::{resolve_columns, ColumnInfo, FeatureSchema};
use crate::stats::{associate, AssociationResult, ContingencyTable};

/// Knowledge source credited on every edge.
pub const DEFAULT_PRIMARY_KNOWLEDGE_SOURCE: &str = "infores:automat-icees-kg";

/// Supporting data source credited on every edge.
pub const DEFAULT_SUPPORTING_DATA_SOURCE: &str =
    "https://github.com/NCATSTranslator/Translator-All/wiki/Exposures-Provider-ICEES";

/// Terms of use attached to every edge.
pub const DEFAULT_TERMS_OF_USE: &str = "https://github.com/NCATSTranslator/Translator-All/wiki/Exposures-Provider-ICEES-and-ICEES-KG-Terms-and-Conditions-of-Use";

/// Configuration for graph building.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Parser configuration.
    pub parser: ParserConfig,
    pub primary_knowledge_source: String,
    pub supporting_data_source: String,
    pub terms_of_use: String,
    /// Pairs whose chi-squared p exceeds this emit no edges (None = keep all).
    pub max_p_value: Option<f64>,
    /// Attach the contingency matrix and feature domains to edges.
    pub include_contingency: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parser: ParserConfig::default(),
            primary_knowledge_source: DEFAULT_PRIMARY_KNOWLEDGE_SOURCE.to_string(),
            supporting_data_source: DEFAULT_SUPPORTING_DATA_SOURCE.to_string(),
            terms_of_use: DEFAULT_TERMS_OF_USE.to_string(),
            max_p_value: None,
            include_contingency: false,
        }
    }
}

/// A column pair whose statistics could not be computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairFailure {
    pub subject_feature: String,
    pub object_feature: String,
    pub reason: String,
}

/// Counts describing one build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildSummary {
    /// Data rows in the extract.
    pub rows: usize,
    /// Columns bound to a schema entry.
    pub accepted_columns: usize,
    /// Accepted columns with at least one valid code.
    pub useful_columns: usize,
    /// Pairs with statistics computed.
    pub pairs_tested: usize,
    /// Pairs dropped for unresolved identifiers, failed statistics or the p-value ceiling.
    pub pairs_skipped: usize,
    pub node_count: usize,
    pub edge_count: usize,
}

/// Nodes and edges built from one cohort extract.
#[derive(Debug, Clone)]
pub struct CohortGraph {
    pub cohort_id: CohortId,
    /// Source metadata, when built from a file.
    pub source: Option<CohortSource>,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    /// Raw values that matched no code.
    pub gaps: Vec<EncodingGap>,
    pub failures: Vec<PairFailure>,
    pub summary: BuildSummary,
}

impl CohortGraph {
    /// Write `{dataset_id}_nodes.jsonl` and `{dataset_id}_edges.jsonl` into `dir`.
    pub fn write(&self, dir: impl AsRef<Path>) -> Result<GraphFiles> {
        GraphWriter::new(dir.as_ref()).write(&self.cohort_id.dataset_id, &self.nodes, &self.edges)
    }
}

/// Nodes and edges produced by one column pair.
struct PairOutcome {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
}

/// Builds association graphs from cohort extracts.
pub struct CohortGraphBuilder {
    config: EngineConfig,
    parser: Parser,
    resolver: Arc<dyn IdentityResolver>,
}

impl CohortGraphBuilder {
    /// Create a builder with default configuration.
    pub fn new(resolver: Arc<dyn IdentityResolver>) -> Self {
        Self::with_config(resolver, EngineConfig::default())
    }

    /// Create a builder with custom configuration.
    pub fn with_config(resolver: Arc<dyn IdentityResolver>, config: EngineConfig) -> Self {
        let parser = Parser::with_config(config.parser.clone());
        Self {
            config,
            parser,
            resolver,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Parse a cohort file and build its graph.
    ///
    /// The file stem is the dataset identifier; `year` overrides detection
    /// from the stem.
    pub fn build_file(
        &self,
        path: impl AsRef<Path>,
        schema: &FeatureSchema,
        dataset_name: &str,
        year: Option<&str>,
        run_started: DateTime<Local>,
    ) -> Result<CohortGraph> {
        let (table, source) = self.parser.parse_file(path)?;
        let cohort_id = CohortId::from_stem(&source.data_id, dataset_name, year, run_started)?;

        info!(
            file = %source.file,
            hash = %source.hash,
            rows = source.row_count,
            cohort = %cohort_id,
            "Loaded cohort extract"
        );

        let mut graph = self.build(&table, schema, cohort_id)?;
        graph.source = Some(source);
        Ok(graph)
    }

    /// Build the graph of an in-memory table.
    pub fn build(&self, table: &DataTable, schema: &FeatureSchema, cohort_id: CohortId) -> Result<CohortGraph> {
        self.build_with(table, schema, cohort_id, associate)
    }

    /// Build with a custom statistics step for each pair.
    pub(crate) fn build_with<F>(
        &self,
        table: &DataTable,
        schema: &FeatureSchema,
        cohort_id: CohortId,
        stats: F,
    ) -> Result<CohortGraph>
    where
        F: Fn(&ContingencyTable, &ColumnInfo, &ColumnInfo) -> Result<AssociationResult>,
    {
        if table.row_count() == 0 {
            return Err(CohortGraphError::EmptyData(format!(
                "cohort '{}' has no data rows",
                cohort_id.dataset_id
            )));
        }

        let columns = resolve_columns(&table.headers, schema)?;
        let encoded = FeatureEncoder::encode_table(table, &columns)?;
        let useful = encoded.useful_columns();

        let mut summary = BuildSummary {
            rows: table.row_count(),
            accepted_columns: columns.len(),
            useful_columns: useful.len(),
            ..BuildSummary::default()
        };

        let cohort_identifier = cohort_id.to_string();
        let mut resolved: HashMap<usize, ResolvedNodes> = HashMap::new();
        let mut registry = NodeRegistry::new();
        let mut edges = Vec::new();
        let mut failures = Vec::new();

        info!(useful = useful.len(), "Creating nodes and edges");

        for (i, subject) in useful.iter().enumerate() {
            for object in &useful[i + 1..] {
                self.resolve_column(&mut resolved, &subject.info);
                self.resolve_column(&mut resolved, &object.info);
                let (Some(subject_ids), Some(object_ids)) =
                    (resolved.get(&subject.info.position), resolved.get(&object.info.position))
                else {
                    continue;
                };
                if subject_ids.is_empty() || object_ids.is_empty() {
                    debug!(
                        subject = %subject.name(),
                        object = %object.name(),
                        "No identifiers for pair"
                    );
                    summary.pairs_skipped += 1;
                    continue;
                }

                match self.process_pair(subject, object, subject_ids, object_ids, &cohort_identifier, &stats) {
                    Ok(Some(outcome)) => {
                        summary.pairs_tested += 1;
                        for node in outcome.nodes {
                            registry.upsert(node);
                        }
                        edges.extend(outcome.edges);
                    }
                    Ok(None) => {
                        summary.pairs_tested += 1;
                        summary.pairs_skipped += 1;
                    }
                    Err(e) => {
                        error!(
                            subject = %subject.name(),
                            object = %object.name(),
                            error = %e,
                            "Failed to compute edge statistics"
                        );
                        summary.pairs_skipped += 1;
                        failures.push(PairFailure {
                            subject_feature: subject.name().to_string(),
                            object_feature: object.name().to_string(),
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }

        let nodes = registry.into_nodes();
        summary.node_count = nodes.len();
        summary.edge_count = edges.len();

        info!(
            cohort = %cohort_identifier,
            nodes = summary.node_count,
            edges = summary.edge_count,
            pairs_tested = summary.pairs_tested,
            pairs_skipped = summary.pairs_skipped,
            "Built cohort graph"
        );

        Ok(CohortGraph {
            cohort_id,
            source: None,
            nodes,
            edges,
            gaps: encoded.gaps,
            failures,
            summary,
        })
    }

    /// Look up a column's identifiers unless this build already has them.
    fn resolve_column(&self, cache: &mut HashMap<usize, ResolvedNodes>, info: &ColumnInfo) {
        cache.entry(info.position).or_insert_with(|| {
            let nodes = merge_resolved(self.resolver.as_ref(), &info.name_lookup);
            debug!(
                column = %info.name,
                resolver = self.resolver.name(),
                found = nodes.len(),
                "Resolved feature identifiers"
            );
            nodes
        });
    }

    /// Statistics, nodes and edges for one pair. `None` when the pair is
    /// above the p-value ceiling.
    fn process_pair<F>(
        &self,
        subject: &EncodedColumn,
        object: &EncodedColumn,
        subject_ids: &ResolvedNodes,
        object_ids: &ResolvedNodes,
        cohort_identifier: &str,
        stats: &F,
    ) -> Result<Option<PairOutcome>>
    where
        F: Fn(&ContingencyTable, &ColumnInfo, &ColumnInfo) -> Result<AssociationResult>,
    {
        debug!(subject = %subject.name(), object = %object.name(), "Testing pair");

        let table = ContingencyTable::build(subject, object);
        if table.out_of_domain() > 0 {
            warn!(
                subject = %subject.name(),
                object = %object.name(),
                rows = table.out_of_domain(),
                "Values outside the feature domain were not counted"
            );
        }

        let result = stats(&table, &subject.info, &object.info)?;

        if let Some(ceiling) = self.config.max_p_value {
            if result.chi_squared.p_value > ceiling {
                debug!(
                    subject = %subject.name(),
                    object = %object.name(),
                    p = result.chi_squared.p_value,
                    "Pair above p-value ceiling"
                );
                return Ok(None);
            }
        }

        let contingency = self.config.include_contingency.then(|| ContingencyDetail {
            feature_a: subject.info.feature_description(),
            feature_b: object.info.feature_description(),
            feature_matrix: table.cells(),
            rows: table.row_summary(),
            columns: table.col_summary(),
        });

        let properties = EdgeProperties {
            provenance: EdgeProvenance {
                supporting_data_source: self.config.supporting_data_source.clone(),
                terms_and_conditions_of_use: self.config.terms_of_use.clone(),
                cohort_identifier: cohort_identifier.to_string(),
                subject_feature_name: subject.name().to_string(),
                object_feature_name: object.name().to_string(),
            },
            statistics: EdgeStatistics::from(&result),
            contingency,
        };

        let edges = synthesize_edges(
            subject_ids.keys().map(String::as_str),
            object_ids.keys().map(String::as_str),
            result.predicate,
            &self.config.primary_knowledge_source,
            &properties,
        );

        let nodes = side_nodes(subject_ids, &subject.info)
            .chain(side_nodes(object_ids, &object.info))
            .collect();

        Ok(Some(PairOutcome { nodes, edges }))
    }
}

fn side_nodes<'a>(ids: &'a ResolvedNodes, info: &'a ColumnInfo) -> impl Iterator<Item = GraphNode> + 'a {
    ids.iter()
        .map(move |(id, node)| GraphNode::from_resolved(id.as_str(), node.clone(), &info.categories))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::{ResolvedNode, StaticResolver};
    use crate::schema::FeatureSchemaEntry;
    use crate::stats::Predicate;

    fn cohort() -> CohortId {
        CohortId::new("cohort_2010", "pcd", "2010", "2024_01_01_00_00_00")
    }

    fn resolver() -> Arc<StaticResolver> {
        Arc::new(
            StaticResolver::new()
                .with_node("asthma", "MONDO:0004979", ResolvedNode::new("asthma").with_categories(["biolink:Disease"]))
                .with_node("obesity", "MONDO:0011122", ResolvedNode::new("obesity"))
                .with_node("obesity", "HP:0001513", ResolvedNode::new("Obesity"))
                .with_node("age", "PATO:0000011", ResolvedNode::new("age")),
        )
    }

    fn schema() -> FeatureSchema {
        FeatureSchema::new()
            .with_feature(
                "AsthmaDx",
                FeatureSchemaEntry::enumerated(["no", "yes"]).with_lookup("asthma", 1),
            )
            .with_feature(
                "ObesityDx",
                FeatureSchemaEntry::enumerated(["no", "yes"])
                    .with_lookup("obesity", 2)
                    .with_categories(["biolink:PhenotypicFeature"]),
            )
    }

    fn table() -> DataTable {
        DataTable::from_rows(
            &["AsthmaDx", "ObesityDx"],
            &[&["no", "no"], &["no", "yes"], &["yes", "no"], &["yes", "yes"]],
        )
    }

    #[test]
    fn test_balanced_pair_builds_cross_product() {
        let builder = CohortGraphBuilder::new(resolver());
        let graph = builder.build(&table(), &schema(), cohort()).unwrap();

        assert_eq!(graph.edges.len(), 2);
        assert_eq!(graph.nodes.len(), 3);
        assert!(graph.failures.is_empty());
        assert_eq!(graph.summary.pairs_tested, 1);

        let edge = &graph.edges[0];
        assert_eq!(edge.subject, "MONDO:0004979");
        assert_eq!(edge.predicate, Predicate::CorrelatedWith);
        assert_eq!(edge.primary_knowledge_source, DEFAULT_PRIMARY_KNOWLEDGE_SOURCE);
        assert_eq!(edge.properties.provenance.cohort_identifier, cohort().to_string());
        assert_eq!(edge.properties.statistics.total_sample_size, 4);
        assert!(edge.properties.statistics.chi_squared_statistic.abs() < 1e-9);
        assert!((edge.properties.statistics.chi_squared_p - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_schema_categories_reach_nodes() {
        let builder = CohortGraphBuilder::new(resolver());
        let graph = builder.build(&table(), &schema(), cohort()).unwrap();

        let obesity = graph.nodes.iter().find(|n| n.id == "HP:0001513").unwrap();
        assert!(obesity.categories.contains("biolink:PhenotypicFeature"));
        let asthma = graph.nodes.iter().find(|n| n.id == "MONDO:0004979").unwrap();
        assert!(asthma.categories.contains("biolink:Disease"));
        assert!(!asthma.categories.contains("biolink:PhenotypicFeature"));
    }

    #[test]
    fn test_each_column_resolves_once() {
        let resolver = resolver();
        let schema = schema().with_feature(
            "AgeBin",
            FeatureSchemaEntry::enumerated(["<18", "18-65", ">65"]).with_lookup("age", 1),
        );
        let table = DataTable::from_rows(
            &["AsthmaDx", "ObesityDx", "AgeBin"],
            &[&["no", "yes", "12"], &["yes", "no", "70"], &["yes", "yes", "18-65"]],
        );

        let builder = CohortGraphBuilder::new(resolver.clone());
        let graph = builder.build(&table, &schema, cohort()).unwrap();

        assert_eq!(graph.summary.pairs_tested, 3);
        assert_eq!(resolver.calls(), 3);
    }

    #[test]
    fn test_unresolved_column_contributes_nothing() {
        let schema = schema().with_feature(
            "Mystery",
            FeatureSchemaEntry::enumerated(["a", "b"]).with_lookup("unknown term", 1),
        );
        let table = DataTable::from_rows(
            &["AsthmaDx", "ObesityDx", "Mystery"],
            &[&["no", "no", "a"], &["yes", "yes", "b"]],
        );

        let graph = CohortGraphBuilder::new(resolver()).build(&table, &schema, cohort()).unwrap();
        assert_eq!(graph.edges.len(), 2);
        assert_eq!(graph.summary.pairs_skipped, 2);
    }

    #[test]
    fn test_p_value_ceiling_drops_edges() {
        let config = EngineConfig {
            max_p_value: Some(0.05),
            ..EngineConfig::default()
        };
        let builder = CohortGraphBuilder::with_config(resolver(), config);
        let graph = builder.build(&table(), &schema(), cohort()).unwrap();

        assert!(graph.edges.is_empty());
        assert!(graph.nodes.is_empty());
        assert_eq!(graph.summary.pairs_skipped, 1);
    }

    #[test]
    fn test_contingency_detail_is_optional() {
        let config = EngineConfig {
            include_contingency: true,
            ..EngineConfig::default()
        };
        let graph = CohortGraphBuilder::with_config(resolver(), config)
            .build(&table(), &schema(), cohort())
            .unwrap();

        let detail = graph.edges[0].properties.contingency.as_ref().unwrap();
        assert_eq!(detail.feature_a.feature_name, "AsthmaDx");
        assert_eq!(detail.feature_matrix.len(), 2);
        assert_eq!(detail.rows.len(), 2);
    }

    #[test]
    fn test_failed_pair_does_not_stop_the_build() {
        let schema = schema().with_feature(
            "AgeBin",
            FeatureSchemaEntry::enumerated(["<18", "18-65", ">65"]).with_lookup("age", 1),
        );
        let table = DataTable::from_rows(
            &["AsthmaDx", "ObesityDx", "AgeBin"],
            &[&["no", "yes", "12"], &["yes", "no", "70"], &["yes", "yes", "18-65"]],
        );

        let graph = CohortGraphBuilder::new(resolver())
            .build_with(&table, &schema, cohort(), |table, subject, object| {
                if subject.name == "AsthmaDx" && object.name == "ObesityDx" {
                    return Err(CohortGraphError::Statistics("degenerate table".to_string()));
                }
                associate(table, subject, object)
            })
            .unwrap();

        assert_eq!(graph.failures.len(), 1);
        let failure = &graph.failures[0];
        assert_eq!(failure.subject_feature, "AsthmaDx");
        assert_eq!(failure.object_feature, "ObesityDx");
        assert!(failure.reason.contains("degenerate table"));

        // Asthma x age (1 edge) and obesity x age (2 edges) survive.
        assert_eq!(graph.edges.len(), 3);
        assert!(graph
            .edges
            .iter()
            .all(|e| e.properties.provenance.object_feature_name == "AgeBin"));
        assert_eq!(graph.summary.pairs_tested, 2);
        assert_eq!(graph.summary.pairs_skipped, 1);
        assert_eq!(graph.nodes.len(), 4);
    }

    #[test]
    fn test_failed_pair_adds_no_nodes() {
        let graph = CohortGraphBuilder::new(resolver())
            .build_with(&table(), &schema(), cohort(), |_, _, _| {
                Err(CohortGraphError::Statistics("degenerate table".to_string()))
            })
            .unwrap();

        assert!(graph.edges.is_empty());
        assert!(graph.nodes.is_empty());
        assert_eq!(graph.failures.len(), 1);
    }

    #[test]
    fn test_empty_table_is_rejected() {
        let table = DataTable::from_rows(&["AsthmaDx", "ObesityDx"], &[]);
        let result = CohortGraphBuilder::new(resolver()).build(&table, &schema(), cohort());
        assert!(matches!(result, Err(CohortGraphError::EmptyData(_))));
    }

    #[test]
    fn test_unmatched_values_are_reported() {
        let table = DataTable::from_rows(
            &["AsthmaDx", "ObesityDx"],
            &[&["no", "maybe"], &["yes", "yes"], &["no", "no"]],
        );
        let graph = CohortGraphBuilder::new(resolver()).build(&table, &schema(), cohort()).unwrap();

        assert_eq!(graph.gaps.len(), 1);
        assert_eq!(graph.gaps[0].value, "maybe");
        assert_eq!(graph.edges[0].properties.statistics.total_sample_size, 2);
    }
}

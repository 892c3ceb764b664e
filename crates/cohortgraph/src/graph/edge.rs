//! Association edges and their properties.

use serde::{Deserialize, Serialize};

use crate::schema::FeatureDescription;
use crate::stats::{AssociationResult, ContingencyCell, MarginalSummary, Predicate};

/// Where an edge came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeProvenance {
    #[serde(rename = "biolink:supporting_data_source")]
    pub supporting_data_source: String,
    pub terms_and_conditions_of_use: String,
    #[serde(rename = "icees_cohort_identifier")]
    pub cohort_identifier: String,
    pub subject_feature_name: String,
    pub object_feature_name: String,
}

/// Association statistics, flattened into edge records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeStatistics {
    pub chi_squared_statistic: f64,
    pub chi_squared_dof: usize,
    pub chi_squared_p: f64,
    pub total_sample_size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fisher_exact_odds_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fisher_exact_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_odds_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_odds_ratio_95_ci: Option<[f64; 2]>,
}

impl From<&AssociationResult> for EdgeStatistics {
    fn from(result: &AssociationResult) -> Self {
        let odds = result.odds.as_ref();
        Self {
            chi_squared_statistic: result.chi_squared.statistic,
            chi_squared_dof: result.chi_squared.dof,
            chi_squared_p: result.chi_squared.p_value,
            total_sample_size: result.total_sample_size,
            fisher_exact_odds_ratio: odds.map(|o| o.fisher.odds_ratio),
            fisher_exact_p: odds.map(|o| o.fisher.p_value),
            log_odds_ratio: odds.map(|o| o.log_odds_ratio),
            log_odds_ratio_95_ci: odds.map(|o| [o.log_odds_ratio_ci.0, o.log_odds_ratio_ci.1]),
        }
    }
}

/// Full contingency matrix and feature domains of the pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContingencyDetail {
    pub feature_a: FeatureDescription,
    pub feature_b: FeatureDescription,
    pub feature_matrix: Vec<Vec<ContingencyCell>>,
    /// Marginals of `feature_b` (table rows).
    pub rows: Vec<MarginalSummary>,
    /// Marginals of `feature_a` (table columns).
    pub columns: Vec<MarginalSummary>,
}

/// Properties shared by every edge produced for one column pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeProperties {
    #[serde(flatten)]
    pub provenance: EdgeProvenance,
    #[serde(flatten)]
    pub statistics: EdgeStatistics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contingency: Option<ContingencyDetail>,
}

/// One edge record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub subject: String,
    pub predicate: Predicate,
    pub object: String,
    #[serde(rename = "biolink:primary_knowledge_source")]
    pub primary_knowledge_source: String,
    #[serde(flatten)]
    pub properties: EdgeProperties,
}

/// One edge per subject identifier × object identifier, all sharing the
/// pair's predicate and properties.
pub fn synthesize_edges<'a>(
    subject_ids: impl IntoIterator<Item = &'a str>,
    object_ids: impl IntoIterator<Item = &'a str> + Clone,
    predicate: Predicate,
    primary_knowledge_source: &str,
    properties: &EdgeProperties,
) -> Vec<GraphEdge> {
    subject_ids
        .into_iter()
        .flat_map(|subject| {
            object_ids.clone().into_iter().map(move |object| GraphEdge {
                subject: subject.to_string(),
                predicate,
                object: object.to_string(),
                primary_knowledge_source: primary_knowledge_source.to_string(),
                properties: properties.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn properties() -> EdgeProperties {
        EdgeProperties {
            provenance: EdgeProvenance {
                supporting_data_source: "https://example.org/source".to_string(),
                terms_and_conditions_of_use: "https://example.org/terms".to_string(),
                cohort_identifier: "cohort_2010|pcd|2010|2024_01_01_00_00_00".to_string(),
                subject_feature_name: "AsthmaDx".to_string(),
                object_feature_name: "ObesityDx".to_string(),
            },
            statistics: EdgeStatistics {
                chi_squared_statistic: 1.5,
                chi_squared_dof: 1,
                chi_squared_p: 0.22,
                total_sample_size: 40,
                fisher_exact_odds_ratio: None,
                fisher_exact_p: None,
                log_odds_ratio: None,
                log_odds_ratio_95_ci: None,
            },
            contingency: None,
        }
    }

    #[test]
    fn test_cross_product() {
        let edges = synthesize_edges(
            ["A:1", "A:2"],
            ["B:1", "B:2", "B:3"],
            Predicate::CorrelatedWith,
            "infores:test",
            &properties(),
        );
        assert_eq!(edges.len(), 6);
        assert_eq!(edges[0].subject, "A:1");
        assert_eq!(edges[0].object, "B:1");
        assert_eq!(edges[5].subject, "A:2");
        assert_eq!(edges[5].object, "B:3");
    }

    #[test]
    fn test_empty_side_yields_no_edges() {
        let edges = synthesize_edges(
            ["A:1"],
            Vec::<&str>::new(),
            Predicate::CorrelatedWith,
            "infores:test",
            &properties(),
        );
        assert!(edges.is_empty());
    }

    #[test]
    fn test_edge_record_is_flat() {
        let edge = synthesize_edges(["A:1"], ["B:1"], Predicate::PositivelyCorrelatedWith, "infores:test", &properties())
            .remove(0);
        let json = serde_json::to_value(&edge).unwrap();

        assert_eq!(json["predicate"], "biolink:positively_correlated_with");
        assert_eq!(json["subject_feature_name"], "AsthmaDx");
        assert_eq!(json["chi_squared_dof"], 1);
        assert_eq!(json["biolink:primary_knowledge_source"], "infores:test");
        assert_eq!(json["biolink:supporting_data_source"], "https://example.org/source");
        assert_eq!(json["icees_cohort_identifier"], "cohort_2010|pcd|2010|2024_01_01_00_00_00");
        assert!(json.get("primary_knowledge_source").is_none());
        assert!(json.get("cohort_identifier").is_none());
        assert!(json.get("fisher_exact_p").is_none());
        assert!(json.get("contingency").is_none());

        let back: GraphEdge = serde_json::from_value(json).unwrap();
        assert_eq!(back.properties.statistics.total_sample_size, 40);
        assert_eq!(back.properties.provenance.object_feature_name, "ObesityDx");
    }
}

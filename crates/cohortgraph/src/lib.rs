//! Cohortgraph: association knowledge graphs from patient-cohort extracts.
//!
//! A cohort extract is a CSV of per-patient survey features. Each feature
//! named in a YAML feature schema is discretized into codes, every pair of
//! informative features is tested for association, and the results become
//! graph edges between the biomedical identifiers the features resolve to.
//!
//! # Core Principles
//!
//! - **Schema-driven**: only features the schema declares are encoded
//! - **Deterministic**: pairs are tested in schema order, output order is stable
//! - **Pluggable resolution**: identifier lookup sits behind [`IdentityResolver`]
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use cohortgraph::{CohortGraphBuilder, FeatureSchema, HttpResolver};
//!
//! let schema = FeatureSchema::load("features.yaml").unwrap();
//! let builder = CohortGraphBuilder::new(Arc::new(HttpResolver::new().unwrap()));
//! let graph = builder
//!     .build_file("Asthma_patient_2010_binned.csv", &schema, "PCD", None, chrono::Local::now())
//!     .unwrap();
//!
//! println!("Nodes: {}", graph.nodes.len());
//! println!("Edges: {}", graph.edges.len());
//! graph.write("build").unwrap();
//! ```

pub mod encoding;
pub mod error;
pub mod graph;
pub mod input;
pub mod release;
pub mod resolve;
pub mod schema;
pub mod stats;

mod engine;

pub use crate::engine::{
    BuildSummary, CohortGraph, CohortGraphBuilder, EngineConfig, PairFailure,
    DEFAULT_PRIMARY_KNOWLEDGE_SOURCE, DEFAULT_SUPPORTING_DATA_SOURCE, DEFAULT_TERMS_OF_USE,
};
pub use error::{CohortGraphError, Result};
pub use graph::{prune_orphan_nodes, GraphEdge, GraphNode};
pub use input::{CohortId, DataTable};
pub use release::ReleaseBuilder;
pub use resolve::{HttpResolver, IdentityResolver, StaticResolver};
pub use schema::{FeatureSchema, FeatureSchemaEntry};
pub use stats::{AssociationResult, Predicate};

//! Knowledge graph records and their line-delimited JSON files.

mod edge;
mod node;
mod prune;
mod writer;

pub use edge::{
    synthesize_edges, ContingencyDetail, EdgeProperties, EdgeProvenance, EdgeStatistics, GraphEdge,
};
pub use node::{GraphNode, NodeRegistry};
pub use prune::prune_orphan_nodes;
pub use writer::{GraphFiles, GraphWriter};

pub(crate) use prune::read_lines;
pub(crate) use writer::write_jsonl;

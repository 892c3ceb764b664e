//! Line-delimited JSON output for nodes and edges.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use super::{GraphEdge, GraphNode};
use crate::error::{CohortGraphError, Result};

/// Paths and record counts of a written graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphFiles {
    pub nodes_path: PathBuf,
    pub edges_path: PathBuf,
    pub node_count: usize,
    pub edge_count: usize,
}

/// Writes `{stem}_nodes.jsonl` and `{stem}_edges.jsonl` into one directory.
#[derive(Debug, Clone)]
pub struct GraphWriter {
    output_dir: PathBuf,
}

impl GraphWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn nodes_path(&self, stem: &str) -> PathBuf {
        self.output_dir.join(format!("{}_nodes.jsonl", stem))
    }

    pub fn edges_path(&self, stem: &str) -> PathBuf {
        self.output_dir.join(format!("{}_edges.jsonl", stem))
    }

    /// Write both files, creating the output directory if needed.
    pub fn write(&self, stem: &str, nodes: &[GraphNode], edges: &[GraphEdge]) -> Result<GraphFiles> {
        if !self.output_dir.exists() {
            fs::create_dir_all(&self.output_dir)
                .map_err(|e| CohortGraphError::io(&self.output_dir, e))?;
        }

        let nodes_path = self.nodes_path(stem);
        let edges_path = self.edges_path(stem);
        write_jsonl(&nodes_path, nodes)?;
        write_jsonl(&edges_path, edges)?;

        info!(
            nodes = nodes.len(),
            edges = edges.len(),
            path = %self.output_dir.display(),
            "Wrote graph files"
        );

        Ok(GraphFiles {
            nodes_path,
            edges_path,
            node_count: nodes.len(),
            edge_count: edges.len(),
        })
    }
}

/// Serialize records one per line.
pub(crate) fn write_jsonl<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let file = File::create(path).map_err(|e| CohortGraphError::io(path, e))?;
    let mut writer = BufWriter::new(file);

    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer
            .write_all(b"\n")
            .map_err(|e| CohortGraphError::io(path, e))?;
    }

    writer.flush().map_err(|e| CohortGraphError::io(path, e))
}

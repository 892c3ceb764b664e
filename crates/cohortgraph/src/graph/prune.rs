//! Removal of nodes that no edge references.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::{CohortGraphError, Result};

#[derive(Deserialize)]
struct EdgeEndpoints {
    subject: String,
    object: String,
}

#[derive(Deserialize)]
struct NodeId {
    id: String,
}

/// Rewrite `nodes_path` keeping only nodes referenced as subject or object in
/// `edges_path`. Returns the number of nodes removed.
///
/// Kept lines are copied through unchanged.
pub fn prune_orphan_nodes(nodes_path: impl AsRef<Path>, edges_path: impl AsRef<Path>) -> Result<usize> {
    let nodes_path = nodes_path.as_ref();
    let edges_path = edges_path.as_ref();

    let mut referenced = HashSet::new();
    for line in read_lines(edges_path)? {
        let edge: EdgeEndpoints = serde_json::from_str(&line)?;
        referenced.insert(edge.subject);
        referenced.insert(edge.object);
    }

    let mut kept = Vec::new();
    let mut removed = 0;
    for line in read_lines(nodes_path)? {
        let node: NodeId = serde_json::from_str(&line)?;
        if referenced.contains(&node.id) {
            kept.push(line);
        } else {
            removed += 1;
        }
    }

    let tmp_path = nodes_path.with_extension("jsonl.tmp");
    {
        let file = File::create(&tmp_path).map_err(|e| CohortGraphError::io(&tmp_path, e))?;
        let mut writer = BufWriter::new(file);
        for line in &kept {
            writeln!(writer, "{}", line).map_err(|e| CohortGraphError::io(&tmp_path, e))?;
        }
        writer.flush().map_err(|e| CohortGraphError::io(&tmp_path, e))?;
    }
    fs::rename(&tmp_path, nodes_path).map_err(|e| CohortGraphError::io(nodes_path, e))?;

    info!(removed, kept = kept.len(), path = %nodes_path.display(), "Pruned orphan nodes");
    Ok(removed)
}

/// Non-blank lines of a file.
pub(crate) fn read_lines(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).map_err(|e| CohortGraphError::io(path, e))?;
    let mut lines = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| CohortGraphError::io(path, e))?;
        if !line.trim().is_empty() {
            lines.push(line);
        }
    }
    Ok(lines)
}

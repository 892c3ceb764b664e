//! Prune command - drop nodes no edge references.

use std::path::PathBuf;

use colored::Colorize;
use cohortgraph::prune_orphan_nodes;

pub fn run(nodes: PathBuf, edges: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    for path in [&nodes, &edges] {
        if !path.exists() {
            return Err(format!("File not found: {}", path.display()).into());
        }
    }

    let removed = prune_orphan_nodes(&nodes, &edges)?;

    println!(
        "{} {} orphan nodes from {}",
        "Removed".green().bold(),
        removed.to_string().white().bold(),
        nodes.display()
    );

    Ok(())
}

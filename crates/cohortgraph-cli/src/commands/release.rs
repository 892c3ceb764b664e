//! Release command - merge cohort graphs into one release.

use std::path::PathBuf;

use colored::Colorize;
use cohortgraph::release::{release_dir, ReleaseBuilder};

pub fn run(
    build_dir: PathBuf,
    output_root: PathBuf,
    version: String,
) -> Result<(), Box<dyn std::error::Error>> {
    if !build_dir.is_dir() {
        return Err(format!("Directory not found: {}", build_dir.display()).into());
    }

    println!(
        "{} {} from {}",
        "Merging".cyan().bold(),
        version.white(),
        build_dir.display()
    );

    let mut release = ReleaseBuilder::new();
    release.add_directory(&build_dir)?;

    if release.edge_count() == 0 {
        println!("{}", "No edges found - nothing to release".yellow());
        return Ok(());
    }

    let files = release.write(release_dir(&output_root, &version))?;

    println!(
        "{} {} edges and {} nodes to {}",
        "Wrote".green().bold(),
        files.edge_count.to_string().white().bold(),
        files.node_count.to_string().white().bold(),
        files.edges_path.parent().unwrap_or(output_root.as_path()).display()
    );

    Ok(())
}

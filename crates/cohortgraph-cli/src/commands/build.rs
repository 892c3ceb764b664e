//! Build command - turn cohort extracts into node and edge files.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local};
use colored::Colorize;
use cohortgraph::resolve::ResolverConfig;
use cohortgraph::{
    prune_orphan_nodes, CohortGraphBuilder, EngineConfig, FeatureSchema, HttpResolver,
};
use tracing::info;

/// Arguments of the build command.
pub struct BuildArgs {
    pub data_path: PathBuf,
    pub features_yaml: PathBuf,
    pub dataset_name: String,
    pub output_dir: PathBuf,
    pub year: Option<String>,
    pub include_contingency: bool,
    pub max_p_value: Option<f64>,
    pub name_resolver: Option<String>,
    pub node_norm: Option<String>,
    pub prune: bool,
    pub run_started: DateTime<Local>,
    pub verbose: bool,
}

pub fn run(args: BuildArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !args.features_yaml.exists() {
        return Err(format!("File not found: {}", args.features_yaml.display()).into());
    }
    let inputs = cohort_files(&args.data_path)?;
    if inputs.is_empty() {
        return Err(format!("No CSV files found in {}", args.data_path.display()).into());
    }

    let schema = FeatureSchema::load(&args.features_yaml)?;
    info!(
        dataset = %args.dataset_name,
        features = schema.len(),
        files = inputs.len(),
        "Running build"
    );

    let mut resolver_config = ResolverConfig::default();
    if let Some(url) = args.name_resolver {
        resolver_config.name_resolver_url = url;
    }
    if let Some(url) = args.node_norm {
        resolver_config.node_norm_url = url;
    }
    let resolver = HttpResolver::with_config(resolver_config)?;

    let config = EngineConfig {
        max_p_value: args.max_p_value,
        include_contingency: args.include_contingency,
        ..EngineConfig::default()
    };
    let builder = CohortGraphBuilder::with_config(Arc::new(resolver), config);

    for file in &inputs {
        println!(
            "{} {}",
            "Building".cyan().bold(),
            file.display().to_string().white()
        );

        let graph = builder.build_file(
            file,
            &schema,
            &args.dataset_name,
            args.year.as_deref(),
            args.run_started,
        )?;
        let files = graph.write(&args.output_dir)?;

        let removed = if args.prune {
            prune_orphan_nodes(&files.nodes_path, &files.edges_path)?
        } else {
            0
        };

        let summary = &graph.summary;
        println!(
            "  {} useful of {} features, {} pairs tested, {} skipped",
            summary.useful_columns.to_string().white().bold(),
            summary.accepted_columns,
            summary.pairs_tested,
            summary.pairs_skipped.to_string().yellow()
        );
        println!(
            "  {} nodes ({} orphans pruned), {} edges",
            (files.node_count - removed).to_string().white().bold(),
            removed,
            files.edge_count.to_string().white().bold()
        );

        if !graph.gaps.is_empty() {
            println!(
                "  {} raw values matched no code",
                graph.gaps.len().to_string().yellow()
            );
            if args.verbose {
                for gap in &graph.gaps {
                    println!("    {:24} {:?} x{}", gap.column, gap.value, gap.occurrences);
                }
            }
        }
        for failure in &graph.failures {
            println!(
                "  {} {} -> {}: {}",
                "Failed".red(),
                failure.subject_feature,
                failure.object_feature,
                failure.reason
            );
        }

        println!(
            "{} {}",
            "Saved to".green().bold(),
            files.edges_path.display().to_string().white()
        );
    }

    Ok(())
}

/// A single file, or every `*.csv` in a directory sorted by name.
fn cohort_files(path: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(format!("File not found: {}", path.display()).into());
    }

    let mut files: Vec<PathBuf> = fs::read_dir(path)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv")))
        .collect();
    files.sort();
    Ok(files)
}

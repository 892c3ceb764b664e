//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use cohortgraph::release::DEFAULT_RELEASE_VERSION;

/// Cohortgraph: association knowledge graphs from patient-cohort extracts
#[derive(Parser)]
#[command(name = "cohortgraph")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write logs to cohortgraph_<timestamp>.log in this directory
    #[arg(long, global = true, env = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build node and edge files from cohort extracts
    Build {
        /// Cohort CSV file, or a directory of them
        #[arg(long, env = "DATA_PATH")]
        data_path: PathBuf,

        /// Feature schema YAML with a `patient` section
        #[arg(long, env = "FEATURES_YAML")]
        features_yaml: PathBuf,

        /// Dataset name embedded in cohort identifiers
        #[arg(long, env = "DATASET_NAME")]
        dataset_name: String,

        /// Directory for the jsonl outputs
        #[arg(short, long, default_value = "build")]
        output_dir: PathBuf,

        /// Cohort year (default: detected from the file name)
        #[arg(long)]
        year: Option<String>,

        /// Attach contingency matrices to edges
        #[arg(long)]
        include_contingency: bool,

        /// Drop pairs whose chi-squared p exceeds this value
        #[arg(long)]
        max_p_value: Option<f64>,

        /// Name-resolution lookup URL
        #[arg(long, env = "NAME_RESOLVER")]
        name_resolver: Option<String>,

        /// Node-normalization URL
        #[arg(long, env = "NODE_NORM")]
        node_norm: Option<String>,

        /// Keep nodes that no edge references
        #[arg(long)]
        no_prune: bool,
    },

    /// Remove nodes that no edge references
    Prune {
        /// Nodes file to rewrite
        #[arg(value_name = "NODES_FILE")]
        nodes: PathBuf,

        /// Edges file to check references against
        #[arg(value_name = "EDGES_FILE")]
        edges: PathBuf,
    },

    /// Merge built cohort graphs into a release
    Release {
        /// Directory holding *_nodes.jsonl and *_edges.jsonl files
        #[arg(long, default_value = "build")]
        build_dir: PathBuf,

        /// Root under which releases/<version> is created
        #[arg(long, default_value = ".")]
        output_root: PathBuf,

        /// Release version
        #[arg(long, default_value = DEFAULT_RELEASE_VERSION)]
        version: String,
    },
}

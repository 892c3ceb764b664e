//! Cohortgraph CLI - association knowledge graphs from cohort extracts.

mod cli;
mod commands;

use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Local};
use clap::Parser;
use cli::{Cli, Commands};
use cohortgraph::input::RUN_TIMESTAMP_FORMAT;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() {
    let cli = Cli::parse();
    let run_started = Local::now();

    if let Err(e) = init_logging(cli.verbose, cli.log_dir.as_deref(), run_started) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    let result = match cli.command {
        Commands::Build {
            data_path,
            features_yaml,
            dataset_name,
            output_dir,
            year,
            include_contingency,
            max_p_value,
            name_resolver,
            node_norm,
            no_prune,
        } => commands::build::run(commands::build::BuildArgs {
            data_path,
            features_yaml,
            dataset_name,
            output_dir,
            year,
            include_contingency,
            max_p_value,
            name_resolver,
            node_norm,
            prune: !no_prune,
            run_started,
            verbose: cli.verbose,
        }),

        Commands::Prune { nodes, edges } => commands::prune::run(nodes, edges),

        Commands::Release {
            build_dir,
            output_root,
            version,
        } => commands::release::run(build_dir, output_root, version),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Console logging, plus a plain-text log file when `log_dir` is given.
///
/// `RUST_LOG` overrides the level chosen by `verbose`.
fn init_logging(
    verbose: bool,
    log_dir: Option<&Path>,
    run_started: DateTime<Local>,
) -> Result<(), Box<dyn std::error::Error>> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let file_layer = match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let path = dir.join(format!(
                "cohortgraph_{}.log",
                run_started.format(RUN_TIMESTAMP_FORMAT)
            ));
            let file = File::create(&path)?;
            Some(fmt::layer().with_ansi(false).with_writer(Arc::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .try_init()?;

    Ok(())
}

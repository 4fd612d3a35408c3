//! WSI Anonymizer - removes label images and identifying metadata from
//! Whole Slide Images.
//!
//! This binary parses the command line and runs one blocking task per file.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wsi_anonymizer::{
    anonymize, detect, inspect,
    config::{AnonymizeConfig, CheckConfig, Cli, Command, InfoConfig},
    AnonymizeError,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Anonymize(config) => run_anonymize(config).await,
        Command::Check(config) => run_check(config).await,
        Command::Info(config) => run_info(config).await,
    }
}

/// Run `task` on every file in a blocking task and collect the results in
/// input order.
async fn for_each_file<T, F>(files: Vec<PathBuf>, task: F) -> Vec<(PathBuf, Result<T, String>)>
where
    T: Send + 'static,
    F: Fn(&PathBuf) -> Result<T, AnonymizeError> + Clone + Send + 'static,
{
    let handles: Vec<_> = files
        .into_iter()
        .map(|path| {
            let task = task.clone();
            tokio::task::spawn_blocking(move || {
                let result = task(&path).map_err(|e| e.to_string());
                (path, result)
            })
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        match handle.await {
            Ok(result) => results.push(result),
            Err(e) => results.push((PathBuf::new(), Err(format!("task failed: {e}")))),
        }
    }
    results
}

/// Log the first failure in input order.
fn report_first_failure<T>(results: &[(PathBuf, Result<T, String>)]) -> ExitCode {
    match results.iter().find_map(|(path, result)| result.as_ref().err().map(|e| (path, e))) {
        Some((path, e)) => {
            error!("{}: {}", path.display(), e);
            ExitCode::FAILURE
        }
        None => ExitCode::SUCCESS,
    }
}

// =============================================================================
// Anonymize Command
// =============================================================================

async fn run_anonymize(config: AnonymizeConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let options = config.to_options();
    if options.in_place {
        info!("Anonymizing in place; originals will be modified");
    }

    let results = for_each_file(config.files, move |path| anonymize(path, &options)).await;

    for (path, result) in &results {
        if let Ok(report) = result {
            info!(
                "{} -> {} ({}, {} wiped, {} unlinked, {} redacted)",
                path.display(),
                report.path.display(),
                report.vendor.name(),
                report.wiped_directories.len(),
                report.unlinked_directories.len(),
                report.redacted_entries
            );
        }
    }

    report_first_failure(&results)
}

// =============================================================================
// Check Command
// =============================================================================

async fn run_check(config: CheckConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let results = for_each_file(config.files, |path| detect(path)).await;

    for (path, result) in &results {
        match result {
            Ok(Some(vendor)) => println!("✓ {}: {}", path.display(), vendor.name()),
            Ok(None) => println!("✗ {}: unsupported", path.display()),
            Err(e) => println!("✗ {}: {}", path.display(), e),
        }
    }

    let code = report_first_failure(&results);
    if results.iter().any(|(_, result)| matches!(result, Ok(None))) {
        return ExitCode::FAILURE;
    }
    code
}

// =============================================================================
// Info Command
// =============================================================================

async fn run_info(config: InfoConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let results = for_each_file(config.files, |path| inspect(path)).await;

    let slides: Vec<_> = results
        .iter()
        .filter_map(|(_, result)| result.as_ref().ok())
        .collect();

    let json = if config.pretty {
        serde_json::to_string_pretty(&slides)
    } else {
        serde_json::to_string(&slides)
    };

    match json {
        Ok(json) => println!("{}", json),
        Err(e) => {
            error!("Failed to serialize slide info: {}", e);
            return ExitCode::FAILURE;
        }
    }

    report_first_failure(&results)
}

/// Initialize the tracing/logging subsystem.
///
/// Logs go to stderr so JSON output on stdout stays parseable.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "wsi_anonymizer=debug"
    } else {
        "wsi_anonymizer=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

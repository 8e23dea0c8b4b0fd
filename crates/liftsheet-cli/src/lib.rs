//! Command-line front end for the liftsheet workbook converter.

pub mod cli_args;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use cli_args::{Cli, Command, ConfigCommand, ConfigInitArgs, ProcessArgs};
use liftsheet_core::config::LOCAL_CONFIG_FILE_NAME;
use liftsheet_core::{
    FileConfig, LiftsheetError, LoggingDestination, RunOutcome, RunSummary,
    apply_runtime_overrides, init_logging, load_config, render_config, save_config,
};
use tracing::{debug, warn};

/// Parse the process arguments and execute the selected command.
pub fn run() -> Result<()> {
    dispatch(Cli::parse())
}

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Command::Config(cmd)) => {
            if !cli.process.is_empty() {
                anyhow::bail!("Path flags cannot be combined with config subcommands.");
            }
            handle_config_command(cmd, cli.process.config)
        }
        None => run_process(cli.process),
    }
}

fn run_process(args: ProcessArgs) -> Result<()> {
    let destination = if args.log_file {
        LoggingDestination::FileAndStderr
    } else {
        LoggingDestination::StderrOnly
    };
    if let Err(err) = init_logging(destination) {
        eprintln!("Warning: structured logging unavailable: {err}");
    }

    let load = load_config(args.config.as_deref());
    for warning in &load.warnings {
        warn!(%warning, "Configuration warning");
        eprintln!("Warning: {warning}");
    }
    debug!(source = %load.source, "Configuration loaded");

    let overrides = args.to_runtime_overrides().map_err(anyhow::Error::msg)?;
    let mut config = load.config;
    apply_runtime_overrides(&mut config, &overrides);
    let pipeline = config.to_pipeline_config()?;

    match liftsheet_core::run(&pipeline)? {
        RunOutcome::MissingInput(path) => {
            println!("{}", render_missing_input(&path));
        }
        RunOutcome::Completed(summary) => {
            print!("{}", render_summary(&summary));
        }
    }
    Ok(())
}

/// Line printed when the workbook does not exist; the run still exits cleanly.
pub fn render_missing_input(path: &Path) -> String {
    let err = LiftsheetError::MissingInput {
        path: path.to_path_buf(),
    };
    format!("Error: {err}")
}

/// Progress report printed after a completed run.
pub fn render_summary(summary: &RunSummary) -> String {
    let mut out = format!(
        "Successfully parsed Excel file and saved to {}\n\nSheet contents summary:\n",
        summary.json_path.display()
    );
    for sheet in &summary.sheets {
        out.push_str(&format!("{}: {} rows\n", sheet.name, sheet.rows));
    }
    out.push_str(&format!(
        "\nExtracted data saved to markdown files in {}\n",
        summary.docs_dir.display()
    ));
    out
}

fn handle_config_command(command: ConfigCommand, explicit: Option<PathBuf>) -> Result<()> {
    match command {
        ConfigCommand::Init(ConfigInitArgs { path, force }) => {
            let path = path.unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE_NAME));
            save_config(&FileConfig::default(), &path, force)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Wrote default configuration to {}", path.display());
            Ok(())
        }
        ConfigCommand::Show => {
            let load = load_config(explicit.as_deref());
            for warning in &load.warnings {
                eprintln!("Warning: {warning}");
            }
            println!("# source: {}", load.source);
            print!("{}", render_config(&load.config)?);
            Ok(())
        }
    }
}

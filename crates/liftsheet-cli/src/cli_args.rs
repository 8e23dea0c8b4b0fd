use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};
use liftsheet_core::RuntimeOverrides;

/// Top-level CLI entrypoint.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "liftsheet",
    version,
    about = "Convert a workout plan workbook into JSON and markdown reference lists",
    long_about = None
)]
pub struct Cli {
    #[command(flatten)]
    pub process: ProcessArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Supported subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Configuration file helpers.
#[derive(Debug, Clone, Subcommand)]
pub enum ConfigCommand {
    /// Write the default configuration (paths and column mapping) for editing.
    Init(ConfigInitArgs),
    /// Print the effective configuration and where it came from.
    Show,
}

#[derive(Debug, Clone, Args)]
pub struct ConfigInitArgs {
    /// Destination file (defaults to ./liftsheet.toml).
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub path: Option<PathBuf>,

    /// Replace an existing file.
    #[arg(long, action = ArgAction::SetTrue)]
    pub force: bool,
}

/// Arguments for the conversion run (default command).
#[derive(Debug, Clone, Args, Default)]
pub struct ProcessArgs {
    /// Configuration file to read instead of the default lookup.
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Workbook to convert.
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub input: Option<String>,

    /// Path of the JSON dump.
    #[arg(long = "json-output", value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub json_output: Option<String>,

    /// Directory receiving the markdown reference lists.
    #[arg(long = "docs-dir", value_name = "DIR", value_hint = ValueHint::DirPath)]
    pub docs_dir: Option<String>,

    /// Also write JSON logs to the per-user log directory.
    #[arg(long = "log-file", action = ArgAction::SetTrue)]
    pub log_file: bool,
}

impl ProcessArgs {
    /// Returns true when no path overrides were provided.
    pub fn is_empty(&self) -> bool {
        self.input.is_none() && self.json_output.is_none() && self.docs_dir.is_none()
    }

    pub fn to_runtime_overrides(&self) -> Result<RuntimeOverrides, String> {
        Ok(RuntimeOverrides {
            input: parse_path_field("--input", self.input.as_deref())?,
            json_output: parse_path_field("--json-output", self.json_output.as_deref())?,
            docs_dir: parse_path_field("--docs-dir", self.docs_dir.as_deref())?,
        })
    }
}

fn parse_path_field(flag: &str, value: Option<&str>) -> Result<Option<String>, String> {
    match value.map(str::trim) {
        None => Ok(None),
        Some("") => Err(format!("{flag} requires a non-empty path.")),
        Some(trimmed) => Ok(Some(trimmed.to_string())),
    }
}

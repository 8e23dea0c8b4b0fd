use crate::error::LiftsheetError;
use crate::workbook::ReadOptions;
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_DIR_NAME: &str = "liftsheet";
const CONFIG_FILE_NAME: &str = "config.toml";
const CURRENT_SCHEMA_VERSION: u32 = 1;
pub const LOCAL_CONFIG_FILE_NAME: &str = "liftsheet.toml";
pub const CONFIG_ENV_VAR: &str = "LIFTSHEET_CONFIG";
pub const DEFAULT_INPUT_PATH: &str = "workouts.xlsx";
pub const DEFAULT_JSON_OUTPUT_PATH: &str = "workouts_data.json";
pub const DEFAULT_DOCS_DIR: &str = "../docs";
pub const DEFAULT_MOVEMENTS_FILE: &str = "movements.md";
pub const DEFAULT_WORKOUT_FORMATS_FILE: &str = "workout_formats.md";
pub const DEFAULT_INTENSITY_LEVELS_FILE: &str = "intensity_levels.md";

/// Text cell contents treated as missing values, matching the usual spreadsheet NA spellings.
const DEFAULT_NULL_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Result returned by [`load_config`], capturing the source and any non-fatal issues.
#[derive(Debug, Clone)]
pub struct ConfigLoadResult {
    pub config: FileConfig,
    pub warnings: Vec<String>,
    pub source: ConfigSource,
}

/// Indicates where the configuration was loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// No usable configuration file was found; defaults were synthesized.
    Default,
    /// Configuration was read from the given TOML file.
    File(PathBuf),
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "built-in defaults"),
            ConfigSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Errors that can occur when persisting configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Ser(toml::ser::Error),
    AlreadyExists(PathBuf),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "IO error: {err}"),
            ConfigError::Ser(err) => write!(f, "TOML serialization error: {err}"),
            ConfigError::AlreadyExists(path) => {
                write!(f, "{} already exists (use --force to overwrite)", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(value: toml::ser::Error) -> Self {
        Self::Ser(value)
    }
}

/// The reference list a mapped column feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceCategory {
    MainMovement,
    AccessoryMovement,
    WorkoutFormat,
    IntensityLevel,
}

impl ReferenceCategory {
    pub fn label(&self) -> &'static str {
        match self {
            ReferenceCategory::MainMovement => "main movement",
            ReferenceCategory::AccessoryMovement => "accessory movement",
            ReferenceCategory::WorkoutFormat => "workout format",
            ReferenceCategory::IntensityLevel => "intensity level",
        }
    }
}

/// Maps one worksheet column (zero-based, counted from column A) onto a reference list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRule {
    pub index: usize,
    pub category: ReferenceCategory,
    /// Split the cell text on commas and record each trimmed segment.
    #[serde(default)]
    pub split: bool,
}

impl ColumnRule {
    pub const fn new(index: usize, category: ReferenceCategory, split: bool) -> Self {
        Self {
            index,
            category,
            split,
        }
    }
}

/// Column layout of the workout plan workbook, whose headers are blank and therefore
/// surface as `Unnamed: <index>` placeholders.
pub fn default_column_rules() -> Vec<ColumnRule> {
    vec![
        ColumnRule::new(3, ReferenceCategory::MainMovement, false),
        ColumnRule::new(5, ReferenceCategory::AccessoryMovement, true),
        ColumnRule::new(9, ReferenceCategory::AccessoryMovement, true),
        ColumnRule::new(8, ReferenceCategory::WorkoutFormat, false),
        ColumnRule::new(7, ReferenceCategory::IntensityLevel, false),
    ]
}

/// Disk-backed configuration schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default = "FileConfig::schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub paths: PathSettings,
    #[serde(default)]
    pub docs: DocFileNames,
    #[serde(default)]
    pub reader: ReaderSettings,
    #[serde(default = "default_column_rules")]
    pub columns: Vec<ColumnRule>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            paths: PathSettings::default(),
            docs: DocFileNames::default(),
            reader: ReaderSettings::default(),
            columns: default_column_rules(),
        }
    }
}

impl FileConfig {
    const fn schema_version() -> u32 {
        CURRENT_SCHEMA_VERSION
    }

    /// Resolve paths (expanding `~` and environment variables) into a runnable pipeline config.
    pub fn to_pipeline_config(&self) -> Result<PipelineConfig, LiftsheetError> {
        Ok(PipelineConfig {
            input: expand_path(&self.paths.input)?,
            json_output: expand_path(&self.paths.json_output)?,
            docs_dir: expand_path(&self.paths.docs_dir)?,
            doc_files: self.docs.clone(),
            read_options: ReadOptions {
                null_markers: self.reader.null_markers.clone(),
            },
            columns: self.columns.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSettings {
    #[serde(default = "PathSettings::default_input")]
    pub input: String,
    #[serde(default = "PathSettings::default_json_output")]
    pub json_output: String,
    #[serde(default = "PathSettings::default_docs_dir")]
    pub docs_dir: String,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            input: Self::default_input(),
            json_output: Self::default_json_output(),
            docs_dir: Self::default_docs_dir(),
        }
    }
}

impl PathSettings {
    fn default_input() -> String {
        DEFAULT_INPUT_PATH.to_string()
    }

    fn default_json_output() -> String {
        DEFAULT_JSON_OUTPUT_PATH.to_string()
    }

    fn default_docs_dir() -> String {
        DEFAULT_DOCS_DIR.to_string()
    }
}

/// File names of the generated markdown references inside the docs directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocFileNames {
    #[serde(default = "DocFileNames::default_movements")]
    pub movements: String,
    #[serde(default = "DocFileNames::default_workout_formats")]
    pub workout_formats: String,
    #[serde(default = "DocFileNames::default_intensity_levels")]
    pub intensity_levels: String,
}

impl Default for DocFileNames {
    fn default() -> Self {
        Self {
            movements: Self::default_movements(),
            workout_formats: Self::default_workout_formats(),
            intensity_levels: Self::default_intensity_levels(),
        }
    }
}

impl DocFileNames {
    fn default_movements() -> String {
        DEFAULT_MOVEMENTS_FILE.to_string()
    }

    fn default_workout_formats() -> String {
        DEFAULT_WORKOUT_FORMATS_FILE.to_string()
    }

    fn default_intensity_levels() -> String {
        DEFAULT_INTENSITY_LEVELS_FILE.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderSettings {
    #[serde(default = "ReaderSettings::default_null_markers")]
    pub null_markers: Vec<String>,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            null_markers: Self::default_null_markers(),
        }
    }
}

impl ReaderSettings {
    fn default_null_markers() -> Vec<String> {
        DEFAULT_NULL_MARKERS.iter().map(|s| s.to_string()).collect()
    }
}

/// Fully resolved inputs for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input: PathBuf,
    pub json_output: PathBuf,
    pub docs_dir: PathBuf,
    pub doc_files: DocFileNames,
    pub read_options: ReadOptions,
    pub columns: Vec<ColumnRule>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT_PATH),
            json_output: PathBuf::from(DEFAULT_JSON_OUTPUT_PATH),
            docs_dir: PathBuf::from(DEFAULT_DOCS_DIR),
            doc_files: DocFileNames::default(),
            read_options: ReadOptions::default(),
            columns: default_column_rules(),
        }
    }
}

/// Represents overrides sourced from command-line flags.
#[derive(Debug, Default, Clone)]
pub struct RuntimeOverrides {
    pub input: Option<String>,
    pub json_output: Option<String>,
    pub docs_dir: Option<String>,
}

impl RuntimeOverrides {
    pub fn is_empty(&self) -> bool {
        self.input.is_none() && self.json_output.is_none() && self.docs_dir.is_none()
    }
}

pub fn apply_runtime_overrides(config: &mut FileConfig, overrides: &RuntimeOverrides) {
    if let Some(input) = overrides.input.as_ref() {
        config.paths.input = input.clone();
    }
    if let Some(json_output) = overrides.json_output.as_ref() {
        config.paths.json_output = json_output.clone();
    }
    if let Some(docs_dir) = overrides.docs_dir.as_ref() {
        config.paths.docs_dir = docs_dir.clone();
    }
}

/// Path to the per-user configuration directory.
pub fn config_directory() -> PathBuf {
    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// Path to the per-user `config.toml`.
pub fn config_path() -> PathBuf {
    config_directory().join(CONFIG_FILE_NAME)
}

/// Pick the configuration file to read: an explicit path, then `LIFTSHEET_CONFIG`, then
/// `./liftsheet.toml`, then the per-user file. Only the explicit path is returned when missing.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(value) = env::var(CONFIG_ENV_VAR) {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }

    [PathBuf::from(LOCAL_CONFIG_FILE_NAME), config_path()]
        .into_iter()
        .find(|candidate| candidate.exists())
}

/// Load the configuration, falling back to defaults with a warning when the file is unusable.
pub fn load_config(explicit: Option<&Path>) -> ConfigLoadResult {
    match resolve_config_path(explicit) {
        Some(path) => load_config_from(&path),
        None => ConfigLoadResult {
            config: FileConfig::default(),
            warnings: Vec::new(),
            source: ConfigSource::Default,
        },
    }
}

pub fn load_config_from(path: &Path) -> ConfigLoadResult {
    let mut warnings = Vec::new();

    if !path.exists() {
        warnings.push(format!(
            "Config file {} not found. Falling back to defaults.",
            path.display()
        ));
    } else {
        match fs::read_to_string(path) {
            Ok(raw) => match toml::from_str::<FileConfig>(&raw) {
                Ok(cfg) => {
                    let (cfg, mut sanitize_warnings) = sanitize_config(cfg);
                    warnings.append(&mut sanitize_warnings);
                    return ConfigLoadResult {
                        config: cfg,
                        warnings,
                        source: ConfigSource::File(path.to_path_buf()),
                    };
                }
                Err(err) => {
                    warnings.push(format!(
                        "Failed to parse {} as TOML: {}. Falling back to defaults.",
                        path.display(),
                        err
                    ));
                }
            },
            Err(err) => {
                warnings.push(format!(
                    "Failed to read {}: {}. Falling back to defaults.",
                    path.display(),
                    err
                ));
            }
        }
    }

    ConfigLoadResult {
        config: FileConfig::default(),
        warnings,
        source: ConfigSource::Default,
    }
}

pub fn render_config(config: &FileConfig) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(config)?)
}

/// Write `config` as TOML, refusing to replace an existing file unless `overwrite` is set.
pub fn save_config(config: &FileConfig, path: &Path, overwrite: bool) -> Result<(), ConfigError> {
    if path.exists() && !overwrite {
        return Err(ConfigError::AlreadyExists(path.to_path_buf()));
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, render_config(config)?)?;
    Ok(())
}

fn sanitize_config(mut config: FileConfig) -> (FileConfig, Vec<String>) {
    let mut warnings = Vec::new();

    if config.schema_version != CURRENT_SCHEMA_VERSION {
        warnings.push(format!(
            "Unknown config schema version {}. Resetting to {}.",
            config.schema_version, CURRENT_SCHEMA_VERSION
        ));
        return (FileConfig::default(), warnings);
    }

    let defaults = PathSettings::default();
    for (name, value, fallback) in [
        ("input", &mut config.paths.input, defaults.input),
        ("json_output", &mut config.paths.json_output, defaults.json_output),
        ("docs_dir", &mut config.paths.docs_dir, defaults.docs_dir),
    ] {
        if value.trim().is_empty() {
            warnings.push(format!(
                "paths.{name} is empty. Resetting to '{fallback}'."
            ));
            *value = fallback;
        }
    }

    let defaults = DocFileNames::default();
    for (name, value, fallback) in [
        ("movements", &mut config.docs.movements, defaults.movements),
        (
            "workout_formats",
            &mut config.docs.workout_formats,
            defaults.workout_formats,
        ),
        (
            "intensity_levels",
            &mut config.docs.intensity_levels,
            defaults.intensity_levels,
        ),
    ] {
        if value.trim().is_empty() {
            warnings.push(format!("docs.{name} is empty. Resetting to '{fallback}'."));
            *value = fallback;
        }
    }

    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    config.columns.retain(|rule| {
        if seen.insert((rule.index, rule.category)) {
            true
        } else {
            duplicates.push(format!("{} ({})", rule.index, rule.category.label()));
            false
        }
    });
    if !duplicates.is_empty() {
        warnings.push(format!(
            "Removed duplicate column rules: {}",
            duplicates.join(", ")
        ));
    }

    if config.columns.is_empty() {
        warnings.push("No column rules configured; reference lists will be empty.".to_string());
    }

    (config, warnings)
}

fn expand_path(raw: &str) -> Result<PathBuf, LiftsheetError> {
    shellexpand::full(raw)
        .map(|expanded| PathBuf::from(expanded.as_ref()))
        .map_err(|err| LiftsheetError::Config(format!("cannot expand path '{raw}': {err}")))
}

//! Core library: converts a workout plan workbook into a JSON dump and markdown reference lists.

pub mod config;
pub mod error;
pub mod logging;
pub mod markdown;
pub mod reference;
pub mod runtime;
pub mod serialize;
pub mod workbook;

pub use config::{
    ColumnRule, ConfigError, ConfigLoadResult, ConfigSource, DocFileNames, FileConfig,
    PipelineConfig, ReferenceCategory, RuntimeOverrides, apply_runtime_overrides,
    default_column_rules, load_config, render_config, save_config,
};
pub use error::LiftsheetError;
pub use logging::{LoggingDestination, LoggingError, init_logging};
pub use reference::{ReferenceSets, extract_references};
pub use runtime::{RunOutcome, RunSummary, SheetSummary, run};
pub use serialize::{workbook_to_json, write_json};
pub use workbook::{CellValue, ReadOptions, Row, Sheet, Workbook, read_workbook, sheet_from_range};

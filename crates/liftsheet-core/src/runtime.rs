use std::path::PathBuf;
use std::time::Instant;

use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::error::{LiftsheetError, Result};
use crate::markdown::write_reference_docs;
use crate::reference::{ReferenceSets, extract_references};
use crate::serialize::write_json;
use crate::workbook::read_workbook;

/// Row count of one sheet, in workbook order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetSummary {
    pub name: String,
    pub rows: usize,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub json_path: PathBuf,
    pub sheets: Vec<SheetSummary>,
    pub references: ReferenceSets,
    pub docs_dir: PathBuf,
    pub doc_paths: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// The input workbook does not exist; nothing was written.
    MissingInput(PathBuf),
    Completed(RunSummary),
}

/// Read the workbook, write the JSON dump, then write the reference documents.
pub fn run(config: &PipelineConfig) -> Result<RunOutcome> {
    let started = Instant::now();

    let workbook = match read_workbook(&config.input, &config.read_options) {
        Ok(workbook) => workbook,
        Err(LiftsheetError::MissingInput { path }) => {
            warn!(path = %path.display(), "Input workbook not found; nothing written");
            return Ok(RunOutcome::MissingInput(path));
        }
        Err(err) => return Err(err),
    };
    info!(
        path = %config.input.display(),
        sheets = workbook.sheets.len(),
        rows = workbook.row_count(),
        "Workbook loaded"
    );

    write_json(&config.json_output, &workbook)?;
    info!(path = %config.json_output.display(), "JSON written");

    let references = extract_references(&workbook, &config.columns);
    info!(
        main_movements = references.main_movements.len(),
        accessory_movements = references.accessory_movements.len(),
        workout_formats = references.workout_formats.len(),
        intensity_levels = references.intensity_levels.len(),
        "Reference values extracted"
    );

    let doc_paths = write_reference_docs(&config.docs_dir, &references, &config.doc_files)?;
    info!(
        dir = %config.docs_dir.display(),
        files = doc_paths.len(),
        elapsed_ms = started.elapsed().as_secs_f64() * 1_000.0,
        "Reference documents written"
    );

    let sheets = workbook
        .sheets
        .iter()
        .map(|sheet| SheetSummary {
            name: sheet.name.clone(),
            rows: sheet.rows.len(),
        })
        .collect();

    Ok(RunOutcome::Completed(RunSummary {
        json_path: config.json_output.clone(),
        sheets,
        references,
        docs_dir: config.docs_dir.clone(),
        doc_paths,
    }))
}

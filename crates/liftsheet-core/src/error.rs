use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LiftsheetError {
    #[error("{} not found!", .path.display())]
    MissingInput { path: PathBuf },
    #[error("failed to open workbook: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("failed to read sheet '{sheet}': {message}")]
    Sheet { sheet: String, message: String },
    #[error("configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LiftsheetError {
    pub fn sheet<S: Into<String>, M: std::fmt::Display>(sheet: S, message: M) -> Self {
        LiftsheetError::Sheet {
            sheet: sheet.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LiftsheetError>;

//! Workbook loading: turns every sheet of a spreadsheet into labelled rows of typed cells.
//!
//! Column labels come from the first non-blank row. Blank header cells get the placeholder
//! `Unnamed: <index>`, where the index is the worksheet column counted from column A, so the
//! column rules in [`crate::config`] can address unnamed columns by position.

use std::collections::HashSet;
use std::path::Path;

use calamine::{CellErrorType, Data, ExcelDateTime, Range, Reader, open_workbook_auto};
use chrono::{Duration, NaiveDateTime, NaiveTime};
use tracing::debug;

use crate::config::ReaderSettings;
use crate::error::{LiftsheetError, Result};
use crate::serialize::{format_datetime, format_duration, format_time};

/// Tunables for cell normalisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOptions {
    /// Exact text cell contents that are read as empty cells.
    pub null_markers: Vec<String>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            null_markers: ReaderSettings::default().null_markers,
        }
    }
}

/// A single cell, keeping the native spreadsheet type until serialization.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    Duration(Duration),
    /// Date or duration already rendered as ISO-8601 text by the workbook format (ODS).
    IsoText(String),
    /// Formula error code such as `#DIV/0!`.
    Error(String),
}

static EMPTY_CELL: CellValue = CellValue::Empty;

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Whether the cell carries a meaningful value: empty cells, blank text, zero and
    /// `false` do not.
    pub fn is_truthy(&self) -> bool {
        match self {
            CellValue::Empty => false,
            CellValue::Text(text) | CellValue::IsoText(text) => !text.trim().is_empty(),
            CellValue::Int(value) => *value != 0,
            CellValue::Float(value) => *value != 0.0 && !value.is_nan(),
            CellValue::Bool(value) => *value,
            CellValue::DateTime(_) | CellValue::Time(_) | CellValue::Error(_) => true,
            CellValue::Duration(value) => !value.is_zero(),
        }
    }

    /// Plain text form of the cell, `None` for empty cells.
    pub fn display_text(&self) -> Option<String> {
        let text = match self {
            CellValue::Empty => return None,
            CellValue::Text(text) | CellValue::IsoText(text) | CellValue::Error(text) => {
                text.clone()
            }
            CellValue::Int(value) => value.to_string(),
            CellValue::Float(value) => format_float(*value),
            CellValue::Bool(value) => (if *value { "TRUE" } else { "FALSE" }).to_string(),
            CellValue::DateTime(value) => format_datetime(value),
            CellValue::Time(value) => format_time(value),
            CellValue::Duration(value) => format_duration(value),
        };
        Some(text)
    }
}

fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        (value as i64).to_string()
    } else {
        value.to_string()
    }
}

/// Cells of one data row, positioned by worksheet column index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<CellValue>,
}

impl Row {
    pub fn new(cells: Vec<CellValue>) -> Self {
        Self { cells }
    }

    /// Cell at a zero-based worksheet column; columns past the end read as empty.
    pub fn get(&self, index: usize) -> &CellValue {
        self.cells.get(index).unwrap_or(&EMPTY_CELL)
    }

    pub fn cells(&self) -> &[CellValue] {
        &self.cells
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub name: String,
    /// Column labels in left-to-right order; `columns[i]` labels `Row::get(i)`.
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Sheet {
    /// Pairs each column label with this row's value, in column order.
    pub fn labelled<'a>(&'a self, row: &'a Row) -> impl Iterator<Item = (&'a str, &'a CellValue)> {
        self.columns
            .iter()
            .enumerate()
            .map(move |(index, label)| (label.as_str(), row.get(index)))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }

    pub fn row_count(&self) -> usize {
        self.sheets.iter().map(|sheet| sheet.rows.len()).sum()
    }
}

/// Load every sheet of the workbook at `path`, in workbook order.
///
/// Returns [`LiftsheetError::MissingInput`] without touching the file system further when the
/// path does not exist.
pub fn read_workbook(path: &Path, options: &ReadOptions) -> Result<Workbook> {
    if !path.exists() {
        return Err(LiftsheetError::MissingInput {
            path: path.to_path_buf(),
        });
    }

    let mut workbook = open_workbook_auto(path)?;
    let names = workbook.sheet_names().to_vec();
    let mut sheets = Vec::with_capacity(names.len());

    for name in names {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|err| LiftsheetError::sheet(name.as_str(), err))?;
        let sheet = sheet_from_range(&name, &range, options);
        debug!(
            sheet = %sheet.name,
            columns = sheet.columns.len(),
            rows = sheet.rows.len(),
            "Loaded sheet"
        );
        sheets.push(sheet);
    }

    Ok(Workbook { sheets })
}

/// Convert a raw worksheet range into a labelled [`Sheet`].
pub fn sheet_from_range(name: &str, range: &Range<Data>, options: &ReadOptions) -> Sheet {
    let mut sheet = Sheet {
        name: name.to_string(),
        ..Sheet::default()
    };

    let Some((_, start_col)) = range.start() else {
        return sheet;
    };
    let offset = start_col as usize;
    let width = offset + range.width();

    // Blankness is judged on the raw cells so rows holding only null markers survive as nulls.
    let mut rows = range
        .rows()
        .filter(|cells| !cells.iter().all(is_blank_cell))
        .map(|cells| {
            let mut values = vec![CellValue::Empty; offset];
            values.extend(cells.iter().map(|cell| convert_cell(cell, options)));
            values.resize(width, CellValue::Empty);
            Row::new(values)
        });

    let Some(header) = rows.next() else {
        return sheet;
    };
    sheet.columns = column_labels(&header);
    sheet.rows = rows.collect();
    sheet
}

fn column_labels(header: &Row) -> Vec<String> {
    let mut taken = HashSet::new();
    header
        .cells()
        .iter()
        .enumerate()
        .map(|(index, cell)| {
            let base = cell
                .display_text()
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty())
                .unwrap_or_else(|| format!("Unnamed: {index}"));
            let mut label = base.clone();
            let mut suffix = 0;
            while !taken.insert(label.clone()) {
                suffix += 1;
                label = format!("{base}.{suffix}");
            }
            label
        })
        .collect()
}

fn is_blank_cell(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(text) => text.is_empty(),
        _ => false,
    }
}

fn convert_cell(cell: &Data, options: &ReadOptions) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(text) => {
            if options.null_markers.iter().any(|marker| marker == text) {
                CellValue::Empty
            } else {
                CellValue::Text(text.clone())
            }
        }
        Data::Int(value) => CellValue::Int(*value),
        Data::Float(value) if value.is_nan() => CellValue::Empty,
        Data::Float(value) => CellValue::Float(*value),
        Data::Bool(value) => CellValue::Bool(*value),
        Data::DateTime(value) => convert_datetime(value),
        Data::DateTimeIso(text) | Data::DurationIso(text) => CellValue::IsoText(text.clone()),
        Data::Error(CellErrorType::NA) => CellValue::Empty,
        Data::Error(err) => CellValue::Error(err.to_string()),
    }
}

fn convert_datetime(value: &ExcelDateTime) -> CellValue {
    let serial = value.as_f64();
    let converted = if value.is_duration() {
        value.as_duration().map(CellValue::Duration)
    } else if (0.0..1.0).contains(&serial) {
        value
            .as_datetime()
            .map(|datetime| CellValue::Time(datetime.time()))
    } else {
        value.as_datetime().map(CellValue::DateTime)
    };
    converted.unwrap_or(CellValue::Float(serial))
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::ExcelDateTimeType;
    use chrono::NaiveDate;

    fn text(value: &str) -> Data {
        Data::String(value.to_string())
    }

    #[test]
    fn header_row_labels_and_placeholders() {
        let mut range = Range::new((0, 0), (2, 3));
        range.set_value((0, 0), text("Day"));
        range.set_value((0, 2), text("Notes"));
        range.set_value((1, 0), text("Mon"));
        range.set_value((1, 3), text("Squat"));
        range.set_value((2, 0), text("Tue"));

        let sheet = sheet_from_range("Week 1", &range, &ReadOptions::default());

        assert_eq!(sheet.columns, vec!["Day", "Unnamed: 1", "Notes", "Unnamed: 3"]);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0].get(3), &CellValue::Text("Squat".to_string()));
        assert!(sheet.rows[1].get(3).is_empty());
    }

    #[test]
    fn placeholder_index_counts_from_column_a() {
        let mut range = Range::new((0, 2), (1, 3));
        range.set_value((0, 2), text("Block"));
        range.set_value((1, 2), text("A"));
        range.set_value((1, 3), text("Deadlift"));

        let sheet = sheet_from_range("Offset", &range, &ReadOptions::default());

        assert_eq!(
            sheet.columns,
            vec!["Unnamed: 0", "Unnamed: 1", "Block", "Unnamed: 3"]
        );
        assert_eq!(
            sheet.rows[0].get(3),
            &CellValue::Text("Deadlift".to_string())
        );
    }

    #[test]
    fn duplicate_labels_get_numeric_suffixes() {
        let mut range = Range::new((0, 0), (1, 2));
        range.set_value((0, 0), text("Set"));
        range.set_value((0, 1), text("Set"));
        range.set_value((0, 2), text("Set"));
        range.set_value((1, 0), Data::Int(1));

        let sheet = sheet_from_range("Dupes", &range, &ReadOptions::default());

        assert_eq!(sheet.columns, vec!["Set", "Set.1", "Set.2"]);
    }

    #[test]
    fn blank_rows_are_skipped() {
        let mut range = Range::new((0, 0), (4, 1));
        range.set_value((1, 0), text("Header"));
        range.set_value((2, 1), text("first"));
        range.set_value((4, 0), text("second"));

        let sheet = sheet_from_range("Gaps", &range, &ReadOptions::default());

        assert_eq!(sheet.columns, vec!["Header", "Unnamed: 1"]);
        assert_eq!(sheet.rows.len(), 2);
    }

    #[test]
    fn rows_of_null_markers_are_kept_as_empty_records() {
        let mut range = Range::new((0, 0), (3, 1));
        range.set_value((0, 0), text("Day"));
        range.set_value((0, 1), text("At"));
        range.set_value((1, 0), text("NA"));
        range.set_value((2, 0), text("NULL"));
        range.set_value((2, 1), text("n/a"));
        range.set_value((3, 0), text("Mon"));
        range.set_value((3, 1), text("06:30"));

        let sheet = sheet_from_range("W", &range, &ReadOptions::default());

        assert_eq!(sheet.rows.len(), 3);
        assert!(sheet.rows[0].cells().iter().all(CellValue::is_empty));
        assert!(sheet.rows[1].cells().iter().all(CellValue::is_empty));
        assert_eq!(sheet.rows[2].get(0), &CellValue::Text("Mon".to_string()));
    }

    #[test]
    fn null_markers_and_na_errors_read_as_empty() {
        let options = ReadOptions::default();
        assert!(convert_cell(&text("#N/A"), &options).is_empty());
        assert!(convert_cell(&text("NaN"), &options).is_empty());
        assert!(convert_cell(&text(""), &options).is_empty());
        assert!(convert_cell(&Data::Error(CellErrorType::NA), &options).is_empty());
        assert_eq!(
            convert_cell(&Data::Error(CellErrorType::Div0), &options),
            CellValue::Error("#DIV/0!".to_string())
        );
        assert_eq!(
            convert_cell(&text("Nap"), &options),
            CellValue::Text("Nap".to_string())
        );

        let strict = ReadOptions {
            null_markers: Vec::new(),
        };
        assert_eq!(
            convert_cell(&text("NA"), &strict),
            CellValue::Text("NA".to_string())
        );
    }

    #[test]
    fn excel_serials_become_dates_and_times() {
        let date = ExcelDateTime::new(45306.0, ExcelDateTimeType::DateTime, false);
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid date");
        assert_eq!(convert_datetime(&date), CellValue::DateTime(expected));

        let time = ExcelDateTime::new(0.75, ExcelDateTimeType::DateTime, false);
        assert_eq!(
            convert_datetime(&time),
            CellValue::Time(NaiveTime::from_hms_opt(18, 0, 0).expect("valid time"))
        );
    }

    #[test]
    fn truthiness_matches_reference_rules() {
        assert!(!CellValue::Empty.is_truthy());
        assert!(!CellValue::Text("   ".to_string()).is_truthy());
        assert!(!CellValue::Int(0).is_truthy());
        assert!(!CellValue::Float(0.0).is_truthy());
        assert!(!CellValue::Bool(false).is_truthy());
        assert!(CellValue::Text("Row".to_string()).is_truthy());
        assert!(CellValue::Float(2.5).is_truthy());
    }

    #[test]
    fn display_text_renders_integral_floats_without_fraction() {
        assert_eq!(CellValue::Float(12.0).display_text().as_deref(), Some("12"));
        assert_eq!(CellValue::Float(2.5).display_text().as_deref(), Some("2.5"));
        assert_eq!(CellValue::Empty.display_text(), None);
    }
}

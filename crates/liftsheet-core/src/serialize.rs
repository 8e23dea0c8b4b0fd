use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDateTime, NaiveTime};
use serde::ser::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::workbook::{CellValue, Sheet, Workbook};

pub fn format_datetime(value: &NaiveDateTime) -> String {
    value.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
}

pub fn format_time(value: &NaiveTime) -> String {
    value.format("%H:%M:%S%.f").to_string()
}

/// ISO-8601 duration such as `PT1H30M` or `P2DT4H`.
pub fn format_duration(value: &Duration) -> String {
    if value.is_zero() {
        return "PT0S".to_string();
    }

    let sign = if *value < Duration::zero() { "-" } else { "" };
    let total_ms = value.num_milliseconds().unsigned_abs();
    let days = total_ms / 86_400_000;
    let hours = total_ms / 3_600_000 % 24;
    let minutes = total_ms / 60_000 % 60;
    let seconds = total_ms / 1_000 % 60;
    let millis = total_ms % 1_000;

    let mut out = format!("{sign}P");
    if days > 0 {
        out.push_str(&format!("{days}D"));
    }
    if hours > 0 || minutes > 0 || seconds > 0 || millis > 0 {
        out.push('T');
        if hours > 0 {
            out.push_str(&format!("{hours}H"));
        }
        if minutes > 0 {
            out.push_str(&format!("{minutes}M"));
        }
        if millis > 0 {
            out.push_str(&format!("{seconds}.{millis:03}S"));
        } else if seconds > 0 {
            out.push_str(&format!("{seconds}S"));
        }
    }
    out
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            CellValue::Empty => serializer.serialize_none(),
            CellValue::Text(text) | CellValue::IsoText(text) | CellValue::Error(text) => {
                serializer.serialize_str(text)
            }
            CellValue::Int(value) => serializer.serialize_i64(*value),
            CellValue::Float(value) if !value.is_finite() => serializer.serialize_none(),
            CellValue::Float(value)
                if value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0 =>
            {
                serializer.serialize_i64(*value as i64)
            }
            CellValue::Float(value) => serializer.serialize_f64(*value),
            CellValue::Bool(value) => serializer.serialize_bool(*value),
            CellValue::DateTime(value) => serializer.serialize_str(&format_datetime(value)),
            CellValue::Time(value) => serializer.serialize_str(&format_time(value)),
            CellValue::Duration(value) => serializer.serialize_str(&format_duration(value)),
        }
    }
}

/// Rows of one sheet as JSON objects keyed by column label.
pub fn sheet_to_json(sheet: &Sheet) -> Result<Value> {
    let rows = sheet
        .rows
        .iter()
        .map(|row| -> Result<Value> {
            let mut object = Map::with_capacity(sheet.columns.len());
            for (label, cell) in sheet.labelled(row) {
                object.insert(label.to_string(), serde_json::to_value(cell)?);
            }
            Ok(Value::Object(object))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Value::Array(rows))
}

/// `{ "<sheet name>": [ { "<column label>": value, ... }, ... ], ... }` in workbook order.
pub fn workbook_to_json(workbook: &Workbook) -> Result<Value> {
    let mut document = Map::with_capacity(workbook.sheets.len());
    for sheet in &workbook.sheets {
        document.insert(sheet.name.clone(), sheet_to_json(sheet)?);
    }
    Ok(Value::Object(document))
}

/// Write the workbook as indented JSON, replacing `path` atomically.
pub fn write_json(path: &Path, workbook: &Workbook) -> Result<()> {
    let document = workbook_to_json(workbook)?;
    let serialized = serde_json::to_string_pretty(&document)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    let temp_path = build_temp_path(path);
    fs::write(&temp_path, format!("{serialized}\n"))?;
    fs::rename(&temp_path, path)?;
    Ok(())
}

fn build_temp_path(path: &Path) -> PathBuf {
    let mut temp_path = path.to_path_buf();
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if !ext.is_empty() => {
            temp_path.set_extension(format!("{ext}.tmp"));
        }
        _ => {
            temp_path.set_extension("tmp");
        }
    }
    temp_path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbook::Row;
    use chrono::NaiveDate;
    use serde_json::json;
    use tempfile::tempdir;

    fn sample_sheet() -> Sheet {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15)
            .and_then(|d| d.and_hms_opt(6, 30, 0))
            .expect("valid datetime");
        Sheet {
            name: "Week 1".to_string(),
            columns: vec![
                "Day".to_string(),
                "Unnamed: 1".to_string(),
                "Reps".to_string(),
                "When".to_string(),
            ],
            rows: vec![
                Row::new(vec![
                    CellValue::Text("Mon".to_string()),
                    CellValue::Empty,
                    CellValue::Float(5.0),
                    CellValue::DateTime(date),
                ]),
                Row::new(vec![CellValue::Text("Tue".to_string())]),
            ],
        }
    }

    #[test]
    fn sheet_rows_keep_labels_and_convert_values() {
        let value = sheet_to_json(&sample_sheet()).expect("serialize");
        assert_eq!(
            value,
            json!([
                {"Day": "Mon", "Unnamed: 1": null, "Reps": 5, "When": "2024-01-15T06:30:00"},
                {"Day": "Tue", "Unnamed: 1": null, "Reps": null, "When": null}
            ])
        );
    }

    #[test]
    fn column_order_is_preserved() {
        let value = sheet_to_json(&sample_sheet()).expect("serialize");
        let keys: Vec<&str> = value[0]
            .as_object()
            .expect("object")
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["Day", "Unnamed: 1", "Reps", "When"]);
    }

    #[test]
    fn floats_and_non_finite_values() {
        assert_eq!(serde_json::to_value(CellValue::Float(2.5)).unwrap(), json!(2.5));
        assert_eq!(serde_json::to_value(CellValue::Float(3.0)).unwrap(), json!(3));
        assert_eq!(
            serde_json::to_value(CellValue::Float(f64::INFINITY)).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn temporal_formats() {
        let time = NaiveTime::from_hms_opt(18, 5, 0).unwrap();
        assert_eq!(format_time(&time), "18:05:00");
        assert_eq!(format_duration(&Duration::minutes(90)), "PT1H30M");
        assert_eq!(format_duration(&Duration::hours(52)), "P2DT4H");
        assert_eq!(format_duration(&Duration::milliseconds(1_500)), "PT1.500S");
        assert_eq!(format_duration(&Duration::zero()), "PT0S");
        assert_eq!(format_duration(&Duration::seconds(-30)), "-PT30S");
    }

    #[test]
    fn write_json_is_indented_and_stable() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("out").join("data.json");
        let workbook = Workbook {
            sheets: vec![sample_sheet()],
        };

        write_json(&path, &workbook).expect("first write");
        let first = fs::read_to_string(&path).expect("read");
        write_json(&path, &workbook).expect("second write");
        let second = fs::read_to_string(&path).expect("read");

        assert_eq!(first, second);
        assert!(first.starts_with("{\n  \"Week 1\": [\n    {\n      \"Day\": \"Mon\""));
        assert!(first.ends_with("}\n"));
        assert!(!path.with_extension("json.tmp").exists());
    }
}

//! Two-sheet workbook export of a successful result set.

use std::fs;
use std::path::{Path, PathBuf};

use biograph_core::config::ExportSettings;
use biograph_core::{Record, RequestId};
use rust_xlsxwriter::{Workbook, Worksheet};
use serde_json::Value;

use crate::error::ExportError;

pub const RESULTS_SHEET: &str = "Query Results";
pub const METADATA_SHEET: &str = "Metadata";

/// File name used when exports are not keyed by request.
const SHARED_FILE_NAME: &str = "results.xlsx";

/// Where this request's workbook goes.
pub fn export_path(settings: &ExportSettings, request_id: RequestId) -> PathBuf {
    let dir = Path::new(&settings.dir);
    if settings.per_request {
        dir.join(format!("results-{request_id}.xlsx"))
    } else {
        dir.join(SHARED_FILE_NAME)
    }
}

/// Write renamed rows to "Query Results" and the provenance note to
/// "Metadata", replacing any existing file at `path`.
pub fn write_workbook(
    path: &Path,
    columns: &[String],
    records: &[Record],
    question: &str,
) -> Result<(), ExportError> {
    if columns.len() > usize::from(u16::MAX) {
        return Err(ExportError::TooManyColumns(columns.len()));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut workbook = Workbook::new();

    let results = workbook.add_worksheet();
    results.set_name(RESULTS_SHEET)?;
    for (col, name) in columns.iter().enumerate() {
        results.write_string(0, col as u16, name.as_str())?;
    }
    for (i, record) in records.iter().enumerate() {
        let row = (i + 1) as u32;
        for (col, name) in columns.iter().enumerate() {
            if let Some(value) = record.get(name) {
                write_cell(results, row, col as u16, value)?;
            }
        }
    }

    let metadata = workbook.add_worksheet();
    metadata.set_name(METADATA_SHEET)?;
    metadata.write_string(0, 0, format!("Results for: {question}"))?;

    workbook.save(path)?;
    tracing::debug!(path = %path.display(), rows = records.len(), "Workbook saved");
    Ok(())
}

fn write_cell(sheet: &mut Worksheet, row: u32, col: u16, value: &Value) -> Result<(), ExportError> {
    match value {
        Value::Null => {}
        Value::Bool(b) => {
            sheet.write_boolean(row, col, *b)?;
        }
        Value::Number(n) => match n.as_f64() {
            Some(f) => {
                sheet.write_number(row, col, f)?;
            }
            None => {
                sheet.write_string(row, col, n.to_string())?;
            }
        },
        Value::String(s) => {
            sheet.write_string(row, col, s.as_str())?;
        }
        other => {
            sheet.write_string(row, col, other.to_string())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{open_workbook, Data, Reader, Xlsx};
    use serde_json::json;

    #[test]
    fn test_export_path_per_request_and_shared() {
        let id = RequestId::new();
        let mut settings = ExportSettings {
            dir: "out".into(),
            ..Default::default()
        };
        assert_eq!(
            export_path(&settings, id),
            PathBuf::from(format!("out/results-{id}.xlsx"))
        );

        settings.per_request = false;
        assert_eq!(export_path(&settings, id), PathBuf::from("out/results.xlsx"));
    }

    #[test]
    fn test_write_workbook_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("results.xlsx");
        let columns = vec!["Drug name".to_string(), "Score".to_string()];
        let records: Vec<Record> = vec![
            [
                ("Drug name".to_string(), json!("Isoniazid")),
                ("Score".to_string(), json!(0.9)),
            ]
            .into_iter()
            .collect(),
            [
                ("Drug name".to_string(), json!("Rifampicin")),
                ("Score".to_string(), Value::Null),
            ]
            .into_iter()
            .collect(),
        ];

        write_workbook(&path, &columns, &records, "Drugs for tuberculosis").unwrap();

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        assert_eq!(workbook.sheet_names(), vec![RESULTS_SHEET, METADATA_SHEET]);

        let results = workbook.worksheet_range(RESULTS_SHEET).unwrap();
        assert_eq!(results.get_value((0, 0)), Some(&Data::String("Drug name".into())));
        assert_eq!(results.get_value((0, 1)), Some(&Data::String("Score".into())));
        assert_eq!(results.get_value((1, 0)), Some(&Data::String("Isoniazid".into())));
        assert_eq!(results.get_value((1, 1)), Some(&Data::Float(0.9)));
        assert_eq!(results.get_value((2, 0)), Some(&Data::String("Rifampicin".into())));
        assert!(matches!(results.get_value((2, 1)), None | Some(Data::Empty)));

        let metadata = workbook.worksheet_range(METADATA_SHEET).unwrap();
        assert_eq!(
            metadata.get_value((0, 0)),
            Some(&Data::String("Results for: Drugs for tuberculosis".into()))
        );
    }

    #[test]
    fn test_write_workbook_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.xlsx");
        std::fs::write(&path, b"stale").unwrap();

        write_workbook(&path, &["A".to_string()], &[], "Q").unwrap();
        assert_eq!(&std::fs::read(&path).unwrap()[..2], b"PK");
    }
}

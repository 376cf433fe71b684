//! CSV and spreadsheet loading

use calamine::{Data, Reader};
use std::path::Path;

use super::dataset::{CellValue, TabularDataset};
use crate::error::{Error, Result};
use crate::types::FileType;

/// Loads tabular files into datasets
pub struct TabularLoader;

impl TabularLoader {
    /// Load `path` as a dataset named `filename`; the type comes from the filename's extension
    pub fn load(filename: &str, path: &Path) -> Result<TabularDataset> {
        let dataset = match FileType::from_filename(filename)? {
            FileType::Csv => Self::load_csv(filename, path)?,
            FileType::Xlsx | FileType::Xls => Self::load_spreadsheet(filename, path)?,
            FileType::Pdf => {
                return Err(Error::UnsupportedFormat(format!(
                    "{} is not a tabular file",
                    filename
                )))
            }
        };

        let (rows, cols) = dataset.shape();
        tracing::info!("Loaded {}: {} rows x {} columns", filename, rows, cols);
        Ok(dataset)
    }

    /// Parse CSV with a required header row
    fn load_csv(filename: &str, path: &Path) -> Result<TabularDataset> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(|e| Error::parse(filename, e.to_string()))?;

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| Error::parse(filename, e.to_string()))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err(Error::parse(filename, "no columns to parse from file"));
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| Error::parse(filename, e.to_string()))?;
            // Skip fully blank lines
            if record.iter().all(|f| f.is_empty()) {
                continue;
            }
            rows.push(record.iter().map(CellValue::from_raw).collect());
        }

        TabularDataset::from_raw(filename, headers, rows)
    }

    /// Parse the first worksheet; its first row is the header
    fn load_spreadsheet(filename: &str, path: &Path) -> Result<TabularDataset> {
        let mut workbook = calamine::open_workbook_auto(path)
            .map_err(|e| Error::parse(filename, e.to_string()))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| Error::parse(filename, "workbook has no worksheets"))?
            .map_err(|e| Error::parse(filename, e.to_string()))?;

        let mut rows = range.rows();
        let headers: Vec<String> = match rows.next() {
            Some(header) => header.iter().map(|c| cell_to_header(c)).collect(),
            None => return Err(Error::parse(filename, "no columns to parse from file")),
        };

        let body = rows
            .filter(|row| !row.iter().all(|c| matches!(c, Data::Empty)))
            .map(|row| row.iter().map(cell_to_value).collect())
            .collect();

        TabularDataset::from_raw(filename, headers, body)
    }
}

fn cell_to_header(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        other => other.to_string().trim().to_string(),
    }
}

fn cell_to_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Null,
        Data::String(s) => CellValue::from_raw(s),
        Data::Float(f) => CellValue::Float(*f),
        Data::Int(i) => CellValue::Int(*i),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(CellValue::DateTime)
            .unwrap_or_else(|| CellValue::Float(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tabular::ColumnType;
    use std::io::Write;

    fn write_temp(suffix: &str, content: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_csv() {
        let file = write_temp(".csv", b"product,price,stock\nPen,1.25,40\nBook,12.5,\nLamp,30,3\n");
        let ds = TabularLoader::load("inventory.csv", file.path()).unwrap();

        assert_eq!(ds.filename(), "inventory.csv");
        assert_eq!(ds.shape(), (3, 3));
        assert_eq!(ds.column_names(), vec!["product", "price", "stock"]);
        assert_eq!(ds.columns()[1].dtype, ColumnType::Float64);
        assert_eq!(ds.columns()[2].dtype, ColumnType::Float64);
    }

    #[test]
    fn test_header_only_csv_has_no_rows() {
        let file = write_temp(".csv", b"a,b\n");
        let ds = TabularLoader::load("empty.csv", file.path()).unwrap();
        assert_eq!(ds.shape(), (0, 2));
    }

    #[test]
    fn test_empty_csv_is_parse_error() {
        let file = write_temp(".csv", b"");
        let err = TabularLoader::load("blank.csv", file.path()).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_ragged_csv_is_parse_error() {
        let file = write_temp(".csv", b"a,b\n1,2,3\n");
        let err = TabularLoader::load("ragged.csv", file.path()).unwrap_err();
        assert!(err.to_string().contains("ragged.csv"));
    }

    #[test]
    fn test_corrupt_spreadsheet_is_parse_error() {
        let file = write_temp(".xlsx", b"definitely not a zip archive");
        let err = TabularLoader::load("book.xlsx", file.path()).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_rejects_non_tabular_extensions() {
        let file = write_temp(".txt", b"a,b\n1,2\n");
        assert!(matches!(
            TabularLoader::load("notes.txt", file.path()),
            Err(Error::UnsupportedFormat(_))
        ));
        assert!(matches!(
            TabularLoader::load("notes.pdf", file.path()),
            Err(Error::UnsupportedFormat(_))
        ));
    }
}

//! In-memory tabular datasets with dataframe-style column typing

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::error::{Error, Result};

/// Rows shown in the descriptor preview
const PREVIEW_ROWS: usize = 10;

/// Strings read as missing values
const NULL_MARKERS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "NULL", "null", "None", "<NA>", "#N/A",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Inferred column type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Int64,
    Float64,
    Bool,
    Datetime64,
    Object,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Int64 => "int64",
            Self::Float64 => "float64",
            Self::Bool => "bool",
            Self::Datetime64 => "datetime64",
            Self::Object => "object",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int64 | Self::Float64)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
    Text(String),
}

impl CellValue {
    /// Build a cell from raw delimited text, mapping missing-value markers to `Null`
    pub fn from_raw(raw: &str) -> Self {
        if NULL_MARKERS.contains(&raw.trim()) {
            Self::Null
        } else {
            Self::Text(raw.to_string())
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) if !f.is_nan() => Some(*f),
            _ => None,
        }
    }

    fn to_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 => {
                Some(*f as i64)
            }
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn to_float(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn to_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Text(s) => match s.trim() {
                "true" | "True" | "TRUE" => Some(true),
                "false" | "False" | "FALSE" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    fn to_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Self::DateTime(dt) => Some(*dt),
            Self::Text(s) => parse_datetime(s.trim()),
            _ => None,
        }
    }

    fn to_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Convert to the representation of `dtype`; callers check compatibility first
    fn coerce(self, dtype: ColumnType) -> Self {
        if self.is_null() {
            return self;
        }
        let coerced = match dtype {
            ColumnType::Int64 => self.to_int().map(Self::Int),
            ColumnType::Float64 => self.to_float().map(Self::Float),
            ColumnType::Bool => self.to_bool().map(Self::Bool),
            ColumnType::Datetime64 => self.to_datetime().map(Self::DateTime),
            ColumnType::Object => Some(Self::Text(self.to_text())),
        };
        coerced.unwrap_or(Self::Null)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 => {
                write!(f, "{:.1}", v)
            }
            Self::Float(v) => write!(f, "{}", v),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::DateTime(dt) if dt.time() == NaiveTime::MIN => {
                write!(f, "{}", dt.format("%Y-%m-%d"))
            }
            Self::DateTime(dt) if dt.nanosecond() == 0 => {
                write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S"))
            }
            Self::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S%.f")),
            Self::Text(s) => f.write_str(s),
        }
    }
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

/// Infer a column type from its cells, dataframe style.
///
/// Integers with gaps widen to float64; booleans with gaps fall back to object;
/// an all-missing column is float64.
pub fn infer_column_type<'a, I>(cells: I) -> ColumnType
where
    I: IntoIterator<Item = &'a CellValue>,
{
    let cells: Vec<&CellValue> = cells.into_iter().collect();
    let has_nulls = cells.iter().any(|c| c.is_null());
    let values: Vec<&CellValue> = cells.into_iter().filter(|c| !c.is_null()).collect();

    if values.is_empty() {
        return ColumnType::Float64;
    }
    if values.iter().all(|c| c.to_int().is_some()) {
        return if has_nulls {
            ColumnType::Float64
        } else {
            ColumnType::Int64
        };
    }
    if values.iter().all(|c| c.to_float().is_some()) {
        return ColumnType::Float64;
    }
    if values.iter().all(|c| c.to_bool().is_some()) {
        return if has_nulls {
            ColumnType::Object
        } else {
            ColumnType::Bool
        };
    }
    if values.iter().all(|c| c.to_datetime().is_some()) {
        return ColumnType::Datetime64;
    }
    ColumnType::Object
}

/// Column name and type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub dtype: ColumnType,
}

/// Per-column profile
#[derive(Debug, Clone, Serialize)]
pub struct ColumnProfile {
    pub name: String,
    pub dtype: ColumnType,
    /// Distinct non-null values
    pub distinct: usize,
    /// Missing values
    pub nulls: usize,
    /// Random non-null values, at most the requested sample size
    pub sample: Vec<String>,
}

/// Summary statistics for a numeric column
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct NumericSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
}

/// A table parsed from a CSV or spreadsheet upload
#[derive(Debug, Clone)]
pub struct TabularDataset {
    filename: String,
    columns: Vec<Column>,
    rows: Vec<Vec<CellValue>>,
}

impl TabularDataset {
    /// Build a dataset from header names and raw rows, inferring column types.
    ///
    /// Rows shorter than the header are padded with nulls; longer rows are an error.
    pub fn from_raw(
        filename: impl Into<String>,
        headers: Vec<String>,
        raw_rows: Vec<Vec<CellValue>>,
    ) -> Result<Self> {
        let filename = filename.into();
        if headers.is_empty() {
            return Err(Error::parse(&filename, "no columns to parse from file"));
        }

        let width = headers.len();
        let mut rows = Vec::with_capacity(raw_rows.len());
        for (i, mut row) in raw_rows.into_iter().enumerate() {
            if row.len() > width {
                return Err(Error::parse(
                    &filename,
                    format!(
                        "expected {} fields in data row {}, saw {}",
                        width,
                        i + 1,
                        row.len()
                    ),
                ));
            }
            row.resize(width, CellValue::Null);
            rows.push(row);
        }

        let names = dedupe_headers(headers);
        let mut columns = Vec::with_capacity(width);
        for (idx, name) in names.into_iter().enumerate() {
            let dtype = infer_column_type(rows.iter().map(|r| &r[idx]));
            columns.push(Column { name, dtype });
        }

        for row in rows.iter_mut() {
            for (cell, column) in row.iter_mut().zip(&columns) {
                let raw = std::mem::replace(cell, CellValue::Null);
                *cell = raw.coerce(column.dtype);
            }
        }

        Ok(Self {
            filename,
            columns,
            rows,
        })
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// `(rows, columns)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Column name to type name
    pub fn dtypes(&self) -> BTreeMap<String, String> {
        self.columns
            .iter()
            .map(|c| (c.name.clone(), c.dtype.to_string()))
            .collect()
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    fn column_cells(&self, idx: usize) -> impl Iterator<Item = &CellValue> {
        self.rows.iter().map(move |r| &r[idx])
    }

    /// Profile a column; `None` for an unknown column
    pub fn column_profile<R: Rng + ?Sized>(
        &self,
        name: &str,
        sample_size: usize,
        rng: &mut R,
    ) -> Option<ColumnProfile> {
        let idx = self.column_index(name)?;
        let values: Vec<&CellValue> = self.column_cells(idx).filter(|c| !c.is_null()).collect();
        let nulls = self.rows.len() - values.len();
        let distinct = values
            .iter()
            .map(|c| c.to_string())
            .collect::<HashSet<_>>()
            .len();

        // choose_multiple clamps to the number of available values
        let sample = values
            .choose_multiple(rng, sample_size)
            .map(|c| c.to_string())
            .collect();

        Some(ColumnProfile {
            name: name.to_string(),
            dtype: self.columns[idx].dtype,
            distinct,
            nulls,
            sample,
        })
    }

    /// Min, max, mean and median of a numeric column
    pub fn numeric_summary(&self, name: &str) -> Option<NumericSummary> {
        let idx = self.column_index(name)?;
        if !self.columns[idx].dtype.is_numeric() {
            return None;
        }

        let mut values: Vec<f64> = self.column_cells(idx).filter_map(|c| c.as_f64()).collect();
        if values.is_empty() {
            return None;
        }
        values.sort_by(|a, b| a.total_cmp(b));

        let n = values.len();
        let mean = values.iter().sum::<f64>() / n as f64;
        let median = if n % 2 == 1 {
            values[n / 2]
        } else {
            (values[n / 2 - 1] + values[n / 2]) / 2.0
        };

        Some(NumericSummary {
            min: values[0],
            max: values[n - 1],
            mean,
            median,
        })
    }

    /// Summaries for every numeric column that has values
    pub fn numeric_summaries(&self) -> BTreeMap<String, NumericSummary> {
        self.columns
            .iter()
            .filter_map(|c| self.numeric_summary(&c.name).map(|s| (c.name.clone(), s)))
            .collect()
    }

    /// Serialize the full dataset as CSV with a header row
    pub fn to_csv(&self) -> Result<String> {
        self.write_csv(self.rows.len())
    }

    fn write_csv(&self, limit: usize) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(self.columns.iter().map(|c| c.name.as_str()))
            .map_err(|e| Error::internal(format!("CSV encoding of {} failed: {}", self.filename, e)))?;

        for row in self.rows.iter().take(limit) {
            writer
                .write_record(row.iter().map(|c| c.to_string()))
                .map_err(|e| {
                    Error::internal(format!("CSV encoding of {} failed: {}", self.filename, e))
                })?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| Error::internal(format!("CSV encoding of {} failed: {}", self.filename, e)))?;
        String::from_utf8(bytes).map_err(|e| Error::internal(e.to_string()))
    }

    /// Text standing in for this dataset in the retrieval index
    pub fn describe(&self) -> Result<String> {
        let (rows, cols) = self.shape();
        let types = serde_json::to_string(&self.dtypes())?;
        let stats = serde_json::to_string(&self.numeric_summaries())?;
        let preview = self.write_csv(PREVIEW_ROWS)?;

        Ok(format!(
            "This is a tabular data file named {name}. Use data analysis techniques to query its contents.\n\
             Filename: {name}\n\
             Total rows: {rows}\n\
             Total columns: {cols}\n\
             Column names: {columns}\n\
             Column types: {types}\n\
             Statistics: {stats}\n\
             \n\
             Preview:\n\
             {preview}",
            name = self.filename,
            rows = rows,
            cols = cols,
            columns = self.column_names().join(", "),
            types = types,
            stats = stats,
            preview = preview,
        ))
    }
}

/// Fill blank header names and suffix repeats (`a`, `a.1`, `a.2`)
fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::with_capacity(headers.len());

    for (i, header) in headers.into_iter().enumerate() {
        let base = if header.trim().is_empty() {
            format!("Unnamed: {}", i)
        } else {
            header
        };

        let mut name = base.clone();
        let mut n = 1;
        while seen.contains(&name) {
            name = format!("{}.{}", base, n);
            n += 1;
        }
        seen.insert(name.clone());
        names.push(name);
    }

    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn raw(rows: &[&[&str]]) -> Vec<Vec<CellValue>> {
        rows.iter()
            .map(|r| r.iter().map(|c| CellValue::from_raw(c)).collect())
            .collect()
    }

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn grades() -> TabularDataset {
        TabularDataset::from_raw(
            "grades.csv",
            headers(&["student", "score", "passed", "submitted", "weight"]),
            raw(&[
                &["Ana", "91", "true", "2024-03-01", "1.5"],
                &["Ben", "78", "false", "2024-03-02", ""],
                &["Caro", "85", "True", "2024-03-03", "2"],
            ]),
        )
        .unwrap()
    }

    #[test]
    fn test_type_inference() {
        let ds = grades();
        let types: Vec<ColumnType> = ds.columns().iter().map(|c| c.dtype).collect();
        assert_eq!(
            types,
            vec![
                ColumnType::Object,
                ColumnType::Int64,
                ColumnType::Bool,
                ColumnType::Datetime64,
                ColumnType::Float64,
            ]
        );
        assert_eq!(ds.shape(), (3, 5));
    }

    #[test]
    fn test_int_with_missing_widens_to_float() {
        let cells = vec![CellValue::Int(1), CellValue::Null, CellValue::Int(3)];
        assert_eq!(infer_column_type(&cells), ColumnType::Float64);
        assert_eq!(infer_column_type(&[CellValue::Null]), ColumnType::Float64);
    }

    #[test]
    fn test_short_rows_padded_long_rows_rejected() {
        let ds = TabularDataset::from_raw("a.csv", headers(&["x", "y"]), raw(&[&["1"]])).unwrap();
        assert_eq!(ds.rows()[0][1], CellValue::Null);

        let err = TabularDataset::from_raw("b.csv", headers(&["x"]), raw(&[&["1", "2"]])).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
        assert!(err.to_string().contains("b.csv"));
    }

    #[test]
    fn test_duplicate_and_blank_headers() {
        let names = dedupe_headers(headers(&["a", "a", "", "a"]));
        assert_eq!(names, vec!["a", "a.1", "Unnamed: 2", "a.2"]);
    }

    #[test]
    fn test_numeric_summary() {
        let ds = grades();
        let summary = ds.numeric_summary("score").unwrap();
        assert_eq!(summary.min, 78.0);
        assert_eq!(summary.max, 91.0);
        assert_eq!(summary.median, 85.0);
        assert!((summary.mean - 84.666).abs() < 0.01);

        assert!(ds.numeric_summary("student").is_none());
        assert!(ds.numeric_summary("missing").is_none());
    }

    #[test]
    fn test_profile_sample_is_clamped() {
        let ds = grades();
        let mut rng = StdRng::seed_from_u64(42);

        let profile = ds.column_profile("weight", 5, &mut rng).unwrap();
        assert_eq!(profile.nulls, 1);
        assert_eq!(profile.distinct, 2);
        assert_eq!(profile.sample.len(), 2);

        let profile = ds.column_profile("student", 2, &mut rng).unwrap();
        assert_eq!(profile.sample.len(), 2);
        let unique: HashSet<_> = profile.sample.iter().collect();
        assert_eq!(unique.len(), 2);
    }

    #[test]
    fn test_csv_output_formatting() {
        let ds = grades();
        let csv = ds.to_csv().unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("student,score,passed,submitted,weight"));
        assert_eq!(lines.next(), Some("Ana,91,True,2024-03-01,1.5"));
        assert_eq!(lines.next(), Some("Ben,78,False,2024-03-02,"));
        assert_eq!(lines.next(), Some("Caro,85,True,2024-03-03,2.0"));
    }

    #[test]
    fn test_describe_mentions_structure() {
        let text = grades().describe().unwrap();
        assert!(text.starts_with("This is a tabular data file named grades.csv."));
        assert!(text.contains("Total rows: 3"));
        assert!(text.contains("\"score\":\"int64\""));
        assert!(text.contains("Preview:"));
    }
}

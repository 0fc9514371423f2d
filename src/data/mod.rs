//! Tabular dataset representation and CSV I/O.
//!
//! Every stage of the pipeline exchanges data as [`TabularDataset`]: an
//! ordered list of column names plus rows of optional numeric values.
//! Missing values are `None`; on disk they appear as an empty field or the
//! literal token `na`.

mod schema;

pub use schema::{expected_columns, FEATURE_COLUMNS, TARGET_COLUMN};

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

/// Missing-value token accepted on read. Writes emit an empty field.
const NA_TOKEN: &str = "na";

/// Errors produced by tabular data handling.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("row {row} has {got} values but the dataset has {expected} columns")]
    RaggedRow { row: usize, got: usize, expected: usize },

    #[error("non-numeric value '{value}' in column '{column}'")]
    NonNumeric { column: String, value: String },

    #[error("column sets differ; cannot concatenate")]
    ColumnMismatch,

    #[error("CSV file {path} has no header row")]
    MissingHeader { path: PathBuf },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// An ordered sequence of records over a fixed set of named numeric columns.
#[derive(Debug, Clone, PartialEq)]
pub struct TabularDataset {
    columns: Vec<String>,
    rows: Vec<Vec<Option<f64>>>,
}

impl TabularDataset {
    /// Builds a dataset, rejecting rows whose width differs from the header.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<f64>>>) -> Result<Self, DataError> {
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(DataError::RaggedRow {
                    row: i,
                    got: row.len(),
                    expected: columns.len(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Option<f64>>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All values of one column, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r[idx]).collect())
    }

    /// Column names as a set, for schema comparison.
    pub fn column_set(&self) -> BTreeSet<&str> {
        self.columns.iter().map(String::as_str).collect()
    }

    /// New dataset containing the rows at `indices`, in the given order.
    pub fn take(&self, indices: &[usize]) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    /// Splits off the named column, returning the remaining dataset and the
    /// removed values. Returns `None` when the column does not exist.
    pub fn drop_column(&self, name: &str) -> Option<(Self, Vec<Option<f64>>)> {
        let idx = self.column_index(name)?;
        let columns = self
            .columns
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != idx)
            .map(|(_, c)| c.clone())
            .collect();
        let mut removed = Vec::with_capacity(self.rows.len());
        let rows = self
            .rows
            .iter()
            .map(|row| {
                removed.push(row[idx]);
                row.iter()
                    .enumerate()
                    .filter(|(i, _)| *i != idx)
                    .map(|(_, v)| *v)
                    .collect()
            })
            .collect();
        Some((Self { columns, rows }, removed))
    }

    /// Row-wise concatenation of two datasets with identical columns.
    pub fn concat(&self, other: &Self) -> Result<Self, DataError> {
        if self.columns != other.columns {
            return Err(DataError::ColumnMismatch);
        }
        let mut rows = self.rows.clone();
        rows.extend(other.rows.iter().cloned());
        Ok(Self {
            columns: self.columns.clone(),
            rows,
        })
    }

    /// Converts document-store records into a dataset.
    ///
    /// The store-assigned `_id` field is stripped; the literal token `na`
    /// becomes a missing value. Columns are the sorted union of keys so the
    /// result is deterministic regardless of record order.
    pub fn from_documents(
        docs: &[serde_json::Map<String, Value>],
    ) -> Result<Self, DataError> {
        let mut keys: BTreeSet<String> = BTreeSet::new();
        for doc in docs {
            for key in doc.keys() {
                if key != "_id" {
                    keys.insert(key.clone());
                }
            }
        }
        let columns: Vec<String> = keys.into_iter().collect();

        let mut rows = Vec::with_capacity(docs.len());
        for doc in docs {
            let mut row = Vec::with_capacity(columns.len());
            for col in &columns {
                row.push(match doc.get(col) {
                    None | Some(Value::Null) => None,
                    Some(value) => parse_value(col, value)?,
                });
            }
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }

    /// Reads a headered CSV file.
    pub fn read_csv(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)?;

        let headers = reader.headers()?;
        if headers.is_empty() {
            return Err(DataError::MissingHeader {
                path: path.to_path_buf(),
            });
        }
        let columns: Vec<String> = headers.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = record?;
            if record.len() != columns.len() {
                return Err(DataError::RaggedRow {
                    row: i,
                    got: record.len(),
                    expected: columns.len(),
                });
            }
            let mut row = Vec::with_capacity(columns.len());
            for (col, field) in columns.iter().zip(record.iter()) {
                row.push(parse_field(col, field)?);
            }
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }

    /// Writes the dataset as a headered CSV file, creating parent
    /// directories as needed. Missing values are written as empty fields.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<(), DataError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut writer = csv::WriterBuilder::new().from_path(path)?;
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            let fields: Vec<String> = row
                .iter()
                .map(|v| match v {
                    Some(x) => format_number(*x),
                    None => String::new(),
                })
                .collect();
            writer.write_record(&fields)?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn parse_value(column: &str, value: &Value) -> Result<Option<f64>, DataError> {
    match value {
        Value::Number(n) => Ok(n.as_f64()),
        Value::String(s) => parse_field(column, s),
        other => Err(DataError::NonNumeric {
            column: column.to_string(),
            value: other.to_string(),
        }),
    }
}

fn parse_field(column: &str, field: &str) -> Result<Option<f64>, DataError> {
    let trimmed = field.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(NA_TOKEN) {
        return Ok(None);
    }
    trimmed
        .parse::<f64>()
        .map(Some)
        .map_err(|_| DataError::NonNumeric {
            column: column.to_string(),
            value: field.to_string(),
        })
}

/// Integers print without a trailing `.0` so round-tripped files stay close
/// to the raw exports.
fn format_number(x: f64) -> String {
    if x.fract() == 0.0 && x.abs() < 1e15 {
        format!("{}", x as i64)
    } else {
        format!("{x}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TabularDataset {
        TabularDataset::new(
            vec!["a".into(), "b".into(), "Result".into()],
            vec![
                vec![Some(1.0), Some(2.0), Some(1.0)],
                vec![None, Some(4.0), Some(-1.0)],
            ],
        )
        .expect("valid dataset")
    }

    #[test]
    fn test_new_rejects_ragged_rows() {
        let err = TabularDataset::new(
            vec!["a".into(), "b".into()],
            vec![vec![Some(1.0)]],
        )
        .unwrap_err();
        assert!(matches!(err, DataError::RaggedRow { row: 0, .. }));
    }

    #[test]
    fn test_drop_column() {
        let (features, target) = sample().drop_column("Result").expect("column exists");
        assert_eq!(features.columns(), ["a", "b"]);
        assert_eq!(target, vec![Some(1.0), Some(-1.0)]);
        assert!(sample().drop_column("missing").is_none());
    }

    #[test]
    fn test_concat_requires_same_columns() {
        let ds = sample();
        let joined = ds.concat(&ds).expect("same columns");
        assert_eq!(joined.len(), 4);

        let other = TabularDataset::new(vec!["x".into()], vec![]).unwrap();
        assert!(matches!(ds.concat(&other), Err(DataError::ColumnMismatch)));
    }

    #[test]
    fn test_from_documents_strips_id_and_normalizes_na() {
        let docs: Vec<serde_json::Map<String, Value>> = vec![
            serde_json::from_str(r#"{"_id": "abc", "a": 1, "b": "na"}"#).unwrap(),
            serde_json::from_str(r#"{"a": "2.5", "b": 3}"#).unwrap(),
        ];
        let ds = TabularDataset::from_documents(&docs).expect("valid documents");
        assert_eq!(ds.columns(), ["a", "b"]);
        assert_eq!(ds.rows()[0], vec![Some(1.0), None]);
        assert_eq!(ds.rows()[1], vec![Some(2.5), Some(3.0)]);
    }

    #[test]
    fn test_csv_round_trip_preserves_columns_and_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("data.csv");
        let ds = sample();
        ds.write_csv(&path).expect("write");
        let back = TabularDataset::read_csv(&path).expect("read");
        assert_eq!(back, ds);
    }

    #[test]
    fn test_read_csv_accepts_na_token() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("data.csv");
        std::fs::write(&path, "a,b\n1,na\nNA,2\n").expect("write");
        let ds = TabularDataset::read_csv(&path).expect("read");
        assert_eq!(ds.rows()[0], vec![Some(1.0), None]);
        assert_eq!(ds.rows()[1], vec![None, Some(2.0)]);
    }
}

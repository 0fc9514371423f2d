//! Document-store boundary.
//!
//! The pipeline only needs "fetch all records of collection X in database Y"
//! and "insert many records". [`DocumentStore`] is that seam; the shipped
//! [`JsonlStore`] keeps each collection as a newline-delimited JSON file
//! under a root directory, which is enough for local runs and tests.

use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

/// Errors from the document-store boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("collection '{collection}' in database '{database}' is unreachable: {source}")]
    Unreachable {
        database: String,
        collection: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed record at line {line} of {path}: {source}")]
    MalformedRecord {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A record as stored: field name to scalar value.
pub type Document = serde_json::Map<String, Value>;

/// Query-by-collection capability over some document database.
pub trait DocumentStore {
    /// Fetches every record of a collection. Order is unspecified.
    fn fetch_all(&self, database: &str, collection: &str) -> Result<Vec<Document>, StoreError>;

    /// Appends records to a collection, returning the number written.
    fn insert_many(
        &self,
        database: &str,
        collection: &str,
        records: &[Document],
    ) -> Result<usize, StoreError>;
}

/// File-backed store: one `<root>/<database>/<collection>.jsonl` per
/// collection.
#[derive(Debug, Clone)]
pub struct JsonlStore {
    root: PathBuf,
}

impl JsonlStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn collection_path(&self, database: &str, collection: &str) -> PathBuf {
        self.root.join(database).join(format!("{collection}.jsonl"))
    }
}

impl DocumentStore for JsonlStore {
    fn fetch_all(&self, database: &str, collection: &str) -> Result<Vec<Document>, StoreError> {
        let path = self.collection_path(database, collection);
        let file = fs::File::open(&path).map_err(|source| StoreError::Unreachable {
            database: database.to_string(),
            collection: collection.to_string(),
            source,
        })?;

        let mut documents = Vec::new();
        for (i, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let value: Value =
                serde_json::from_str(&line).map_err(|source| StoreError::MalformedRecord {
                    path: path.clone(),
                    line: i + 1,
                    source,
                })?;
            match value {
                Value::Object(map) => documents.push(map),
                _ => return Err(StoreError::NotAnObject),
            }
        }
        Ok(documents)
    }

    fn insert_many(
        &self,
        database: &str,
        collection: &str,
        records: &[Document],
    ) -> Result<usize, StoreError> {
        let path = self.collection_path(database, collection);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        for record in records {
            serde_json::to_writer(&mut file, &Value::Object(record.clone()))
                .map_err(|e| StoreError::Io(e.into()))?;
            file.write_all(b"\n")?;
        }
        Ok(records.len())
    }
}

/// Reads a headered CSV file into documents, one per row. Used by the `seed`
/// command to load raw exports into the store.
pub fn documents_from_csv(path: impl AsRef<Path>) -> Result<Vec<Document>, StoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path.as_ref())
        .map_err(|e| StoreError::Io(std::io::Error::other(e.to_string())))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| StoreError::Io(std::io::Error::other(e.to_string())))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut documents = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| StoreError::Io(std::io::Error::other(e.to_string())))?;
        let mut doc = Document::new();
        for (header, field) in headers.iter().zip(record.iter()) {
            let value = match field.trim().parse::<f64>() {
                Ok(n) => serde_json::Number::from_f64(n)
                    .map(Value::Number)
                    .unwrap_or_else(|| Value::String(field.to_string())),
                Err(_) => Value::String(field.to_string()),
            };
            doc.insert(header.clone(), value);
        }
        documents.push(doc);
    }
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_then_fetch_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonlStore::new(dir.path());

        let docs: Vec<Document> = vec![
            serde_json::from_str(r#"{"a": 1, "b": 2}"#).unwrap(),
            serde_json::from_str(r#"{"a": 3, "b": 4}"#).unwrap(),
        ];
        let written = store
            .insert_many("phishing", "sites", &docs)
            .expect("insert");
        assert_eq!(written, 2);

        let fetched = store.fetch_all("phishing", "sites").expect("fetch");
        assert_eq!(fetched, docs);
    }

    #[test]
    fn test_fetch_missing_collection_is_unreachable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonlStore::new(dir.path());
        let err = store.fetch_all("phishing", "absent").unwrap_err();
        assert!(matches!(err, StoreError::Unreachable { .. }));
    }

    #[test]
    fn test_documents_from_csv() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("raw.csv");
        std::fs::write(&path, "a,b\n1,na\n2,3\n").expect("write");
        let docs = documents_from_csv(&path).expect("parse");
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0]["a"], serde_json::json!(1.0));
        assert_eq!(docs[0]["b"], serde_json::json!("na"));
    }
}

//! Error types for pipeline stages and the prediction service.
//!
//! Each stage owns one error enum; `PipelineError` wraps them so a full run
//! surfaces a single error type carrying the failing stage and the original
//! cause. The under/overfitting variants of `TrainingError` are business
//! gates, not defects.

use std::path::PathBuf;

use thiserror::Error;

use crate::data::DataError;
use crate::ml::ModelError;
use crate::storage::StorageError;
use crate::store::StoreError;

/// Errors that can occur during data ingestion.
#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("document store error: {0}")]
    Store(#[from] StoreError),

    #[error("collection '{collection}' in database '{database}' returned no records")]
    EmptyCollection { database: String, collection: String },

    #[error("split ratio {0} must be strictly between 0 and 1")]
    InvalidSplitRatio(f64),

    #[error("dataset with {rows} rows is too small to split at ratio {ratio}")]
    SplitTooSmall { rows: usize, ratio: f64 },

    #[error("tabular data error: {0}")]
    Data(#[from] DataError),
}

/// Errors that can occur during data validation.
///
/// A schema mismatch is not an error: it clears `is_validated` on the
/// artifact and the pipeline continues. Only I/O and report persistence
/// failures abort the stage.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("tabular data error: {0}")]
    Data(#[from] DataError),

    #[error("failed to write drift report to {path}: {source}")]
    Report {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur during data transformation.
#[derive(Debug, Error)]
pub enum TransformationError {
    #[error("upstream validation did not pass; refusing to transform unvalidated data")]
    NotValidated,

    #[error("target column '{0}' not found in dataset")]
    MissingTargetColumn(String),

    #[error("target value {0} is outside the {{-1, 0, 1}} label domain")]
    InvalidLabel(f64),

    #[error("missing target value at row {0}")]
    MissingLabel(usize),

    #[error("preprocessing error: {0}")]
    Model(#[from] ModelError),

    #[error("tabular data error: {0}")]
    Data(#[from] DataError),

    #[error("object persistence error: {0}")]
    Storage(#[from] StorageError),
}

/// Errors that can occur during model training.
#[derive(Debug, Error)]
pub enum TrainingError {
    /// Train f1 at or below the configured accuracy floor.
    #[error("underfitting: train f1 {actual:.4} is at or below the expected accuracy {expected:.4}")]
    Underfit { actual: f64, expected: f64 },

    /// Train/test f1 gap above the configured ceiling.
    #[error("overfitting: train/test f1 gap {gap:.4} exceeds threshold {threshold:.4}")]
    Overfit { gap: f64, threshold: f64 },

    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("transformed matrix has no rows")]
    EmptyMatrix,

    #[error("object persistence error: {0}")]
    Storage(#[from] StorageError),
}

/// Errors that can occur during model evaluation.
#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("validation artifact has no valid data paths")]
    MissingValidData,

    #[error("tabular data error: {0}")]
    Data(#[from] DataError),

    #[error("object persistence error: {0}")]
    Storage(#[from] StorageError),

    #[error("prediction over the evaluation population failed: {0}")]
    Predict(#[from] ModelError),

    #[error("evaluation population error: {0}")]
    Population(#[from] TransformationError),

    #[error("failed to write evaluation report to {path}: {source}")]
    Report {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while publishing an accepted model.
#[derive(Debug, Error)]
pub enum PushError {
    #[error("failed to copy model from {src} to {dst}: {source}")]
    Copy {
        src: PathBuf,
        dst: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to update version manifest: {0}")]
    Manifest(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur in the prediction service.
#[derive(Debug, Error)]
pub enum ServingError {
    /// Neither the stable serving path nor any archived version exists.
    #[error("no serving model found under {0}")]
    ModelNotFound(PathBuf),

    #[error("failed to load bundled predictor: {0}")]
    Load(#[from] StorageError),

    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("tabular data error: {0}")]
    Data(#[from] DataError),
}

/// Uniform pipeline error: one variant per stage, each carrying the
/// stage-local cause.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("data ingestion failed: {0}")]
    Ingestion(#[from] IngestionError),

    #[error("data validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("data transformation failed: {0}")]
    Transformation(#[from] TransformationError),

    #[error("model training failed: {0}")]
    Training(#[from] TrainingError),

    #[error("model evaluation failed: {0}")]
    Evaluation(#[from] EvaluationError),

    #[error("model push failed: {0}")]
    Push(#[from] PushError),
}

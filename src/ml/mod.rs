//! ML primitives shared by the training stages and the serving adapter.
//!
//! - [`metrics`]: binary classification metrics (precision/recall/f1).
//! - [`preprocessing`]: the fit-once [`Preprocessor`](preprocessing::Preprocessor).
//! - [`predictor`]: the persisted [`BundledPredictor`](predictor::BundledPredictor).

pub mod metrics;
pub mod predictor;
pub mod preprocessing;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from preprocessing and model fitting.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("feature column '{0}' not found in input")]
    MissingFeature(String),

    #[error("cannot fit on an empty dataset")]
    EmptyDataset,

    #[error("classifier fit failed: {0}")]
    Fit(String),
}

/// A transformed feature matrix with its schema attached.
///
/// Replaces the implicit "last column is the label" convention: the feature
/// order and the label name travel with the array, and labels are already
/// remapped to `{0, 1}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledMatrix {
    pub feature_names: Vec<String>,
    pub label_name: String,
    pub features: Array2<f64>,
    pub labels: Vec<u32>,
}

impl LabeledMatrix {
    pub fn n_rows(&self) -> usize {
        self.features.nrows()
    }
}

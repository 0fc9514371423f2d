//! The bundled predictor: fitted preprocessor + fitted classifier, persisted
//! as one blob.
//!
//! This is the only entity that crosses from training into serving. The
//! trainer creates it, the pusher copies it, and the prediction service
//! loads a read-only copy per request.

use std::path::Path;

use linfa::prelude::*;
use linfa::Dataset;
use linfa_trees::DecisionTree;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::preprocessing::Preprocessor;
use super::ModelError;
use crate::data::TabularDataset;
use crate::storage::{self, StorageError};

/// Depth cap for the CART tree; deep enough for the 30 ternary features
/// without memorizing row noise.
const MAX_TREE_DEPTH: usize = 16;

/// Fits the one fixed classifier family used by the pipeline.
pub fn fit_classifier(
    features: Array2<f64>,
    labels: &[u32],
) -> Result<DecisionTree<f64, usize>, ModelError> {
    if features.nrows() == 0 {
        return Err(ModelError::EmptyDataset);
    }
    let targets: Array1<usize> = labels.iter().map(|&l| l as usize).collect();
    let dataset = Dataset::new(features, targets);
    DecisionTree::params()
        .max_depth(Some(MAX_TREE_DEPTH))
        .fit(&dataset)
        .map_err(|e| ModelError::Fit(e.to_string()))
}

/// Runs a fitted tree over an already-preprocessed matrix.
pub fn predict_matrix(model: &DecisionTree<f64, usize>, features: &Array2<f64>) -> Vec<u32> {
    model.predict(features).iter().map(|&l| l as u32).collect()
}

/// A fitted preprocessing transform paired with a fitted classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundledPredictor {
    preprocessor: Preprocessor,
    model: DecisionTree<f64, usize>,
}

impl BundledPredictor {
    pub fn new(preprocessor: Preprocessor, model: DecisionTree<f64, usize>) -> Self {
        Self {
            preprocessor,
            model,
        }
    }

    pub fn preprocessor(&self) -> &Preprocessor {
        &self.preprocessor
    }

    /// Preprocesses raw tabular rows and returns one `{0, 1}` label per row,
    /// in input order.
    pub fn predict(&self, dataset: &TabularDataset) -> Result<Vec<u32>, ModelError> {
        let features = self.preprocessor.transform(dataset)?;
        Ok(predict_matrix(&self.model, &features))
    }

    /// Persists the bundle as one opaque blob.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StorageError> {
        storage::save_json(path, self)
    }

    /// Loads a bundle previously written by [`BundledPredictor::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        storage::load_json(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two well-separated clusters keyed by the `signal` column.
    fn labeled_dataset(n: usize) -> (TabularDataset, Vec<u32>) {
        let mut rows = Vec::with_capacity(n);
        let mut labels = Vec::with_capacity(n);
        for i in 0..n {
            let label = (i % 2) as u32;
            let signal = if label == 1 { 10.0 } else { -10.0 };
            rows.push(vec![Some(signal), Some(i as f64)]);
            labels.push(label);
        }
        let ds = TabularDataset::new(vec!["signal".into(), "noise".into()], rows).unwrap();
        (ds, labels)
    }

    fn fitted_bundle() -> (BundledPredictor, TabularDataset, Vec<u32>) {
        let (ds, labels) = labeled_dataset(40);
        let names: Vec<String> = vec!["signal".into(), "noise".into()];
        let prep = Preprocessor::fit(&ds, &names).expect("fit preprocessor");
        let x = prep.transform(&ds).expect("transform");
        let model = fit_classifier(x, &labels).expect("fit classifier");
        (BundledPredictor::new(prep, model), ds, labels)
    }

    #[test]
    fn test_predict_separable_data() {
        let (bundle, ds, labels) = fitted_bundle();
        let preds = bundle.predict(&ds).expect("predict");
        assert_eq!(preds, labels);
    }

    #[test]
    fn test_save_load_round_trip_predicts_identically() {
        let (bundle, ds, _) = fitted_bundle();
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("model.json");

        bundle.save(&path).expect("save");
        let restored = BundledPredictor::load(&path).expect("load");

        assert_eq!(
            restored.predict(&ds).expect("predict restored"),
            bundle.predict(&ds).expect("predict original")
        );
    }

    #[test]
    fn test_fit_classifier_rejects_empty_matrix() {
        let err = fit_classifier(Array2::zeros((0, 2)), &[]).unwrap_err();
        assert!(matches!(err, ModelError::EmptyDataset));
    }
}

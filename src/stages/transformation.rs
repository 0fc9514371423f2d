//! Data transformation: target remap, fit-once preprocessing, persisted
//! matrices.

use tracing::info;

use crate::config::RunConfig;
use crate::data::{TabularDataset, TARGET_COLUMN};
use crate::error::TransformationError;
use crate::ml::preprocessing::Preprocessor;
use crate::ml::LabeledMatrix;
use crate::pipeline::artifacts::{TransformationArtifact, ValidationArtifact};
use crate::storage;

/// Remaps a raw label into the strict `{0, 1}` space: `-1` becomes `0`,
/// `1` stays `1`, and an already-remapped `0` passes through.
pub fn remap_label(value: f64) -> Result<u32, TransformationError> {
    if value == -1.0 || value == 0.0 {
        Ok(0)
    } else if value == 1.0 {
        Ok(1)
    } else {
        Err(TransformationError::InvalidLabel(value))
    }
}

/// Splits a validated dataset into features and remapped labels.
pub fn split_features_and_labels(
    dataset: &TabularDataset,
) -> Result<(TabularDataset, Vec<u32>), TransformationError> {
    let (features, raw_labels) = dataset
        .drop_column(TARGET_COLUMN)
        .ok_or_else(|| TransformationError::MissingTargetColumn(TARGET_COLUMN.to_string()))?;

    let mut labels = Vec::with_capacity(raw_labels.len());
    for (row, raw) in raw_labels.into_iter().enumerate() {
        let raw = raw.ok_or(TransformationError::MissingLabel(row))?;
        labels.push(remap_label(raw)?);
    }
    Ok((features, labels))
}

/// Fits the preprocessor on the validated train split and applies it,
/// unchanged, to both splits.
pub struct DataTransformation<'a> {
    run: &'a RunConfig,
}

impl<'a> DataTransformation<'a> {
    pub fn new(run: &'a RunConfig) -> Self {
        Self { run }
    }

    pub fn run(
        &self,
        validation: &ValidationArtifact,
    ) -> Result<TransformationArtifact, TransformationError> {
        if !validation.is_validated {
            return Err(TransformationError::NotValidated);
        }
        let (train_path, test_path) = match (
            &validation.valid_train_path,
            &validation.valid_test_path,
        ) {
            (Some(train), Some(test)) => (train, test),
            _ => return Err(TransformationError::NotValidated),
        };

        let train = TabularDataset::read_csv(train_path)?;
        let test = TabularDataset::read_csv(test_path)?;

        let (train_features, train_labels) = split_features_and_labels(&train)?;
        let (test_features, test_labels) = split_features_and_labels(&test)?;

        // Fit on train only; the same fitted parameters transform the test
        // split.
        let feature_names = train_features.columns().to_vec();
        let preprocessor = Preprocessor::fit(&train_features, &feature_names)?;
        let train_matrix = preprocessor.transform(&train_features)?;
        let test_matrix = preprocessor.transform(&test_features)?;

        storage::save_json(self.run.preprocessor_path(), &preprocessor)?;
        storage::save_json(
            self.run.transformed_train_path(),
            &LabeledMatrix {
                feature_names: feature_names.clone(),
                label_name: TARGET_COLUMN.to_string(),
                features: train_matrix,
                labels: train_labels,
            },
        )?;
        storage::save_json(
            self.run.transformed_test_path(),
            &LabeledMatrix {
                feature_names,
                label_name: TARGET_COLUMN.to_string(),
                features: test_matrix,
                labels: test_labels,
            },
        )?;

        info!(
            preprocessor = %self.run.preprocessor_path().display(),
            "data transformation complete"
        );
        Ok(TransformationArtifact {
            preprocessor_path: self.run.preprocessor_path(),
            transformed_train_path: self.run.transformed_train_path(),
            transformed_test_path: self.run.transformed_test_path(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::metrics::classification_metrics;

    #[test]
    fn test_remap_label_domain() {
        assert_eq!(remap_label(-1.0).unwrap(), 0);
        assert_eq!(remap_label(0.0).unwrap(), 0);
        assert_eq!(remap_label(1.0).unwrap(), 1);
        assert!(matches!(
            remap_label(3.0),
            Err(TransformationError::InvalidLabel(_))
        ));
    }

    #[test]
    fn test_remap_is_consistent_with_direct_comparison() {
        // Metrics over remapped labels must match an independent comparison
        // of the raw labels.
        let raw_true = [-1.0, 1.0, 1.0, -1.0, 1.0];
        let raw_pred = [-1.0, 1.0, -1.0, 1.0, 1.0];

        let y_true: Vec<u32> = raw_true.iter().map(|&v| remap_label(v).unwrap()).collect();
        let y_pred: Vec<u32> = raw_pred.iter().map(|&v| remap_label(v).unwrap()).collect();
        let metrics = classification_metrics(&y_true, &y_pred);

        let tp = raw_true
            .iter()
            .zip(raw_pred.iter())
            .filter(|(t, p)| **t == 1.0 && **p == 1.0)
            .count() as f64;
        let predicted_pos = raw_pred.iter().filter(|p| **p == 1.0).count() as f64;
        let actual_pos = raw_true.iter().filter(|t| **t == 1.0).count() as f64;

        assert!((metrics.precision - tp / predicted_pos).abs() < 1e-12);
        assert!((metrics.recall - tp / actual_pos).abs() < 1e-12);
    }

    #[test]
    fn test_run_refuses_unvalidated_artifact() {
        let run = RunConfig::new(
            std::path::Path::new("artifacts"),
            chrono::Utc::now(),
        );
        let validation = ValidationArtifact {
            is_validated: false,
            valid_train_path: None,
            valid_test_path: None,
            invalid_train_path: None,
            invalid_test_path: None,
            drift_report_path: None,
        };
        let err = DataTransformation::new(&run).run(&validation).unwrap_err();
        assert!(matches!(err, TransformationError::NotValidated));
    }

    #[test]
    fn test_missing_target_column() {
        let ds = TabularDataset::new(vec!["a".into()], vec![vec![Some(1.0)]]).unwrap();
        let err = split_features_and_labels(&ds).unwrap_err();
        assert!(matches!(err, TransformationError::MissingTargetColumn(_)));
    }
}

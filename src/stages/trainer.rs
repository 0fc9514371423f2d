//! Model trainer: one fitting attempt, two business gates, one persisted
//! bundle.

use tracing::info;

use crate::config::{PipelineConfig, RunConfig};
use crate::error::TrainingError;
use crate::ml::metrics::{classification_metrics, ClassificationMetrics};
use crate::ml::predictor::{fit_classifier, predict_matrix, BundledPredictor};
use crate::ml::preprocessing::Preprocessor;
use crate::ml::LabeledMatrix;
use crate::pipeline::artifacts::{TrainerArtifact, TransformationArtifact};
use crate::storage;

/// Underfit gate: train f1 must clear the expected accuracy floor.
fn check_underfit(train: &ClassificationMetrics, expected: f64) -> Result<(), TrainingError> {
    if train.f1_score <= expected {
        return Err(TrainingError::Underfit {
            actual: train.f1_score,
            expected,
        });
    }
    Ok(())
}

/// Overfit gate: the train/test f1 gap must stay under the threshold.
fn check_overfit(
    train: &ClassificationMetrics,
    test: &ClassificationMetrics,
    threshold: f64,
) -> Result<(), TrainingError> {
    let gap = (train.f1_score - test.f1_score).abs();
    if gap > threshold {
        return Err(TrainingError::Overfit { gap, threshold });
    }
    Ok(())
}

/// Fits the classifier on the transformed train matrix and bundles it with
/// the already-fitted preprocessor.
pub struct ModelTrainer<'a> {
    config: &'a PipelineConfig,
    run: &'a RunConfig,
}

impl<'a> ModelTrainer<'a> {
    pub fn new(config: &'a PipelineConfig, run: &'a RunConfig) -> Self {
        Self { config, run }
    }

    pub fn run(
        &self,
        transformation: &TransformationArtifact,
    ) -> Result<TrainerArtifact, TrainingError> {
        let train: LabeledMatrix = storage::load_json(&transformation.transformed_train_path)?;
        let test: LabeledMatrix = storage::load_json(&transformation.transformed_test_path)?;
        if train.n_rows() == 0 || test.n_rows() == 0 {
            return Err(TrainingError::EmptyMatrix);
        }

        let model = fit_classifier(train.features.clone(), &train.labels)?;

        let train_pred = predict_matrix(&model, &train.features);
        let train_metrics = classification_metrics(&train.labels, &train_pred);
        check_underfit(&train_metrics, self.config.expected_accuracy)?;

        let test_pred = predict_matrix(&model, &test.features);
        let test_metrics = classification_metrics(&test.labels, &test_pred);
        check_overfit(&train_metrics, &test_metrics, self.config.overfit_threshold)?;

        let preprocessor: Preprocessor =
            storage::load_json(&transformation.preprocessor_path)?;
        let bundle = BundledPredictor::new(preprocessor, model);
        bundle.save(self.run.trained_model_path())?;

        info!(
            train_f1 = train_metrics.f1_score,
            test_f1 = test_metrics.f1_score,
            model = %self.run.trained_model_path().display(),
            "model training complete"
        );
        Ok(TrainerArtifact {
            trained_model_path: self.run.trained_model_path(),
            train_metrics,
            test_metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(f1: f64) -> ClassificationMetrics {
        ClassificationMetrics {
            precision: f1,
            recall: f1,
            f1_score: f1,
        }
    }

    #[test]
    fn test_underfit_gate_triggers_at_or_below_floor() {
        let err = check_underfit(&metrics(0.5), 0.6).unwrap_err();
        assert!(matches!(
            err,
            TrainingError::Underfit { actual, expected }
                if actual == 0.5 && expected == 0.6
        ));
        // Equality also fails: the floor is exclusive.
        assert!(check_underfit(&metrics(0.6), 0.6).is_err());
        assert!(check_underfit(&metrics(0.7), 0.6).is_ok());
    }

    #[test]
    fn test_overfit_gate_triggers_above_gap() {
        let err = check_overfit(&metrics(0.9), &metrics(0.5), 0.2).unwrap_err();
        assert!(matches!(
            err,
            TrainingError::Overfit { gap, threshold }
                if (gap - 0.4).abs() < 1e-12 && threshold == 0.2
        ));
        assert!(check_overfit(&metrics(0.9), &metrics(0.8), 0.2).is_ok());
        // The gap is symmetric.
        assert!(check_overfit(&metrics(0.5), &metrics(0.9), 0.2).is_err());
    }
}

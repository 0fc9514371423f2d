//! Model evaluation: metrics over the full validated population, a persisted
//! report, and the acceptance gate.

use std::fs;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{PipelineConfig, RunConfig};
use crate::data::TabularDataset;
use crate::error::EvaluationError;
use crate::ml::metrics::classification_metrics;
use crate::ml::predictor::BundledPredictor;
use crate::pipeline::artifacts::{EvaluationArtifact, TrainerArtifact, ValidationArtifact};
use crate::stages::transformation::split_features_and_labels;

/// Persisted evaluation report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub f1_score: f64,
    pub precision: f64,
    pub recall: f64,
    pub population_rows: usize,
    pub acceptance_threshold: f64,
    pub is_accepted: bool,
}

/// Re-scores the trained bundle over the combined valid train+test rows.
pub struct ModelEvaluation<'a> {
    config: &'a PipelineConfig,
    run: &'a RunConfig,
}

impl<'a> ModelEvaluation<'a> {
    pub fn new(config: &'a PipelineConfig, run: &'a RunConfig) -> Self {
        Self { config, run }
    }

    pub fn run(
        &self,
        validation: &ValidationArtifact,
        trainer: &TrainerArtifact,
    ) -> Result<EvaluationArtifact, EvaluationError> {
        let (train_path, test_path) = match (
            &validation.valid_train_path,
            &validation.valid_test_path,
        ) {
            (Some(train), Some(test)) => (train, test),
            _ => return Err(EvaluationError::MissingValidData),
        };

        let train = TabularDataset::read_csv(train_path)?;
        let test = TabularDataset::read_csv(test_path)?;
        let population = train.concat(&test)?;

        // Same target remap as the transformation stage.
        let (features, y_true) = split_features_and_labels(&population)?;

        // The bundle's own embedded preprocessing runs here; the raw CSV
        // rows go in untouched.
        let bundle = BundledPredictor::load(&trainer.trained_model_path)?;
        let y_pred = bundle.predict(&features)?;
        let metrics = classification_metrics(&y_true, &y_pred);

        let is_accepted = metrics.f1_score >= self.config.acceptance_threshold;
        let report = EvaluationReport {
            f1_score: metrics.f1_score,
            precision: metrics.precision,
            recall: metrics.recall,
            population_rows: population.len(),
            acceptance_threshold: self.config.acceptance_threshold,
            is_accepted,
        };

        let report_path = self.run.evaluation_report_path();
        if let Some(parent) = report_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(&report).map_err(|source| EvaluationError::Report {
            path: report_path.clone(),
            source,
        })?;
        fs::write(&report_path, yaml)?;

        info!(
            f1 = metrics.f1_score,
            is_accepted,
            report = %report_path.display(),
            "model evaluation complete"
        );
        Ok(EvaluationArtifact {
            is_accepted,
            improved_score: metrics.f1_score,
            report_path,
            trained_model_path: trainer.trained_model_path.clone(),
        })
    }
}

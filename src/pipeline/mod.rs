//! Training pipeline orchestration.
//!
//! Six stages run strictly in sequence; each stage's artifact is a hard
//! barrier before the next starts. Any stage failure aborts the whole run
//! as a [`PipelineError`]; there is no retry and no partial resume.
//!
//! Concurrent runs sharing one artifact root are distinguished only by the
//! run timestamp; sub-second collisions are a known limitation.

pub mod artifacts;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{PipelineConfig, RunConfig};
use crate::error::PipelineError;
use crate::stages::{
    DataIngestion, DataTransformation, DataValidation, ModelEvaluation, ModelPusher, ModelTrainer,
};
use crate::store::DocumentStore;
use artifacts::{
    EvaluationArtifact, IngestionArtifact, PusherArtifact, TrainerArtifact,
    TransformationArtifact, ValidationArtifact,
};

/// Everything one completed run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRunReport {
    pub run_id: String,
    pub ingestion: IngestionArtifact,
    pub validation: ValidationArtifact,
    pub transformation: TransformationArtifact,
    pub trainer: TrainerArtifact,
    pub evaluation: EvaluationArtifact,
    /// `None` when the evaluation gate rejected the model.
    pub pusher: Option<PusherArtifact>,
    pub finished_at: DateTime<Utc>,
}

/// Owns the configuration and the document store for one or more runs.
pub struct TrainingPipeline<S: DocumentStore> {
    config: PipelineConfig,
    store: S,
}

impl<S: DocumentStore> TrainingPipeline<S> {
    pub fn new(config: PipelineConfig, store: S) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs the full pipeline under a fresh timestamped run directory.
    pub fn run(&self) -> Result<PipelineRunReport, PipelineError> {
        let run = RunConfig::new(&self.config.artifact_root, Utc::now());
        info!(run_id = %run.run_id(), "starting training pipeline");

        let ingestion = DataIngestion::new(&self.store, &self.config, &run).run()?;
        let validation = DataValidation::new(&self.config, &run).run(&ingestion)?;
        let transformation = DataTransformation::new(&run).run(&validation)?;
        let trainer = ModelTrainer::new(&self.config, &run).run(&transformation)?;
        let evaluation =
            ModelEvaluation::new(&self.config, &run).run(&validation, &trainer)?;

        let pusher = if evaluation.is_accepted {
            Some(ModelPusher::new(&self.config, &run).run(&evaluation)?)
        } else {
            warn!(
                score = evaluation.improved_score,
                threshold = self.config.acceptance_threshold,
                "evaluation gate rejected the model; skipping push"
            );
            None
        };

        info!(run_id = %run.run_id(), "training pipeline complete");
        Ok(PipelineRunReport {
            run_id: run.run_id().to_string(),
            ingestion,
            validation,
            transformation,
            trainer,
            evaluation,
            pusher,
            finished_at: Utc::now(),
        })
    }
}

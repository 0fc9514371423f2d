//! Pipeline configuration.
//!
//! [`PipelineConfig`] holds every tunable explicitly; there is no ambient
//! environment-derived state. [`RunConfig`] pins one run to a timestamped
//! directory and derives every stage's file paths from it; it is pure data
//! and lives for exactly one pipeline run.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp layout used for run directory names. Collisions below one
/// second are an accepted limitation.
const RUN_ID_FORMAT: &str = "%m_%d_%Y_%H_%M_%S";

const FEATURE_STORE_FILE: &str = "feature_store/phishing.csv";
const INGESTED_TRAIN_FILE: &str = "ingested/train.csv";
const INGESTED_TEST_FILE: &str = "ingested/test.csv";
const VALID_TRAIN_FILE: &str = "validated/train.csv";
const VALID_TEST_FILE: &str = "validated/test.csv";
const INVALID_TRAIN_FILE: &str = "invalid/train.csv";
const INVALID_TEST_FILE: &str = "invalid/test.csv";
const DRIFT_REPORT_FILE: &str = "drift_report.yaml";
const PREPROCESSOR_FILE: &str = "preprocessor.json";
const TRANSFORMED_TRAIN_FILE: &str = "transformed/train.json";
const TRANSFORMED_TEST_FILE: &str = "transformed/test.json";
const TRAINED_MODEL_FILE: &str = "model.json";
const EVALUATION_REPORT_FILE: &str = "report.yaml";

/// Stable file name of the serving model inside `latest/` and each archive
/// version directory.
pub const SERVING_MODEL_FILE: &str = "model.json";

/// All tunables for one training pipeline, passed in explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Root under which each run creates its timestamped artifact tree.
    pub artifact_root: PathBuf,
    /// Root of the stable serving location and the versioned archive.
    pub serving_root: PathBuf,
    /// Document-store database to ingest from.
    pub database: String,
    /// Document-store collection to ingest from.
    pub collection: String,
    /// Fraction of rows assigned to the test split.
    pub split_ratio: f64,
    /// KS-test significance level below which a feature counts as drifted.
    pub drift_significance: f64,
    /// Train-f1 floor; at or below it the trainer aborts as underfit.
    pub expected_accuracy: f64,
    /// Maximum allowed |train f1 - test f1| gap before aborting as overfit.
    pub overfit_threshold: f64,
    /// Evaluation-f1 floor for accepting the model. The default of 0.0
    /// accepts every model, matching the original advisory-only evaluation.
    pub acceptance_threshold: f64,
    /// Seed for the randomized split. Splits are only reproducible across
    /// runs when this is set.
    pub seed: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            artifact_root: PathBuf::from("artifacts"),
            serving_root: PathBuf::from("saved_models"),
            database: "phishing".to_string(),
            collection: "websites".to_string(),
            split_ratio: 0.2,
            drift_significance: 0.05,
            expected_accuracy: 0.6,
            overfit_threshold: 0.05,
            acceptance_threshold: 0.0,
            seed: None,
        }
    }
}

impl PipelineConfig {
    /// Stable serving path for the most recently pushed model.
    pub fn latest_model_path(&self) -> PathBuf {
        self.serving_root.join("latest").join(SERVING_MODEL_FILE)
    }

    /// Root of the versioned model archive.
    pub fn archive_root(&self) -> PathBuf {
        self.serving_root.join("archive")
    }
}

/// Per-run artifact directory and derived stage paths. Immutable once
/// created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    run_id: String,
    run_dir: PathBuf,
}

impl RunConfig {
    /// Derives the run directory from a wall-clock timestamp.
    pub fn new(artifact_root: &Path, started_at: DateTime<Utc>) -> Self {
        let run_id = started_at.format(RUN_ID_FORMAT).to_string();
        let run_dir = artifact_root.join(&run_id);
        Self { run_id, run_dir }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    fn stage_path(&self, stage: &str, file: &str) -> PathBuf {
        self.run_dir.join(stage).join(file)
    }

    pub fn feature_store_path(&self) -> PathBuf {
        self.stage_path("data_ingestion", FEATURE_STORE_FILE)
    }

    pub fn ingested_train_path(&self) -> PathBuf {
        self.stage_path("data_ingestion", INGESTED_TRAIN_FILE)
    }

    pub fn ingested_test_path(&self) -> PathBuf {
        self.stage_path("data_ingestion", INGESTED_TEST_FILE)
    }

    pub fn valid_train_path(&self) -> PathBuf {
        self.stage_path("data_validation", VALID_TRAIN_FILE)
    }

    pub fn valid_test_path(&self) -> PathBuf {
        self.stage_path("data_validation", VALID_TEST_FILE)
    }

    pub fn invalid_train_path(&self) -> PathBuf {
        self.stage_path("data_validation", INVALID_TRAIN_FILE)
    }

    pub fn invalid_test_path(&self) -> PathBuf {
        self.stage_path("data_validation", INVALID_TEST_FILE)
    }

    pub fn drift_report_path(&self) -> PathBuf {
        self.stage_path("data_validation", DRIFT_REPORT_FILE)
    }

    pub fn preprocessor_path(&self) -> PathBuf {
        self.stage_path("data_transformation", PREPROCESSOR_FILE)
    }

    pub fn transformed_train_path(&self) -> PathBuf {
        self.stage_path("data_transformation", TRANSFORMED_TRAIN_FILE)
    }

    pub fn transformed_test_path(&self) -> PathBuf {
        self.stage_path("data_transformation", TRANSFORMED_TEST_FILE)
    }

    pub fn trained_model_path(&self) -> PathBuf {
        self.stage_path("model_trainer", TRAINED_MODEL_FILE)
    }

    pub fn evaluation_report_path(&self) -> PathBuf {
        self.stage_path("model_evaluation", EVALUATION_REPORT_FILE)
    }
}

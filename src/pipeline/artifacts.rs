//! Artifact records handed between pipeline stages.
//!
//! An artifact is a set of file-path references, never the data itself. Each
//! stage creates exactly one, the next stage consumes it read-only, and no
//! artifact outlives the run directory.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::ml::metrics::ClassificationMetrics;

/// Output of data ingestion: the two split files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionArtifact {
    pub train_path: PathBuf,
    pub test_path: PathBuf,
}

/// Output of data validation.
///
/// Only the side of the schema gate that was taken is populated: `valid_*`
/// and the drift report on a pass, `invalid_*` on a failure. Downstream
/// stages must check `is_validated` rather than assume validity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationArtifact {
    pub is_validated: bool,
    pub valid_train_path: Option<PathBuf>,
    pub valid_test_path: Option<PathBuf>,
    pub invalid_train_path: Option<PathBuf>,
    pub invalid_test_path: Option<PathBuf>,
    pub drift_report_path: Option<PathBuf>,
}

/// Output of data transformation: the fitted preprocessor and both
/// transformed matrices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformationArtifact {
    pub preprocessor_path: PathBuf,
    pub transformed_train_path: PathBuf,
    pub transformed_test_path: PathBuf,
}

/// Output of model training: the persisted bundle plus the metrics that
/// passed the gates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerArtifact {
    pub trained_model_path: PathBuf,
    pub train_metrics: ClassificationMetrics,
    pub test_metrics: ClassificationMetrics,
}

/// Output of model evaluation over the combined train+test population.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationArtifact {
    pub is_accepted: bool,
    pub improved_score: f64,
    pub report_path: PathBuf,
    pub trained_model_path: PathBuf,
}

/// Output of the model pusher: the versioned archive copy and the stable
/// serving copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PusherArtifact {
    pub saved_model_path: PathBuf,
    pub served_model_path: PathBuf,
}

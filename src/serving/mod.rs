//! Prediction service: resolves the latest published model and applies it
//! to new tabular input.
//!
//! The bundle is reloaded from storage on every call, so requests share no
//! mutable state, at the cost of a load per prediction.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{PipelineConfig, SERVING_MODEL_FILE};
use crate::data::TabularDataset;
use crate::error::ServingError;
use crate::ml::predictor::BundledPredictor;
use crate::storage::registry::VersionManifest;
use crate::store::Document;

/// Outcome counts for a batch prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionSummary {
    pub total: usize,
    pub phishing: usize,
    pub legitimate: usize,
}

/// Serves predictions from the last pushed bundled predictor.
pub struct PredictionService {
    serving_root: PathBuf,
    latest_model_path: PathBuf,
    archive_root: PathBuf,
}

impl PredictionService {
    pub fn new(serving_root: impl Into<PathBuf>) -> Self {
        let serving_root = serving_root.into();
        let latest_model_path = serving_root.join("latest").join(SERVING_MODEL_FILE);
        let archive_root = serving_root.join("archive");
        Self {
            serving_root,
            latest_model_path,
            archive_root,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.serving_root.clone())
    }

    /// Path of the model to serve: the stable `latest/` copy, else the most
    /// recent manifest entry, else the lexicographically-last archive
    /// directory (for archives written by older tooling).
    pub fn resolve_latest_model_path(&self) -> Result<PathBuf, ServingError> {
        if self.latest_model_path.exists() {
            return Ok(self.latest_model_path.clone());
        }

        if let Ok(manifest) = VersionManifest::load(&self.archive_root) {
            if let Some(version) = manifest.latest() {
                let path = self.archive_root.join(&version.path);
                if path.exists() {
                    return Ok(path);
                }
            }
        }

        if let Some(path) = last_archive_dir_model(&self.archive_root) {
            return Ok(path);
        }

        Err(ServingError::ModelNotFound(self.serving_root.clone()))
    }

    /// Labels every input row, in input order. The bundle is loaded fresh
    /// for this call.
    pub fn predict(&self, rows: &TabularDataset) -> Result<Vec<u32>, ServingError> {
        let model_path = self.resolve_latest_model_path()?;
        let bundle = BundledPredictor::load(&model_path)?;
        info!(model = %model_path.display(), rows = rows.len(), "serving prediction");
        Ok(bundle.predict(rows)?)
    }

    /// Labels a single JSON record of named features.
    pub fn predict_record(&self, record: &Document) -> Result<u32, ServingError> {
        let dataset = TabularDataset::from_documents(std::slice::from_ref(record))?;
        let labels = self.predict(&dataset)?;
        Ok(labels[0])
    }

    /// Reads a CSV of feature rows, writes a copy with an appended
    /// `prediction` column, and returns the outcome counts.
    pub fn predict_csv(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<PredictionSummary, ServingError> {
        let dataset = TabularDataset::read_csv(input.as_ref())?;
        let labels = self.predict(&dataset)?;

        let mut columns: Vec<String> = dataset.columns().to_vec();
        columns.push("prediction".to_string());
        let rows = dataset
            .rows()
            .iter()
            .zip(labels.iter())
            .map(|(row, &label)| {
                let mut row = row.clone();
                row.push(Some(f64::from(label)));
                row
            })
            .collect();
        TabularDataset::new(columns, rows)?.write_csv(output.as_ref())?;

        let phishing = labels.iter().filter(|&&l| l == 1).count();
        Ok(PredictionSummary {
            total: labels.len(),
            phishing,
            legitimate: labels.len() - phishing,
        })
    }
}

fn last_archive_dir_model(archive_root: &Path) -> Option<PathBuf> {
    let entries = fs::read_dir(archive_root).ok()?;
    let mut dirs: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();
    dirs.into_iter()
        .rev()
        .map(|dir| dir.join(SERVING_MODEL_FILE))
        .find(|path| path.exists())
}

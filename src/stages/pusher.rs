//! Model pusher: copies the accepted bundle to the stable serving location
//! and the versioned archive, then records the version in the manifest.

use std::fs;
use std::path::Path;

use chrono::Utc;
use tracing::info;

use crate::config::{PipelineConfig, RunConfig, SERVING_MODEL_FILE};
use crate::error::PushError;
use crate::pipeline::artifacts::{EvaluationArtifact, PusherArtifact};
use crate::storage::registry::{ModelVersion, VersionManifest};

/// Publishes the trained bundle. Each destination is copied
/// atomic-or-fail; a failure on the second copy propagates instead of
/// reporting partial success.
pub struct ModelPusher<'a> {
    config: &'a PipelineConfig,
    run: &'a RunConfig,
}

impl<'a> ModelPusher<'a> {
    pub fn new(config: &'a PipelineConfig, run: &'a RunConfig) -> Self {
        Self { config, run }
    }

    pub fn run(&self, evaluation: &EvaluationArtifact) -> Result<PusherArtifact, PushError> {
        let source = &evaluation.trained_model_path;

        let served_model_path = self.config.latest_model_path();
        copy_model(source, &served_model_path)?;

        let archive_root = self.config.archive_root();
        let saved_model_path = archive_root
            .join(self.run.run_id())
            .join(SERVING_MODEL_FILE);
        copy_model(source, &saved_model_path)?;

        VersionManifest::push(
            &archive_root,
            ModelVersion {
                run_id: self.run.run_id().to_string(),
                path: Path::new(self.run.run_id()).join(SERVING_MODEL_FILE),
                pushed_at: Utc::now(),
            },
        )?;

        info!(
            served = %served_model_path.display(),
            archived = %saved_model_path.display(),
            "model push complete"
        );
        Ok(PusherArtifact {
            saved_model_path,
            served_model_path,
        })
    }
}

fn copy_model(src: &Path, dst: &Path) -> Result<(), PushError> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(src, dst).map_err(|source| PushError::Copy {
        src: src.to_path_buf(),
        dst: dst.to_path_buf(),
        source,
    })?;
    Ok(())
}

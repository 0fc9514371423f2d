//! Data ingestion: document store -> feature store -> train/test split.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::info;

use crate::config::{PipelineConfig, RunConfig};
use crate::data::TabularDataset;
use crate::error::IngestionError;
use crate::pipeline::artifacts::IngestionArtifact;
use crate::store::DocumentStore;

/// Pulls raw records into the run's feature store and splits them.
pub struct DataIngestion<'a, S: DocumentStore> {
    store: &'a S,
    config: &'a PipelineConfig,
    run: &'a RunConfig,
}

impl<'a, S: DocumentStore> DataIngestion<'a, S> {
    pub fn new(store: &'a S, config: &'a PipelineConfig, run: &'a RunConfig) -> Self {
        Self { store, config, run }
    }

    /// Fetches every record of the configured collection as a tabular
    /// dataset. The store `_id` field is stripped and the literal `na`
    /// token becomes a missing value.
    pub fn fetch_raw(&self) -> Result<TabularDataset, IngestionError> {
        let documents = self
            .store
            .fetch_all(&self.config.database, &self.config.collection)?;
        if documents.is_empty() {
            return Err(IngestionError::EmptyCollection {
                database: self.config.database.clone(),
                collection: self.config.collection.clone(),
            });
        }
        let dataset = TabularDataset::from_documents(&documents)?;
        info!(
            rows = dataset.len(),
            columns = dataset.columns().len(),
            collection = %self.config.collection,
            "fetched raw records"
        );
        Ok(dataset)
    }

    /// Writes the full dataset to the feature store path. Side effect only;
    /// the dataset is returned unchanged for chaining.
    pub fn persist_feature_store<'d>(
        &self,
        dataset: &'d TabularDataset,
    ) -> Result<&'d TabularDataset, IngestionError> {
        dataset.write_csv(self.run.feature_store_path())?;
        Ok(dataset)
    }

    /// Randomized train/test partition at the configured ratio. Both output
    /// files exist afterwards. Reproducible only when a seed is configured.
    pub fn split(&self, dataset: &TabularDataset) -> Result<(), IngestionError> {
        let ratio = self.config.split_ratio;
        if !(0.0..1.0).contains(&ratio) || ratio == 0.0 {
            return Err(IngestionError::InvalidSplitRatio(ratio));
        }

        let n = dataset.len();
        let test_len = ((n as f64) * ratio).round() as usize;
        if test_len == 0 || test_len == n {
            return Err(IngestionError::SplitTooSmall { rows: n, ratio });
        }

        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng: StdRng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        indices.shuffle(&mut rng);

        let test = dataset.take(&indices[..test_len]);
        let train = dataset.take(&indices[test_len..]);

        train.write_csv(self.run.ingested_train_path())?;
        test.write_csv(self.run.ingested_test_path())?;
        info!(
            train_rows = train.len(),
            test_rows = test.len(),
            ratio,
            "performed train/test split"
        );
        Ok(())
    }

    /// Composes fetch, feature-store persistence and the split. Any failure
    /// aborts the stage.
    pub fn run(&self) -> Result<IngestionArtifact, IngestionError> {
        let dataset = self.fetch_raw()?;
        self.persist_feature_store(&dataset)?;
        self.split(&dataset)?;

        let artifact = IngestionArtifact {
            train_path: self.run.ingested_train_path(),
            test_path: self.run.ingested_test_path(),
        };
        info!(
            train = %artifact.train_path.display(),
            test = %artifact.test_path.display(),
            "data ingestion complete"
        );
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Document, JsonlStore};
    use chrono::{TimeZone, Utc};
    use std::path::Path;

    fn seeded_store(dir: &Path, rows: usize) -> JsonlStore {
        let store = JsonlStore::new(dir);
        let docs: Vec<Document> = (0..rows)
            .map(|i| {
                serde_json::from_str(&format!(r#"{{"a": {i}, "b": {}, "Result": 1}}"#, i * 2))
                    .unwrap()
            })
            .collect();
        store.insert_many("phishing", "websites", &docs).unwrap();
        store
    }

    fn run_config(dir: &Path) -> RunConfig {
        RunConfig::new(dir, Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap())
    }

    #[test]
    fn test_split_partitions_without_overlap() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = seeded_store(dir.path(), 50);
        let config = PipelineConfig {
            seed: Some(7),
            ..PipelineConfig::default()
        };
        let run = run_config(&dir.path().join("artifacts"));
        let ingestion = DataIngestion::new(&store, &config, &run);

        let artifact = ingestion.run().expect("ingestion");
        let train = TabularDataset::read_csv(&artifact.train_path).expect("train");
        let test = TabularDataset::read_csv(&artifact.test_path).expect("test");

        assert_eq!(test.len(), 10); // 0.2 * 50
        assert_eq!(train.len() + test.len(), 50);

        // Rows are unique by the `a` column; no row may appear in both splits.
        let train_keys: std::collections::BTreeSet<i64> = train
            .column("a")
            .unwrap()
            .into_iter()
            .map(|v| v.unwrap() as i64)
            .collect();
        for key in test.column("a").unwrap() {
            assert!(!train_keys.contains(&(key.unwrap() as i64)));
        }
    }

    #[test]
    fn test_split_is_reproducible_with_seed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = seeded_store(dir.path(), 30);
        let config = PipelineConfig {
            seed: Some(42),
            ..PipelineConfig::default()
        };

        let run_a = run_config(&dir.path().join("a"));
        let run_b = run_config(&dir.path().join("b"));
        DataIngestion::new(&store, &config, &run_a).run().unwrap();
        DataIngestion::new(&store, &config, &run_b).run().unwrap();

        let train_a = TabularDataset::read_csv(run_a.ingested_train_path()).unwrap();
        let train_b = TabularDataset::read_csv(run_b.ingested_train_path()).unwrap();
        assert_eq!(train_a, train_b);
    }

    #[test]
    fn test_empty_collection_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonlStore::new(dir.path());
        store.insert_many("phishing", "websites", &[]).unwrap();
        let config = PipelineConfig::default();
        let run = run_config(&dir.path().join("artifacts"));

        let err = DataIngestion::new(&store, &config, &run)
            .run()
            .unwrap_err();
        assert!(matches!(err, IngestionError::EmptyCollection { .. }));
    }

    #[test]
    fn test_invalid_ratio_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = seeded_store(dir.path(), 10);
        let config = PipelineConfig {
            split_ratio: 1.5,
            ..PipelineConfig::default()
        };
        let run = run_config(&dir.path().join("artifacts"));

        let err = DataIngestion::new(&store, &config, &run)
            .run()
            .unwrap_err();
        assert!(matches!(err, IngestionError::InvalidSplitRatio(_)));
    }
}

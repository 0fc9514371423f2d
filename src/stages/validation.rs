//! Data validation: exact schema gate plus train/test drift report.
//!
//! Schema mismatch flags the artifact as not validated and routes copies to
//! the invalid paths; the pipeline itself keeps going and downstream stages
//! decide what to do with the flag. Drift is advisory: it is measured with a
//! two-sample Kolmogorov-Smirnov test per feature, persisted to the report,
//! and never fails the stage on its own.

use std::collections::BTreeMap;
use std::fs;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{PipelineConfig, RunConfig};
use crate::data::{expected_columns, TabularDataset, FEATURE_COLUMNS};
use crate::error::ValidationError;
use crate::pipeline::artifacts::{IngestionArtifact, ValidationArtifact};

/// Drift verdict for one feature.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeatureDrift {
    pub p_value: f64,
    pub drift_detected: bool,
}

/// Per-feature drift results between the train (reference) and test
/// (current) distributions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftReport {
    pub significance: f64,
    pub drifted_features: usize,
    pub features: BTreeMap<String, FeatureDrift>,
}

/// Validates ingested splits against the fixed schema and measures drift.
pub struct DataValidation<'a> {
    config: &'a PipelineConfig,
    run: &'a RunConfig,
}

impl<'a> DataValidation<'a> {
    pub fn new(config: &'a PipelineConfig, run: &'a RunConfig) -> Self {
        Self { config, run }
    }

    /// True iff the dataset's column set exactly matches the expected
    /// feature set plus target: count and names, no partial tolerance.
    pub fn check_schema(dataset: &TabularDataset) -> bool {
        dataset.column_set() == expected_columns()
    }

    /// Runs the KS test for every named feature between the two datasets.
    pub fn detect_drift(
        &self,
        reference: &TabularDataset,
        current: &TabularDataset,
    ) -> DriftReport {
        let significance = self.config.drift_significance;
        let mut features = BTreeMap::new();
        let mut drifted = 0usize;

        for name in FEATURE_COLUMNS {
            let ref_values = present_values(reference, name);
            let cur_values = present_values(current, name);
            let (_, p_value) = ks_2samp(&ref_values, &cur_values);
            let drift_detected = p_value < significance;
            if drift_detected {
                drifted += 1;
                warn!(feature = name, p_value, "distribution drift detected");
            }
            features.insert(
                name.to_string(),
                FeatureDrift {
                    p_value,
                    drift_detected,
                },
            );
        }

        DriftReport {
            significance,
            drifted_features: drifted,
            features,
        }
    }

    /// Loads both splits, applies the schema gate, persists valid or invalid
    /// copies, and writes the drift report on a pass.
    pub fn run(
        &self,
        ingestion: &IngestionArtifact,
    ) -> Result<ValidationArtifact, ValidationError> {
        let train = TabularDataset::read_csv(&ingestion.train_path)?;
        let test = TabularDataset::read_csv(&ingestion.test_path)?;

        let train_ok = Self::check_schema(&train);
        let test_ok = Self::check_schema(&test);
        let is_validated = train_ok && test_ok;

        if !is_validated {
            warn!(
                train_ok,
                test_ok, "schema validation failed; persisting invalid copies"
            );
            train.write_csv(self.run.invalid_train_path())?;
            test.write_csv(self.run.invalid_test_path())?;
            return Ok(ValidationArtifact {
                is_validated: false,
                valid_train_path: None,
                valid_test_path: None,
                invalid_train_path: Some(self.run.invalid_train_path()),
                invalid_test_path: Some(self.run.invalid_test_path()),
                drift_report_path: None,
            });
        }

        train.write_csv(self.run.valid_train_path())?;
        test.write_csv(self.run.valid_test_path())?;

        let report = self.detect_drift(&train, &test);
        let report_path = self.run.drift_report_path();
        if let Some(parent) = report_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(&report).map_err(|source| ValidationError::Report {
            path: report_path.clone(),
            source,
        })?;
        fs::write(&report_path, yaml)?;

        info!(
            drifted = report.drifted_features,
            report = %report_path.display(),
            "data validation passed"
        );
        Ok(ValidationArtifact {
            is_validated: true,
            valid_train_path: Some(self.run.valid_train_path()),
            valid_test_path: Some(self.run.valid_test_path()),
            invalid_train_path: None,
            invalid_test_path: None,
            drift_report_path: Some(report_path),
        })
    }
}

fn present_values(dataset: &TabularDataset, column: &str) -> Vec<f64> {
    dataset
        .column(column)
        .map(|values| values.into_iter().flatten().collect())
        .unwrap_or_default()
}

/// Two-sample Kolmogorov-Smirnov test.
///
/// Returns the supremum distance between the empirical CDFs and the
/// asymptotic two-sided p-value. Empty samples yield no evidence of drift
/// (statistic 0, p-value 1).
pub fn ks_2samp(a: &[f64], b: &[f64]) -> (f64, f64) {
    if a.is_empty() || b.is_empty() {
        return (0.0, 1.0);
    }

    let mut sa = a.to_vec();
    let mut sb = b.to_vec();
    sa.sort_by(|x, y| x.partial_cmp(y).unwrap_or(std::cmp::Ordering::Equal));
    sb.sort_by(|x, y| x.partial_cmp(y).unwrap_or(std::cmp::Ordering::Equal));

    let (na, nb) = (sa.len(), sb.len());
    let (mut ia, mut ib) = (0usize, 0usize);
    let mut statistic = 0.0f64;

    while ia < na && ib < nb {
        let xa = sa[ia];
        let xb = sb[ib];
        let x = xa.min(xb);
        while ia < na && sa[ia] <= x {
            ia += 1;
        }
        while ib < nb && sb[ib] <= x {
            ib += 1;
        }
        let diff = (ia as f64 / na as f64 - ib as f64 / nb as f64).abs();
        if diff > statistic {
            statistic = diff;
        }
    }

    let en = ((na * nb) as f64 / (na + nb) as f64).sqrt();
    let lambda = (en + 0.12 + 0.11 / en) * statistic;
    (statistic, ks_p_value(lambda))
}

/// Asymptotic Kolmogorov distribution tail: Q(lambda) = 2 * sum_{j>=1}
/// (-1)^{j-1} exp(-2 j^2 lambda^2), clamped to [0, 1].
fn ks_p_value(lambda: f64) -> f64 {
    if lambda <= 0.0 {
        return 1.0;
    }
    let mut sum = 0.0f64;
    let mut sign = 1.0f64;
    for j in 1..=100 {
        let term = (-2.0 * (j as f64).powi(2) * lambda * lambda).exp();
        sum += sign * term;
        sign = -sign;
        if term < 1e-12 {
            break;
        }
    }
    (2.0 * sum).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TARGET_COLUMN;

    fn schema_dataset(extra: Option<&str>, skip: Option<&str>) -> TabularDataset {
        let mut columns: Vec<String> = FEATURE_COLUMNS
            .iter()
            .filter(|c| Some(**c) != skip)
            .map(|c| c.to_string())
            .collect();
        columns.push(TARGET_COLUMN.to_string());
        if let Some(col) = extra {
            columns.push(col.to_string());
        }
        let row = vec![Some(1.0); columns.len()];
        TabularDataset::new(columns, vec![row]).unwrap()
    }

    #[test]
    fn test_check_schema_exact_match_only() {
        assert!(DataValidation::check_schema(&schema_dataset(None, None)));
        // An extra key fails.
        assert!(!DataValidation::check_schema(&schema_dataset(
            Some("bonus"),
            None
        )));
        // A missing key fails.
        assert!(!DataValidation::check_schema(&schema_dataset(
            None,
            Some("Favicon")
        )));
    }

    #[test]
    fn test_ks_identical_samples_show_no_drift() {
        let sample: Vec<f64> = (0..200).map(|i| (i % 17) as f64).collect();
        let (statistic, p_value) = ks_2samp(&sample, &sample);
        assert_eq!(statistic, 0.0);
        assert!(p_value > 0.99);
    }

    #[test]
    fn test_ks_disjoint_samples_show_drift() {
        let a: Vec<f64> = (0..100).map(f64::from).collect();
        let b: Vec<f64> = (0..100).map(|i| f64::from(i) + 1000.0).collect();
        let (statistic, p_value) = ks_2samp(&a, &b);
        assert_eq!(statistic, 1.0);
        assert!(p_value < 0.001);
    }

    #[test]
    fn test_ks_empty_sample_is_neutral() {
        let (statistic, p_value) = ks_2samp(&[], &[1.0, 2.0]);
        assert_eq!(statistic, 0.0);
        assert_eq!(p_value, 1.0);
    }
}

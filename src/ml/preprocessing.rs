//! Reusable preprocessing pipeline: median imputation then standard scaling.
//!
//! A [`Preprocessor`] is fit exactly once, on the validated train split, and
//! applied unchanged everywhere else (test split, evaluation population,
//! serving requests). `transform` takes `&self`; there is no way to re-fit
//! through the transform path. Columns are addressed by the names captured at
//! fit time, so input column order is irrelevant.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::ModelError;
use crate::data::TabularDataset;

/// Stddev floor below which a column counts as constant and is left
/// unscaled (scale factor 1).
const STD_FLOOR: f64 = 1e-12;

/// Fitted imputation + scaling parameters, one entry per feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    feature_names: Vec<String>,
    medians: Vec<f64>,
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl Preprocessor {
    /// Fits imputation and scaling parameters on the given columns of a
    /// train dataset.
    pub fn fit(dataset: &TabularDataset, feature_names: &[String]) -> Result<Self, ModelError> {
        if dataset.is_empty() {
            return Err(ModelError::EmptyDataset);
        }

        let mut medians = Vec::with_capacity(feature_names.len());
        let mut means = Vec::with_capacity(feature_names.len());
        let mut stds = Vec::with_capacity(feature_names.len());

        for name in feature_names {
            let column = dataset
                .column(name)
                .ok_or_else(|| ModelError::MissingFeature(name.clone()))?;

            let median = median_of_present(&column);
            let imputed: Vec<f64> = column.iter().map(|v| v.unwrap_or(median)).collect();

            let mean = imputed.iter().sum::<f64>() / imputed.len() as f64;
            let variance = imputed
                .iter()
                .map(|v| (v - mean).powi(2))
                .sum::<f64>()
                / imputed.len() as f64;
            let std = variance.sqrt();

            medians.push(median);
            means.push(mean);
            stds.push(if std < STD_FLOOR { 1.0 } else { std });
        }

        Ok(Self {
            feature_names: feature_names.to_vec(),
            medians,
            means,
            stds,
        })
    }

    /// Feature names in the order the fitted matrix columns use.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Applies imputation and scaling, producing a dense matrix with one
    /// column per fitted feature. Never mutates the fitted parameters.
    pub fn transform(&self, dataset: &TabularDataset) -> Result<Array2<f64>, ModelError> {
        let mut column_indices = Vec::with_capacity(self.feature_names.len());
        for name in &self.feature_names {
            let idx = dataset
                .column_index(name)
                .ok_or_else(|| ModelError::MissingFeature(name.clone()))?;
            column_indices.push(idx);
        }

        let mut matrix = Array2::zeros((dataset.len(), self.feature_names.len()));
        for (r, row) in dataset.rows().iter().enumerate() {
            for (c, &idx) in column_indices.iter().enumerate() {
                let raw = row[idx].unwrap_or(self.medians[c]);
                matrix[[r, c]] = (raw - self.means[c]) / self.stds[c];
            }
        }
        Ok(matrix)
    }
}

fn median_of_present(column: &[Option<f64>]) -> f64 {
    let mut present: Vec<f64> = column.iter().filter_map(|v| *v).collect();
    if present.is_empty() {
        return 0.0;
    }
    present.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = present.len() / 2;
    if present.len() % 2 == 1 {
        present[mid]
    } else {
        (present[mid - 1] + present[mid]) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn train_dataset() -> TabularDataset {
        TabularDataset::new(
            vec!["a".into(), "b".into()],
            vec![
                vec![Some(1.0), Some(10.0)],
                vec![Some(3.0), None],
                vec![None, Some(30.0)],
                vec![Some(5.0), Some(20.0)],
            ],
        )
        .expect("valid dataset")
    }

    fn names() -> Vec<String> {
        vec!["a".into(), "b".into()]
    }

    #[test]
    fn test_fit_rejects_empty_and_missing_feature() {
        let empty = TabularDataset::new(vec!["a".into()], vec![]).unwrap();
        assert!(matches!(
            Preprocessor::fit(&empty, &["a".into()]),
            Err(ModelError::EmptyDataset)
        ));

        let err = Preprocessor::fit(&train_dataset(), &["missing".into()]).unwrap_err();
        assert!(matches!(err, ModelError::MissingFeature(name) if name == "missing"));
    }

    #[test]
    fn test_transform_imputes_and_scales() {
        let prep = Preprocessor::fit(&train_dataset(), &names()).expect("fit");
        let x = prep.transform(&train_dataset()).expect("transform");
        assert_eq!(x.dim(), (4, 2));
        // Each scaled column is centered.
        for c in 0..2 {
            let mean: f64 = x.column(c).sum() / 4.0;
            assert!(mean.abs() < 1e-9);
        }
    }

    #[test]
    fn test_transform_is_column_order_insensitive() {
        let prep = Preprocessor::fit(&train_dataset(), &names()).expect("fit");
        let reordered = TabularDataset::new(
            vec!["b".into(), "a".into()],
            vec![vec![Some(10.0), Some(1.0)]],
        )
        .unwrap();
        let straight = TabularDataset::new(
            vec!["a".into(), "b".into()],
            vec![vec![Some(1.0), Some(10.0)]],
        )
        .unwrap();
        assert_eq!(
            prep.transform(&reordered).expect("transform"),
            prep.transform(&straight).expect("transform")
        );
    }

    #[test]
    fn test_fit_once_transforming_test_leaves_parameters_unchanged() {
        let prep = Preprocessor::fit(&train_dataset(), &names()).expect("fit");
        let before = prep.clone();
        let train_out = prep.transform(&train_dataset()).expect("transform train");

        let test = TabularDataset::new(
            vec!["a".into(), "b".into()],
            vec![vec![Some(100.0), None], vec![None, Some(-40.0)]],
        )
        .unwrap();
        let _ = prep.transform(&test).expect("transform test");

        assert_eq!(prep, before);
        assert_eq!(
            prep.transform(&train_dataset()).expect("transform again"),
            train_out
        );
    }

    #[test]
    fn test_constant_column_is_left_unscaled() {
        let ds = TabularDataset::new(
            vec!["c".into()],
            vec![vec![Some(7.0)], vec![Some(7.0)], vec![Some(7.0)]],
        )
        .unwrap();
        let prep = Preprocessor::fit(&ds, &["c".into()]).expect("fit");
        let x = prep.transform(&ds).expect("transform");
        assert!(x.iter().all(|v| *v == 0.0));
    }
}

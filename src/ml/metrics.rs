//! Binary classification metrics.
//!
//! Computed identically wherever metrics are needed (trainer gates,
//! evaluation report). Class `1` is the positive (phishing) class; a zero
//! denominator yields a zero score rather than a NaN.

use serde::{Deserialize, Serialize};

/// Precision, recall and f1 for the positive class. The f1 score is the sole
/// acceptance criterion throughout the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

/// Computes metrics over `{0, 1}` label vectors of equal length.
pub fn classification_metrics(y_true: &[u32], y_pred: &[u32]) -> ClassificationMetrics {
    assert_eq!(
        y_true.len(),
        y_pred.len(),
        "label vectors must have the same length"
    );

    let mut tp = 0usize;
    let mut fp = 0usize;
    let mut fn_ = 0usize;
    for (&truth, &pred) in y_true.iter().zip(y_pred.iter()) {
        match (truth, pred) {
            (1, 1) => tp += 1,
            (0, 1) => fp += 1,
            (1, 0) => fn_ += 1,
            _ => {}
        }
    }

    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    let f1_score = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    ClassificationMetrics {
        precision,
        recall,
        f1_score,
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_prediction() {
        let y = [0, 1, 1, 0, 1];
        let m = classification_metrics(&y, &y);
        assert_eq!(m.precision, 1.0);
        assert_eq!(m.recall, 1.0);
        assert_eq!(m.f1_score, 1.0);
    }

    #[test]
    fn test_known_confusion_counts() {
        // tp=2, fp=1, fn=1 -> precision 2/3, recall 2/3, f1 2/3.
        let y_true = [1, 1, 1, 0, 0];
        let y_pred = [1, 1, 0, 1, 0];
        let m = classification_metrics(&y_true, &y_pred);
        assert!((m.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((m.recall - 2.0 / 3.0).abs() < 1e-12);
        assert!((m.f1_score - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_no_positive_predictions_scores_zero() {
        let m = classification_metrics(&[1, 1, 0], &[0, 0, 0]);
        assert_eq!(m.precision, 0.0);
        assert_eq!(m.recall, 0.0);
        assert_eq!(m.f1_score, 0.0);
    }
}

//! Evaluation metrics for binary classifiers.

use serde::{Deserialize, Serialize};

use crate::domain::{FeatureRow, DECISION_THRESHOLD};
use crate::ports::Classifier;

/// Accuracy and ROC AUC of a classifier on a held-out partition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    /// Fraction of rows labeled correctly at the decision threshold.
    pub accuracy: f64,
    /// Area under the ROC curve; `None` when the labels contain a single class.
    pub auc: Option<f64>,
    /// ROC AUC of the thresholded 0/1 predictions, comparable with reports
    /// that score hard labels.
    #[serde(default)]
    pub label_auc: Option<f64>,
    /// Number of evaluated rows.
    pub support: usize,
}

impl EvaluationMetrics {
    /// Score every row with the classifier and compute the metrics.
    pub fn evaluate<C: Classifier + ?Sized>(model: &C, x: &[FeatureRow], y: &[u8]) -> Self {
        let scores: Vec<f64> = x.iter().map(|row| model.predict_proba(row)).collect();
        Self::from_scores(&scores, y)
    }

    /// Compute the metrics from precomputed probabilities.
    #[must_use]
    pub fn from_scores(scores: &[f64], labels: &[u8]) -> Self {
        Self {
            accuracy: accuracy(scores, labels),
            auc: roc_auc(scores, labels),
            label_auc: label_roc_auc(scores, labels),
            support: scores.len().min(labels.len()),
        }
    }
}

impl std::fmt::Display for EvaluationMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.auc {
            Some(auc) => write!(f, "Accuracy: {:.4}, AUC: {:.4}", self.accuracy, auc),
            None => write!(f, "Accuracy: {:.4}, AUC: n/a", self.accuracy),
        }
    }
}

/// Fraction of thresholded probabilities that match the labels.
#[must_use]
pub fn accuracy(scores: &[f64], labels: &[u8]) -> f64 {
    let total = scores.len().min(labels.len());
    if total == 0 {
        return 0.0;
    }
    let correct = scores
        .iter()
        .zip(labels)
        .filter(|(&p, &y)| u8::from(p > DECISION_THRESHOLD) == y)
        .count();
    correct as f64 / total as f64
}

/// Area under the ROC curve via the Mann-Whitney rank statistic.
///
/// Tied scores receive their average rank, which counts a tied
/// positive/negative pair as half correct.
#[must_use]
pub fn roc_auc(scores: &[f64], labels: &[u8]) -> Option<f64> {
    let n = scores.len().min(labels.len());
    let positives = labels[..n].iter().filter(|&&y| y == 1).count();
    let negatives = n - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut ranks = vec![0.0f64; n];
    let mut start = 0usize;
    while start < n {
        let mut end = start + 1;
        while end < n && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        // Ranks are 1-based; the tie group [start, end) shares the mean rank.
        let avg_rank = (start + end + 1) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = avg_rank;
        }
        start = end;
    }

    let positive_rank_sum: f64 = (0..n).filter(|&i| labels[i] == 1).map(|i| ranks[i]).sum();
    let p = positives as f64;
    let u = positive_rank_sum - p * (p + 1.0) / 2.0;
    Some(u / (p * negatives as f64))
}

/// ROC AUC of predictions thresholded at 0.5.
///
/// Equals the mean of the true positive rate and the true negative rate.
#[must_use]
pub fn label_roc_auc(scores: &[f64], labels: &[u8]) -> Option<f64> {
    let hard: Vec<f64> = scores
        .iter()
        .map(|&p| if p > DECISION_THRESHOLD { 1.0 } else { 0.0 })
        .collect();
    roc_auc(&hard, labels)
}

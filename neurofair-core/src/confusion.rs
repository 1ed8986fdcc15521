//! Confusion statistics — per-stratum TP/FP/FN/TN counts and ROC-AUC.
//!
//! Every metric here is a pure function: predictions and ground truth
//! in, counts out. Classification is exact integer match of the rounded
//! prediction against the label; there is no threshold tuning.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Label, SexPartition};

/// Test-category axis of the results table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Overall,
    Male,
    Female,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Overall => "overall",
            Category::Male => "male",
            Category::Female => "female",
        }
    }

    pub fn from_str_exact(s: &str) -> Option<Self> {
        match s {
            "overall" => Some(Category::Overall),
            "male" => Some(Category::Male),
            "female" => Some(Category::Female),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from confusion aggregation.
#[derive(Debug, Error)]
pub enum ConfusionError {
    #[error("prediction vector has {predictions} entries but test set has {labels} labels")]
    PredictionLengthMismatch { predictions: usize, labels: usize },
    #[error("AUC undefined for {category} stratum: no {missing} labels present")]
    DegenerateStratum {
        category: Category,
        missing: &'static str,
    },
}

/// Confusion counts plus AUC for one stratum of one fold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfusionRecord {
    pub true_positive: u32,
    pub false_positive: u32,
    pub false_negative: u32,
    pub true_negative: u32,
    pub auc: f64,
}

impl ConfusionRecord {
    /// Total classified subjects in this stratum.
    pub fn total(&self) -> u32 {
        self.true_positive + self.false_positive + self.false_negative + self.true_negative
    }
}

/// The three strata of one (submission, fold): overall, male, female.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FoldStatistics {
    pub overall: ConfusionRecord,
    pub male: ConfusionRecord,
    pub female: ConfusionRecord,
}

impl FoldStatistics {
    pub fn by_category(&self, category: Category) -> &ConfusionRecord {
        match category {
            Category::Overall => &self.overall,
            Category::Male => &self.male,
            Category::Female => &self.female,
        }
    }
}

/// Aggregate one fold's rounded predictions against the frozen test
/// labels into overall / male / female confusion records.
///
/// Invariant: male and female counts sum componentwise to overall, since
/// the sex partition covers every test row exactly once.
pub fn fold_statistics(
    predictions: &[Label],
    labels: &[Label],
    sexes: &SexPartition,
) -> Result<FoldStatistics, ConfusionError> {
    if predictions.len() != labels.len() {
        return Err(ConfusionError::PredictionLengthMismatch {
            predictions: predictions.len(),
            labels: labels.len(),
        });
    }

    let all: Vec<usize> = (0..labels.len()).collect();
    Ok(FoldStatistics {
        overall: stratum_record(predictions, labels, &all, Category::Overall)?,
        male: stratum_record(predictions, labels, &sexes.male, Category::Male)?,
        female: stratum_record(predictions, labels, &sexes.female, Category::Female)?,
    })
}

fn stratum_record(
    predictions: &[Label],
    labels: &[Label],
    rows: &[usize],
    category: Category,
) -> Result<ConfusionRecord, ConfusionError> {
    let mut record = ConfusionRecord {
        true_positive: 0,
        false_positive: 0,
        false_negative: 0,
        true_negative: 0,
        auc: 0.0,
    };
    for &i in rows {
        match (labels[i], predictions[i]) {
            (1, 1) => record.true_positive += 1,
            (1, 0) => record.false_negative += 1,
            (0, 1) => record.false_positive += 1,
            (0, 0) => record.true_negative += 1,
            _ => {}
        }
    }

    let stratum_labels: Vec<Label> = rows.iter().map(|&i| labels[i]).collect();
    let stratum_scores: Vec<f64> = rows.iter().map(|&i| f64::from(predictions[i])).collect();
    record.auc = roc_auc(&stratum_labels, &stratum_scores, category)?;

    Ok(record)
}

/// Trapezoidal ROC-AUC over raw scores.
///
/// A stratum with zero positive or zero negative labels has no defined
/// ROC curve; that is surfaced as an error naming the stratum rather
/// than a silent NaN.
pub fn roc_auc(labels: &[Label], scores: &[f64], category: Category) -> Result<f64, ConfusionError> {
    let positives = labels.iter().filter(|&&l| l == 1).count();
    let negatives = labels.len() - positives;
    if positives == 0 {
        return Err(ConfusionError::DegenerateStratum {
            category,
            missing: "positive",
        });
    }
    if negatives == 0 {
        return Err(ConfusionError::DegenerateStratum {
            category,
            missing: "negative",
        });
    }

    let mut order: Vec<usize> = (0..labels.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    // Sweep thresholds from high to low, accumulating trapezoids in
    // units of (FP count × TP count); normalize by P*N at the end.
    let mut area = 0.0_f64;
    let (mut tp, mut fp) = (0u64, 0u64);
    let (mut prev_tp, mut prev_fp) = (0u64, 0u64);
    let mut prev_score = f64::INFINITY;

    for &i in &order {
        if scores[i] != prev_score {
            area += (fp - prev_fp) as f64 * (tp + prev_tp) as f64 / 2.0;
            prev_score = scores[i];
            prev_tp = tp;
            prev_fp = fp;
        }
        if labels[i] == 1 {
            tp += 1;
        } else {
            fp += 1;
        }
    }
    area += (fp - prev_fp) as f64 * (tp + prev_tp) as f64 / 2.0;

    Ok(area / (positives as f64 * negatives as f64))
}

//! Metric views over a results table.
//!
//! Each view flattens the table into tidy (submission, sex, fold,
//! value) points ready for export or plotting:
//! - `auc_roc_view` — per-sex AUC as a percentage
//! - `general_accuracy_view` — per-sex accuracy as a percentage
//! - `accuracy_gap_view` — absolute male/female accuracy gap plus a
//!   ternary sign indicating which sex is favored
//! - `equal_opportunity_view` — male minus female true-positive rate,
//!   in percentage points
//!
//! Degenerate strata surface as explicit errors that name the
//! submission, fold, and category; no NaN ever leaves this module.

use serde::Serialize;
use thiserror::Error;

use neurofair_core::confusion::{Category, ConfusionRecord};
use neurofair_core::domain::Sex;

use crate::table::ResultsTable;

#[derive(Debug, Error)]
pub enum MetricError {
    #[error(
        "{metric}: zero denominator for submission '{submission}', fold {fold}, category {category}"
    )]
    ZeroDenominator {
        metric: &'static str,
        submission: String,
        fold: usize,
        category: Category,
    },
}

/// One tidy observation. `sex` is `None` for overall rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricPoint {
    pub submission: String,
    pub sex: Option<Sex>,
    /// 1-based fold number.
    pub fold: usize,
    pub value: f64,
}

/// All observations of one metric across the table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSeries {
    pub metric: &'static str,
    pub points: Vec<MetricPoint>,
}

/// One male/female accuracy comparison.
///
/// `gap` is the absolute difference of the two rounded accuracy
/// percentages. `sign` is -1 when male accuracy is higher, 1 when
/// female accuracy is higher, and 0 on a tie.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccuracyGap {
    pub submission: String,
    /// 1-based fold number.
    pub fold: usize,
    pub gap: f64,
    pub sign: i8,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn accuracy_percent(
    metric: &'static str,
    record: &ConfusionRecord,
    submission: &str,
    fold: usize,
    category: Category,
) -> Result<f64, MetricError> {
    let total = record.total();
    if total == 0 {
        return Err(MetricError::ZeroDenominator {
            metric,
            submission: submission.to_string(),
            fold,
            category,
        });
    }
    let correct = record.true_positive + record.true_negative;
    Ok(f64::from(correct) / f64::from(total) * 100.0)
}

fn true_positive_rate(
    metric: &'static str,
    record: &ConfusionRecord,
    submission: &str,
    fold: usize,
    category: Category,
) -> Result<f64, MetricError> {
    let positives = record.true_positive + record.false_negative;
    if positives == 0 {
        return Err(MetricError::ZeroDenominator {
            metric,
            submission: submission.to_string(),
            fold,
            category,
        });
    }
    Ok(f64::from(record.true_positive) / f64::from(positives))
}

fn sex_rows<'a>(
    table: &'a ResultsTable,
    submission: &str,
) -> impl Iterator<Item = (Sex, &'a [ConfusionRecord])> {
    let male = table
        .get(submission, Category::Male)
        .map(|r| (Sex::Male, r.folds.as_slice()));
    let female = table
        .get(submission, Category::Female)
        .map(|r| (Sex::Female, r.folds.as_slice()));
    male.into_iter().chain(female)
}

/// Per-sex AUC for every fold, scaled to a percentage. Overall rows
/// carry no fairness signal and are excluded.
pub fn auc_roc_view(table: &ResultsTable) -> MetricSeries {
    let mut points = Vec::new();
    for submission in table.submissions() {
        for (sex, folds) in sex_rows(table, submission) {
            for (fold_index, record) in folds.iter().enumerate() {
                points.push(MetricPoint {
                    submission: submission.to_string(),
                    sex: Some(sex),
                    fold: fold_index + 1,
                    value: record.auc * 100.0,
                });
            }
        }
    }
    MetricSeries {
        metric: "auc_roc",
        points,
    }
}

/// Per-sex accuracy for every fold, as a percentage.
pub fn general_accuracy_view(table: &ResultsTable) -> Result<MetricSeries, MetricError> {
    let mut points = Vec::new();
    for submission in table.submissions() {
        for (sex, folds) in sex_rows(table, submission) {
            let category = match sex {
                Sex::Male => Category::Male,
                Sex::Female => Category::Female,
            };
            for (fold_index, record) in folds.iter().enumerate() {
                let value = accuracy_percent(
                    "general_accuracy",
                    record,
                    submission,
                    fold_index + 1,
                    category,
                )?;
                points.push(MetricPoint {
                    submission: submission.to_string(),
                    sex: Some(sex),
                    fold: fold_index + 1,
                    value,
                });
            }
        }
    }
    Ok(MetricSeries {
        metric: "general_accuracy",
        points,
    })
}

/// Male/female accuracy gap per fold.
///
/// Both accuracies are rounded to two decimal places before
/// differencing, so hairline floating-point residue cannot masquerade
/// as a fairness gap.
pub fn accuracy_gap_view(table: &ResultsTable) -> Result<Vec<AccuracyGap>, MetricError> {
    let mut gaps = Vec::new();
    for submission in table.submissions() {
        let male = table.get(submission, Category::Male);
        let female = table.get(submission, Category::Female);
        let (Some(male), Some(female)) = (male, female) else {
            continue;
        };
        for (fold_index, (m, f)) in male.folds.iter().zip(&female.folds).enumerate() {
            let fold = fold_index + 1;
            let male_pct = round2(accuracy_percent(
                "accuracy_gap",
                m,
                submission,
                fold,
                Category::Male,
            )?);
            let female_pct = round2(accuracy_percent(
                "accuracy_gap",
                f,
                submission,
                fold,
                Category::Female,
            )?);
            let difference = male_pct - female_pct;
            let (gap, sign) = if difference == 0.0 {
                (0.0, 0)
            } else {
                (round2(difference.abs()), (difference.abs() / -difference).round() as i8)
            };
            gaps.push(AccuracyGap {
                submission: submission.to_string(),
                fold,
                gap,
                sign,
            });
        }
    }
    Ok(gaps)
}

/// Equal opportunity per fold: male TPR minus female TPR, in
/// percentage points. Positive values mean positive male subjects are
/// recognized more often than positive female subjects.
pub fn equal_opportunity_view(table: &ResultsTable) -> Result<MetricSeries, MetricError> {
    let mut points = Vec::new();
    for submission in table.submissions() {
        let male = table.get(submission, Category::Male);
        let female = table.get(submission, Category::Female);
        let (Some(male), Some(female)) = (male, female) else {
            continue;
        };
        for (fold_index, (m, f)) in male.folds.iter().zip(&female.folds).enumerate() {
            let fold = fold_index + 1;
            let male_tpr =
                true_positive_rate("equal_opportunity", m, submission, fold, Category::Male)?;
            let female_tpr =
                true_positive_rate("equal_opportunity", f, submission, fold, Category::Female)?;
            points.push(MetricPoint {
                submission: submission.to_string(),
                sex: None,
                fold,
                value: (male_tpr - female_tpr) * 100.0,
            });
        }
    }
    Ok(MetricSeries {
        metric: "equal_opportunity",
        points,
    })
}

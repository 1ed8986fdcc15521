//! The per-run results table.
//!
//! Each evaluated submission contributes three rows — overall, male,
//! female — and each fold contributes five columns (TP, FP, FN, TN,
//! AUC). The table is the unit the cache persists and the metric views
//! consume.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use neurofair_core::confusion::{Category, ConfusionRecord, FoldStatistics};

/// Per-fold statistic columns, in table order.
pub const STAT_COLUMNS: [&str; 5] = ["TP", "FP", "FN", "TN", "AUC"];

#[derive(Debug, Error)]
pub enum TableError {
    #[error("submission '{submission}' reported {got} folds, table holds {expected}")]
    FoldCountMismatch {
        submission: String,
        got: usize,
        expected: usize,
    },
    #[error("submission '{0}' is already present in the table")]
    DuplicateSubmission(String),
    #[error("malformed results row name '{0}' (expected '<submission>-<category>')")]
    MalformedRowName(String),
    #[error("malformed results header (expected 'submission' then {expected} stat columns, got {got} columns)")]
    MalformedHeader { expected: usize, got: usize },
    #[error("row '{row}', column '{column}': invalid value '{value}'")]
    BadValue {
        row: String,
        column: String,
        value: String,
    },
    #[error("results row '{0}' duplicates an earlier row")]
    DuplicateRow(String),
}

/// One row: a submission's confusion statistics for one category
/// across every fold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRow {
    pub submission: String,
    pub category: Category,
    pub folds: Vec<ConfusionRecord>,
}

impl SubmissionRow {
    /// Row name as persisted: `<submission>-<category>`.
    pub fn name(&self) -> String {
        format!("{}-{}", self.submission, self.category)
    }
}

/// Mean of the confusion columns over all folds of one row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoldMeans {
    pub true_positive: f64,
    pub false_positive: f64,
    pub false_negative: f64,
    pub true_negative: f64,
    pub auc: f64,
}

/// Confusion statistics for every (submission, category, fold) cell of
/// one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsTable {
    n_folds: usize,
    rows: Vec<SubmissionRow>,
}

impl ResultsTable {
    pub fn new(n_folds: usize) -> Self {
        Self {
            n_folds,
            rows: Vec::new(),
        }
    }

    pub fn n_folds(&self) -> usize {
        self.n_folds
    }

    pub fn rows(&self) -> &[SubmissionRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Submission names in insertion order.
    pub fn submissions(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for row in &self.rows {
            if !names.contains(&row.submission.as_str()) {
                names.push(&row.submission);
            }
        }
        names
    }

    pub fn get(&self, submission: &str, category: Category) -> Option<&SubmissionRow> {
        self.rows
            .iter()
            .find(|r| r.submission == submission && r.category == category)
    }

    /// Append the three category rows for one submission.
    pub fn push_submission(
        &mut self,
        submission: &str,
        folds: &[FoldStatistics],
    ) -> Result<(), TableError> {
        if folds.len() != self.n_folds {
            return Err(TableError::FoldCountMismatch {
                submission: submission.to_string(),
                got: folds.len(),
                expected: self.n_folds,
            });
        }
        if self.submissions().contains(&submission) {
            return Err(TableError::DuplicateSubmission(submission.to_string()));
        }
        for category in [Category::Overall, Category::Male, Category::Female] {
            self.rows.push(SubmissionRow {
                submission: submission.to_string(),
                category,
                folds: folds.iter().map(|f| *f.by_category(category)).collect(),
            });
        }
        Ok(())
    }

    /// Rebuild a table from persisted rows, validating fold counts and
    /// row uniqueness.
    pub fn from_rows(n_folds: usize, rows: Vec<SubmissionRow>) -> Result<Self, TableError> {
        let mut table = Self::new(n_folds);
        for row in rows {
            if row.folds.len() != n_folds {
                return Err(TableError::FoldCountMismatch {
                    submission: row.submission.clone(),
                    got: row.folds.len(),
                    expected: n_folds,
                });
            }
            if table.get(&row.submission, row.category).is_some() {
                return Err(TableError::DuplicateRow(row.name()));
            }
            table.rows.push(row);
        }
        Ok(table)
    }

    /// Column-wise mean over folds for one (submission, category) row.
    pub fn fold_means(&self, submission: &str, category: Category) -> Option<FoldMeans> {
        let row = self.get(submission, category)?;
        if row.folds.is_empty() {
            return None;
        }
        let n = row.folds.len() as f64;
        let sum = |f: fn(&ConfusionRecord) -> f64| row.folds.iter().map(f).sum::<f64>() / n;
        Some(FoldMeans {
            true_positive: sum(|r| f64::from(r.true_positive)),
            false_positive: sum(|r| f64::from(r.false_positive)),
            false_negative: sum(|r| f64::from(r.false_negative)),
            true_negative: sum(|r| f64::from(r.true_negative)),
            auc: sum(|r| r.auc),
        })
    }

    // ─── Delimited persistence ───────────────────────────────────────

    /// Encode as CSV: a `submission` name column, then the five stat
    /// columns repeated per fold with a 1-based suffix.
    pub fn to_csv_string(&self) -> Result<String, csv::Error> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        let mut header = vec!["submission".to_string()];
        for fold in 1..=self.n_folds {
            for stat in STAT_COLUMNS {
                header.push(format!("{stat}_{fold}"));
            }
        }
        writer.write_record(&header)?;
        for row in &self.rows {
            let mut record = vec![row.name()];
            for fold in &row.folds {
                record.push(fold.true_positive.to_string());
                record.push(fold.false_positive.to_string());
                record.push(fold.false_negative.to_string());
                record.push(fold.true_negative.to_string());
                record.push(fold.auc.to_string());
            }
            writer.write_record(&record)?;
        }
        let bytes = writer.into_inner().map_err(|e| e.into_error())?;
        // The writer only ever receives UTF-8.
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Decode a table previously written by [`Self::to_csv_string`].
    pub fn from_csv_str(raw: &str) -> Result<Self, TableError> {
        let mut reader = csv::ReaderBuilder::new().from_reader(raw.as_bytes());
        let headers = reader
            .headers()
            .map_err(|_| TableError::MalformedHeader {
                expected: STAT_COLUMNS.len(),
                got: 0,
            })?
            .clone();
        let stat_width = STAT_COLUMNS.len();
        if headers.len() < 1 + stat_width || (headers.len() - 1) % stat_width != 0 {
            return Err(TableError::MalformedHeader {
                expected: stat_width,
                got: headers.len(),
            });
        }
        let n_folds = (headers.len() - 1) / stat_width;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|_| TableError::MalformedHeader {
                expected: stat_width,
                got: 0,
            })?;
            let name = record.get(0).unwrap_or("").to_string();
            let (submission, category_str) = name
                .rsplit_once('-')
                .ok_or_else(|| TableError::MalformedRowName(name.clone()))?;
            let category = Category::from_str_exact(category_str)
                .ok_or_else(|| TableError::MalformedRowName(name.clone()))?;

            let cell = |offset: usize, column: &str| -> Result<&str, TableError> {
                record.get(offset).ok_or_else(|| TableError::BadValue {
                    row: name.clone(),
                    column: column.to_string(),
                    value: String::new(),
                })
            };
            let mut folds = Vec::with_capacity(n_folds);
            for fold in 0..n_folds {
                let base = 1 + fold * stat_width;
                let count = |idx: usize| -> Result<u32, TableError> {
                    let raw = cell(base + idx, STAT_COLUMNS[idx])?;
                    raw.parse().map_err(|_| TableError::BadValue {
                        row: name.clone(),
                        column: format!("{}_{}", STAT_COLUMNS[idx], fold + 1),
                        value: raw.to_string(),
                    })
                };
                let auc_raw = cell(base + 4, "AUC")?;
                let auc: f64 = auc_raw.parse().map_err(|_| TableError::BadValue {
                    row: name.clone(),
                    column: format!("AUC_{}", fold + 1),
                    value: auc_raw.to_string(),
                })?;
                folds.push(ConfusionRecord {
                    true_positive: count(0)?,
                    false_positive: count(1)?,
                    false_negative: count(2)?,
                    true_negative: count(3)?,
                    auc,
                });
            }
            rows.push(SubmissionRow {
                submission: submission.to_string(),
                category,
                folds,
            });
        }
        Self::from_rows(n_folds, rows)
    }
}

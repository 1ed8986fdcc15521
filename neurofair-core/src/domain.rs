//! Domain types — subjects, datasets, labels, and sex partitions.
//!
//! A `Dataset` is columnar and insertion-ordered: parallel vectors of
//! subject id, acquisition site, sex, and an opaque feature payload row.
//! Diagnosis labels travel in a separate array aligned by position, the
//! same way the upstream tabular source ships them.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unique participant identifier.
pub type SubjectId = u64;

/// Binary diagnosis label: 0 or 1.
pub type Label = u8;

/// One subject's opaque feature payload. The core never inspects it;
/// it is passed through to submission pipelines untouched.
pub type FeatureRow = Vec<f64>;

/// Feature matrix produced by a `FeatureExtractor`, one row per subject.
pub type FeatureMatrix = Vec<Vec<f64>>;

/// Errors from dataset construction and merging.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("column length mismatch: {column} has {got} rows, expected {expected}")]
    ColumnLengthMismatch {
        column: &'static str,
        got: usize,
        expected: usize,
    },
    #[error("subject id {0} appears more than once across the merged partitions")]
    DuplicateSubject(SubjectId),
}

/// Participant sex category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// Parse the upstream single-letter encoding (`M` / `F`).
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "M" => Some(Sex::Male),
            "F" => Some(Sex::Female),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Sex::Male => "M",
            Sex::Female => "F",
        }
    }
}

impl std::fmt::Display for Sex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sex::Male => write!(f, "male"),
            Sex::Female => write!(f, "female"),
        }
    }
}

/// Row indices of a dataset split by sex, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SexPartition {
    pub male: Vec<usize>,
    pub female: Vec<usize>,
}

/// Ordered, columnar subject collection.
///
/// Row order is the insertion order of the original source and is
/// preserved through merges and subsetting.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    ids: Vec<SubjectId>,
    sites: Vec<String>,
    sexes: Vec<Sex>,
    features: Vec<FeatureRow>,
}

impl Dataset {
    /// Build a dataset from parallel columns. All columns must have the
    /// same length as `ids`.
    pub fn new(
        ids: Vec<SubjectId>,
        sites: Vec<String>,
        sexes: Vec<Sex>,
        features: Vec<FeatureRow>,
    ) -> Result<Self, DomainError> {
        let expected = ids.len();
        if sites.len() != expected {
            return Err(DomainError::ColumnLengthMismatch {
                column: "sites",
                got: sites.len(),
                expected,
            });
        }
        if sexes.len() != expected {
            return Err(DomainError::ColumnLengthMismatch {
                column: "sexes",
                got: sexes.len(),
                expected,
            });
        }
        if features.len() != expected {
            return Err(DomainError::ColumnLengthMismatch {
                column: "features",
                got: features.len(),
                expected,
            });
        }
        Ok(Self {
            ids,
            sites,
            sexes,
            features,
        })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[SubjectId] {
        &self.ids
    }

    pub fn sites(&self) -> &[String] {
        &self.sites
    }

    pub fn sexes(&self) -> &[Sex] {
        &self.sexes
    }

    pub fn features(&self) -> &[FeatureRow] {
        &self.features
    }

    /// Project the dataset onto a set of row indices, preserving the
    /// relative order of `rows`.
    pub fn subset(&self, rows: &[usize]) -> Dataset {
        Dataset {
            ids: rows.iter().map(|&r| self.ids[r]).collect(),
            sites: rows.iter().map(|&r| self.sites[r].clone()).collect(),
            sexes: rows.iter().map(|&r| self.sexes[r]).collect(),
            features: rows.iter().map(|&r| self.features[r].clone()).collect(),
        }
    }

    /// Split row indices by sex, each side in source order.
    pub fn sex_partition(&self) -> SexPartition {
        let mut male = Vec::new();
        let mut female = Vec::new();
        for (i, sex) in self.sexes.iter().enumerate() {
            match sex {
                Sex::Male => male.push(i),
                Sex::Female => female.push(i),
            }
        }
        SexPartition { male, female }
    }

    /// Distinct site identifiers, sorted ascending.
    pub fn unique_sites(&self) -> Vec<String> {
        let mut sites: Vec<String> = self
            .sites
            .iter()
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .cloned()
            .collect();
        sites.sort();
        sites
    }
}

/// Concatenate the original train and test partitions into one dataset,
/// train rows first, preserving each side's row order. Label arrays are
/// concatenated the same way so position alignment survives the merge.
///
/// Subject ids must be unique across the merge; a duplicate would let
/// the same participant land in both final partitions.
pub fn merge_datasets(
    train: Dataset,
    train_labels: Vec<Label>,
    test: Dataset,
    test_labels: Vec<Label>,
) -> Result<(Dataset, Vec<Label>), DomainError> {
    let mut seen: HashSet<SubjectId> = HashSet::with_capacity(train.len() + test.len());
    for &id in train.ids.iter().chain(test.ids.iter()) {
        if !seen.insert(id) {
            return Err(DomainError::DuplicateSubject(id));
        }
    }

    let mut ids = train.ids;
    let mut sites = train.sites;
    let mut sexes = train.sexes;
    let mut features = train.features;
    ids.extend(test.ids);
    sites.extend(test.sites);
    sexes.extend(test.sexes);
    features.extend(test.features);

    let mut labels = train_labels;
    labels.extend(test_labels);

    Ok((
        Dataset {
            ids,
            sites,
            sexes,
            features,
        },
        labels,
    ))
}

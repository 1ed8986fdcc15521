//! Loading subject feature tables from delimited text.
//!
//! Each partition is one CSV file. Four columns are required by name —
//! `subject_id`, `participants_site`, `participants_sex`, `label` —
//! and every remaining column is parsed as a numeric feature.

use std::path::{Path, PathBuf};

use thiserror::Error;

use neurofair_core::domain::{Dataset, DomainError, Label, Sex, SubjectId};

/// Column names the loader requires in every partition file.
pub const REQUIRED_COLUMNS: [&str; 4] =
    ["subject_id", "participants_site", "participants_sex", "label"];

/// Errors from reading a subject feature table.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("'{path}' is missing required column '{column}'")]
    MissingColumn { path: PathBuf, column: &'static str },
    #[error("'{path}' row {row}: invalid subject id '{value}'")]
    BadSubjectId {
        path: PathBuf,
        row: usize,
        value: String,
    },
    #[error("'{path}' row {row}: invalid sex code '{value}' (expected 'M' or 'F')")]
    BadSex {
        path: PathBuf,
        row: usize,
        value: String,
    },
    #[error("'{path}' row {row}: invalid label '{value}' (expected 0 or 1)")]
    BadLabel {
        path: PathBuf,
        row: usize,
        value: String,
    },
    #[error("'{path}' row {row}, column '{column}': invalid feature value '{value}'")]
    BadFeature {
        path: PathBuf,
        row: usize,
        column: String,
        value: String,
    },
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Source of the two frozen input partitions.
///
/// The runner only sees this trait; production uses [`CsvDataProvider`]
/// and tests substitute in-memory fixtures.
pub trait DataProvider {
    fn train_partition(&self) -> Result<(Dataset, Vec<Label>), LoadError>;
    fn test_partition(&self) -> Result<(Dataset, Vec<Label>), LoadError>;
}

/// Loads both partitions from CSV files on disk.
#[derive(Debug, Clone)]
pub struct CsvDataProvider {
    train_path: PathBuf,
    test_path: PathBuf,
}

impl CsvDataProvider {
    pub fn new(train_path: PathBuf, test_path: PathBuf) -> Self {
        Self {
            train_path,
            test_path,
        }
    }
}

impl DataProvider for CsvDataProvider {
    fn train_partition(&self) -> Result<(Dataset, Vec<Label>), LoadError> {
        load_partition(&self.train_path)
    }

    fn test_partition(&self) -> Result<(Dataset, Vec<Label>), LoadError> {
        load_partition(&self.test_path)
    }
}

/// Parse one partition file into a dataset plus its label column.
pub fn load_partition(path: &Path) -> Result<(Dataset, Vec<Label>), LoadError> {
    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::Reader::from_path(path).map_err(csv_err)?;
    let headers = reader.headers().map_err(csv_err)?.clone();

    let column = |name: &'static str| -> Result<usize, LoadError> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or(LoadError::MissingColumn {
                path: path.to_path_buf(),
                column: name,
            })
    };
    let id_col = column("subject_id")?;
    let site_col = column("participants_site")?;
    let sex_col = column("participants_sex")?;
    let label_col = column("label")?;

    let reserved = [id_col, site_col, sex_col, label_col];
    let feature_cols: Vec<usize> = (0..headers.len())
        .filter(|i| !reserved.contains(i))
        .collect();

    let mut ids = Vec::new();
    let mut sites = Vec::new();
    let mut sexes = Vec::new();
    let mut labels = Vec::new();
    let mut features = Vec::new();

    for (row_index, record) in reader.records().enumerate() {
        let record = record.map_err(csv_err)?;
        // 1-based, counting the header.
        let row = row_index + 2;
        let field = |col: usize| record.get(col).unwrap_or("");

        let id: SubjectId = field(id_col)
            .trim()
            .parse()
            .map_err(|_| LoadError::BadSubjectId {
                path: path.to_path_buf(),
                row,
                value: field(id_col).to_string(),
            })?;
        let sex = Sex::from_code(field(sex_col).trim()).ok_or_else(|| LoadError::BadSex {
            path: path.to_path_buf(),
            row,
            value: field(sex_col).to_string(),
        })?;
        let label: Label = match field(label_col).trim() {
            "0" => 0,
            "1" => 1,
            other => {
                return Err(LoadError::BadLabel {
                    path: path.to_path_buf(),
                    row,
                    value: other.to_string(),
                })
            }
        };

        let mut feature_row = Vec::with_capacity(feature_cols.len());
        for &col in &feature_cols {
            let value: f64 = field(col)
                .trim()
                .parse()
                .map_err(|_| LoadError::BadFeature {
                    path: path.to_path_buf(),
                    row,
                    column: headers[col].to_string(),
                    value: field(col).to_string(),
                })?;
            feature_row.push(value);
        }

        ids.push(id);
        sites.push(field(site_col).trim().to_string());
        sexes.push(sex);
        labels.push(label);
        features.push(feature_row);
    }

    let data = Dataset::new(ids, sites, sexes, features)?;
    Ok((data, labels))
}

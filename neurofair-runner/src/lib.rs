//! NeuroFair Runner — run orchestration around the core pipeline.
//!
//! - TOML run configuration
//! - CSV data loading behind the [`DataProvider`] seam
//! - The per-run results table and its delimited persistence
//! - A seed-keyed result cache that short-circuits retraining
//! - Fairness metric views (AUC, accuracy, accuracy gap, equal
//!   opportunity) over a results table
//! - Timestamped report export

pub mod cache;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;
pub mod table;

pub use cache::ResultCache;
pub use config::{ConfigError, DataSection, EvalConfig, EvaluationSection};
pub use data_loader::{CsvDataProvider, DataProvider, LoadError};
pub use export::save_report;
pub use metrics::{
    accuracy_gap_view, auc_roc_view, equal_opportunity_view, general_accuracy_view, AccuracyGap,
    MetricError, MetricPoint, MetricSeries,
};
pub use runner::{run_evaluation, EvaluationReport, RunError};
pub use table::{ResultsTable, SubmissionRow, TableError};

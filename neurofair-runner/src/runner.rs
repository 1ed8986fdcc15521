//! End-to-end run orchestration.
//!
//! One call drives the whole pipeline: load partitions, merge them,
//! either replay the seed's cached results table or carve a fresh
//! stratified test set and train every rostered submission across the
//! folds, then derive the four metric views.

use thiserror::Error;

use neurofair_core::confusion::{fold_statistics, ConfusionError, FoldStatistics};
use neurofair_core::domain::{merge_datasets, DomainError};
use neurofair_core::rng::SeedHierarchy;
use neurofair_core::split::{carve_test_set, SplitError};
use neurofair_core::submission::SubmissionRegistry;
use neurofair_core::trainer::{train_folds, TrainError, TrainOptions};

use crate::cache::ResultCache;
use crate::config::EvalConfig;
use crate::data_loader::{DataProvider, LoadError};
use crate::metrics::{
    accuracy_gap_view, auc_roc_view, equal_opportunity_view, general_accuracy_view, AccuracyGap,
    MetricError, MetricSeries,
};
use crate::table::{ResultsTable, TableError};

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Split(#[from] SplitError),
    #[error("submission '{0}' is not registered")]
    UnknownSubmission(String),
    #[error("training submission '{submission}' failed: {source}")]
    Train {
        submission: String,
        #[source]
        source: TrainError,
    },
    #[error("statistics for submission '{submission}', fold {fold} failed: {source}")]
    Confusion {
        submission: String,
        fold: usize,
        #[source]
        source: ConfusionError,
    },
    #[error(transparent)]
    Table(#[from] TableError),
    #[error(transparent)]
    Metric(#[from] MetricError),
    #[error("result cache error: {0:#}")]
    Cache(#[source] anyhow::Error),
}

/// Everything one run produces.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationReport {
    pub seed: u64,
    pub n_folds: usize,
    /// The table was replayed from the cache; no training happened.
    pub from_cache: bool,
    pub table: ResultsTable,
    pub auc_roc: MetricSeries,
    pub general_accuracy: MetricSeries,
    pub accuracy_gap: Vec<AccuracyGap>,
    pub equal_opportunity: MetricSeries,
}

pub fn run_evaluation(
    config: &EvalConfig,
    provider: &dyn DataProvider,
    registry: &SubmissionRegistry,
    cache: &ResultCache,
) -> Result<EvaluationReport, RunError> {
    let seed = config.evaluation.seed;

    let (table, from_cache) = if cache.contains(seed) {
        log::info!("seed {seed}: cached results found, skipping training");
        (cache.load(seed).map_err(RunError::Cache)?, true)
    } else {
        let table = evaluate_from_scratch(config, provider, registry)?;
        cache.store(seed, &table).map_err(RunError::Cache)?;
        (table, false)
    };

    let auc_roc = auc_roc_view(&table);
    let general_accuracy = general_accuracy_view(&table)?;
    let accuracy_gap = accuracy_gap_view(&table)?;
    let equal_opportunity = equal_opportunity_view(&table)?;

    Ok(EvaluationReport {
        seed,
        n_folds: table.n_folds(),
        from_cache,
        table,
        auc_roc,
        general_accuracy,
        accuracy_gap,
        equal_opportunity,
    })
}

fn evaluate_from_scratch(
    config: &EvalConfig,
    provider: &dyn DataProvider,
    registry: &SubmissionRegistry,
) -> Result<ResultsTable, RunError> {
    let seed = config.evaluation.seed;
    let seeds = SeedHierarchy::new(seed);

    let (orig_train, orig_train_labels) = provider.train_partition()?;
    let (orig_test, orig_test_labels) = provider.test_partition()?;
    log::info!(
        "loaded {} train and {} test subjects",
        orig_train.len(),
        orig_test.len()
    );

    let (merged, merged_labels) =
        merge_datasets(orig_train, orig_train_labels, orig_test, orig_test_labels)?;

    let split = carve_test_set(&merged, &merged_labels, &mut seeds.split_rng())?;
    log::info!(
        "seed {seed}: carved {} test subjects from {} total",
        split.test.len(),
        merged.len()
    );

    let train_data = merged.subset(&split.train);
    let train_labels: Vec<_> = split.train.iter().map(|&i| merged_labels[i]).collect();
    let test_data = merged.subset(&split.test);
    let test_labels: Vec<_> = split.test.iter().map(|&i| merged_labels[i]).collect();
    let test_sexes = test_data.sex_partition();

    let options = TrainOptions {
        n_folds: config.evaluation.n_folds,
        parallel: config.evaluation.parallel_folds,
    };

    let mut table = ResultsTable::new(options.n_folds);
    for name in &config.evaluation.submissions {
        let factory = registry
            .get(name)
            .ok_or_else(|| RunError::UnknownSubmission(name.clone()))?;
        let train_err = |source| RunError::Train {
            submission: name.clone(),
            source,
        };
        factory
            .ensure_data()
            .map_err(|e| train_err(TrainError::Submission(e)))?;

        log::info!("training '{name}' across {} folds", options.n_folds);
        // Every submission draws the same fold RNG, so fold membership
        // is identical across the roster.
        let mut fold_rng = seeds.fold_rng();
        let predictions = train_folds(
            &train_data,
            &train_labels,
            &test_data,
            factory,
            &mut fold_rng,
            &options,
        )
        .map_err(train_err)?;

        let stats: Vec<FoldStatistics> = predictions
            .iter()
            .enumerate()
            .map(|(fold_index, preds)| {
                fold_statistics(preds, &test_labels, &test_sexes).map_err(|source| {
                    RunError::Confusion {
                        submission: name.clone(),
                        fold: fold_index + 1,
                        source,
                    }
                })
            })
            .collect::<Result<_, _>>()?;
        table.push_submission(name, &stats)?;
    }
    Ok(table)
}

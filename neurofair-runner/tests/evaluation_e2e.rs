//! End-to-end evaluation runs against an in-memory data provider.

use std::path::PathBuf;

use neurofair_core::confusion::Category;
use neurofair_core::domain::{Dataset, Label, Sex};
use neurofair_core::submission::SubmissionRegistry;

use neurofair_runner::cache::ResultCache;
use neurofair_runner::config::{DataSection, EvalConfig, EvaluationSection};
use neurofair_runner::data_loader::{DataProvider, LoadError};
use neurofair_runner::runner::{run_evaluation, RunError};

/// Hands out fixed partitions without touching disk.
struct FixtureProvider {
    train: (Dataset, Vec<Label>),
    test: (Dataset, Vec<Label>),
}

impl DataProvider for FixtureProvider {
    fn train_partition(&self) -> Result<(Dataset, Vec<Label>), LoadError> {
        Ok(self.train.clone())
    }

    fn test_partition(&self) -> Result<(Dataset, Vec<Label>), LoadError> {
        Ok(self.test.clone())
    }
}

fn dataset(rows: &[(u64, &str, Sex, Label)]) -> (Dataset, Vec<Label>) {
    let ids = rows.iter().map(|r| r.0).collect();
    let sites = rows.iter().map(|r| r.1.to_string()).collect();
    let sexes = rows.iter().map(|r| r.2).collect();
    let features = rows.iter().map(|r| vec![r.0 as f64]).collect();
    let labels = rows.iter().map(|r| r.3).collect();
    (
        Dataset::new(ids, sites, sexes, features).unwrap(),
        labels,
    )
}

/// Twelve subjects covering the full (2 sites × 2 sexes × 2 labels)
/// grid twice for half the combinations, split eight/four across the
/// original partitions.
fn fixture_provider() -> FixtureProvider {
    use Sex::{Female, Male};
    let train = dataset(&[
        (1, "1", Male, 1),
        (2, "1", Male, 0),
        (3, "1", Female, 1),
        (4, "1", Female, 0),
        (5, "2", Male, 1),
        (6, "2", Male, 0),
        (7, "2", Female, 1),
        (8, "2", Female, 0),
    ]);
    let test = dataset(&[
        (9, "1", Male, 1),
        (10, "1", Female, 0),
        (11, "2", Male, 0),
        (12, "2", Female, 1),
    ]);
    FixtureProvider { train, test }
}

fn config(seed: u64, cache_dir: PathBuf, submissions: Vec<String>) -> EvalConfig {
    EvalConfig {
        evaluation: EvaluationSection {
            seed,
            n_folds: 5,
            parallel_folds: false,
            cache_dir,
            submissions,
        },
        data: DataSection {
            train: PathBuf::from("unused.csv"),
            test: PathBuf::from("unused.csv"),
        },
    }
}

#[test]
fn full_run_with_always_positive_baseline() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ResultCache::open(dir.path()).unwrap();
    let config = config(
        42,
        dir.path().to_path_buf(),
        vec!["constant_positive".to_string()],
    );
    let registry = SubmissionRegistry::with_baselines();
    let provider = fixture_provider();

    let report = run_evaluation(&config, &provider, &registry, &cache).unwrap();
    assert!(!report.from_cache);
    assert_eq!(report.seed, 42);
    assert_eq!(report.n_folds, 5);
    assert_eq!(report.table.rows().len(), 3);

    // The carved test set holds one subject per grid combination, so
    // each sex stratum has two positives and two negatives. An
    // always-positive classifier converts those to TP=2, FP=2.
    for category in [Category::Male, Category::Female] {
        let row = report.table.get("constant_positive", category).unwrap();
        assert_eq!(row.folds.len(), 5);
        for record in &row.folds {
            assert_eq!(record.true_positive, 2);
            assert_eq!(record.false_positive, 2);
            assert_eq!(record.false_negative, 0);
            assert_eq!(record.true_negative, 0);
            assert!((record.auc - 0.5).abs() < 1e-9);
        }
    }
    let overall = report.table.get("constant_positive", Category::Overall).unwrap();
    assert_eq!(overall.folds[0].true_positive, 4);
    assert_eq!(overall.folds[0].false_positive, 4);

    // Identical per-sex behavior: no accuracy gap, no TPR gap.
    assert_eq!(report.accuracy_gap.len(), 5);
    for gap in &report.accuracy_gap {
        assert_eq!(gap.gap, 0.0);
        assert_eq!(gap.sign, 0);
    }
    for point in &report.equal_opportunity.points {
        assert!(point.value.abs() < 1e-9);
    }
    // 2 sexes × 5 folds.
    assert_eq!(report.auc_roc.points.len(), 10);
    assert_eq!(report.general_accuracy.points.len(), 10);
    for point in &report.general_accuracy.points {
        assert!((point.value - 50.0).abs() < 1e-9);
    }
}

#[test]
fn second_run_with_same_seed_replays_the_cache() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ResultCache::open(dir.path()).unwrap();
    let config = config(
        7,
        dir.path().to_path_buf(),
        vec!["constant_positive".to_string(), "majority_class".to_string()],
    );
    let registry = SubmissionRegistry::with_baselines();
    let provider = fixture_provider();

    let first = run_evaluation(&config, &provider, &registry, &cache).unwrap();
    assert!(!first.from_cache);
    assert!(cache.contains(7));

    let second = run_evaluation(&config, &provider, &registry, &cache).unwrap();
    assert!(second.from_cache);
    assert_eq!(first.table, second.table);
    assert_eq!(first.auc_roc, second.auc_roc);
    assert_eq!(first.accuracy_gap, second.accuracy_gap);
}

#[test]
fn distinct_seeds_use_distinct_cache_entries() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ResultCache::open(dir.path()).unwrap();
    let registry = SubmissionRegistry::with_baselines();
    let provider = fixture_provider();

    let roster = vec!["constant_positive".to_string()];
    let a = config(1, dir.path().to_path_buf(), roster.clone());
    let b = config(2, dir.path().to_path_buf(), roster);

    let first = run_evaluation(&a, &provider, &registry, &cache).unwrap();
    let second = run_evaluation(&b, &provider, &registry, &cache).unwrap();
    assert!(!first.from_cache);
    assert!(!second.from_cache);
    assert_eq!(cache.stored_seeds().unwrap(), vec![1, 2]);
}

#[test]
fn unregistered_submission_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ResultCache::open(dir.path()).unwrap();
    let config = config(3, dir.path().to_path_buf(), vec!["mystery".to_string()]);
    let registry = SubmissionRegistry::with_baselines();
    let provider = fixture_provider();

    let err = run_evaluation(&config, &provider, &registry, &cache).unwrap_err();
    match err {
        RunError::UnknownSubmission(name) => assert_eq!(name, "mystery"),
        other => panic!("expected UnknownSubmission, got {other:?}"),
    }
}

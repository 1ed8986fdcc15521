//! Fold trainer — cross-validated fitting against the frozen test set.
//!
//! For each planned fold, a fresh pipeline is fit on the fold's training
//! rows (a subset of the training partition) and then predicts on the
//! entire frozen external test set, never on the fold's held-out rows.
//! Keeping the prediction target fixed means later fairness and accuracy
//! comparisons across folds and submissions score identical ground
//! truth, so the variance observed is the trained model's, not the
//! sampled subjects'.

use rand::rngs::StdRng;
use rayon::prelude::*;
use thiserror::Error;

use crate::domain::{Dataset, Label};
use crate::folds::{stratified_folds, Fold, FoldError};
use crate::submission::{SubmissionError, SubmissionFactory};

/// Errors from fold training. Submission failures propagate as fatal;
/// the orchestrator neither retries nor skips.
#[derive(Debug, Error)]
pub enum TrainError {
    #[error("training labels have {labels} entries but training partition has {rows} rows")]
    LabelLengthMismatch { labels: usize, rows: usize },
    #[error(transparent)]
    Folds(#[from] FoldError),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

/// Options controlling fold training.
#[derive(Debug, Clone)]
pub struct TrainOptions {
    /// Number of stratified folds (k).
    pub n_folds: usize,
    /// Fan folds out across the rayon pool. Fold membership is planned
    /// before fan-out, so this cannot perturb determinism.
    pub parallel: bool,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            n_folds: 5,
            parallel: false,
        }
    }
}

/// Round a raw prediction to a {0,1} label.
pub fn round_prediction(raw: f64) -> Label {
    raw.round().clamp(0.0, 1.0) as Label
}

/// Train `k` differently-fit instances of one submission and collect
/// their rounded predictions over the frozen test set.
///
/// Returns one prediction vector per fold, in fold order, each of length
/// `test_data.len()`.
pub fn train_folds(
    train_data: &Dataset,
    train_labels: &[Label],
    test_data: &Dataset,
    factory: &dyn SubmissionFactory,
    rng: &mut StdRng,
    options: &TrainOptions,
) -> Result<Vec<Vec<Label>>, TrainError> {
    if train_labels.len() != train_data.len() {
        return Err(TrainError::LabelLengthMismatch {
            labels: train_labels.len(),
            rows: train_data.len(),
        });
    }

    let plan = stratified_folds(train_labels, options.n_folds, rng)?;

    let run_fold = |fold: &Fold| -> Result<Vec<Label>, TrainError> {
        let fold_data = train_data.subset(&fold.train_rows);
        let fold_labels: Vec<Label> = fold.train_rows.iter().map(|&i| train_labels[i]).collect();

        let mut pipeline = factory.build();
        pipeline.fit(&fold_data, &fold_labels)?;
        let raw = pipeline.predict(test_data)?;
        Ok(raw.into_iter().map(round_prediction).collect())
    };

    if options.parallel {
        plan.par_iter().map(run_fold).collect()
    } else {
        plan.iter().map(run_fold).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Sex;
    use crate::submission::baseline::ConstantBaseline;
    use rand::SeedableRng;

    fn dataset(n: usize) -> Dataset {
        Dataset::new(
            (0..n as u64).collect(),
            vec!["1".into(); n],
            vec![Sex::Male; n],
            vec![vec![0.0]; n],
        )
        .unwrap()
    }

    #[test]
    fn one_prediction_vector_per_fold_sized_to_test_set() {
        let train = dataset(10);
        let train_labels = vec![0, 1, 0, 1, 0, 1, 0, 1, 0, 1];
        let test = dataset(7);
        let factory = ConstantBaseline::positive();

        let mut rng = StdRng::seed_from_u64(42);
        let predictions = train_folds(
            &train,
            &train_labels,
            &test,
            &factory,
            &mut rng,
            &TrainOptions::default(),
        )
        .unwrap();

        assert_eq!(predictions.len(), 5);
        for fold_preds in &predictions {
            assert_eq!(fold_preds.len(), 7);
            assert!(fold_preds.iter().all(|&p| p == 1));
        }
    }

    #[test]
    fn tiny_training_partition_still_yields_k_folds() {
        // 4 training subjects, k = 5: folds with an empty hold-out fit
        // on everything and still predict the full test set.
        let train = dataset(4);
        let train_labels = vec![0, 1, 0, 1];
        let test = dataset(8);
        let factory = ConstantBaseline::positive();

        let mut rng = StdRng::seed_from_u64(42);
        let predictions = train_folds(
            &train,
            &train_labels,
            &test,
            &factory,
            &mut rng,
            &TrainOptions::default(),
        )
        .unwrap();

        assert_eq!(predictions.len(), 5);
        for fold_preds in &predictions {
            assert_eq!(fold_preds, &vec![1u8; 8]);
        }
    }

    #[test]
    fn parallel_matches_sequential() {
        let train = dataset(12);
        let train_labels = vec![0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1];
        let test = dataset(5);
        let factory = ConstantBaseline::negative();

        let sequential = train_folds(
            &train,
            &train_labels,
            &test,
            &factory,
            &mut StdRng::seed_from_u64(9),
            &TrainOptions {
                n_folds: 5,
                parallel: false,
            },
        )
        .unwrap();
        let parallel = train_folds(
            &train,
            &train_labels,
            &test,
            &factory,
            &mut StdRng::seed_from_u64(9),
            &TrainOptions {
                n_folds: 5,
                parallel: true,
            },
        )
        .unwrap();

        assert_eq!(sequential, parallel);
    }

    #[test]
    fn label_length_mismatch_is_fatal() {
        let train = dataset(4);
        let factory = ConstantBaseline::positive();
        let err = train_folds(
            &train,
            &[0, 1],
            &dataset(2),
            &factory,
            &mut StdRng::seed_from_u64(0),
            &TrainOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, TrainError::LabelLengthMismatch { .. }));
    }

    #[test]
    fn rounding_thresholds_raw_scores() {
        assert_eq!(round_prediction(0.4), 0);
        assert_eq!(round_prediction(0.5), 1);
        assert_eq!(round_prediction(0.9), 1);
        assert_eq!(round_prediction(1.4), 1);
        assert_eq!(round_prediction(-0.2), 0);
    }
}

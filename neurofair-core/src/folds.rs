//! Label-stratified k-fold planning over the training partition.
//!
//! Each class's row indices are shuffled with the run's fold generator,
//! then dealt into k hold-out chunks whose sizes differ by at most one.
//! A fold trains on everything outside its hold-out chunk. Fold
//! membership is fixed before any training starts, so the trainer can
//! fan folds out to worker threads without touching the RNG.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use thiserror::Error;

use crate::domain::Label;

/// Errors from fold planning.
#[derive(Debug, Error)]
pub enum FoldError {
    #[error("fold count must be at least 2, got {0}")]
    TooFewFolds(usize),
}

/// One cross-validation fold: row indices (into the training partition)
/// to fit on, and the held-out chunk that was excluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub fold_index: usize,
    /// Rows to fit the pipeline on, ascending.
    pub train_rows: Vec<usize>,
    /// Rows withheld from fitting, ascending. May be empty when the
    /// training partition has fewer rows than there are folds; such a
    /// fold fits on the full partition.
    pub holdout_rows: Vec<usize>,
}

/// Plan `k` label-stratified shuffled folds over `labels`.
///
/// Every class present in `labels` is spread across the hold-out chunks
/// as evenly as possible, earlier folds receiving the remainder. The
/// hold-out chunks partition the row set exactly (when rows >= k).
pub fn stratified_folds(
    labels: &[Label],
    k: usize,
    rng: &mut StdRng,
) -> Result<Vec<Fold>, FoldError> {
    if k < 2 {
        return Err(FoldError::TooFewFolds(k));
    }

    let classes: std::collections::BTreeSet<Label> = labels.iter().copied().collect();

    let mut holdouts: Vec<Vec<usize>> = vec![Vec::new(); k];
    for class in classes {
        let mut members: Vec<usize> = (0..labels.len()).filter(|&i| labels[i] == class).collect();
        members.shuffle(rng);

        let base = members.len() / k;
        let remainder = members.len() % k;
        let mut cursor = 0;
        for (fold, holdout) in holdouts.iter_mut().enumerate() {
            let take = base + usize::from(fold < remainder);
            holdout.extend(&members[cursor..cursor + take]);
            cursor += take;
        }
    }

    let folds = holdouts
        .into_iter()
        .enumerate()
        .map(|(fold_index, mut holdout_rows)| {
            holdout_rows.sort_unstable();
            let mut withheld = vec![false; labels.len()];
            for &i in &holdout_rows {
                withheld[i] = true;
            }
            let train_rows: Vec<usize> = (0..labels.len()).filter(|&i| !withheld[i]).collect();
            Fold {
                fold_index,
                train_rows,
                holdout_rows,
            }
        })
        .collect();

    Ok(folds)
}

//! NeuroFair Core — fairness-aware evaluation primitives.
//!
//! This crate contains the heart of the evaluation pipeline:
//! - Domain types (datasets, labels, sex partitions)
//! - Stratified test-set carving over (site × sex × label) combinations
//! - Label-stratified k-fold planning
//! - Fold training against a frozen external test set
//! - Per-sex confusion statistics and ROC-AUC
//! - The submission contract (feature extractor + classifier pipeline)
//!   with an explicit named registry
//! - A BLAKE3-based deterministic seed hierarchy

pub mod confusion;
pub mod domain;
pub mod folds;
pub mod rng;
pub mod split;
pub mod submission;
pub mod trainer;

pub use confusion::{fold_statistics, roc_auc, Category, ConfusionError, ConfusionRecord, FoldStatistics};
pub use domain::{
    merge_datasets, Dataset, DomainError, FeatureMatrix, FeatureRow, Label, Sex, SexPartition,
    SubjectId,
};
pub use folds::{stratified_folds, Fold, FoldError};
pub use rng::SeedHierarchy;
pub use split::{carve_test_set, SplitAssignment, SplitError};
pub use submission::{
    Classifier, FeatureExtractor, Pipeline, SubmissionError, SubmissionFactory, SubmissionRegistry,
};
pub use trainer::{train_folds, TrainError, TrainOptions};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: the types handed across the runner boundary
    /// are Send + Sync, so the fold trainer's rayon fan-out stays legal.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<Dataset>();
        require_sync::<Dataset>();
        require_send::<SexPartition>();
        require_sync::<SexPartition>();
        require_send::<SplitAssignment>();
        require_sync::<SplitAssignment>();
        require_send::<Fold>();
        require_sync::<Fold>();
        require_send::<ConfusionRecord>();
        require_sync::<ConfusionRecord>();
        require_send::<FoldStatistics>();
        require_sync::<FoldStatistics>();
        require_send::<SeedHierarchy>();
        require_sync::<SeedHierarchy>();
        require_send::<TrainOptions>();
        require_sync::<TrainOptions>();
        require_send::<TrainError>();
    }
}

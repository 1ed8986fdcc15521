//! Submission contract — feature extractor and classifier traits, the
//! two-stage pipeline, and the named factory registry.
//!
//! Submissions are opaque, externally supplied models. The core only
//! holds a factory per roster name and instantiates a fresh pipeline for
//! every fold; nothing is shared between folds or between submissions.
//! Known submissions are registered explicitly against their name rather
//! than resolved from module path strings.

pub mod baseline;

use std::collections::BTreeMap;

use thiserror::Error;

use crate::domain::{Dataset, FeatureMatrix, Label};

/// Errors raised by submission code. All are fatal for the run.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("feature extractor fit failed: {0}")]
    ExtractorFit(String),
    #[error("feature transform failed: {0}")]
    Transform(String),
    #[error("classifier fit failed: {0}")]
    ClassifierFit(String),
    #[error("prediction failed: {0}")]
    Predict(String),
    #[error("submission data unavailable: {0}")]
    DataUnavailable(String),
}

/// First pipeline stage: learns a transform from the training rows and
/// maps a dataset's opaque payload into a feature matrix.
pub trait FeatureExtractor: Send {
    fn fit(&mut self, data: &Dataset, labels: &[Label]) -> Result<(), SubmissionError>;
    fn transform(&self, data: &Dataset) -> Result<FeatureMatrix, SubmissionError>;
}

/// Second pipeline stage: fits on extracted features and emits one
/// numeric prediction per row. Predictions are thresholded to {0,1} by
/// the fold trainer, not here.
pub trait Classifier: Send {
    fn fit(&mut self, features: &FeatureMatrix, labels: &[Label]) -> Result<(), SubmissionError>;
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>, SubmissionError>;
}

/// Two-stage pipeline: FeatureExtractor → Classifier.
pub struct Pipeline {
    extractor: Box<dyn FeatureExtractor>,
    classifier: Box<dyn Classifier>,
}

impl Pipeline {
    pub fn new(extractor: Box<dyn FeatureExtractor>, classifier: Box<dyn Classifier>) -> Self {
        Self {
            extractor,
            classifier,
        }
    }

    /// Fit both stages on the given rows: the extractor first, then the
    /// classifier on the extracted features.
    pub fn fit(&mut self, data: &Dataset, labels: &[Label]) -> Result<(), SubmissionError> {
        self.extractor.fit(data, labels)?;
        let features = self.extractor.transform(data)?;
        self.classifier.fit(&features, labels)
    }

    /// Predict raw numeric scores for every row of `data`.
    pub fn predict(&self, data: &Dataset) -> Result<Vec<f64>, SubmissionError> {
        let features = self.extractor.transform(data)?;
        self.classifier.predict(&features)
    }
}

/// Named constructor for a submission's pipeline.
///
/// `build` must return a fresh, unfitted pipeline on every call: one
/// instance per fold. `ensure_data` is the external availability
/// check/fetch hook invoked once before a submission trains; the default
/// assumes the payload shipped with the dataset.
pub trait SubmissionFactory: Send + Sync {
    fn name(&self) -> &str;

    fn ensure_data(&self) -> Result<(), SubmissionError> {
        Ok(())
    }

    fn build(&self) -> Pipeline;
}

/// Explicit name → factory map for the roster.
#[derive(Default)]
pub struct SubmissionRegistry {
    factories: BTreeMap<String, Box<dyn SubmissionFactory>>,
}

impl SubmissionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the builtin baseline submissions.
    pub fn with_baselines() -> Self {
        let mut registry = Self::new();
        for factory in baseline::baseline_factories() {
            registry.register(factory);
        }
        registry
    }

    /// Register a factory under its own name, replacing any previous
    /// registration for that name.
    pub fn register(&mut self, factory: Box<dyn SubmissionFactory>) {
        self.factories.insert(factory.name().to_string(), factory);
    }

    pub fn get(&self, name: &str) -> Option<&dyn SubmissionFactory> {
        self.factories.get(name).map(|f| f.as_ref())
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

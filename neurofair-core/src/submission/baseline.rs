//! Builtin baseline submissions.
//!
//! These are not models: they exist so the roster, CLI, and tests have
//! runnable submissions with fully predictable output. Real submissions
//! register their own factories against the registry.

use super::{Classifier, FeatureExtractor, Pipeline, SubmissionError, SubmissionFactory};
use crate::domain::{Dataset, FeatureMatrix, Label};

/// Extractor that forwards the opaque payload rows unchanged.
pub struct PassthroughExtractor;

impl FeatureExtractor for PassthroughExtractor {
    fn fit(&mut self, _data: &Dataset, _labels: &[Label]) -> Result<(), SubmissionError> {
        Ok(())
    }

    fn transform(&self, data: &Dataset) -> Result<FeatureMatrix, SubmissionError> {
        Ok(data.features().to_vec())
    }
}

/// Classifier that predicts a fixed value for every row.
pub struct ConstantClassifier {
    value: f64,
    fitted: bool,
}

impl ConstantClassifier {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            fitted: false,
        }
    }
}

impl Classifier for ConstantClassifier {
    fn fit(&mut self, _features: &FeatureMatrix, _labels: &[Label]) -> Result<(), SubmissionError> {
        self.fitted = true;
        Ok(())
    }

    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>, SubmissionError> {
        if !self.fitted {
            return Err(SubmissionError::Predict(
                "constant classifier used before fit".into(),
            ));
        }
        Ok(vec![self.value; features.len()])
    }
}

/// Classifier that predicts the majority training label for every row.
pub struct MajorityClassifier {
    majority: Option<Label>,
}

impl MajorityClassifier {
    pub fn new() -> Self {
        Self { majority: None }
    }
}

impl Default for MajorityClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for MajorityClassifier {
    fn fit(&mut self, _features: &FeatureMatrix, labels: &[Label]) -> Result<(), SubmissionError> {
        if labels.is_empty() {
            return Err(SubmissionError::ClassifierFit(
                "cannot fit majority classifier on zero rows".into(),
            ));
        }
        let positives = labels.iter().filter(|&&l| l == 1).count();
        // Ties go to the positive class.
        self.majority = Some(u8::from(positives * 2 >= labels.len()));
        Ok(())
    }

    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>, SubmissionError> {
        let majority = self.majority.ok_or_else(|| {
            SubmissionError::Predict("majority classifier used before fit".into())
        })?;
        Ok(vec![f64::from(majority); features.len()])
    }
}

/// Factory for the constant-prediction baselines.
pub struct ConstantBaseline {
    name: &'static str,
    value: f64,
}

impl ConstantBaseline {
    /// Always predicts 1.
    pub fn positive() -> Self {
        Self {
            name: "constant_positive",
            value: 1.0,
        }
    }

    /// Always predicts 0.
    pub fn negative() -> Self {
        Self {
            name: "constant_negative",
            value: 0.0,
        }
    }
}

impl SubmissionFactory for ConstantBaseline {
    fn name(&self) -> &str {
        self.name
    }

    fn build(&self) -> Pipeline {
        Pipeline::new(
            Box::new(PassthroughExtractor),
            Box::new(ConstantClassifier::new(self.value)),
        )
    }
}

/// Factory for the majority-class baseline.
pub struct MajorityBaseline;

impl SubmissionFactory for MajorityBaseline {
    fn name(&self) -> &str {
        "majority_class"
    }

    fn build(&self) -> Pipeline {
        Pipeline::new(
            Box::new(PassthroughExtractor),
            Box::new(MajorityClassifier::new()),
        )
    }
}

/// All builtin baseline factories.
pub fn baseline_factories() -> Vec<Box<dyn SubmissionFactory>> {
    vec![
        Box::new(ConstantBaseline::positive()),
        Box::new(ConstantBaseline::negative()),
        Box::new(MajorityBaseline),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Sex;

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
    fn majority_picks_dominant_class() {
        let data = dataset(5);
        let mut clf = MajorityClassifier::new();
        let features = data.features().to_vec();
        clf.fit(&features, &[0, 0, 0, 1, 1]).unwrap();
        assert_eq!(clf.predict(&features).unwrap(), vec![0.0; 5]);

        clf.fit(&features, &[1, 1, 1, 0, 0]).unwrap();
        assert_eq!(clf.predict(&features).unwrap(), vec![1.0; 5]);
    }

    #[test]
    fn majority_tie_goes_positive() {
        let data = dataset(4);
        let features = data.features().to_vec();
        let mut clf = MajorityClassifier::new();
        clf.fit(&features, &[0, 0, 1, 1]).unwrap();
        assert_eq!(clf.predict(&features).unwrap(), vec![1.0; 4]);
    }

    #[test]
    fn majority_rejects_empty_fit() {
        let mut clf = MajorityClassifier::new();
        assert!(clf.fit(&Vec::new(), &[]).is_err());
    }

    #[test]
    fn constant_negative_predicts_zero() {
        let data = dataset(3);
        let mut pipe = ConstantBaseline::negative().build();
        pipe.fit(&data, &[0, 1, 0]).unwrap();
        assert_eq!(pipe.predict(&data).unwrap(), vec![0.0; 3]);
    }
}

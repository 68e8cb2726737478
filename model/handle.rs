//! The capability contract every loaded model satisfies.
//!
//! The prediction path only ever sees a `dyn Classifier`: an expected input
//! width (optional), a label predictor, and optionally a class-probability
//! predictor. Handles are loaded once and shared read-only, so the trait
//! requires `Send + Sync` and exposes no mutation.

use super::artifact::{ModelError, TrainedModel};
use ndarray::{Array1, ArrayView1};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Failures raised inside a single inference call.
#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("X has {found} features, but the estimator is expecting {expected} features as input")]
    DimensionMismatch { found: usize, expected: usize },
    #[error("Estimator produced a non-finite decision value")]
    NonFiniteDecision,
    #[error("predict_proba returned {classes} class column(s); no positive-class probability")]
    MissingPositiveClass { classes: usize },
    #[error("Decision selected class index {index} but only {classes} class label(s) are defined")]
    MissingClassLabel { index: usize, classes: usize },
}

pub trait Classifier: Send + Sync {
    /// Short type name of the final estimator.
    fn kind(&self) -> &str;

    /// Input width the model was fitted on, when the model declares one.
    fn n_features_in(&self) -> Option<usize>;

    /// Column names seen during fitting, when recorded.
    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    /// Processing steps in application order.
    fn steps(&self) -> Vec<String> {
        vec![self.kind().to_string()]
    }

    /// Class label for one sample.
    fn predict(&self, x: ArrayView1<f64>) -> Result<i64, InferenceError>;

    /// Per-class probabilities for one sample, or `None` when the model has no
    /// probability capability.
    fn predict_proba(&self, x: ArrayView1<f64>) -> Option<Result<Array1<f64>, InferenceError>>;
}

/// Loads a model artifact from disk into a shareable handle.
pub fn load_classifier(path: &Path) -> Result<Arc<dyn Classifier>, ModelError> {
    let model = TrainedModel::load(path)?;
    Ok(Arc::new(model))
}

/// Human-readable description of a loaded model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSummary {
    pub kind: String,
    pub n_features_in: Option<usize>,
    pub feature_names: Option<Vec<String>>,
    pub steps: Vec<String>,
}

impl ModelSummary {
    pub fn of(model: &dyn Classifier) -> Self {
        Self {
            kind: model.kind().to_string(),
            n_features_in: model.n_features_in(),
            feature_names: model.feature_names().map(<[String]>::to_vec),
            steps: model.steps(),
        }
    }
}

impl fmt::Display for ModelSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Model type: {}", self.kind)?;
        match self.n_features_in {
            Some(n) => writeln!(f, "n_features_in: {n}")?,
            None => writeln!(f, "n_features_in: None")?,
        }
        match &self.feature_names {
            Some(names) => writeln!(f, "feature_names: {}", names.join(", "))?,
            None => writeln!(f, "feature_names: None")?,
        }
        write!(f, "Pipeline steps: {}", self.steps.join(" -> "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Stub;

    impl Classifier for Stub {
        fn kind(&self) -> &str {
            "stub"
        }

        fn n_features_in(&self) -> Option<usize> {
            None
        }

        fn predict(&self, _: ArrayView1<f64>) -> Result<i64, InferenceError> {
            Ok(0)
        }

        fn predict_proba(&self, _: ArrayView1<f64>) -> Option<Result<Array1<f64>, InferenceError>> {
            None
        }
    }

    #[test]
    fn summary_uses_trait_defaults() {
        let summary = ModelSummary::of(&Stub);
        assert_eq!(summary.kind, "stub");
        assert_eq!(summary.n_features_in, None);
        assert_eq!(summary.steps, vec!["stub"]);

        let rendered = summary.to_string();
        assert!(rendered.contains("Model type: stub"));
        assert!(rendered.contains("n_features_in: None"));
        assert!(rendered.ends_with("Pipeline steps: stub"));
    }

    #[test]
    fn load_reports_missing_artifact() {
        let err = match load_classifier(Path::new("no_such_model.toml")) {
            Err(e) => e,
            Ok(_) => panic!("Expected a load failure"),
        };
        assert!(matches!(err, ModelError::NotFound(_)));
    }
}

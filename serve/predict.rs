//! # Prediction Service
//!
//! Orchestrates one inference request end to end: normalize the raw record,
//! check the vector width against what the model declares, then ask the model
//! for a probability and a label.
//!
//! The service owns the only persistent state in the system, the loaded model
//! handle. It is immutable after construction and cloning the service only
//! bumps a reference count, so one instance is shared by every request.

use crate::features::{FeatureVector, InputRecord, feature_order, normalize};
use crate::model::{Classifier, InferenceError, ModelError, ModelSummary, load_classifier};
use log::{debug, warn};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Diagnostic metadata returned with every prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionMetadata {
    pub used_order: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub prediction: i64,
    pub probability: f64,
    pub raw: PredictionMetadata,
}

#[derive(Error, Debug)]
pub enum PredictError {
    #[error("Input vector has {actual} features but model expects {expected}")]
    ShapeMismatch { actual: usize, expected: usize },
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

#[derive(Clone)]
pub struct PredictionService {
    model: Arc<dyn Classifier>,
}

impl PredictionService {
    pub fn new(model: Arc<dyn Classifier>) -> Self {
        if let Some(names) = model.feature_names() {
            let canonical = feature_order();
            if names.iter().map(String::as_str).ne(canonical.iter().copied()) {
                warn!(
                    "Model feature names {:?} differ from the canonical order {:?}; vectors are passed positionally",
                    names, canonical
                );
            }
        }
        Self { model }
    }

    /// Reads the model artifact at `path`. Any failure here is fatal to startup.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        Ok(Self::new(load_classifier(path)?))
    }

    pub fn summary(&self) -> ModelSummary {
        ModelSummary::of(self.model.as_ref())
    }

    pub fn predict(&self, record: &InputRecord) -> Result<PredictionResult, PredictError> {
        let vector = normalize(record);
        self.predict_vector(&vector)
    }

    pub fn predict_vector(&self, vector: &FeatureVector) -> Result<PredictionResult, PredictError> {
        let actual = vector.as_slice().len();
        if let Some(expected) = self.model.n_features_in() {
            if expected != actual {
                return Err(PredictError::ShapeMismatch { actual, expected });
            }
        }

        let x = vector.view();
        let probability = match self.model.predict_proba(x) {
            Some(probabilities) => positive_class(&probabilities?)?,
            None => self.model.predict(x)? as f64,
        };
        // The label comes from its own inference call even when a probability
        // is already available.
        let prediction = self.model.predict(x)?;

        debug!("Predicted label {prediction} with probability {probability:.4}");
        Ok(PredictionResult {
            prediction,
            probability,
            raw: PredictionMetadata {
                used_order: feature_order().iter().map(|s| s.to_string()).collect(),
            },
        })
    }
}

fn positive_class(probabilities: &Array1<f64>) -> Result<f64, InferenceError> {
    probabilities
        .get(1)
        .copied()
        .ok_or(InferenceError::MissingPositiveClass {
            classes: probabilities.len(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FEATURE_COUNT;
    use approx::assert_abs_diff_eq;
    use ndarray::{ArrayView1, array};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted classifier that records how often each capability was used.
    struct Scripted {
        width: Option<usize>,
        proba: Option<Vec<f64>>,
        label: i64,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(width: Option<usize>, proba: Option<Vec<f64>>, label: i64) -> Arc<Self> {
            Arc::new(Self {
                width,
                proba,
                label,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl Classifier for Scripted {
        fn kind(&self) -> &str {
            "scripted"
        }

        fn n_features_in(&self) -> Option<usize> {
            self.width
        }

        fn predict(&self, _: ArrayView1<f64>) -> Result<i64, InferenceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.label)
        }

        fn predict_proba(&self, _: ArrayView1<f64>) -> Option<Result<Array1<f64>, InferenceError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.proba.clone().map(|p| Ok(Array1::from_vec(p)))
        }
    }

    #[test]
    fn probability_comes_from_second_class_column() {
        let model = Scripted::new(Some(14), Some(vec![0.2, 0.8]), 1);
        let service = PredictionService::new(model.clone());
        let result = service.predict(&InputRecord::new()).unwrap();
        assert_eq!(result.prediction, 1);
        assert_abs_diff_eq!(result.probability, 0.8);
        assert_eq!(result.raw.used_order.len(), FEATURE_COUNT);
        assert_eq!(result.raw.used_order[3], "cp");
        assert_eq!(model.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn label_only_models_report_label_as_probability() {
        let model = Scripted::new(None, None, 1);
        let service = PredictionService::new(model.clone());
        let result = service.predict(&InputRecord::new()).unwrap();
        assert_eq!(result.prediction, 1);
        assert_abs_diff_eq!(result.probability, 1.0);
        // proba probe, label fallback, label
        assert_eq!(model.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn shape_mismatch_never_reaches_the_model() {
        let model = Scripted::new(Some(13), Some(vec![0.5, 0.5]), 0);
        let service = PredictionService::new(model.clone());
        let err = service.predict(&InputRecord::new()).unwrap_err();
        match err {
            PredictError::ShapeMismatch { actual, expected } => {
                assert_eq!(actual, 14);
                assert_eq!(expected, 13);
            }
            other => panic!("Expected ShapeMismatch, got {:?}", other),
        }
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            service.predict(&InputRecord::new()).unwrap_err().to_string(),
            "Input vector has 14 features but model expects 13"
        );
    }

    #[test]
    fn single_column_probabilities_are_an_inference_error() {
        let model = Scripted::new(None, Some(vec![1.0]), 0);
        let service = PredictionService::new(model);
        let err = service.predict(&InputRecord::new()).unwrap_err();
        assert!(matches!(
            err,
            PredictError::Inference(InferenceError::MissingPositiveClass { classes: 1 })
        ));
    }

    #[test]
    fn positive_class_reads_index_one() {
        assert_abs_diff_eq!(positive_class(&array![0.3, 0.7]).unwrap(), 0.7);
    }
}

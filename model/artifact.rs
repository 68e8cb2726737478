use super::handle::{Classifier, InferenceError};
use ndarray::{Array1, ArrayView1, array};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

// A model artifact is a TOML document with three tables: `[config]`, an
// optional `[scaler]` and a `[estimator]` tagged by `kind`. Parameters are
// plain arrays so an exported pipeline can be written by any tool.

fn default_classes() -> Vec<i64> {
    vec![0, 1]
}

/// Structural metadata recorded alongside the fitted parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Expected input width. When omitted it is taken from the coefficient count.
    #[serde(default)]
    pub n_features_in: Option<usize>,
    /// Column names seen during fitting, in fitting order.
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
    /// Class labels; `predict` returns `classes[1]` for a positive decision.
    #[serde(default = "default_classes")]
    pub classes: Vec<i64>,
}

/// Per-column standardization applied before the estimator: `(x - mean) / scale`.
#[derive(Debug, Clone, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// The final estimator of the pipeline.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Estimator {
    /// Logistic regression. Provides both labels and class probabilities.
    LogisticRegression { coefficients: Vec<f64>, intercept: f64 },
    /// Linear support vector classifier. Provides labels only.
    LinearSvc { coefficients: Vec<f64>, intercept: f64 },
}

impl Estimator {
    pub fn kind(&self) -> &'static str {
        match self {
            Estimator::LogisticRegression { .. } => "logistic_regression",
            Estimator::LinearSvc { .. } => "linear_svc",
        }
    }

    fn linear_terms(&self) -> (&[f64], f64) {
        match self {
            Estimator::LogisticRegression {
                coefficients,
                intercept,
            }
            | Estimator::LinearSvc {
                coefficients,
                intercept,
            } => (coefficients.as_slice(), *intercept),
        }
    }
}

/// A fitted scaler-plus-estimator pipeline as read from disk.
#[derive(Debug, Clone, Deserialize)]
pub struct TrainedModel {
    pub config: ModelConfig,
    #[serde(default)]
    pub scaler: Option<StandardScaler>,
    pub estimator: Estimator,
}

/// Custom error type for model loading and saving.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Model file not found at {}", .0.display())]
    NotFound(PathBuf),
    #[error("Failed to read or write model file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML model file: {0}")]
    TomlParseError(#[from] toml::de::Error),
    #[error("Model artifact is inconsistent: {0}")]
    InvalidArtifact(String),
}

impl TrainedModel {
    /// Loads and validates a trained model from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        if !path.exists() {
            return Err(ModelError::NotFound(path.to_path_buf()));
        }
        let toml_string = fs::read_to_string(path)?;
        let model: TrainedModel = toml::from_str(&toml_string)?;
        model.validate()?;
        Ok(model)
    }

    /// Checks that every stored vector agrees on the input width and that all
    /// parameters are usable for inference.
    pub fn validate(&self) -> Result<(), ModelError> {
        let (coefficients, intercept) = self.estimator.linear_terms();
        let width = coefficients.len();

        if width == 0 {
            return Err(invalid("estimator has no coefficients"));
        }
        if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return Err(invalid("estimator parameters must be finite"));
        }
        if let Some(declared) = self.config.n_features_in {
            if declared != width {
                return Err(invalid(format!(
                    "n_features_in is {declared} but the estimator has {width} coefficients"
                )));
            }
        }
        if let Some(names) = &self.config.feature_names {
            if names.len() != width {
                return Err(invalid(format!(
                    "{} feature names given for {width} coefficients",
                    names.len()
                )));
            }
        }
        if self.config.classes.len() != 2 {
            return Err(invalid(format!(
                "binary classifier needs exactly 2 classes, found {}",
                self.config.classes.len()
            )));
        }
        if let Some(scaler) = &self.scaler {
            if scaler.mean.len() != width || scaler.scale.len() != width {
                return Err(invalid(format!(
                    "scaler has {} means and {} scales for {width} coefficients",
                    scaler.mean.len(),
                    scaler.scale.len()
                )));
            }
            if scaler
                .scale
                .iter()
                .chain(&scaler.mean)
                .any(|v| !v.is_finite())
                || scaler.scale.contains(&0.0)
            {
                return Err(invalid("scaler values must be finite with non-zero scales"));
            }
        }
        Ok(())
    }

    /// Signed distance to the decision boundary for one sample.
    fn decision_function(&self, x: ArrayView1<f64>) -> Result<f64, InferenceError> {
        let (coefficients, intercept) = self.estimator.linear_terms();
        if x.len() != coefficients.len() {
            return Err(InferenceError::DimensionMismatch {
                found: x.len(),
                expected: coefficients.len(),
            });
        }
        let coef = ArrayView1::from(coefficients);
        let eta = match &self.scaler {
            Some(scaler) => {
                let mean = ArrayView1::from(scaler.mean.as_slice());
                let scale = ArrayView1::from(scaler.scale.as_slice());
                let scaled = (&x - &mean) / &scale;
                coef.dot(&scaled) + intercept
            }
            None => coef.dot(&x) + intercept,
        };
        if !eta.is_finite() {
            return Err(InferenceError::NonFiniteDecision);
        }
        Ok(eta)
    }
}

fn invalid(message: impl Into<String>) -> ModelError {
    ModelError::InvalidArtifact(message.into())
}

impl Classifier for TrainedModel {
    fn kind(&self) -> &str {
        self.estimator.kind()
    }

    fn n_features_in(&self) -> Option<usize> {
        Some(
            self.config
                .n_features_in
                .unwrap_or_else(|| self.estimator.linear_terms().0.len()),
        )
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.config.feature_names.as_deref()
    }

    fn steps(&self) -> Vec<String> {
        let mut steps = Vec::with_capacity(2);
        if self.scaler.is_some() {
            steps.push("standard_scaler".to_string());
        }
        steps.push(self.estimator.kind().to_string());
        steps
    }

    fn predict(&self, x: ArrayView1<f64>) -> Result<i64, InferenceError> {
        let eta = self.decision_function(x)?;
        let class_index = usize::from(eta > 0.0);
        self.config
            .classes
            .get(class_index)
            .copied()
            .ok_or(InferenceError::MissingClassLabel {
                index: class_index,
                classes: self.config.classes.len(),
            })
    }

    fn predict_proba(&self, x: ArrayView1<f64>) -> Option<Result<Array1<f64>, InferenceError>> {
        match self.estimator {
            Estimator::LogisticRegression { .. } => Some(self.decision_function(x).map(|eta| {
                // Clamp eta to prevent numerical overflow in exp()
                let p = 1.0 / (1.0 + f64::exp(-eta.clamp(-700.0, 700.0)));
                array![1.0 - p, p]
            })),
            Estimator::LinearSvc { .. } => None,
        }
    }
}

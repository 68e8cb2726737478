pub mod artifact;
pub mod handle;

pub use artifact::{Estimator, ModelConfig, ModelError, StandardScaler, TrainedModel};
pub use handle::{Classifier, InferenceError, ModelSummary, load_classifier};

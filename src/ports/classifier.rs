//! Risk model port: Trait for the deterioration classifier.
//!
//! The scorer only needs a class-1 probability and the model's global
//! feature importances; how the model is fitted or persisted is an adapter
//! concern.

use crate::domain::{VitalSigns, NUM_FEATURES};

/// Errors raised while loading, training or evaluating a model.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model artifact I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Model artifact is malformed: {0}")]
    Format(#[from] serde_json::Error),

    #[error("Expected {expected} features, model has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Model produced a non-finite score")]
    NonFiniteScore,

    #[error("Training failed: {0}")]
    Training(String),
}

/// A fitted binary classifier with its feature scaler.
///
/// Implementations are immutable once constructed and shared across
/// requests.
pub trait RiskModel: Send + Sync {
    /// Probability that the reading belongs to the deteriorating class.
    ///
    /// # Errors
    /// Returns `ModelError::NonFiniteScore` if evaluation yields NaN/inf.
    fn predict_proba(&self, vitals: &VitalSigns) -> Result<f64, ModelError>;

    /// Global importance of each feature, in `FEATURE_NAMES` order, summing to 1.
    fn feature_importances(&self) -> [f64; NUM_FEATURES];
}

//! Scoring service: risk assessment for a patient's latest reading.
//!
//! This service coordinates:
//! - Latest-reading lookup
//! - Classifier evaluation through the model handle
//! - Prediction persistence

use std::sync::Arc;

use crate::domain::{anonymize_patient_id, contributing_factors, RiskAssessment, RiskPrediction};
use crate::ports::{RiskModel, Storage};
use crate::VitalWatchError;

/// Service for scoring deterioration risk.
///
/// The model handle is built once at startup and shared; the service never
/// loads or trains a model itself.
pub struct ScoringService<M, S>
where
    M: RiskModel,
    S: Storage,
{
    model: Arc<M>,
    storage: Arc<S>,
}

impl<M, S> ScoringService<M, S>
where
    M: RiskModel,
    S: Storage,
    S::Error: Into<crate::adapters::StorageError>,
{
    /// Create a new scoring service.
    pub fn new(model: Arc<M>, storage: Arc<S>) -> Self {
        Self { model, storage }
    }

    /// Score the most recent reading for `patient_id` and persist the result.
    ///
    /// Returns `Ok(None)` when no prediction is possible: the patient has no
    /// readings, or the model failed to produce a usable score (logged).
    ///
    /// # Errors
    /// Returns `VitalWatchError::Storage` if the lookup or the write fails.
    pub fn score(&self, patient_id: &str) -> Result<Option<RiskAssessment>, VitalWatchError> {
        let anonymized = anonymize_patient_id(patient_id);

        let Some(vitals) = self
            .storage
            .latest_vitals(patient_id)
            .map_err(|e| VitalWatchError::Storage(e.into()))?
        else {
            tracing::info!(patient = %anonymized, "No readings, no prediction possible");
            return Ok(None);
        };

        let probability = match self.model.predict_proba(&vitals) {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(patient = %anonymized, error = %e, "Risk scoring failed");
                return Ok(None);
            }
        };

        let assessment = RiskAssessment::new(
            probability,
            contributing_factors(&self.model.feature_importances()),
        );

        self.storage
            .save_prediction(&RiskPrediction::new(patient_id, assessment.clone()))
            .map_err(|e| VitalWatchError::Storage(e.into()))?;

        tracing::info!(
            patient = %anonymized,
            score = assessment.risk_score,
            level = %assessment.risk_level,
            "Risk prediction stored"
        );

        Ok(Some(assessment))
    }
}

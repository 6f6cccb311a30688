//! Ingestion service: validates and stores one incoming reading.

use std::sync::Arc;

use serde::Deserialize;

use crate::domain::{AuditEntry, Patient, VitalReading, VitalSigns};
use crate::ports::Storage;
use crate::VitalWatchError;

/// Source label used when the upstream system does not identify itself.
pub const UNKNOWN_SOURCE: &str = "unknown";

/// Upper bound accepted for patient age.
const MAX_AGE: u32 = 130;

/// Payload posted by an upstream system.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestRequest {
    pub patient_id: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub ward: Option<String>,
    #[serde(default)]
    pub source_system: Option<String>,
    #[serde(flatten)]
    pub vitals: VitalSigns,
}

/// Outcome of a successful ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReceipt {
    pub anonymized_id: String,
    /// Whether this reading created the patient record
    pub new_patient: bool,
}

/// Service for ingesting readings.
pub struct IngestionService<S>
where
    S: Storage,
{
    storage: Arc<S>,
}

impl<S> IngestionService<S>
where
    S: Storage,
    S::Error: Into<crate::adapters::StorageError>,
{
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// Validate and store a reading.
    ///
    /// The patient row (if new), the reading and the audit entry are written
    /// in one transaction; either all three land or none do.
    ///
    /// # Errors
    /// Returns `VitalWatchError::Validation` for an empty identifier or
    /// implausible values, `VitalWatchError::Storage` if the write fails.
    pub fn ingest(&self, request: IngestRequest) -> Result<IngestReceipt, VitalWatchError> {
        let patient_id = request.patient_id.as_str();
        if patient_id.trim().is_empty() {
            return Err(VitalWatchError::Validation(
                "patient_id must not be empty".to_string(),
            ));
        }

        let mut problems = request.vitals.validate().err().unwrap_or_default();
        if let Some(age) = request.age.filter(|&a| a > MAX_AGE) {
            problems.push(format!("age {age} out of range [0, {MAX_AGE}]"));
        }
        if !problems.is_empty() {
            return Err(VitalWatchError::Validation(problems.join("; ")));
        }

        let source_system = request
            .source_system
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| UNKNOWN_SOURCE.to_string());

        let patient = Patient::admit(patient_id, request.age, request.gender, request.ward);
        let reading = VitalReading::now(patient_id, request.vitals, source_system.as_str());
        let audit = AuditEntry::data_ingest(patient.anonymized_id.as_str(), &source_system);

        let new_patient = self
            .storage
            .record_reading(&patient, &reading, &audit)
            .map_err(|e| VitalWatchError::Storage(e.into()))?;

        tracing::info!(
            patient = %patient.anonymized_id,
            source = %source_system,
            new_patient,
            "Ingested reading"
        );

        Ok(IngestReceipt {
            anonymized_id: patient.anonymized_id,
            new_patient,
        })
    }
}

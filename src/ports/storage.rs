//! Storage port: Trait for persistent storage operations.
//!
//! This trait abstracts the storage backend (SQLite) from the application logic.
//! All four tables are append-only; the trait exposes no update or delete.

use chrono::NaiveDate;

use crate::domain::{
    AuditEntry, Patient, PatientSummary, RecentPrediction, RiskLevel, RiskPrediction,
    VitalReading, VitalRecord, VitalSigns,
};

/// Trait for clinical data storage.
pub trait Storage: Send + Sync {
    /// Error type for storage operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Append a reading atomically.
    ///
    /// Inserts `patient` only if its raw identifier is unseen, then the
    /// reading, then the audit entry, all in one transaction.
    ///
    /// # Returns
    /// `true` if a new patient row was created.
    ///
    /// # Errors
    /// Returns error if any insert fails; nothing is written in that case.
    fn record_reading(
        &self,
        patient: &Patient,
        reading: &VitalReading,
        audit: &AuditEntry,
    ) -> Result<bool, Self::Error>;

    /// Most recent reading for a raw patient identifier.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn latest_vitals(&self, patient_id: &str) -> Result<Option<VitalSigns>, Self::Error>;

    /// Append a risk prediction.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn save_prediction(&self, prediction: &RiskPrediction) -> Result<(), Self::Error>;

    /// All patients, most recently admitted first.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn list_patients(&self) -> Result<Vec<PatientSummary>, Self::Error>;

    /// Up to `limit` readings for a patient, newest first.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn recent_readings(&self, patient_id: &str, limit: usize)
        -> Result<Vec<VitalRecord>, Self::Error>;

    /// Up to `limit` predictions across all patients, newest first.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn recent_predictions(&self, limit: usize) -> Result<Vec<RecentPrediction>, Self::Error>;

    fn count_patients(&self) -> Result<usize, Self::Error>;

    /// Number of readings in the table, optionally for one patient.
    fn count_readings(&self, patient_id: Option<&str>) -> Result<usize, Self::Error>;

    /// Readings whose UTC calendar date is `date`.
    fn count_readings_on(&self, date: NaiveDate) -> Result<usize, Self::Error>;

    /// Predictions at `level` made on the UTC calendar date `date`.
    fn count_predictions_on(&self, level: RiskLevel, date: NaiveDate)
        -> Result<usize, Self::Error>;

    fn count_audit_entries(&self) -> Result<usize, Self::Error>;
}

//! Query service: read-only projections for the dashboard and API.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::domain::{PatientSummary, RecentPrediction, RiskLevel, VitalRecord};
use crate::ports::Storage;
use crate::VitalWatchError;

/// Maximum number of readings returned by a history query.
pub const VITALS_HISTORY_LIMIT: usize = 50;

/// Number of predictions shown on the dashboard.
pub const RECENT_PREDICTIONS_LIMIT: usize = 10;

/// Dashboard aggregates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total_patients: usize,
    /// Readings whose UTC calendar date is today
    pub readings_today: usize,
    /// HIGH predictions made today (not distinct patients)
    pub high_risk_patients: usize,
    pub recent_predictions: Vec<RecentPrediction>,
}

/// Service for read-only queries.
pub struct QueryService<S>
where
    S: Storage,
{
    storage: Arc<S>,
}

impl<S> QueryService<S>
where
    S: Storage,
    S::Error: Into<crate::adapters::StorageError>,
{
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// All patients, most recently admitted first.
    ///
    /// # Errors
    /// Returns `VitalWatchError::Storage` if the query fails.
    pub fn list_patients(&self) -> Result<Vec<PatientSummary>, VitalWatchError> {
        self.storage
            .list_patients()
            .map_err(|e| VitalWatchError::Storage(e.into()))
    }

    /// Latest readings for a raw patient identifier, newest first.
    ///
    /// An unknown patient yields an empty list.
    ///
    /// # Errors
    /// Returns `VitalWatchError::Storage` if the query fails.
    pub fn vitals_history(&self, patient_id: &str) -> Result<Vec<VitalRecord>, VitalWatchError> {
        self.storage
            .recent_readings(patient_id, VITALS_HISTORY_LIMIT)
            .map_err(|e| VitalWatchError::Storage(e.into()))
    }

    /// Aggregates for the current UTC day.
    ///
    /// # Errors
    /// Returns `VitalWatchError::Storage` if any query fails.
    pub fn dashboard(&self) -> Result<DashboardSummary, VitalWatchError> {
        self.dashboard_for(Utc::now().date_naive())
    }

    /// Aggregates for an arbitrary UTC day.
    ///
    /// # Errors
    /// Returns `VitalWatchError::Storage` if any query fails.
    pub fn dashboard_for(&self, today: NaiveDate) -> Result<DashboardSummary, VitalWatchError> {
        let storage = &self.storage;
        let summary = DashboardSummary {
            total_patients: storage
                .count_patients()
                .map_err(|e| VitalWatchError::Storage(e.into()))?,
            readings_today: storage
                .count_readings_on(today)
                .map_err(|e| VitalWatchError::Storage(e.into()))?,
            high_risk_patients: storage
                .count_predictions_on(RiskLevel::High, today)
                .map_err(|e| VitalWatchError::Storage(e.into()))?,
            recent_predictions: storage
                .recent_predictions(RECENT_PREDICTIONS_LIMIT)
                .map_err(|e| VitalWatchError::Storage(e.into()))?,
        };

        tracing::debug!(
            patients = summary.total_patients,
            readings_today = summary.readings_today,
            high_risk = summary.high_risk_patients,
            "Dashboard computed"
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::SqliteStorage;
    use crate::domain::{
        anonymize_patient_id, AuditEntry, Patient, RiskAssessment, RiskPrediction, VitalProfile,
        VitalReading,
    };
    use chrono::Duration;

    fn create_test_service() -> (QueryService<SqliteStorage>, Arc<SqliteStorage>) {
        let storage = Arc::new(SqliteStorage::in_memory().expect("Should create db"));
        (QueryService::new(Arc::clone(&storage)), storage)
    }

    fn ingest(storage: &SqliteStorage, patient_id: &str, count: usize) {
        let patient = Patient::admit(patient_id, Some(50), None, Some("Ward_A".into()));
        let audit = AuditEntry::data_ingest(patient.anonymized_id.as_str(), "Ward_Vitals_System");
        for _ in 0..count {
            let reading = VitalReading::now(
                patient_id,
                VitalProfile::abnormal_low_edge(),
                "Ward_Vitals_System",
            );
            storage
                .record_reading(&patient, &reading, &audit)
                .expect("Should store reading");
        }
    }

    fn predict(storage: &SqliteStorage, patient_id: &str, score: f64) {
        let prediction = RiskPrediction::new(patient_id, RiskAssessment::new(score, Vec::new()));
        storage.save_prediction(&prediction).expect("Should save");
    }

    #[test]
    fn test_empty_dashboard() {
        let (service, _) = create_test_service();
        let summary = service.dashboard().expect("dashboard");
        assert_eq!(summary.total_patients, 0);
        assert_eq!(summary.readings_today, 0);
        assert_eq!(summary.high_risk_patients, 0);
        assert!(summary.recent_predictions.is_empty());
    }

    #[test]
    fn test_dashboard_counts_today_only() {
        let (service, storage) = create_test_service();
        ingest(&storage, "P001", 3);
        ingest(&storage, "P002", 1);
        predict(&storage, "P001", 0.91);
        predict(&storage, "P001", 0.85);
        predict(&storage, "P002", 0.5);

        let today = Utc::now().date_naive();
        let summary = service.dashboard_for(today).expect("dashboard");
        assert_eq!(summary.total_patients, 2);
        assert_eq!(summary.readings_today, 4);
        assert_eq!(summary.high_risk_patients, 2);
        assert_eq!(summary.recent_predictions.len(), 3);
        assert_eq!(
            summary.recent_predictions[0].anonymized_id,
            anonymize_patient_id("P002")
        );

        let tomorrow = today + Duration::days(1);
        let later = service.dashboard_for(tomorrow).expect("dashboard");
        assert_eq!(later.total_patients, 2);
        assert_eq!(later.readings_today, 0);
        assert_eq!(later.high_risk_patients, 0);
    }

    #[test]
    fn test_recent_predictions_capped() {
        let (service, storage) = create_test_service();
        ingest(&storage, "P003", 1);
        for _ in 0..(RECENT_PREDICTIONS_LIMIT + 5) {
            predict(&storage, "P003", 0.2);
        }
        let summary = service.dashboard().expect("dashboard");
        assert_eq!(summary.recent_predictions.len(), RECENT_PREDICTIONS_LIMIT);
    }

    #[test]
    fn test_vitals_history_limit_and_order() {
        let (service, storage) = create_test_service();
        ingest(&storage, "P004", VITALS_HISTORY_LIMIT + 10);

        let history = service.vitals_history("P004").expect("history");
        assert_eq!(history.len(), VITALS_HISTORY_LIMIT);
        assert!(history
            .windows(2)
            .all(|pair| pair[0].timestamp >= pair[1].timestamp));
    }

    #[test]
    fn test_unknown_patient_has_empty_history() {
        let (service, _) = create_test_service();
        assert!(service.vitals_history("P999").expect("history").is_empty());
    }

    #[test]
    fn test_list_patients_exposes_anonymized_ids_only() {
        let (service, storage) = create_test_service();
        ingest(&storage, "P005", 1);

        let patients = service.list_patients().expect("list");
        assert_eq!(patients.len(), 1);
        assert_eq!(patients[0].anonymized_id, anonymize_patient_id("P005"));
        assert_eq!(patients[0].ward.as_deref(), Some("Ward_A"));
    }
}

//! SQLite adapter: Implementation of Storage.
//!
//! Provides local persistence for patients, readings, predictions and the
//! audit log.
//!
//! # Timestamps
//!
//! All timestamps are written as RFC 3339 UTC with fixed microsecond
//! precision (`2026-01-31T08:15:00.000000Z`), so lexical order is
//! chronological order and the first ten characters are the UTC date.
//!
//! # Mutex Behavior
//!
//! The connection is protected by a `Mutex`. A poisoned mutex surfaces as
//! `StorageError::LockPoisoned` instead of panicking the request task.
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

use crate::domain::{
    format_timestamp, AuditEntry, Patient, PatientSummary, RecentPrediction, RiskLevel,
    RiskPrediction, VitalReading, VitalRecord, VitalSigns,
};
use crate::ports::Storage;

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Corrupt row: {0}")]
    Corrupt(String),

    #[error("Database connection lock poisoned")]
    LockPoisoned,
}

fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// SQLite storage adapter.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Open (or create) the database file at `path`.
    ///
    /// # Errors
    /// Returns error if database cannot be opened or initialized.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    /// Create an in-memory SQLite database (for testing).
    ///
    /// # Errors
    /// Returns error if database cannot be created.
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    /// Initialize the database schema.
    fn init_schema(&self) -> Result<(), StorageError> {
        let conn = self.conn()?;

        conn.execute_batch(
            r"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS patients (
                patient_id TEXT PRIMARY KEY,
                age INTEGER,
                gender TEXT,
                admission_date TEXT NOT NULL,
                ward TEXT,
                anonymized_id TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS vital_signs (
                record_id INTEGER PRIMARY KEY AUTOINCREMENT,
                patient_id TEXT NOT NULL REFERENCES patients(patient_id),
                timestamp TEXT NOT NULL,
                heart_rate REAL NOT NULL,
                blood_pressure_systolic REAL NOT NULL,
                blood_pressure_diastolic REAL NOT NULL,
                respiratory_rate REAL NOT NULL,
                temperature REAL NOT NULL,
                oxygen_saturation REAL NOT NULL,
                source_system TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS risk_predictions (
                prediction_id INTEGER PRIMARY KEY AUTOINCREMENT,
                patient_id TEXT NOT NULL REFERENCES patients(patient_id),
                timestamp TEXT NOT NULL,
                risk_score REAL NOT NULL,
                risk_level TEXT NOT NULL,
                contributing_factors TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS audit_log (
                log_id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                action TEXT NOT NULL,
                user_id TEXT NOT NULL,
                patient_id TEXT NOT NULL,
                details TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_vitals_patient_time
                ON vital_signs(patient_id, timestamp DESC);
            CREATE INDEX IF NOT EXISTS idx_predictions_time
                ON risk_predictions(timestamp DESC);
            ",
        )?;

        Ok(())
    }

    fn count(&self, sql: &str, params: impl rusqlite::Params) -> Result<usize, StorageError> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(sql, params, |row| row.get(0))?;
        Ok(count as usize)
    }
}

impl Storage for SqliteStorage {
    type Error = StorageError;

    fn record_reading(
        &self,
        patient: &Patient,
        reading: &VitalReading,
        audit: &AuditEntry,
    ) -> Result<bool, Self::Error> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let created = tx.execute(
            r"
            INSERT OR IGNORE INTO patients (
                patient_id, age, gender, admission_date, ward, anonymized_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
            params![
                patient.patient_id,
                patient.age,
                patient.gender,
                format_timestamp(&patient.admission_date),
                patient.ward,
                patient.anonymized_id,
            ],
        )? == 1;

        let v = &reading.vitals;
        tx.execute(
            r"
            INSERT INTO vital_signs (
                patient_id, timestamp, heart_rate, blood_pressure_systolic,
                blood_pressure_diastolic, respiratory_rate, temperature,
                oxygen_saturation, source_system
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ",
            params![
                reading.patient_id,
                format_timestamp(&reading.recorded_at),
                v.heart_rate,
                v.bp_systolic,
                v.bp_diastolic,
                v.respiratory_rate,
                v.temperature,
                v.oxygen_saturation,
                reading.source_system,
            ],
        )?;

        tx.execute(
            r"
            INSERT INTO audit_log (timestamp, action, user_id, patient_id, details)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
            params![
                format_timestamp(&audit.created_at),
                audit.action,
                audit.user_id,
                audit.anonymized_patient_id,
                audit.details,
            ],
        )?;

        tx.commit()?;

        tracing::debug!(
            patient = %patient.anonymized_id,
            new_patient = created,
            "Stored reading"
        );
        Ok(created)
    }

    fn latest_vitals(&self, patient_id: &str) -> Result<Option<VitalSigns>, Self::Error> {
        let conn = self.conn()?;

        let vitals = conn
            .query_row(
                r"
                SELECT heart_rate, blood_pressure_systolic, blood_pressure_diastolic,
                       respiratory_rate, temperature, oxygen_saturation
                FROM vital_signs
                WHERE patient_id = ?1
                ORDER BY timestamp DESC, record_id DESC
                LIMIT 1
                ",
                params![patient_id],
                |row| {
                    Ok(VitalSigns {
                        heart_rate: row.get(0)?,
                        bp_systolic: row.get(1)?,
                        bp_diastolic: row.get(2)?,
                        respiratory_rate: row.get(3)?,
                        temperature: row.get(4)?,
                        oxygen_saturation: row.get(5)?,
                    })
                },
            )
            .optional()?;

        Ok(vitals)
    }

    fn save_prediction(&self, prediction: &RiskPrediction) -> Result<(), Self::Error> {
        let factors = serde_json::to_string(&prediction.assessment.contributing_factors)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let conn = self.conn()?;

        conn.execute(
            r"
            INSERT INTO risk_predictions (
                patient_id, timestamp, risk_score, risk_level, contributing_factors
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            ",
            params![
                prediction.patient_id,
                format_timestamp(&prediction.created_at),
                prediction.assessment.risk_score,
                prediction.assessment.risk_level.as_str(),
                factors,
            ],
        )?;

        tracing::debug!("Saved {} prediction", prediction.assessment.risk_level);
        Ok(())
    }

    fn list_patients(&self) -> Result<Vec<PatientSummary>, Self::Error> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            r"
            SELECT anonymized_id, age, gender, ward, admission_date
            FROM patients
            ORDER BY admission_date DESC
            ",
        )?;

        let patients = stmt
            .query_map([], |row| {
                Ok(PatientSummary {
                    anonymized_id: row.get(0)?,
                    age: row.get(1)?,
                    gender: row.get(2)?,
                    ward: row.get(3)?,
                    admission_date: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(patients)
    }

    fn recent_readings(
        &self,
        patient_id: &str,
        limit: usize,
    ) -> Result<Vec<VitalRecord>, Self::Error> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            r"
            SELECT timestamp, heart_rate, blood_pressure_systolic,
                   blood_pressure_diastolic, respiratory_rate,
                   temperature, oxygen_saturation, source_system
            FROM vital_signs
            WHERE patient_id = ?1
            ORDER BY timestamp DESC, record_id DESC
            LIMIT ?2
            ",
        )?;

        let readings = stmt
            .query_map(params![patient_id, limit as i64], |row| {
                Ok(VitalRecord {
                    timestamp: row.get(0)?,
                    heart_rate: row.get(1)?,
                    blood_pressure_systolic: row.get(2)?,
                    blood_pressure_diastolic: row.get(3)?,
                    respiratory_rate: row.get(4)?,
                    temperature: row.get(5)?,
                    oxygen_saturation: row.get(6)?,
                    source_system: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(readings)
    }

    fn recent_predictions(&self, limit: usize) -> Result<Vec<RecentPrediction>, Self::Error> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            r"
            SELECT p.anonymized_id, rp.risk_level, rp.risk_score, rp.timestamp
            FROM risk_predictions rp
            JOIN patients p ON rp.patient_id = p.patient_id
            ORDER BY rp.timestamp DESC, rp.prediction_id DESC
            LIMIT ?1
            ",
        )?;

        let rows = stmt
            .query_map(params![limit as i64], |row| {
                let anonymized_id: String = row.get(0)?;
                let risk_level: String = row.get(1)?;
                let risk_score: f64 = row.get(2)?;
                let timestamp: String = row.get(3)?;
                Ok((anonymized_id, risk_level, risk_score, timestamp))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(anonymized_id, level, risk_score, timestamp)| {
                let risk_level = RiskLevel::parse(&level).ok_or_else(|| {
                    StorageError::Corrupt(format!("unknown risk level {level:?}"))
                })?;
                Ok(RecentPrediction {
                    anonymized_id,
                    risk_level,
                    risk_score,
                    timestamp,
                })
            })
            .collect()
    }

    fn count_patients(&self) -> Result<usize, Self::Error> {
        self.count("SELECT COUNT(*) FROM patients", [])
    }

    fn count_readings(&self, patient_id: Option<&str>) -> Result<usize, Self::Error> {
        match patient_id {
            Some(id) => self.count(
                "SELECT COUNT(*) FROM vital_signs WHERE patient_id = ?1",
                params![id],
            ),
            None => self.count("SELECT COUNT(*) FROM vital_signs", []),
        }
    }

    fn count_readings_on(&self, date: NaiveDate) -> Result<usize, Self::Error> {
        self.count(
            "SELECT COUNT(*) FROM vital_signs WHERE substr(timestamp, 1, 10) = ?1",
            params![date_key(date)],
        )
    }

    fn count_predictions_on(
        &self,
        level: RiskLevel,
        date: NaiveDate,
    ) -> Result<usize, Self::Error> {
        self.count(
            r"
            SELECT COUNT(*) FROM risk_predictions
            WHERE risk_level = ?1 AND substr(timestamp, 1, 10) = ?2
            ",
            params![level.as_str(), date_key(date)],
        )
    }

    fn count_audit_entries(&self) -> Result<usize, Self::Error> {
        self.count("SELECT COUNT(*) FROM audit_log", [])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RiskAssessment, ACTION_DATA_INGEST};
    use chrono::{Duration, TimeZone, Utc};

    fn vitals(heart_rate: f64) -> VitalSigns {
        VitalSigns {
            heart_rate,
            bp_systolic: 120.0,
            bp_diastolic: 80.0,
            respiratory_rate: 16.0,
            temperature: 36.9,
            oxygen_saturation: 97.0,
        }
    }

    fn store(storage: &SqliteStorage, id: &str, reading: VitalReading) -> bool {
        let patient = Patient::admit(id, Some(60), Some("M".into()), Some("ICU".into()));
        let audit = AuditEntry::data_ingest(&patient.anonymized_id, &reading.source_system);
        storage
            .record_reading(&patient, &reading, &audit)
            .expect("Should store reading")
    }

    #[test]
    fn test_record_reading_inserts_patient_once() {
        let storage = SqliteStorage::in_memory().expect("Should create db");

        let first = VitalReading::now("P001", vitals(70.0), "ICU_Monitor_System");
        let second = VitalReading::now("P001", vitals(75.0), "Ward_Vitals_System");
        assert!(store(&storage, "P001", first));
        assert!(!store(&storage, "P001", second));

        assert_eq!(storage.count_patients().expect("Should count"), 1);
        assert_eq!(storage.count_readings(Some("P001")).expect("Should count"), 2);
        assert_eq!(storage.count_audit_entries().expect("Should count"), 2);
    }

    #[test]
    fn test_audit_row_carries_anonymized_reference() {
        let storage = SqliteStorage::in_memory().expect("Should create db");
        store(&storage, "P009", VitalReading::now("P009", vitals(70.0), "A&E_Triage_System"));

        let conn = storage.conn().expect("Should lock");
        let (action, user, patient, details): (String, String, String, String) = conn
            .query_row(
                "SELECT action, user_id, patient_id, details FROM audit_log",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .expect("Should read audit row");
        assert_eq!(action, ACTION_DATA_INGEST);
        assert_eq!(user, "system");
        assert_eq!(patient, crate::domain::anonymize_patient_id("P009"));
        assert_eq!(details, "Source: A&E_Triage_System");
    }

    #[test]
    fn test_latest_vitals() {
        let storage = SqliteStorage::in_memory().expect("Should create db");
        assert!(storage.latest_vitals("P001").expect("Should query").is_none());

        let base = Utc::now() - Duration::hours(1);
        for (i, hr) in [60.0, 90.0, 75.0].into_iter().enumerate() {
            let mut reading = VitalReading::now("P001", vitals(hr), "ICU_Monitor_System");
            reading.recorded_at = base + Duration::minutes(i as i64);
            store(&storage, "P001", reading);
        }

        let latest = storage
            .latest_vitals("P001")
            .expect("Should query")
            .expect("Should exist");
        assert!((latest.heart_rate - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_recent_readings_limit_and_order() {
        let storage = SqliteStorage::in_memory().expect("Should create db");
        let base = Utc::now() - Duration::days(1);
        for i in 0..60 {
            let mut reading =
                VitalReading::now("P001", vitals(60.0 + i as f64), "ICU_Monitor_System");
            // Insert out of chronological order.
            reading.recorded_at = base + Duration::seconds((i * 37) % 60);
            store(&storage, "P001", reading);
        }
        store(&storage, "P002", VitalReading::now("P002", vitals(80.0), "ICU_Monitor_System"));

        let readings = storage.recent_readings("P001", 50).expect("Should query");
        assert_eq!(readings.len(), 50);
        assert!(readings.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
        assert!(readings.iter().all(|r| r.source_system == "ICU_Monitor_System"));
    }

    #[test]
    fn test_count_readings_on_ignores_time_of_day() {
        let storage = SqliteStorage::in_memory().expect("Should create db");
        let day = NaiveDate::from_ymd_opt(2026, 3, 14).expect("valid date");
        let at = |h: u32, m: u32, s: u32| {
            Utc.from_utc_datetime(&day.and_hms_opt(h, m, s).expect("valid time"))
        };

        for ts in [at(0, 0, 0), at(12, 30, 0), at(23, 59, 59)] {
            let mut reading = VitalReading::now("P001", vitals(70.0), "ICU_Monitor_System");
            reading.recorded_at = ts;
            store(&storage, "P001", reading);
        }
        let mut next_day = VitalReading::now("P001", vitals(70.0), "ICU_Monitor_System");
        next_day.recorded_at = at(23, 59, 59) + Duration::seconds(1);
        store(&storage, "P001", next_day);

        assert_eq!(storage.count_readings_on(day).expect("Should count"), 3);
        let next = day.succ_opt().expect("valid date");
        assert_eq!(storage.count_readings_on(next).expect("Should count"), 1);
    }

    #[test]
    fn test_predictions_join_and_count() {
        let storage = SqliteStorage::in_memory().expect("Should create db");
        store(&storage, "P001", VitalReading::now("P001", vitals(70.0), "ICU_Monitor_System"));

        let high = RiskPrediction::new(
            "P001",
            RiskAssessment::new(0.9, vec!["heart_rate: 0.30".into()]),
        );
        let low = RiskPrediction::new("P001", RiskAssessment::new(0.1, vec![]));
        storage.save_prediction(&high).expect("Should save");
        storage.save_prediction(&low).expect("Should save");

        let today = Utc::now().date_naive();
        assert_eq!(
            storage
                .count_predictions_on(RiskLevel::High, today)
                .expect("Should count"),
            1
        );

        let recent = storage.recent_predictions(10).expect("Should load");
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].risk_level, RiskLevel::Low);
        assert_eq!(recent[0].anonymized_id, crate::domain::anonymize_patient_id("P001"));
    }

    #[test]
    fn test_prediction_requires_existing_patient() {
        let storage = SqliteStorage::in_memory().expect("Should create db");
        let orphan = RiskPrediction::new("nobody", RiskAssessment::new(0.5, vec![]));
        assert!(storage.save_prediction(&orphan).is_err());
    }

    #[test]
    fn test_list_patients_newest_admission_first() {
        let storage = SqliteStorage::in_memory().expect("Should create db");
        let base = Utc::now() - Duration::hours(2);
        for (i, id) in ["P001", "P002", "P003"].into_iter().enumerate() {
            let mut patient = Patient::admit(id, None, None, None);
            patient.admission_date = base + Duration::minutes(i as i64);
            let reading = VitalReading::now(id, vitals(70.0), "Ward_Vitals_System");
            let audit = AuditEntry::data_ingest(&patient.anonymized_id, "Ward_Vitals_System");
            storage.record_reading(&patient, &reading, &audit).expect("Should store");
        }

        let patients = storage.list_patients().expect("Should list");
        assert_eq!(patients.len(), 3);
        assert_eq!(patients[0].anonymized_id, crate::domain::anonymize_patient_id("P003"));
        assert!(patients[0].age.is_none());
    }
}

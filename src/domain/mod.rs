//! Domain layer: Core clinical types.
//!
//! Plain data types with validation; no storage or HTTP concerns.

mod audit;
mod patient;
mod prediction;
mod synthetic;
mod vitals;

pub use audit::{AuditEntry, ACTION_DATA_INGEST, SYSTEM_ACTOR};
pub use patient::{anonymize_patient_id, Patient, PatientSummary, ANONYMIZED_ID_LEN};
pub use prediction::{
    contributing_factors, RecentPrediction, RiskAssessment, RiskLevel, RiskPrediction,
    HIGH_RISK_THRESHOLD, MEDIUM_RISK_THRESHOLD,
};
pub use synthetic::VitalProfile;
pub use vitals::{VitalReading, VitalRecord, VitalSigns, FEATURE_NAMES, NUM_FEATURES};

use chrono::{DateTime, SecondsFormat, Utc};

/// RFC 3339 UTC with fixed microsecond precision (`2026-01-31T08:15:00.000000Z`).
///
/// Every timestamp the service stores or emits uses this form, so lexical
/// order is chronological order and the first ten characters are the UTC date.
#[must_use]
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_timestamp_is_fixed_width_utc() {
        let dt = Utc
            .with_ymd_and_hms(2026, 1, 31, 8, 15, 0)
            .single()
            .expect("valid date");
        assert_eq!(format_timestamp(&dt), "2026-01-31T08:15:00.000000Z");
    }
}

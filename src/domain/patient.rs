//! Patient demographics and identifier anonymization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Length of the anonymized identifier (hex characters).
pub const ANONYMIZED_ID_LEN: usize = 16;

/// Derive the anonymized identifier for a raw patient identifier.
///
/// The token is the first 16 hex characters of the SHA-256 digest of the raw
/// identifier. It is deterministic and one-way; raw identifiers never leave
/// the store through query responses.
#[must_use]
pub fn anonymize_patient_id(patient_id: &str) -> String {
    let digest = Sha256::digest(patient_id.as_bytes());
    let mut out: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    out.truncate(ANONYMIZED_ID_LEN);
    out
}

/// Patient row as persisted on first sight of a raw identifier.
///
/// Demographic fields are write-once: later readings for the same
/// identifier never modify them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    /// Raw identifier from the upstream system (local only)
    pub patient_id: String,

    /// One-way derived identifier used in every external response
    pub anonymized_id: String,

    pub age: Option<u32>,
    pub gender: Option<String>,
    pub ward: Option<String>,

    /// Time the first reading for this patient was ingested
    pub admission_date: DateTime<Utc>,
}

impl Patient {
    /// Create a patient admitted now.
    #[must_use]
    pub fn admit(
        patient_id: impl Into<String>,
        age: Option<u32>,
        gender: Option<String>,
        ward: Option<String>,
    ) -> Self {
        let patient_id = patient_id.into();
        Self {
            anonymized_id: anonymize_patient_id(&patient_id),
            patient_id,
            age,
            gender,
            ward,
            admission_date: Utc::now(),
        }
    }
}

/// Patient projection exposed by the patient list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientSummary {
    pub anonymized_id: String,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub ward: Option<String>,
    pub admission_date: String,
}

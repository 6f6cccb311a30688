//! Audit trail entries for data governance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Action label written for every ingested reading.
pub const ACTION_DATA_INGEST: &str = "DATA_INGEST";

/// Actor recorded for service-initiated writes.
pub const SYSTEM_ACTOR: &str = "system";

/// Append-only audit record. Only the anonymized patient reference is kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub action: String,
    pub user_id: String,
    pub anonymized_patient_id: String,
    pub details: String,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    /// Entry for a reading received from `source_system`.
    #[must_use]
    pub fn data_ingest(anonymized_patient_id: impl Into<String>, source_system: &str) -> Self {
        Self {
            action: ACTION_DATA_INGEST.to_string(),
            user_id: SYSTEM_ACTOR.to_string(),
            anonymized_patient_id: anonymized_patient_id.into(),
            details: format!("Source: {source_system}"),
            created_at: Utc::now(),
        }
    }
}

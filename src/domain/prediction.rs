//! Risk prediction types.
//!
//! A prediction is the classifier's class-1 probability for the latest
//! reading, bucketed into a coarse level for ward staff.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::vitals::{FEATURE_NAMES, NUM_FEATURES};

/// Score above which a patient is HIGH risk.
pub const HIGH_RISK_THRESHOLD: f64 = 0.7;

/// Score above which a patient is MEDIUM risk.
pub const MEDIUM_RISK_THRESHOLD: f64 = 0.4;

/// Risk level classification for clinical deterioration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    /// Stable, routine observations
    Low,
    /// Increased observation frequency recommended
    Medium,
    /// Urgent clinical review
    High,
}

impl RiskLevel {
    /// Bucket a probability. Both thresholds are exclusive: a score of
    /// exactly 0.7 is MEDIUM and exactly 0.4 is LOW.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score > HIGH_RISK_THRESHOLD {
            Self::High
        } else if score > MEDIUM_RISK_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }

    /// Parse the stored label. Unknown labels are rejected rather than
    /// guessed.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "LOW" => Some(Self::Low),
            "MEDIUM" => Some(Self::Medium),
            "HIGH" => Some(Self::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Format global feature importances as contributing-factor labels.
///
/// These are the classifier's static importances, identical for every
/// reading; they do not explain an individual score.
#[must_use]
pub fn contributing_factors(importances: &[f64; NUM_FEATURES]) -> Vec<String> {
    FEATURE_NAMES
        .iter()
        .zip(importances)
        .map(|(name, imp)| format!("{name}: {imp:.2}"))
        .collect()
}

/// Result returned to the caller of the scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub contributing_factors: Vec<String>,
}

impl RiskAssessment {
    #[must_use]
    pub fn new(risk_score: f64, contributing_factors: Vec<String>) -> Self {
        Self {
            risk_score,
            risk_level: RiskLevel::from_score(risk_score),
            contributing_factors,
        }
    }
}

/// Prediction row as persisted.
#[derive(Debug, Clone)]
pub struct RiskPrediction {
    /// Raw patient identifier (foreign key)
    pub patient_id: String,
    pub assessment: RiskAssessment,
    pub created_at: DateTime<Utc>,
}

impl RiskPrediction {
    #[must_use]
    pub fn new(patient_id: impl Into<String>, assessment: RiskAssessment) -> Self {
        Self {
            patient_id: patient_id.into(),
            assessment,
            created_at: Utc::now(),
        }
    }
}

/// Recent prediction joined with the patient's anonymized identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentPrediction {
    pub anonymized_id: String,
    pub risk_level: RiskLevel,
    pub risk_score: f64,
    pub timestamp: String,
}

//! Vital-sign readings.
//!
//! Six bedside measurements form the feature vector for risk scoring.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of measurements in a reading.
pub const NUM_FEATURES: usize = 6;

/// Feature names, in the order used by the classifier.
pub const FEATURE_NAMES: [&str; NUM_FEATURES] = [
    "heart_rate",
    "bp_systolic",
    "bp_diastolic",
    "respiratory_rate",
    "temperature",
    "oxygen_saturation",
];

/// One set of vital-sign measurements.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct VitalSigns {
    /// Heart rate in beats per minute
    pub heart_rate: f64,

    /// Systolic blood pressure in mmHg
    #[serde(alias = "blood_pressure_systolic")]
    pub bp_systolic: f64,

    /// Diastolic blood pressure in mmHg
    #[serde(alias = "blood_pressure_diastolic")]
    pub bp_diastolic: f64,

    /// Breaths per minute
    pub respiratory_rate: f64,

    /// Body temperature in °C
    pub temperature: f64,

    /// Peripheral oxygen saturation (SpO2) in %
    pub oxygen_saturation: f64,
}

impl VitalSigns {
    /// Feature vector in `FEATURE_NAMES` order.
    #[must_use]
    pub fn to_array(&self) -> [f64; NUM_FEATURES] {
        [
            self.heart_rate,
            self.bp_systolic,
            self.bp_diastolic,
            self.respiratory_rate,
            self.temperature,
            self.oxygen_saturation,
        ]
    }

    #[must_use]
    pub fn from_array(v: [f64; NUM_FEATURES]) -> Self {
        Self {
            heart_rate: v[0],
            bp_systolic: v[1],
            bp_diastolic: v[2],
            respiratory_rate: v[3],
            temperature: v[4],
            oxygen_saturation: v[5],
        }
    }

    /// Check every measurement against physiological plausibility bounds.
    ///
    /// These bounds reject sensor glitches and unit mix-ups, not abnormal
    /// values: a deteriorating patient is still well inside them.
    ///
    /// # Errors
    /// Returns one message per offending field.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        const BOUNDS: [(f64, f64); NUM_FEATURES] = [
            (20.0, 300.0),
            (40.0, 300.0),
            (20.0, 200.0),
            (2.0, 80.0),
            (25.0, 45.0),
            (0.0, 100.0),
        ];

        let errors: Vec<String> = FEATURE_NAMES
            .iter()
            .zip(self.to_array())
            .zip(BOUNDS)
            .filter(|((_, value), (lo, hi))| {
                !value.is_finite() || !(*lo..=*hi).contains(value)
            })
            .map(|((name, value), (lo, hi))| {
                format!("{name} {value} out of range [{lo}, {hi}]")
            })
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// A reading about to be appended for a patient.
#[derive(Debug, Clone)]
pub struct VitalReading {
    /// Raw patient identifier (foreign key)
    pub patient_id: String,
    pub vitals: VitalSigns,
    pub source_system: String,
    pub recorded_at: DateTime<Utc>,
}

impl VitalReading {
    /// Reading taken now.
    #[must_use]
    pub fn now(
        patient_id: impl Into<String>,
        vitals: VitalSigns,
        source_system: impl Into<String>,
    ) -> Self {
        Self {
            patient_id: patient_id.into(),
            vitals,
            source_system: source_system.into(),
            recorded_at: Utc::now(),
        }
    }
}

/// Stored reading as returned by the vitals history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalRecord {
    pub timestamp: String,
    pub heart_rate: f64,
    pub blood_pressure_systolic: f64,
    pub blood_pressure_diastolic: f64,
    pub respiratory_rate: f64,
    pub temperature: f64,
    pub oxygen_saturation: f64,
    pub source_system: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normal() -> VitalSigns {
        VitalSigns {
            heart_rate: 72.0,
            bp_systolic: 120.0,
            bp_diastolic: 80.0,
            respiratory_rate: 16.0,
            temperature: 36.8,
            oxygen_saturation: 98.0,
        }
    }

    #[test]
    fn test_array_order_matches_feature_names() {
        let v = normal().to_array();
        assert_eq!(v.len(), FEATURE_NAMES.len());
        assert!((v[0] - 72.0).abs() < f64::EPSILON);
        assert!((v[4] - 36.8).abs() < f64::EPSILON);
        assert_eq!(VitalSigns::from_array(v), normal());
    }

    #[test]
    fn test_validation_accepts_abnormal_but_plausible() {
        assert!(normal().validate().is_ok());

        let deteriorating = VitalSigns {
            heart_rate: 150.0,
            bp_systolic: 85.0,
            bp_diastolic: 50.0,
            respiratory_rate: 32.0,
            temperature: 39.5,
            oxygen_saturation: 86.0,
        };
        assert!(deteriorating.validate().is_ok());
    }

    #[test]
    fn test_validation_reports_every_field() {
        let invalid = VitalSigns {
            heart_rate: 900.0,
            temperature: f64::NAN,
            oxygen_saturation: 140.0,
            ..normal()
        };
        let errors = invalid.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors[0].starts_with("heart_rate"));
    }
}

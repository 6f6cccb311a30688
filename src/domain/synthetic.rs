//! Synthetic vital-sign profiles.
//!
//! Used both to fit the risk model and by the `simulate` binary, so the
//! classifier is trained on the same distributions the simulator produces.

use rand::Rng;

use super::vitals::VitalSigns;

/// Inclusive integer range sampled uniformly.
type IntRange = (i64, i64);

/// Inclusive real range sampled uniformly and rounded to one decimal.
type RealRange = (f64, f64);

/// Abnormal bands. Each measurement has a low and a high band except SpO2,
/// which is only abnormal when low.
pub const ABNORMAL_HEART_RATE: [IntRange; 2] = [(40, 55), (120, 160)];
pub const ABNORMAL_BP_SYSTOLIC: [IntRange; 2] = [(80, 100), (160, 200)];
pub const ABNORMAL_BP_DIASTOLIC: [IntRange; 2] = [(50, 65), (95, 120)];
pub const ABNORMAL_RESPIRATORY_RATE: [IntRange; 2] = [(8, 10), (25, 35)];
pub const ABNORMAL_TEMPERATURE: [RealRange; 2] = [(35.0, 36.0), (38.5, 40.0)];
pub const ABNORMAL_OXYGEN_SATURATION: IntRange = (85, 93);

/// Distribution a synthetic reading is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VitalProfile {
    /// All measurements within normal adult ranges
    Stable,
    /// Every measurement in an abnormal band
    Deteriorating,
}

impl VitalProfile {
    /// Draw one reading.
    pub fn sample<R: Rng>(self, rng: &mut R) -> VitalSigns {
        match self {
            Self::Stable => VitalSigns {
                heart_rate: int(rng, (60, 100)),
                bp_systolic: int(rng, (110, 140)),
                bp_diastolic: int(rng, (70, 90)),
                respiratory_rate: int(rng, (12, 20)),
                temperature: real(rng, (36.5, 37.5)),
                oxygen_saturation: int(rng, (95, 100)),
            },
            Self::Deteriorating => {
                let hr = band(rng, ABNORMAL_HEART_RATE);
                let sys = band(rng, ABNORMAL_BP_SYSTOLIC);
                let dia = band(rng, ABNORMAL_BP_DIASTOLIC);
                let rr = band(rng, ABNORMAL_RESPIRATORY_RATE);
                let temp = band(rng, ABNORMAL_TEMPERATURE);
                VitalSigns {
                    heart_rate: int(rng, hr),
                    bp_systolic: int(rng, sys),
                    bp_diastolic: int(rng, dia),
                    respiratory_rate: int(rng, rr),
                    temperature: real(rng, temp),
                    oxygen_saturation: int(rng, ABNORMAL_OXYGEN_SATURATION),
                }
            }
        }
    }

    /// Reading with every measurement at the lower edge of its low
    /// abnormal band.
    #[must_use]
    pub fn abnormal_low_edge() -> VitalSigns {
        VitalSigns {
            heart_rate: ABNORMAL_HEART_RATE[0].0 as f64,
            bp_systolic: ABNORMAL_BP_SYSTOLIC[0].0 as f64,
            bp_diastolic: ABNORMAL_BP_DIASTOLIC[0].0 as f64,
            respiratory_rate: ABNORMAL_RESPIRATORY_RATE[0].0 as f64,
            temperature: ABNORMAL_TEMPERATURE[0].0,
            oxygen_saturation: ABNORMAL_OXYGEN_SATURATION.0 as f64,
        }
    }
}

/// Pick the low or high band with equal probability.
fn band<R: Rng, T: Copy>(rng: &mut R, bands: [T; 2]) -> T {
    bands[usize::from(rng.gen_bool(0.5))]
}

fn int<R: Rng>(rng: &mut R, (lo, hi): IntRange) -> f64 {
    rng.gen_range(lo..=hi) as f64
}

fn real<R: Rng>(rng: &mut R, (lo, hi): RealRange) -> f64 {
    (rng.gen_range(lo..=hi) * 10.0).round() / 10.0
}

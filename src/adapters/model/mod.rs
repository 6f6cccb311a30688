//! Logistic-regression adapter: Implementation of RiskModel.
//!
//! The model is a standard scaler followed by a class-weighted logistic
//! regression, fitted by batch gradient descent on synthetic readings drawn
//! from `VitalProfile`. Both halves are persisted as JSON artifacts:
//!
//! - `risk_model.json`: coefficients and intercept (standardized space)
//! - `scaler.json`: per-feature mean and standard deviation
//!
//! Training is deterministic for a given `TrainingConfig::seed`.

use std::fs;
use std::path::{Path, PathBuf};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

use crate::domain::{VitalProfile, VitalSigns, FEATURE_NAMES, NUM_FEATURES};
use crate::ports::{ModelError, RiskModel};

/// Classifier artifact file name.
pub const MODEL_FILE: &str = "risk_model.json";

/// Scaler artifact file name.
pub const SCALER_FILE: &str = "scaler.json";

/// Hyperparameters for fitting on synthetic data.
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    pub samples: usize,
    /// Fraction of samples drawn from the deteriorating profile
    pub deteriorating_fraction: f64,
    pub seed: u64,
    pub epochs: usize,
    pub learning_rate: f64,
    /// L2 penalty; keeps weights finite when the classes are separable
    pub l2: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            samples: 1000,
            deteriorating_fraction: 0.1,
            seed: 42,
            epochs: 1000,
            learning_rate: 0.5,
            l2: 0.01,
        }
    }
}

/// Per-feature standardization: `(x - mean) / scale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Fit mean and population standard deviation per column.
    ///
    /// Zero-variance columns get a scale of 1 so they pass through centred.
    #[must_use]
    pub fn fit(rows: &[[f64; NUM_FEATURES]]) -> Self {
        let n = rows.len().max(1) as f64;
        let mut mean = vec![0.0; NUM_FEATURES];
        for row in rows {
            for (m, x) in mean.iter_mut().zip(row) {
                *m += x / n;
            }
        }

        let mut scale = vec![0.0; NUM_FEATURES];
        for row in rows {
            for ((s, x), m) in scale.iter_mut().zip(row).zip(&mean) {
                *s += (x - m).powi(2) / n;
            }
        }
        for s in &mut scale {
            *s = s.sqrt();
            if *s < f64::EPSILON {
                *s = 1.0;
            }
        }

        Self { mean, scale }
    }

    #[must_use]
    pub fn transform(&self, row: &[f64; NUM_FEATURES]) -> [f64; NUM_FEATURES] {
        let mut out = [0.0; NUM_FEATURES];
        for (i, o) in out.iter_mut().enumerate() {
            *o = (row[i] - self.mean[i]) / self.scale[i];
        }
        out
    }

    fn check(&self) -> Result<(), ModelError> {
        for len in [self.mean.len(), self.scale.len()] {
            if len != NUM_FEATURES {
                return Err(ModelError::DimensionMismatch {
                    expected: NUM_FEATURES,
                    actual: len,
                });
            }
        }
        Ok(())
    }
}

/// Serialized classifier parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticParams {
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LogisticParams {
    fn check(&self) -> Result<(), ModelError> {
        if self.coefficients.len() != NUM_FEATURES {
            return Err(ModelError::DimensionMismatch {
                expected: NUM_FEATURES,
                actual: self.coefficients.len(),
            });
        }
        Ok(())
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Fitted scaler + logistic regression.
#[derive(Debug, Clone)]
pub struct LogisticRiskModel {
    params: LogisticParams,
    scaler: StandardScaler,
}

impl LogisticRiskModel {
    /// Assemble a model from loaded artifacts.
    ///
    /// # Errors
    /// Returns `ModelError::DimensionMismatch` if either artifact does not
    /// have exactly one entry per feature.
    pub fn from_parts(params: LogisticParams, scaler: StandardScaler) -> Result<Self, ModelError> {
        params.check()?;
        scaler.check()?;
        Ok(Self { params, scaler })
    }

    /// Fit on synthetic readings.
    ///
    /// Classes are weighted inversely to their frequency so the minority
    /// (deteriorating) class is not drowned out.
    ///
    /// # Errors
    /// Returns `ModelError::Training` if the configuration yields an empty
    /// class or the fit diverges.
    pub fn train(config: &TrainingConfig) -> Result<Self, ModelError> {
        let mut rng = ChaCha20Rng::seed_from_u64(config.seed);

        let positives = ((config.samples as f64) * config.deteriorating_fraction).round() as usize;
        if positives == 0 || positives >= config.samples {
            return Err(ModelError::Training(format!(
                "need both classes, got {positives} deteriorating of {} samples",
                config.samples
            )));
        }

        let mut rows = Vec::with_capacity(config.samples);
        let mut labels = Vec::with_capacity(config.samples);
        for i in 0..config.samples {
            let profile = if i < positives {
                VitalProfile::Deteriorating
            } else {
                VitalProfile::Stable
            };
            rows.push(profile.sample(&mut rng).to_array());
            labels.push(if i < positives { 1.0 } else { 0.0 });
        }

        let scaler = StandardScaler::fit(&rows);
        let xs: Vec<[f64; NUM_FEATURES]> = rows.iter().map(|r| scaler.transform(r)).collect();

        let n = config.samples as f64;
        let w_pos = n / (2.0 * positives as f64);
        let w_neg = n / (2.0 * (config.samples - positives) as f64);

        // Small random init breaks symmetry between correlated features.
        let mut weights = [0.0; NUM_FEATURES];
        for w in &mut weights {
            *w = rng.gen_range(-0.01..0.01);
        }
        let mut bias = 0.0;

        for _ in 0..config.epochs {
            let mut grad_w = [0.0; NUM_FEATURES];
            let mut grad_b = 0.0;

            for (x, &y) in xs.iter().zip(&labels) {
                let z = bias + weights.iter().zip(x).map(|(w, v)| w * v).sum::<f64>();
                let class_weight = if y > 0.5 { w_pos } else { w_neg };
                let err = class_weight * (sigmoid(z) - y);
                for (g, v) in grad_w.iter_mut().zip(x) {
                    *g += err * v / n;
                }
                grad_b += err / n;
            }

            for (w, g) in weights.iter_mut().zip(grad_w) {
                *w -= config.learning_rate * (g + config.l2 * *w);
            }
            bias -= config.learning_rate * grad_b;
        }

        if !bias.is_finite() || weights.iter().any(|w| !w.is_finite()) {
            return Err(ModelError::Training("gradient descent diverged".into()));
        }

        let params = LogisticParams {
            feature_names: FEATURE_NAMES.iter().map(|s| (*s).to_string()).collect(),
            coefficients: weights.to_vec(),
            intercept: bias,
        };

        tracing::info!(
            samples = config.samples,
            deteriorating = positives,
            "Trained risk model on synthetic data"
        );
        Ok(Self { params, scaler })
    }

    #[must_use]
    pub fn params(&self) -> &LogisticParams {
        &self.params
    }

    #[must_use]
    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }
}

impl RiskModel for LogisticRiskModel {
    fn predict_proba(&self, vitals: &VitalSigns) -> Result<f64, ModelError> {
        let x = self.scaler.transform(&vitals.to_array());
        let z = self.params.intercept
            + self
                .params
                .coefficients
                .iter()
                .zip(x)
                .map(|(w, v)| w * v)
                .sum::<f64>();
        let p = sigmoid(z);
        if p.is_finite() {
            Ok(p)
        } else {
            Err(ModelError::NonFiniteScore)
        }
    }

    /// Normalized absolute coefficients. Features are standardized, so
    /// coefficient magnitudes are comparable across features.
    fn feature_importances(&self) -> [f64; NUM_FEATURES] {
        let mut out = [0.0; NUM_FEATURES];
        let total: f64 = self.params.coefficients.iter().map(|w| w.abs()).sum();
        for (o, w) in out.iter_mut().zip(&self.params.coefficients) {
            *o = if total > 0.0 {
                w.abs() / total
            } else {
                1.0 / NUM_FEATURES as f64
            };
        }
        out
    }
}

/// On-disk cache for the two model artifacts.
#[derive(Debug, Clone)]
pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn model_path(&self) -> PathBuf {
        self.dir.join(MODEL_FILE)
    }

    fn scaler_path(&self) -> PathBuf {
        self.dir.join(SCALER_FILE)
    }

    /// Load both artifacts if present, otherwise train and persist them.
    ///
    /// # Errors
    /// Returns error if existing artifacts are unreadable or malformed, or
    /// if training or writing fails.
    pub fn load_or_train(&self, config: &TrainingConfig) -> Result<LogisticRiskModel, ModelError> {
        if self.model_path().exists() && self.scaler_path().exists() {
            let model = self.load()?;
            tracing::info!(dir = %self.dir.display(), "Loaded cached risk model");
            return Ok(model);
        }

        tracing::info!(dir = %self.dir.display(), "No cached risk model, training");
        let model = LogisticRiskModel::train(config)?;
        self.save(&model)?;
        Ok(model)
    }

    /// Read both artifacts.
    ///
    /// # Errors
    /// Returns error if either file is missing, unreadable or malformed.
    pub fn load(&self) -> Result<LogisticRiskModel, ModelError> {
        let params: LogisticParams = read_json(&self.model_path())?;
        let scaler: StandardScaler = read_json(&self.scaler_path())?;
        LogisticRiskModel::from_parts(params, scaler)
    }

    /// Write both artifacts, creating the directory if needed.
    ///
    /// # Errors
    /// Returns error if the directory or files cannot be written.
    pub fn save(&self, model: &LogisticRiskModel) -> Result<(), ModelError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.model_path(), serde_json::to_vec_pretty(model.params())?)?;
        fs::write(self.scaler_path(), serde_json::to_vec_pretty(model.scaler())?)?;
        tracing::debug!(dir = %self.dir.display(), "Wrote risk model artifacts");
        Ok(())
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ModelError> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

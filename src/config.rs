//! Runtime configuration from `VITALWATCH_*` environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::VitalWatchError;

pub const DEFAULT_BIND: &str = "127.0.0.1:5000";
pub const DEFAULT_DB_PATH: &str = "clinical_data.db";
pub const DEFAULT_MODEL_DIR: &str = "models";
pub const DEFAULT_LOG_FILE: &str = "vitalwatch.log";

/// Where formatted log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogMode {
    #[default]
    Stdout,
    File,
}

/// Service settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub db_path: PathBuf,
    pub model_dir: PathBuf,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
}

impl AppConfig {
    /// Read settings from the process environment.
    ///
    /// # Errors
    /// Returns `VitalWatchError::Config` if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, VitalWatchError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup. Blank values count as unset.
    ///
    /// # Errors
    /// Returns `VitalWatchError::Config` if a value is unusable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, VitalWatchError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bind_raw = get("VITALWATCH_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw.parse::<SocketAddr>().map_err(|e| {
            VitalWatchError::Config(format!("VITALWATCH_BIND '{bind_raw}': {e}"))
        })?;

        let log_mode = match get("VITALWATCH_LOG_MODE").as_deref() {
            None | Some("stdout") => LogMode::Stdout,
            Some("file") => LogMode::File,
            Some(other) => {
                return Err(VitalWatchError::Config(format!(
                    "VITALWATCH_LOG_MODE must be 'stdout' or 'file', got '{other}'"
                )))
            }
        };

        Ok(Self {
            bind,
            db_path: get("VITALWATCH_DB_PATH")
                .unwrap_or_else(|| DEFAULT_DB_PATH.to_string())
                .into(),
            model_dir: get("VITALWATCH_MODEL_DIR")
                .unwrap_or_else(|| DEFAULT_MODEL_DIR.to_string())
                .into(),
            log_mode,
            log_file: get("VITALWATCH_LOG_FILE")
                .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string())
                .into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<AppConfig, VitalWatchError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[]).expect("defaults");
        assert_eq!(cfg.bind.to_string(), DEFAULT_BIND);
        assert_eq!(cfg.db_path, PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(cfg.model_dir, PathBuf::from(DEFAULT_MODEL_DIR));
        assert_eq!(cfg.log_mode, LogMode::Stdout);
    }

    #[test]
    fn test_overrides() {
        let cfg = config(&[
            ("VITALWATCH_BIND", "0.0.0.0:8080"),
            ("VITALWATCH_DB_PATH", "/var/lib/vitalwatch/data.db"),
            ("VITALWATCH_MODEL_DIR", "/opt/models"),
            ("VITALWATCH_LOG_MODE", "file"),
            ("VITALWATCH_LOG_FILE", "/var/log/vw.log"),
        ])
        .expect("overrides");
        assert_eq!(cfg.bind.port(), 8080);
        assert_eq!(cfg.db_path, PathBuf::from("/var/lib/vitalwatch/data.db"));
        assert_eq!(cfg.model_dir, PathBuf::from("/opt/models"));
        assert_eq!(cfg.log_mode, LogMode::File);
        assert_eq!(cfg.log_file, PathBuf::from("/var/log/vw.log"));
    }

    #[test]
    fn test_blank_values_fall_back() {
        let cfg = config(&[("VITALWATCH_BIND", "  "), ("VITALWATCH_LOG_MODE", "")])
            .expect("blank");
        assert_eq!(cfg.bind.to_string(), DEFAULT_BIND);
        assert_eq!(cfg.log_mode, LogMode::Stdout);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            config(&[("VITALWATCH_BIND", "not-an-address")]),
            Err(VitalWatchError::Config(_))
        ));
        assert!(matches!(
            config(&[("VITALWATCH_LOG_MODE", "syslog")]),
            Err(VitalWatchError::Config(_))
        ));
    }
}

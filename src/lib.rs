//! # VitalWatch
//!
//! Clinical early-warning service: ingests vital-sign readings from upstream
//! hospital systems, stores them locally, and scores deterioration risk on
//! demand.
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core clinical types (Patient, VitalSigns, RiskLevel, AuditEntry)
//! - `ports`: Trait definitions for storage and the risk model
//! - `adapters`: Concrete implementations (SQLite, logistic regression, log sanitizer)
//! - `application`: Use cases (ingestion, scoring, queries)
//! - `api`: HTTP surface (axum)
//! - `config`: Environment-driven settings

pub mod adapters;
pub mod api;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use domain::{RiskAssessment, RiskLevel, VitalSigns};

/// Result type for VitalWatch operations
pub type Result<T> = std::result::Result<T, VitalWatchError>;

/// Main error type for VitalWatch
#[derive(Debug, thiserror::Error)]
pub enum VitalWatchError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Storage operation failed: {0}")]
    Storage(#[from] adapters::StorageError),

    #[error("Configuration error: {0}")]
    Config(String),
}

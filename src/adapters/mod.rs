//! Adapters layer: Concrete implementations of ports.
//!
//! - `sqlite`: SQLite persistence for patients, readings, predictions, audit
//! - `model`: scaler + logistic-regression risk model with JSON artifacts
//! - `sanitize`: identifier filtering for logs

pub mod model;
pub mod sanitize;
pub mod sqlite;

// Re-export storage error for lib.rs
pub use sqlite::StorageError;

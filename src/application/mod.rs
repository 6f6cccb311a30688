//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the core use cases of the application.

mod ingestion;
mod queries;
mod scoring;

pub use ingestion::{IngestReceipt, IngestRequest, IngestionService, UNKNOWN_SOURCE};
pub use queries::{DashboardSummary, QueryService, RECENT_PREDICTIONS_LIMIT, VITALS_HISTORY_LIMIT};
pub use scoring::ScoringService;

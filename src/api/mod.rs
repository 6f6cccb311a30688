//! HTTP surface.
//!
//! | Method | Path                       | Response                        |
//! |--------|----------------------------|---------------------------------|
//! | POST   | `/api/ingest`              | 201 receipt with anonymized id  |
//! | GET    | `/api/patients`            | patient summaries               |
//! | GET    | `/api/vitals/:patient_id`  | up to 50 readings, newest first |
//! | POST   | `/api/predict/:patient_id` | risk assessment, or 400         |
//! | GET    | `/api/dashboard`           | daily aggregates                |
//! | GET    | `/health`                  | liveness                        |
//! | GET    | `/`                        | static dashboard page           |

mod error;
mod handlers;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::adapters::model::LogisticRiskModel;
use crate::adapters::sqlite::SqliteStorage;
use crate::application::{IngestionService, QueryService, ScoringService};
use crate::ports::RiskModel;

pub use error::ApiError;

/// Shared handler state. Cloning only bumps reference counts.
pub struct AppState<M = LogisticRiskModel>
where
    M: RiskModel,
{
    ingestion: Arc<IngestionService<SqliteStorage>>,
    scoring: Arc<ScoringService<M, SqliteStorage>>,
    queries: Arc<QueryService<SqliteStorage>>,
}

impl<M: RiskModel> AppState<M> {
    pub fn new(storage: Arc<SqliteStorage>, model: Arc<M>) -> Self {
        Self {
            ingestion: Arc::new(IngestionService::new(Arc::clone(&storage))),
            scoring: Arc::new(ScoringService::new(model, Arc::clone(&storage))),
            queries: Arc::new(QueryService::new(storage)),
        }
    }
}

impl<M: RiskModel> Clone for AppState<M> {
    fn clone(&self) -> Self {
        Self {
            ingestion: Arc::clone(&self.ingestion),
            scoring: Arc::clone(&self.scoring),
            queries: Arc::clone(&self.queries),
        }
    }
}

/// Build the application router with a permissive CORS layer.
pub fn router<M: RiskModel + 'static>(state: AppState<M>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/api/ingest", post(handlers::ingest::<M>))
        .route("/api/patients", get(handlers::patients::<M>))
        .route("/api/vitals/:patient_id", get(handlers::vitals::<M>))
        .route("/api/predict/:patient_id", post(handlers::predict::<M>))
        .route("/api/dashboard", get(handlers::dashboard::<M>))
        .layer(cors)
        .with_state(state)
}

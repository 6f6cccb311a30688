//! Request handlers.
//!
//! Every service call touches SQLite through a blocking mutex, so it runs on
//! the blocking pool rather than on an async worker.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};

use super::error::ApiError;
use super::AppState;
use crate::application::{DashboardSummary, IngestRequest};
use crate::domain::{format_timestamp, PatientSummary, RiskAssessment, VitalRecord};
use crate::ports::RiskModel;
use crate::VitalWatchError;

const DASHBOARD_PAGE: &str = include_str!("../../web/index.html");

async fn run_blocking<T, F>(task: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, VitalWatchError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| ApiError::internal(format!("Worker task failed: {e}")))?
        .map_err(ApiError::from)
}

pub async fn ingest<M: RiskModel + 'static>(
    State(state): State<AppState<M>>,
    payload: Result<Json<IngestRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(request) = payload?;
    let service = Arc::clone(&state.ingestion);
    let receipt = run_blocking(move || service.ingest(request)).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "message": "Data ingested successfully",
            "anonymized_id": receipt.anonymized_id,
        })),
    ))
}

pub async fn patients<M: RiskModel + 'static>(
    State(state): State<AppState<M>>,
) -> Result<Json<Vec<PatientSummary>>, ApiError> {
    let service = Arc::clone(&state.queries);
    run_blocking(move || service.list_patients()).await.map(Json)
}

pub async fn vitals<M: RiskModel + 'static>(
    State(state): State<AppState<M>>,
    Path(patient_id): Path<String>,
) -> Result<Json<Vec<VitalRecord>>, ApiError> {
    let service = Arc::clone(&state.queries);
    run_blocking(move || service.vitals_history(&patient_id))
        .await
        .map(Json)
}

pub async fn predict<M: RiskModel + 'static>(
    State(state): State<AppState<M>>,
    Path(patient_id): Path<String>,
) -> Result<Json<RiskAssessment>, ApiError> {
    let service = Arc::clone(&state.scoring);
    run_blocking(move || service.score(&patient_id))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::bad_request("Unable to generate prediction"))
}

pub async fn dashboard<M: RiskModel + 'static>(
    State(state): State<AppState<M>>,
) -> Result<Json<DashboardSummary>, ApiError> {
    let service = Arc::clone(&state.queries);
    run_blocking(move || service.dashboard()).await.map(Json)
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": format_timestamp(&Utc::now()),
    }))
}

pub async fn index() -> Html<&'static str> {
    Html(DASHBOARD_PAGE)
}

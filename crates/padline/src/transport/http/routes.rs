//! HTTP route handlers.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::PADLINE_VERSION;
use crate::schedule::BatchRequest;
use crate::service::{ServiceError, SessionService};

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    /// Pad line capacity.
    pub n: i64,
    /// Safety margin.
    pub d: i64,
}

#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: &'static str,
    pub sessions: usize,
    pub version: &'static str,
}

fn error_body(message: String) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "error": message }))
}

async fn health_check(State(service): State<Arc<SessionService>>) -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "READY",
        sessions: service.session_count(),
        version: PADLINE_VERSION,
    })
}

async fn create_session(
    State(service): State<Arc<SessionService>>,
    Json(request): Json<CreateSessionRequest>,
) -> impl IntoResponse {
    match service.create(request.n, request.d) {
        Ok(handle) => (StatusCode::CREATED, Json(serde_json::json!(handle))),
        Err(e) => (StatusCode::UNPROCESSABLE_ENTITY, error_body(e.to_string())),
    }
}

async fn run_session(
    State(service): State<Arc<SessionService>>,
    Path(id): Path<Uuid>,
    Json(request): Json<BatchRequest>,
) -> impl IntoResponse {
    match service.run(id, &request) {
        Ok(report) => (StatusCode::OK, Json(serde_json::json!(report))),
        Err(e) => (not_found_status(&e), error_body(e.to_string())),
    }
}

async fn get_session(
    State(service): State<Arc<SessionService>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match service.snapshot(id) {
        Ok(snapshot) => (StatusCode::OK, Json(serde_json::json!(snapshot))),
        Err(e) => (not_found_status(&e), error_body(e.to_string())),
    }
}

async fn get_session_stats(
    State(service): State<Arc<SessionService>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match service.stats(id) {
        Ok(stats) => (StatusCode::OK, Json(serde_json::json!(stats))),
        Err(e) => (not_found_status(&e), error_body(e.to_string())),
    }
}

async fn delete_session(
    State(service): State<Arc<SessionService>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    if service.delete(id) {
        (StatusCode::OK, Json(serde_json::json!({})))
    } else {
        (StatusCode::NOT_FOUND, Json(serde_json::json!({})))
    }
}

fn not_found_status(error: &ServiceError) -> StatusCode {
    match error {
        ServiceError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::InvalidSession(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

pub fn routes(service: Arc<SessionService>) -> Router {
    Router::new()
        .route("/health-check", get(health_check))
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", get(get_session).delete(delete_session))
        .route("/sessions/{id}/run", post(run_session))
        .route("/sessions/{id}/stats", get(get_session_stats))
        .with_state(service)
}

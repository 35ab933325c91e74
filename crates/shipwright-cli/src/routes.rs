//! HTTP surface: task intake, secret administration and run status.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use shipwright_core::app::{AdminUpdate, IntakeError, IntakeRequest, RunStatus, RunningApp};
use shipwright_core::domain::RunId;
use subtle::ConstantTimeEq;
use thiserror::Error;

#[derive(Clone)]
pub struct AppState {
    app: RunningApp,
    admin_token: Option<Arc<SecretString>>,
}

impl AppState {
    pub fn new(app: RunningApp, admin_token: Option<SecretString>) -> Self {
        Self {
            app,
            admin_token: admin_token.map(Arc::new),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/task", post(submit_task))
        .route("/api/runs/{run_id}", get(run_status))
        .route("/admin/add_secret", post(add_secret))
        .with_state(state)
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid json")]
    InvalidJson,

    #[error("unauthorized")]
    Unauthorized,

    #[error("run not found")]
    RunNotFound,

    #[error("internal error")]
    Internal,

    #[error(transparent)]
    Intake(#[from] IntakeError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::InvalidJson => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::RunNotFound => StatusCode::NOT_FOUND,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Intake(IntakeError::Busy | IntakeError::Closed) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Intake(IntakeError::Store(e)) => {
                tracing::error!("secret store update failed: {e}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Intake(_) => StatusCode::BAD_REQUEST,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// POST /api/task - validate, queue, acknowledge
async fn submit_task(
    State(state): State<AppState>,
    payload: Result<Json<IntakeRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload.map_err(|_| ApiError::InvalidJson)?;
    let run_id = state.app.intake.accept(request)?;
    Ok(Json(json!({ "status": "accepted", "run_id": run_id.to_string() })))
}

/// POST /admin/add_secret - overwrite one email's secret
///
/// Persisting fsyncs the secret file, so it runs on the blocking pool.
async fn add_secret(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<AdminUpdate>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    authorize(state.admin_token.as_deref(), &headers)?;
    let Json(update) = payload.map_err(|_| ApiError::InvalidJson)?;
    let intake = Arc::clone(&state.app.intake);
    tokio::task::spawn_blocking(move || intake.update_secret(update))
        .await
        .map_err(|e| {
            tracing::error!("secret update task failed: {e}");
            ApiError::Internal
        })??;
    Ok(Json(json!({ "status": "saved" })))
}

/// GET /api/runs/{run_id} - current status of one run
async fn run_status(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> Result<Json<RunStatus>, ApiError> {
    let run_id: RunId = run_id.parse().map_err(|_| ApiError::RunNotFound)?;
    state
        .app
        .board
        .get(run_id)
        .map(Json)
        .ok_or(ApiError::RunNotFound)
}

/// No configured token means the route is open.
fn authorize(token: Option<&SecretString>, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(token) = token else {
        return Ok(());
    };
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    match presented {
        Some(p) if bool::from(p.as_bytes().ct_eq(token.expose_secret().as_bytes())) => Ok(()),
        _ => Err(ApiError::Unauthorized),
    }
}

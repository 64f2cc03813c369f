//! HTTP API for medical cost inference
//!
//! Provides REST endpoints over a loaded cost model using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /metrics` - Prometheus-formatted metrics
//! - `POST /predict` - Predict charges for one patient record
//!
//! ## Example
//!
//! ```rust,ignore
//! use tasar::api::{create_router, AppState};
//!
//! let state = AppState::demo();
//! let app = create_router(state);
//! axum::serve(listener, app).await?;
//! ```

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::{
    metrics::MetricsCollector,
    model::{CostPredictor, LinearCostModel},
};

mod types;
pub use types::{ErrorResponse, HealthResponse, PatientRecord, PredictResponse};

/// Application state shared across handlers
///
/// Constructed once at startup and injected via `Router::with_state`; the
/// model is immutable for the process lifetime and shared by reference.
#[derive(Clone)]
pub struct AppState {
    /// The loaded predictor, behind the narrow trait so tests can
    /// substitute a stub
    model: Arc<dyn CostPredictor>,
    /// Metrics collector for monitoring
    metrics: Arc<MetricsCollector>,
    /// Display name of the loaded model
    model_name: String,
}

impl AppState {
    /// Create application state around a loaded predictor
    #[must_use]
    pub fn new(model: Arc<dyn CostPredictor>, model_name: impl Into<String>) -> Self {
        Self {
            model,
            metrics: Arc::new(MetricsCollector::new()),
            model_name: model_name.into(),
        }
    }

    /// State backed by the in-memory demo model (no artifact file)
    #[must_use]
    pub fn demo() -> Self {
        Self::new(Arc::new(LinearCostModel::demo()), "medcost-demo")
    }

    /// Metrics collector handle
    #[must_use]
    pub fn metrics(&self) -> &Arc<MetricsCollector> {
        &self.metrics
    }
}

/// Create the API router
///
/// # Arguments
///
/// * `state` - Application state with the loaded model
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/predict", post(predict_handler))
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: crate::VERSION.to_string(),
        model: state.model_name.clone(),
    })
}

/// Metrics handler - returns Prometheus-formatted metrics
async fn metrics_handler(State(state): State<AppState>) -> String {
    state.metrics.to_prometheus()
}

/// Prediction handler (`POST /predict`)
///
/// The `Json` extractor has already validated presence and types of all
/// six fields by the time this runs. The handler builds the one-row
/// frame, invokes the model, and returns the single predicted value.
/// Schema and vocabulary failures map to 422; anything else the model
/// reports maps to 500.
async fn predict_handler(
    State(state): State<AppState>,
    Json(record): Json<PatientRecord>,
) -> Result<Json<PredictResponse>, (StatusCode, Json<ErrorResponse>)> {
    let start = Instant::now();
    let row = record.to_row();

    match state.model.predict_one(&row) {
        Ok(predicted_charges) if predicted_charges.is_finite() => {
            state.metrics.record_success(start.elapsed());
            Ok(Json(PredictResponse { predicted_charges }))
        }
        Ok(value) => {
            state.metrics.record_failure();
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Model produced a non-finite prediction: {value}"),
                }),
            ))
        }
        Err(err) => {
            state.metrics.record_failure();
            let status = if err.is_client_error() {
                StatusCode::UNPROCESSABLE_ENTITY
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            Err((status, Json(ErrorResponse {
                error: err.to_string(),
            })))
        }
    }
}

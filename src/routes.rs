//! API route handlers.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::{ErrorKind, PipelineError};
use crate::pipeline::PitchSpeedService;
use crate::types::{
    ErrorResponse, HealthResponse, ModelInfoResponse, PredictRequest, PredictionResult,
};

/// Application state shared across handlers.
pub struct AppState {
    pub service: PitchSpeedService,
    pub config: AppConfig,
}

/// Error type for API handlers.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        let status = match err.kind() {
            ErrorKind::InvalidQuery => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::UnknownFeatureValue => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::PredictionError | ErrorKind::LoadFailure => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            body: ErrorResponse::from(&err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Model info endpoint.
pub async fn model_info(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ModelInfoResponse>, ApiError> {
    let resources = state
        .service
        .store()
        .get()
        .map_err(PipelineError::from)?;
    let paths = &state.config.resources;

    Ok(Json(ModelInfoResponse {
        model_path: paths.model_path.clone(),
        mapping_path: paths.mapping_path.clone(),
        history_path: paths.history_path.clone(),
        model_kind: resources.model.kind().to_string(),
        feature_names: resources.mapping.feature_names().map(str::to_string).collect(),
        historical_rows: resources.history.len(),
    }))
}

/// Prediction endpoint.
pub async fn predict(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PredictRequest>,
) -> Result<Json<PredictionResult>, ApiError> {
    let result = state
        .service
        .predict_first_pitch_speed(&req.last_name, &req.first_name)?;
    Ok(Json(result))
}

//! Request and response types for the pitch speed service.

use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, PipelineError};
use crate::reference::FirstPitch;

/// A pitcher name as entered by a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PitcherQuery {
    last_name: String,
    first_name: String,
}

impl PitcherQuery {
    /// Both parts are required; surrounding whitespace is dropped.
    pub fn new(last_name: &str, first_name: &str) -> Result<Self, PipelineError> {
        let last_name = last_name.trim();
        let first_name = first_name.trim();
        if last_name.is_empty() || first_name.is_empty() {
            return Err(PipelineError::InvalidQuery(
                "both the pitcher's last name and first name are required".to_string(),
            ));
        }
        Ok(Self {
            last_name: last_name.to_string(),
            first_name: first_name.to_string(),
        })
    }

    /// Lookup key, "Last, First".
    pub fn full_name(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }
}

/// Successful prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub pitcher: String,
    pub pitcher_id: String,
    pub throws: String,
    pub predicted_speed_mph: f64,
    /// Recorded first pitches of games, at most 5
    pub history: Vec<FirstPitch>,
}

/// Prediction request body
#[derive(Debug, Clone, Deserialize)]
pub struct PredictRequest {
    pub last_name: String,
    pub first_name: String,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Model info response
#[derive(Debug, Serialize)]
pub struct ModelInfoResponse {
    pub model_path: String,
    pub mapping_path: String,
    pub history_path: String,
    pub model_kind: String,
    pub feature_names: Vec<String>,
    pub historical_rows: usize,
}

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorKind,
    pub message: String,
}

impl From<&PipelineError> for ErrorResponse {
    fn from(err: &PipelineError) -> Self {
        Self {
            error: err.kind(),
            message: err.to_string(),
        }
    }
}

//! Error taxonomy for resource loading and per-request prediction.
//!
//! Load failures are fatal and surface at startup. Everything that can go
//! wrong while answering a single query is returned as a [`PipelineError`]
//! value so callers decide how to render it.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to load one of the three startup artifacts.
#[derive(Error, Debug)]
pub enum ResourceLoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to load historical table {}: {source}", path.display())]
    Table {
        path: PathBuf,
        #[source]
        source: polars::error::PolarsError,
    },

    #[error("failed to load model {}: {reason}", path.display())]
    Model { path: PathBuf, reason: String },

    #[error("schema mismatch in {}: {reason}", path.display())]
    Schema { path: PathBuf, reason: String },

    #[error("unsupported artifact format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("model expects {model_width} features but mapping defines {mapping_width}")]
    FeatureWidth {
        model_width: usize,
        mapping_width: usize,
    },
}

/// Failure to turn a raw record into model codes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("value '{value}' for '{feature}' is unknown")]
    UnknownValue { feature: String, value: String },

    #[error("raw record has no value for feature '{feature}'")]
    MissingField { feature: String },
}

/// Failure inside the forward pass.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictionError {
    #[error("feature vector has {actual} values, model expects {expected}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("model inference failed: {0}")]
    Inference(String),

    #[error("model returned no output")]
    EmptyOutput,
}

/// Stable tag for each per-request failure, used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    InvalidQuery,
    NotFound,
    UnknownFeatureValue,
    PredictionError,
    LoadFailure,
}

/// Per-request outcome other than success.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{0}")]
    InvalidQuery(String),

    #[error("'{0}' was not found in the historical data")]
    NotFound(String),

    #[error("{0}")]
    UnknownFeatureValue(EncodeError),

    #[error(transparent)]
    Prediction(#[from] PredictionError),

    #[error("resources unavailable: {0}")]
    LoadFailure(#[from] ResourceLoadError),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::InvalidQuery(_) => ErrorKind::InvalidQuery,
            PipelineError::NotFound(_) => ErrorKind::NotFound,
            PipelineError::UnknownFeatureValue(_) => ErrorKind::UnknownFeatureValue,
            PipelineError::Prediction(_) => ErrorKind::PredictionError,
            PipelineError::LoadFailure(_) => ErrorKind::LoadFailure,
        }
    }
}

impl From<EncodeError> for PipelineError {
    fn from(err: EncodeError) -> Self {
        match err {
            EncodeError::UnknownValue { .. } => PipelineError::UnknownFeatureValue(err),
            // The fixed request template and the load-time mapping check agree
            // on the feature set, so a missing field is an internal fault.
            EncodeError::MissingField { feature } => PipelineError::Prediction(
                PredictionError::Inference(format!("no raw value for feature '{}'", feature)),
            ),
        }
    }
}

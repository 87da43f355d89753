//! Release-speed regressor loading and inference.

use anyhow::{Context, Result};
use ndarray::Array2;
use ort::session::Session;
use ort::value::Tensor;
use serde::Deserialize;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

use crate::encoder::EncodedFeatures;
use crate::error::{PredictionError, ResourceLoadError};

/// ONNX regressor (e.g. an exported gradient-boosted ensemble).
pub struct OnnxRegressor {
    session: Mutex<Session>,
    input_width: Option<usize>,
}

impl OnnxRegressor {
    /// Load ONNX model from file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let session = Session::builder()?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
            .with_intra_threads(1)?
            .commit_from_file(path.as_ref())
            .context("Failed to load ONNX model")?;

        let input_width = session
            .inputs
            .first()
            .and_then(|input| input.input_type.tensor_shape())
            .and_then(|shape| declared_width(shape));

        Ok(Self {
            session: Mutex::new(session),
            input_width,
        })
    }

    /// Feature count of input 0, if the graph fixes it.
    pub fn input_width(&self) -> Option<usize> {
        self.input_width
    }

    /// Predict one speed per row of `features` (shape: rows x n_features).
    pub fn predict(&self, features: Array2<f32>) -> Result<Vec<f64>> {
        let n_rows = features.nrows();

        let input_tensor = Tensor::from_array(features)?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow::anyhow!("Failed to lock session: {}", e))?;

        let outputs = session.run(ort::inputs![input_tensor])?;

        if outputs.len() < 1 {
            anyhow::bail!("Model produced no outputs");
        }

        // Output 0 is [rows] or [rows, 1]
        let (shape, values) = outputs[0]
            .try_extract_tensor::<f32>()
            .context("Failed to extract prediction tensor")?;

        if values.len() < n_rows {
            anyhow::bail!(
                "Unexpected output shape: {:?}, expected {} values",
                shape.iter().copied().collect::<Vec<i64>>(),
                n_rows
            );
        }

        Ok(values.iter().take(n_rows).map(|&v| v as f64).collect())
    }
}

/// Last dimension of an input shape; dynamic (`-1`) dimensions yield `None`.
fn declared_width(shape: &[i64]) -> Option<usize> {
    shape
        .last()
        .copied()
        .filter(|&dim| dim > 0)
        .and_then(|dim| usize::try_from(dim).ok())
}

/// Linear regressor stored as JSON.
///
/// ```json
/// {"intercept": 93.1, "coefficients": [0.0, 0.8, 0.0, 0.0, 0.0, -0.02]}
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LinearRegressor {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LinearRegressor {
    pub fn new(intercept: f64, coefficients: Vec<f64>) -> Self {
        Self {
            intercept,
            coefficients,
        }
    }

    pub fn predict(&self, features: &Array2<f32>) -> Vec<f64> {
        features
            .rows()
            .into_iter()
            .map(|row| {
                row.iter()
                    .zip(&self.coefficients)
                    .fold(self.intercept, |acc, (&x, &w)| acc + x as f64 * w)
            })
            .collect()
    }
}

/// Trained release-speed model. Immutable once loaded.
pub enum SpeedModel {
    Onnx(OnnxRegressor),
    Linear(LinearRegressor),
}

impl SpeedModel {
    /// Load a model, picking the format by extension (`.onnx` or `.json`).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ResourceLoadError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        let model = match extension.as_deref() {
            Some("onnx") => {
                if !path.exists() {
                    return Err(ResourceLoadError::Io {
                        path: path.to_path_buf(),
                        source: std::io::Error::from(std::io::ErrorKind::NotFound),
                    });
                }
                let onnx = OnnxRegressor::load(path).map_err(|e| ResourceLoadError::Model {
                    path: path.to_path_buf(),
                    reason: format!("{:#}", e),
                })?;
                SpeedModel::Onnx(onnx)
            }
            Some("json") => {
                let content =
                    std::fs::read_to_string(path).map_err(|source| ResourceLoadError::Io {
                        path: path.to_path_buf(),
                        source,
                    })?;
                let linear: LinearRegressor =
                    serde_json::from_str(&content).map_err(|source| ResourceLoadError::Json {
                        path: path.to_path_buf(),
                        source,
                    })?;
                SpeedModel::Linear(linear)
            }
            _ => {
                return Err(ResourceLoadError::UnsupportedFormat {
                    path: path.to_path_buf(),
                })
            }
        };

        info!("Loaded {} model from {}", model.kind(), path.display());
        Ok(model)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SpeedModel::Onnx(_) => "onnx",
            SpeedModel::Linear(_) => "linear",
        }
    }

    /// Input width, when the artifact declares one.
    ///
    /// ONNX graphs with a dynamic feature axis are checked by the runtime on
    /// each call instead.
    pub fn input_width(&self) -> Option<usize> {
        match self {
            SpeedModel::Onnx(m) => m.input_width(),
            SpeedModel::Linear(l) => Some(l.coefficients.len()),
        }
    }

    fn predict_rows(&self, features: Array2<f32>) -> Result<Vec<f64>, PredictionError> {
        match self {
            SpeedModel::Onnx(m) => m
                .predict(features)
                .map_err(|e| PredictionError::Inference(format!("{:#}", e))),
            SpeedModel::Linear(m) => Ok(m.predict(&features)),
        }
    }
}

impl std::fmt::Debug for SpeedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpeedModel::Onnx(_) => f.write_str("SpeedModel::Onnx"),
            SpeedModel::Linear(l) => f.debug_tuple("SpeedModel::Linear").field(l).finish(),
        }
    }
}

/// Single forward pass: predicted release speed in mph.
pub fn predict(features: &EncodedFeatures, model: &SpeedModel) -> Result<f64, PredictionError> {
    if let Some(expected) = model.input_width() {
        if expected != features.len() {
            return Err(PredictionError::ShapeMismatch {
                expected,
                actual: features.len(),
            });
        }
    }

    let row = Array2::from_shape_vec((1, features.len()), features.to_f32())
        .map_err(|e| PredictionError::Inference(e.to_string()))?;

    model
        .predict_rows(row)?
        .first()
        .copied()
        .ok_or(PredictionError::EmptyOutput)
}

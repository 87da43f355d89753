//! First-pitch release speed prediction.
//!
//! Resolves a pitcher by name against historical pitch records, encodes the
//! fixed first-pitch scenario with the training-time feature mapping, runs
//! the trained regressor and returns the prediction alongside the pitcher's
//! recorded first pitches of games.

pub mod cli;
pub mod config;
pub mod encoder;
pub mod error;
pub mod history;
pub mod model;
pub mod pipeline;
pub mod reference;
pub mod resolver;
pub mod routes;
pub mod store;
pub mod types;

pub use error::{ErrorKind, PipelineError, ResourceLoadError};
pub use pipeline::{run_pipeline, PitchSpeedService};
pub use store::{ResourcePaths, ResourceStore, Resources};
pub use types::{PitcherQuery, PredictionResult};

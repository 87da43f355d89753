//! Prediction resolution: lookup, encode, infer, then fetch reference rows.

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::config::HistoryConfig;
use crate::encoder::{encode, RawRecord};
use crate::error::PipelineError;
use crate::model::predict;
use crate::reference::find_first_pitches;
use crate::resolver::{resolve, Resolution};
use crate::store::{ResourceStore, Resources};
use crate::types::{PitcherQuery, PredictionResult};

/// Run one query against loaded resources.
///
/// Stops at the first failure; an unknown pitcher never reaches the encoder
/// or the model.
pub fn run_pipeline(
    resources: &Resources,
    query: &PitcherQuery,
    history: &HistoryConfig,
) -> Result<PredictionResult, PipelineError> {
    let full_name = query.full_name();

    let identity = match resolve(&full_name, resources.history.rows()) {
        Resolution::Found { identity, .. } => identity,
        Resolution::NotFound(name) => {
            info!("No historical rows for '{}'", name);
            return Err(PipelineError::NotFound(name));
        }
    };
    debug!(
        "Resolved '{}' to pitcher {} ({})",
        full_name, identity.pitcher, identity.throws
    );

    let encoded = encode(&RawRecord::first_pitch(&identity), &resources.mapping).map_err(|e| {
        warn!("Encoding failed for '{}': {}", full_name, e);
        PipelineError::from(e)
    })?;
    debug!("Encoded features {:?} = {:?}", encoded.names(), encoded.codes());

    let predicted_speed_mph = predict(&encoded, &resources.model).map_err(|e| {
        error!("Prediction failed for '{}': {}", full_name, e);
        PipelineError::from(e)
    })?;

    let reference = find_first_pitches(
        identity.pitcher,
        resources.history.rows(),
        history.limit,
        history.order,
    );

    Ok(PredictionResult {
        pitcher: full_name,
        pitcher_id: identity.id(),
        throws: identity.throws,
        predicted_speed_mph,
        history: reference,
    })
}

/// Caller-facing entry point over a shared [`ResourceStore`].
pub struct PitchSpeedService {
    store: Arc<ResourceStore>,
    history: HistoryConfig,
}

impl PitchSpeedService {
    pub fn new(store: Arc<ResourceStore>, history: HistoryConfig) -> Self {
        Self { store, history }
    }

    /// Predict the release speed of a pitcher's first pitch of a game.
    pub fn predict_first_pitch_speed(
        &self,
        last_name: &str,
        first_name: &str,
    ) -> Result<PredictionResult, PipelineError> {
        let query = PitcherQuery::new(last_name, first_name)?;
        let resources = self.store.get()?;
        run_pipeline(&resources, &query, &self.history)
    }

    pub fn store(&self) -> &ResourceStore {
        &self.store
    }
}

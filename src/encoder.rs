//! Categorical feature mapping and encoding.
//!
//! The mapping is frozen at training time. Its top-level key order is the
//! column order the model was trained on, so it is kept as an [`IndexMap`]
//! and never rebuilt from hash iteration.

use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use tracing::info;

use crate::error::{EncodeError, ResourceLoadError};
use crate::resolver::PitcherIdentity;

/// Feature names a mapping must define, in request-template order.
pub const FEATURE_NAMES: [&str; 6] = [
    "pitcher",
    "p_throws",
    "inning",
    "at_bat_number",
    "pitch_number",
    "pitch_type",
];

/// Pitch type assumed for every prediction (four-seam fastball).
pub const FIRST_PITCH_TYPE: &str = "FF";

/// Raw shape of a mapping file.
pub type FeatureTable = IndexMap<String, IndexMap<String, i64>>;

/// Feature name -> (raw value -> integer code).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "FeatureTable")]
pub struct FeatureMapping {
    features: IndexMap<String, IndexMap<String, i64>>,
}

impl FeatureMapping {
    /// Build from ordered parts, validating the feature set.
    pub fn new(features: FeatureTable) -> Result<Self, String> {
        let mapping = Self { features };
        mapping.validate()?;
        Ok(mapping)
    }

    /// Load from a JSON object of objects.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ResourceLoadError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ResourceLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        // Parse the raw table first so a bad feature set is a schema error,
        // not a JSON one.
        let features: FeatureTable =
            serde_json::from_str(&content).map_err(|source| ResourceLoadError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        let mapping = Self::new(features).map_err(|reason| ResourceLoadError::Schema {
            path: path.to_path_buf(),
            reason,
        })?;

        info!(
            "Loaded feature mapping {}: {} features ({})",
            path.display(),
            mapping.len(),
            mapping.feature_names().collect::<Vec<_>>().join(", ")
        );
        Ok(mapping)
    }

    fn validate(&self) -> Result<(), String> {
        let expected: BTreeSet<&str> = FEATURE_NAMES.iter().copied().collect();
        let actual: BTreeSet<&str> = self.features.keys().map(String::as_str).collect();
        if expected == actual {
            return Ok(());
        }

        let missing: Vec<&str> = expected.difference(&actual).copied().collect();
        let extra: Vec<&str> = actual.difference(&expected).copied().collect();
        Err(format!(
            "mapping features do not match model inputs (missing: [{}], unexpected: [{}])",
            missing.join(", "),
            extra.join(", ")
        ))
    }

    /// Feature names in model input order.
    pub fn feature_names(&self) -> impl Iterator<Item = &str> {
        self.features.keys().map(String::as_str)
    }

    /// Code for one raw value, if the training data saw it.
    pub fn code(&self, feature: &str, value: &str) -> Option<i64> {
        self.features.get(feature)?.get(value).copied()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl TryFrom<FeatureTable> for FeatureMapping {
    type Error = String;

    fn try_from(features: FeatureTable) -> Result<Self, Self::Error> {
        Self::new(features)
    }
}

/// Raw string values keyed by feature name, before encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    values: HashMap<String, String>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// The hypothetical first pitch of a game: inning 1, first at-bat,
    /// first pitch, four-seam fastball.
    pub fn first_pitch(identity: &PitcherIdentity) -> Self {
        Self::new()
            .with("pitcher", identity.id())
            .with("p_throws", identity.throws.clone())
            .with("inning", "1")
            .with("at_bat_number", "1")
            .with("pitch_number", "1")
            .with("pitch_type", FIRST_PITCH_TYPE)
    }

    pub fn with(mut self, feature: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(feature.into(), value.into());
        self
    }

    pub fn get(&self, feature: &str) -> Option<&str> {
        self.values.get(feature).map(String::as_str)
    }
}

/// Encoded feature vector, values in mapping key order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFeatures {
    names: Vec<String>,
    codes: Vec<i64>,
}

impl EncodedFeatures {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn codes(&self) -> &[i64] {
        &self.codes
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Values as the model's input element type.
    pub fn to_f32(&self) -> Vec<f32> {
        self.codes.iter().map(|&c| c as f32).collect()
    }
}

/// Map every feature of `raw` to its code.
///
/// Fails on the first feature whose value the mapping has never seen; no
/// default code is substituted and no partial vector is returned.
pub fn encode(raw: &RawRecord, mapping: &FeatureMapping) -> Result<EncodedFeatures, EncodeError> {
    let mut names = Vec::with_capacity(mapping.len());
    let mut codes = Vec::with_capacity(mapping.len());

    for (feature, table) in &mapping.features {
        let value = raw.get(feature).ok_or_else(|| EncodeError::MissingField {
            feature: feature.clone(),
        })?;
        let code = table
            .get(value)
            .copied()
            .ok_or_else(|| EncodeError::UnknownValue {
                feature: feature.clone(),
                value: value.to_string(),
            })?;
        names.push(feature.clone());
        codes.push(code);
    }

    Ok(EncodedFeatures { names, codes })
}

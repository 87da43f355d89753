//! Process-lifetime cache of the model, feature mapping and historical table.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use tracing::info;

use crate::config::ResourceConfig;
use crate::encoder::FeatureMapping;
use crate::error::ResourceLoadError;
use crate::history::HistoricalTable;
use crate::model::SpeedModel;

/// The three immutable artifacts every request reads.
#[derive(Debug)]
pub struct Resources {
    pub model: SpeedModel,
    pub mapping: FeatureMapping,
    pub history: HistoricalTable,
}

impl Resources {
    /// Assemble from already-loaded parts, checking they agree.
    pub fn new(
        model: SpeedModel,
        mapping: FeatureMapping,
        history: HistoricalTable,
    ) -> Result<Self, ResourceLoadError> {
        if let Some(width) = model.input_width() {
            if width != mapping.len() {
                return Err(ResourceLoadError::FeatureWidth {
                    model_width: width,
                    mapping_width: mapping.len(),
                });
            }
        }
        Ok(Self {
            model,
            mapping,
            history,
        })
    }

    /// Read all three artifacts from disk.
    pub fn load(paths: &ResourcePaths) -> Result<Self, ResourceLoadError> {
        let model = SpeedModel::load(&paths.model)?;
        let mapping = FeatureMapping::from_file(&paths.mapping)?;
        let history = HistoricalTable::load(&paths.history)?;

        Self::new(model, mapping, history)
    }
}

/// Where the artifacts live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePaths {
    pub model: PathBuf,
    pub mapping: PathBuf,
    pub history: PathBuf,
}

impl ResourcePaths {
    pub fn new(
        model: impl AsRef<Path>,
        mapping: impl AsRef<Path>,
        history: impl AsRef<Path>,
    ) -> Self {
        Self {
            model: model.as_ref().to_path_buf(),
            mapping: mapping.as_ref().to_path_buf(),
            history: history.as_ref().to_path_buf(),
        }
    }
}

impl From<&ResourceConfig> for ResourcePaths {
    fn from(config: &ResourceConfig) -> Self {
        Self::new(
            &config.model_path,
            &config.mapping_path,
            &config.history_path,
        )
    }
}

/// Lazily loaded, load-once resource holder.
///
/// The first successful [`get`](Self::get) reads storage; concurrent first
/// callers wait on the same load. Afterwards every caller shares one
/// immutable [`Resources`] without locking. A failed load is not cached.
pub struct ResourceStore {
    paths: ResourcePaths,
    cell: OnceLock<Arc<Resources>>,
    init: Mutex<()>,
    loads: AtomicUsize,
}

impl ResourceStore {
    pub fn new(paths: ResourcePaths) -> Self {
        Self {
            paths,
            cell: OnceLock::new(),
            init: Mutex::new(()),
            loads: AtomicUsize::new(0),
        }
    }

    /// Store that is already initialised with in-memory resources.
    pub fn preloaded(paths: ResourcePaths, resources: Resources) -> Self {
        let store = Self::new(paths);
        let _ = store.cell.set(Arc::new(resources));
        store
    }

    /// Cached resources, loading them on first use.
    pub fn get(&self) -> Result<Arc<Resources>, ResourceLoadError> {
        if let Some(resources) = self.cell.get() {
            return Ok(Arc::clone(resources));
        }

        // Poisoning only means another loader panicked; the cell is still
        // either empty or fully set.
        let _guard = self.init.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(resources) = self.cell.get() {
            return Ok(Arc::clone(resources));
        }

        let count = self.loads.fetch_add(1, Ordering::SeqCst) + 1;
        info!("Loading resources (load #{})", count);
        let resources = Arc::new(Resources::load(&self.paths)?);
        info!(
            "Resources ready: {} model, {} features, {} historical rows",
            resources.model.kind(),
            resources.mapping.len(),
            resources.history.len()
        );

        let _ = self.cell.set(Arc::clone(&resources));
        Ok(resources)
    }

    /// Number of times storage has been read.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }

    pub fn paths(&self) -> &ResourcePaths {
        &self.paths
    }
}

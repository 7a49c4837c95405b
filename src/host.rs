use std::{path::Path, sync::Arc};

use parking_lot::RwLock;

use crate::error::{ServiceError, StartupError};
use crate::model::{self, Regressor};

/// Owns the loaded model for the life of the process.
///
/// Readers clone the `Arc` out and drop the lock before running inference,
/// so no request ever waits on another.
#[derive(Default)]
pub struct ModelHost {
    slot: RwLock<Option<Arc<dyn Regressor>>>,
}

impl ModelHost {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_model(model: Arc<dyn Regressor>) -> Self {
        Self {
            slot: RwLock::new(Some(model)),
        }
    }

    /// Loads the artifact once. Any failure is fatal for startup.
    pub fn load(path: &Path) -> Result<Self, StartupError> {
        if !path.exists() {
            return Err(StartupError::ModelNotFound {
                path: path.to_path_buf(),
            });
        }

        let model = model::load_artifact(path).map_err(|source| StartupError::LoadFailed {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::info!(
            "loaded model name={} version={} from {}",
            model.name(),
            model.version(),
            path.display()
        );
        Ok(Self::with_model(model))
    }

    pub fn publish(&self, model: Arc<dyn Regressor>) {
        *self.slot.write() = Some(model);
    }

    pub fn get(&self) -> Result<Arc<dyn Regressor>, ServiceError> {
        self.slot.read().clone().ok_or(ServiceError::ModelUnavailable)
    }

    pub fn is_loaded(&self) -> bool {
        self.slot.read().is_some()
    }
}

impl std::fmt::Debug for ModelHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slot = self.slot.read();
        f.debug_struct("ModelHost")
            .field("model", &slot.as_ref().map(|m| m.name().to_string()))
            .finish()
    }
}

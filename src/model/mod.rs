use std::{path::Path, sync::Arc};

use anyhow::{bail, Result};

use crate::error::ModelError;
use crate::features::FeatureFrame;

pub mod encoder;
pub mod pipeline;
#[cfg(feature = "torch")]
pub mod torchscript;

pub use pipeline::PipelineModel;

/// The opaque "predict" boundary. One output per input row.
///
/// Implementations are shared read-only across concurrent requests.
pub trait Regressor: Send + Sync {
    fn predict(&self, frame: &FeatureFrame) -> Result<Vec<f64>, ModelError>;

    fn name(&self) -> &str;

    fn version(&self) -> &str;
}

/// Deserializes an artifact, picking the backend from the file extension.
pub fn load_artifact(path: &Path) -> Result<Arc<dyn Regressor>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "json" => Ok(Arc::new(PipelineModel::from_path(path)?)),
        #[cfg(feature = "torch")]
        "pt" | "ts" => Ok(Arc::new(torchscript::TorchModel::from_path(path)?)),
        #[cfg(not(feature = "torch"))]
        "pt" | "ts" => bail!("TorchScript artifacts need the `torch` feature"),
        other => bail!("unsupported model artifact extension '{}'", other),
    }
}

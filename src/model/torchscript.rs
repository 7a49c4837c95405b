use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::{fs, path::Path};
use tch::{kind::Kind, CModule, Device, Tensor};

use super::encoder::EncoderSpec;
use super::Regressor;
use crate::error::ModelError;
use crate::features::FeatureFrame;

#[derive(Deserialize)]
struct MetaJson {
    encoder: EncoderSpec,
    in_dim: Option<usize>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
}

/// TorchScript regressor. Expects `meta.json` next to the module.
pub struct TorchModel {
    model: CModule,
    device: Device,
    encoder: EncoderSpec,
    name: String,
    version: String,
}

impl TorchModel {
    pub fn from_path(model_path: &Path) -> Result<Self> {
        let device = Device::Cpu;

        let meta_path = model_path.with_file_name("meta.json");
        let meta_txt = fs::read_to_string(&meta_path)
            .with_context(|| format!("failed to read meta at {}", meta_path.display()))?;
        let meta: MetaJson =
            serde_json::from_str(&meta_txt).with_context(|| "failed to parse meta.json")?;

        meta.encoder.validate()?;
        let in_dim = meta.encoder.width();
        if let Some(declared) = meta.in_dim {
            if declared != in_dim {
                bail!("meta.in_dim ({}) != encoder width ({})", declared, in_dim);
            }
        }

        let model = CModule::load_on_device(model_path, device)
            .with_context(|| format!("failed to load TorchScript {}", model_path.display()))?;

        // Probe output shape with a dummy forward: expect a single scalar
        let dummy = Tensor::zeros([1, in_dim as i64], (Kind::Float, device));
        let t = model.forward_ts(&[dummy])?;
        if t.numel() != 1 {
            bail!("unexpected model output size: {:?}", t.size());
        }

        let stem = model_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("torchscript")
            .to_string();

        Ok(Self {
            model,
            device,
            encoder: meta.encoder,
            name: meta.name.unwrap_or(stem),
            version: meta.version.unwrap_or_else(|| "0.0.0".to_string()),
        })
    }

    fn forward_one(&self, x: &[f64]) -> Result<f64, ModelError> {
        let xs: Vec<f32> = x.iter().map(|v| *v as f32).collect();
        let input = Tensor::from_slice(&xs)
            .reshape([1, xs.len() as i64])
            .to_device(self.device);

        let out = self
            .model
            .forward_ts(&[input])
            .map_err(|e| ModelError::Backend(e.to_string()))?;
        if out.numel() != 1 {
            return Err(ModelError::Shape(format!("model output {:?}", out.size())));
        }
        let y = out
            .to_kind(Kind::Double)
            .reshape([1])
            .double_value(&[0]);
        if !y.is_finite() {
            return Err(ModelError::NonFinite(y));
        }
        Ok(y)
    }
}

impl Regressor for TorchModel {
    fn predict(&self, frame: &FeatureFrame) -> Result<Vec<f64>, ModelError> {
        if frame.is_empty() {
            return Err(ModelError::EmptyFrame);
        }
        frame
            .rows()
            .iter()
            .map(|row| {
                let x = self.encoder.encode(row)?;
                self.forward_one(&x)
            })
            .collect()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        &self.version
    }
}

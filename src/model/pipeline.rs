use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use super::encoder::EncoderSpec;
use super::Regressor;
use crate::error::ModelError;
use crate::features::FeatureFrame;

// ---------- Artifact schema ----------

#[derive(Debug, Deserialize)]
struct PipelineJson {
    #[serde(default = "default_name")]
    name: String,
    #[serde(default = "default_version")]
    version: String,
    encoder: EncoderSpec,
    regressor: RegressorSpec,
    #[serde(default)]
    target: Target,
}

fn default_name() -> String {
    "pipeline".to_string()
}

fn default_version() -> String {
    "0.0.0".to_string()
}

fn default_learning_rate() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum RegressorSpec {
    Linear {
        intercept: f64,
        coefficients: Vec<f64>,
    },
    TreeEnsemble {
        #[serde(default)]
        base_score: f64,
        #[serde(default = "default_learning_rate")]
        learning_rate: f64,
        #[serde(default)]
        aggregation: Aggregation,
        trees: Vec<Tree>,
    },
}

#[derive(Debug, Default, Clone, Copy, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
enum Aggregation {
    /// Boosting: base_score + learning_rate * Σ trees
    #[default]
    Sum,
    /// Forest: base_score + mean(trees)
    Mean,
}

#[derive(Debug, Default, Clone, Copy, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
enum Target {
    #[default]
    Identity,
    /// Regressor was fit on ln(1 + price)
    Log1p,
}

#[derive(Debug, Deserialize)]
struct Tree {
    nodes: Vec<Node>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

impl Tree {
    // Children always sit after their parent, so traversal terminates.
    fn validate(&self, width: usize, idx: usize) -> Result<()> {
        if self.nodes.is_empty() {
            bail!("tree {idx} has no nodes");
        }
        let n = self.nodes.len();
        for (i, node) in self.nodes.iter().enumerate() {
            if let Node::Split {
                feature,
                left,
                right,
                ..
            } = *node
            {
                if feature >= width {
                    bail!("tree {idx} node {i}: feature {feature} out of range (width {width})");
                }
                if left <= i || right <= i || left >= n || right >= n {
                    bail!("tree {idx} node {i}: bad child indices ({left}, {right})");
                }
            }
        }
        Ok(())
    }

    fn eval(&self, x: &[f64]) -> f64 {
        let mut i = 0;
        loop {
            match self.nodes[i] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    i = if x[feature] < threshold { left } else { right };
                }
            }
        }
    }
}

impl RegressorSpec {
    fn validate(&self, width: usize) -> Result<()> {
        match self {
            RegressorSpec::Linear { coefficients, .. } => {
                if coefficients.len() != width {
                    bail!(
                        "linear regressor has {} coefficients, encoder width is {}",
                        coefficients.len(),
                        width
                    );
                }
            }
            RegressorSpec::TreeEnsemble { trees, .. } => {
                if trees.is_empty() {
                    bail!("tree ensemble has no trees");
                }
                for (idx, t) in trees.iter().enumerate() {
                    t.validate(width, idx)?;
                }
            }
        }
        Ok(())
    }

    fn eval(&self, x: &[f64]) -> f64 {
        match self {
            RegressorSpec::Linear {
                intercept,
                coefficients,
            } => intercept + coefficients.iter().zip(x).map(|(c, v)| c * v).sum::<f64>(),
            RegressorSpec::TreeEnsemble {
                base_score,
                learning_rate,
                aggregation,
                trees,
            } => {
                let total: f64 = trees.iter().map(|t| t.eval(x)).sum();
                match aggregation {
                    Aggregation::Sum => base_score + learning_rate * total,
                    Aggregation::Mean => base_score + total / trees.len() as f64,
                }
            }
        }
    }
}

// ---------- Model ----------

/// JSON pipeline artifact: column encoder + linear or tree-ensemble regressor.
#[derive(Debug)]
pub struct PipelineModel {
    name: String,
    version: String,
    encoder: EncoderSpec,
    regressor: RegressorSpec,
    target: Target,
}

impl PipelineModel {
    pub fn from_path(path: &Path) -> Result<Self> {
        let txt = fs::read_to_string(path)
            .with_context(|| format!("failed to read model at {}", path.display()))?;
        Self::from_json(&txt)
    }

    pub fn from_json(txt: &str) -> Result<Self> {
        let raw: PipelineJson =
            serde_json::from_str(txt).context("failed to parse pipeline artifact")?;

        raw.encoder.validate()?;
        raw.regressor.validate(raw.encoder.width())?;

        Ok(Self {
            name: raw.name,
            version: raw.version,
            encoder: raw.encoder,
            regressor: raw.regressor,
            target: raw.target,
        })
    }

    pub fn input_width(&self) -> usize {
        self.encoder.width()
    }
}

impl Regressor for PipelineModel {
    fn predict(&self, frame: &FeatureFrame) -> Result<Vec<f64>, ModelError> {
        if frame.is_empty() {
            return Err(ModelError::EmptyFrame);
        }
        frame
            .rows()
            .iter()
            .map(|row| {
                let x = self.encoder.encode(row)?;
                let raw = self.regressor.eval(&x);
                let y = match self.target {
                    Target::Identity => raw,
                    Target::Log1p => raw.exp_m1(),
                };
                if !y.is_finite() {
                    return Err(ModelError::NonFinite(y));
                }
                Ok(y)
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

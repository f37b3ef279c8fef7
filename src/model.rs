//! Regression model backends.
//!
//! The default backend reads a JSON document tagged by `kind`:
//!
//! ```json
//! { "kind": "linear",  "intercept": 1.5, "coefficients": [0.1, ...] }
//! { "kind": "forest",  "trees": [ {...}, ... ] }
//! { "kind": "boosted", "base_score": 12.0, "learning_rate": 0.1, "trees": [ {...} ] }
//! ```
//!
//! Trees use the parallel-array layout of an exported decision tree
//! (`children_left`, `children_right`, `feature`, `threshold`, `value`);
//! a node with `children_left == -1` is a leaf. With the `torch` feature a
//! `.pt` path is loaded as a TorchScript module instead.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::{fmt, fs, path::Path};
use thiserror::Error;

use crate::features::FEATURE_COUNT;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("feature length mismatch: got {got}, expected {expected}")]
    FeatureLength { got: usize, expected: usize },
    #[error("tree traversal did not reach a leaf")]
    NoLeaf,
    #[error("{0}")]
    Backend(String),
}

/// A fitted regressor producing one scalar per feature vector.
pub trait Regressor: Send + Sync + fmt::Debug {
    fn predict(&self, x: &[f64]) -> Result<f64, ModelError>;

    fn describe(&self) -> String;
}

fn check_len(x: &[f64], expected: usize) -> Result<(), ModelError> {
    if x.len() != expected {
        return Err(ModelError::FeatureLength {
            got: x.len(),
            expected,
        });
    }
    Ok(())
}

// ---------- Decision trees ----------

#[derive(Debug, Clone, Deserialize)]
pub struct Tree {
    children_left: Vec<i64>,
    children_right: Vec<i64>,
    feature: Vec<i64>,
    threshold: Vec<f64>,
    value: Vec<f64>,
}

impl Tree {
    fn len(&self) -> usize {
        self.children_left.len()
    }

    fn validate(&self, n_features: usize) -> Result<()> {
        let n = self.len();
        if n == 0 {
            bail!("tree has no nodes");
        }
        if [
            self.children_right.len(),
            self.feature.len(),
            self.threshold.len(),
            self.value.len(),
        ]
        .iter()
        .any(|&len| len != n)
        {
            bail!("tree arrays differ in length");
        }
        for i in 0..n {
            let (l, r) = (self.children_left[i], self.children_right[i]);
            if (l < 0) != (r < 0) {
                bail!("node {i} has exactly one child");
            }
            if l < 0 {
                continue;
            }
            if l as usize >= n || r as usize >= n {
                bail!("node {i} points outside the tree");
            }
            let f = self.feature[i];
            if f < 0 || f as usize >= n_features {
                bail!("node {i} splits on feature {f}, model has {n_features}");
            }
        }
        Ok(())
    }

    /// Walks from the root; `x[feature] <= threshold` goes left. Bounded by
    /// the node count so a cyclic tree cannot loop forever.
    fn eval(&self, x: &[f64]) -> Result<f64, ModelError> {
        let mut node = 0usize;
        for _ in 0..self.len() {
            let left = self.children_left[node];
            if left < 0 {
                return Ok(self.value[node]);
            }
            let f = self.feature[node] as usize;
            node = if x[f] <= self.threshold[node] {
                left as usize
            } else {
                self.children_right[node] as usize
            };
        }
        Err(ModelError::NoLeaf)
    }
}

// ---------- JSON models ----------

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JsonModel {
    Linear {
        intercept: f64,
        coefficients: Vec<f64>,
        n_features: Option<usize>,
    },
    Forest {
        trees: Vec<Tree>,
        n_features: Option<usize>,
    },
    Boosted {
        base_score: f64,
        learning_rate: f64,
        trees: Vec<Tree>,
        n_features: Option<usize>,
    },
}

impl JsonModel {
    pub fn from_json(txt: &str) -> Result<Self> {
        let model: JsonModel = serde_json::from_str(txt).context("invalid model JSON")?;
        model.validate()?;
        Ok(model)
    }

    fn declared_features(&self) -> Option<usize> {
        match self {
            JsonModel::Linear { n_features, .. }
            | JsonModel::Forest { n_features, .. }
            | JsonModel::Boosted { n_features, .. } => *n_features,
        }
    }

    fn validate(&self) -> Result<()> {
        if let Some(n) = self.declared_features() {
            if n != FEATURE_COUNT {
                bail!("model expects {n} features, service provides {FEATURE_COUNT}");
            }
        }
        let trees = match self {
            JsonModel::Linear { coefficients, .. } => {
                if coefficients.len() != FEATURE_COUNT {
                    bail!(
                        "linear model has {} coefficients, expected {FEATURE_COUNT}",
                        coefficients.len()
                    );
                }
                return Ok(());
            }
            JsonModel::Forest { trees, .. } => trees,
            JsonModel::Boosted { trees, learning_rate, .. } => {
                if !learning_rate.is_finite() {
                    bail!("learning_rate must be finite");
                }
                trees
            }
        };
        if trees.is_empty() {
            bail!("ensemble has no trees");
        }
        for (i, tree) in trees.iter().enumerate() {
            tree.validate(FEATURE_COUNT)
                .with_context(|| format!("tree {i} is malformed"))?;
        }
        Ok(())
    }

    fn tree_sum(trees: &[Tree], x: &[f64]) -> Result<f64, ModelError> {
        trees
            .iter()
            .try_fold(0.0, |acc, t| -> Result<f64, ModelError> { Ok(acc + t.eval(x)?) })
    }
}

impl Regressor for JsonModel {
    fn predict(&self, x: &[f64]) -> Result<f64, ModelError> {
        check_len(x, FEATURE_COUNT)?;
        match self {
            JsonModel::Linear {
                intercept,
                coefficients,
                ..
            } => Ok(intercept + coefficients.iter().zip(x).map(|(c, v)| c * v).sum::<f64>()),
            JsonModel::Forest { trees, .. } => {
                Ok(Self::tree_sum(trees, x)? / trees.len() as f64)
            }
            JsonModel::Boosted {
                base_score,
                learning_rate,
                trees,
                ..
            } => Ok(base_score + learning_rate * Self::tree_sum(trees, x)?),
        }
    }

    fn describe(&self) -> String {
        match self {
            JsonModel::Linear { coefficients, .. } => format!("linear[{}]", coefficients.len()),
            JsonModel::Forest { trees, .. } => format!("forest[{} trees]", trees.len()),
            JsonModel::Boosted { trees, .. } => format!("boosted[{} trees]", trees.len()),
        }
    }
}

// ---------- TorchScript ----------

#[cfg(feature = "torch")]
mod torch {
    use super::{check_len, ModelError, Regressor};
    use crate::features::FEATURE_COUNT;
    use anyhow::{Context, Result};
    use std::{fmt, path::Path};
    use tch::{CModule, Device, Tensor};

    pub struct TorchRegressor {
        module: CModule,
        device: Device,
    }

    impl fmt::Debug for TorchRegressor {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("TorchRegressor")
                .field("device", &self.device)
                .finish()
        }
    }

    impl TorchRegressor {
        pub fn load(path: &Path) -> Result<Self> {
            let device = Device::Cpu;
            let module = CModule::load_on_device(path, device)
                .with_context(|| format!("failed to load TorchScript {}", path.display()))?;
            Ok(Self { module, device })
        }
    }

    impl Regressor for TorchRegressor {
        fn predict(&self, x: &[f64]) -> Result<f64, ModelError> {
            check_len(x, FEATURE_COUNT)?;
            let xs: Vec<f32> = x.iter().map(|v| *v as f32).collect();
            let input = Tensor::from_slice(&xs)
                .reshape([1, FEATURE_COUNT as i64])
                .to_device(self.device);

            // Forward: [1] or [1, 1]; take the first scalar.
            let out = self
                .module
                .forward_ts(&[input])
                .map_err(|e| ModelError::Backend(e.to_string()))?
                .flatten(0, -1);
            if out.numel() == 0 {
                return Err(ModelError::Backend("model returned an empty tensor".into()));
            }
            Ok(out.double_value(&[0]))
        }

        fn describe(&self) -> String {
            "torchscript".to_string()
        }
    }
}

/// Picks a backend from the file extension.
pub fn load_model(path: impl AsRef<Path>) -> Result<Box<dyn Regressor>> {
    let path = path.as_ref();
    if path.extension().is_some_and(|e| e == "pt") {
        #[cfg(feature = "torch")]
        return Ok(Box::new(torch::TorchRegressor::load(path)?));
        #[cfg(not(feature = "torch"))]
        bail!(
            "{} is a TorchScript model; rebuild with the `torch` feature",
            path.display()
        );
    }
    let txt = fs::read_to_string(path)
        .with_context(|| format!("failed to read model at {}", path.display()))?;
    let model = JsonModel::from_json(&txt)
        .with_context(|| format!("failed to load model {}", path.display()))?;
    Ok(Box::new(model))
}

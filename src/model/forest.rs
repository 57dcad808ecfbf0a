//! Tree-ensemble classifier loaded from a JSON artifact.
//!
//! The artifact mirrors a fitted random forest: optional standard-scaler
//! parameters, the class labels, and each tree's nodes in pre-order. Class
//! probabilities are the mean of every tree's normalized leaf distribution and
//! the predicted label is the most probable class.

use super::{Classifier, RawLabel};
use crate::error::{ModelError, ModelLoadError};
use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEnsemble {
    pub n_features: usize,
    pub classes: Vec<RawLabel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaler: Option<Scaler>,
    pub trees: Vec<Tree>,
}

/// Standardization applied before the trees: `(x - mean) / scale`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    /// Samples with `x[feature] <= threshold` go left
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Per-class sample weights
    Leaf { value: Vec<f64> },
}

impl TreeEnsemble {
    pub fn load(path: &Path) -> Result<Self, ModelLoadError> {
        let data = std::fs::read_to_string(path).map_err(|source| ModelLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let model: TreeEnsemble =
            serde_json::from_str(&data).map_err(|source| ModelLoadError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        model.validate()?;
        Ok(model)
    }

    pub fn from_json_str(data: &str) -> Result<Self, ModelLoadError> {
        let model: TreeEnsemble = serde_json::from_str(data).map_err(|source| {
            ModelLoadError::Parse {
                path: "<inline>".into(),
                source,
            }
        })?;
        model.validate()?;
        Ok(model)
    }

    /// Structural checks so traversal can never index out of bounds or loop.
    fn validate(&self) -> Result<(), ModelLoadError> {
        let invalid = |msg: String| Err(ModelLoadError::Invalid(msg));

        if self.classes.is_empty() {
            return invalid("no classes".into());
        }
        if self.trees.is_empty() {
            return invalid("no trees".into());
        }
        if let Some(s) = &self.scaler {
            if s.mean.len() != self.n_features || s.scale.len() != self.n_features {
                return invalid(format!(
                    "scaler has {}/{} entries for {} features",
                    s.mean.len(),
                    s.scale.len(),
                    self.n_features
                ));
            }
            if s.scale.iter().any(|v| *v == 0.0 || !v.is_finite()) {
                return invalid("scaler scale must be finite and non-zero".into());
            }
        }

        for (t, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return invalid(format!("tree {} is empty", t));
            }
            for (i, node) in tree.nodes.iter().enumerate() {
                match node {
                    Node::Split {
                        feature,
                        left,
                        right,
                        ..
                    } => {
                        if *feature >= self.n_features {
                            return invalid(format!(
                                "tree {} node {} splits on feature {} of {}",
                                t, i, feature, self.n_features
                            ));
                        }
                        let in_order = |c: usize| c > i && c < tree.nodes.len();
                        if !in_order(*left) || !in_order(*right) {
                            return invalid(format!("tree {} node {} has bad children", t, i));
                        }
                    }
                    Node::Leaf { value } => {
                        if value.len() != self.classes.len() {
                            return invalid(format!(
                                "tree {} leaf {} has {} weights for {} classes",
                                t,
                                i,
                                value.len(),
                                self.classes.len()
                            ));
                        }
                        if value.iter().any(|v| *v < 0.0 || !v.is_finite())
                            || value.iter().sum::<f64>() <= 0.0
                        {
                            return invalid(format!("tree {} leaf {} has bad weights", t, i));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn check_width(&self, batch: &Array2<f64>) -> Result<(), ModelError> {
        if batch.ncols() != self.n_features {
            return Err(ModelError::Shape {
                expected: self.n_features,
                got: batch.ncols(),
            });
        }
        Ok(())
    }

    fn scaled(&self, row: ArrayView1<'_, f64>) -> Vec<f64> {
        match &self.scaler {
            Some(s) => row
                .iter()
                .zip(s.mean.iter().zip(&s.scale))
                .map(|(x, (m, sc))| (x - m) / sc)
                .collect(),
            None => row.to_vec(),
        }
    }

    fn leaf<'a>(tree: &'a Tree, x: &[f64]) -> &'a [f64] {
        let mut i = 0;
        loop {
            match &tree.nodes[i] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => i = if x[*feature] <= *threshold { *left } else { *right },
                Node::Leaf { value } => return value,
            }
        }
    }

    fn proba(&self, batch: &Array2<f64>) -> Result<Array2<f64>, ModelError> {
        self.check_width(batch)?;
        let n_classes = self.classes.len();
        let mut out = Array2::<f64>::zeros((batch.nrows(), n_classes));
        let n_trees = self.trees.len() as f64;

        for (r, row) in batch.rows().into_iter().enumerate() {
            let x = self.scaled(row);
            for tree in &self.trees {
                let value = Self::leaf(tree, &x);
                let total: f64 = value.iter().sum();
                for (c, w) in value.iter().enumerate() {
                    out[[r, c]] += w / total / n_trees;
                }
            }
        }
        Ok(out)
    }
}

impl Classifier for TreeEnsemble {
    fn predict(&self, batch: &Array2<f64>) -> Result<Vec<RawLabel>, ModelError> {
        let proba = self.proba(batch)?;
        Ok(proba
            .rows()
            .into_iter()
            .map(|row| {
                let mut best = 0;
                for (c, p) in row.iter().enumerate() {
                    if *p > row[best] {
                        best = c;
                    }
                }
                self.classes[best].clone()
            })
            .collect())
    }

    fn predict_proba(&self, batch: &Array2<f64>) -> Option<Result<Array2<f64>, ModelError>> {
        Some(self.proba(batch))
    }

    fn expected_width(&self) -> Option<usize> {
        Some(self.n_features)
    }
}

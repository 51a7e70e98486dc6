//! Isolation forest over dense f64 rows. Trees are flat arenas of nodes indexed by `u32`;
//! node 0 is the root and children always sit at higher indices than their parent.

use crate::error::{CbhsError, Result};
use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Average path length of an unsuccessful BST search over `n` points, c(n)
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    /// `x[feature] <= threshold` goes left
    Split {
        feature: usize,
        threshold: f64,
        left: u32,
        right: u32,
    },
    /// Unsplit remainder of `size` training points
    Leaf { size: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    /// Grow a tree over `rows` of `data` until points are isolated or `height_limit` is reached.
    pub fn build<R: Rng + ?Sized>(
        data: &Array2<f64>,
        rows: Vec<usize>,
        height_limit: usize,
        rng: &mut R,
    ) -> Self {
        let mut nodes = vec![Node::Leaf { size: 0 }];
        let mut pending: Vec<(usize, Vec<usize>, usize)> = vec![(0, rows, 0)];

        while let Some((id, rows, depth)) = pending.pop() {
            if depth >= height_limit || rows.len() <= 1 {
                nodes[id] = Node::Leaf { size: rows.len() };
                continue;
            }

            // Only features that still vary within this node can split it
            let candidates: Vec<(usize, f64, f64)> = (0..data.ncols())
                .filter_map(|f| {
                    let col = data.column(f);
                    let (lo, hi) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &r| {
                        (lo.min(col[r]), hi.max(col[r]))
                    });
                    (lo < hi).then_some((f, lo, hi))
                })
                .collect();
            if candidates.is_empty() {
                nodes[id] = Node::Leaf { size: rows.len() };
                continue;
            }

            let (feature, lo, hi) = candidates[rng.gen_range(0..candidates.len())];
            // Interpolate instead of sampling `lo..hi` directly: `hi - lo` can overflow for
            // finite extremes. Rounding may land on `hi`, which must stay on the right.
            let u: f64 = rng.gen();
            let t = lo * (1.0 - u) + hi * u;
            let threshold = if t >= lo && t < hi { t } else { lo };
            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) =
                rows.into_iter().partition(|&r| data[[r, feature]] <= threshold);

            let left = nodes.len();
            let right = left + 1;
            nodes.push(Node::Leaf { size: 0 });
            nodes.push(Node::Leaf { size: 0 });
            nodes[id] = Node::Split {
                feature,
                threshold,
                left: left as u32,
                right: right as u32,
            };
            pending.push((left, left_rows, depth + 1));
            pending.push((right, right_rows, depth + 1));
        }

        Self { nodes }
    }

    /// Edges from root to the leaf reached by `x`, plus c(leaf size) for unresolved points.
    pub fn path_length(&self, x: ArrayView1<'_, f64>) -> f64 {
        let mut id = 0usize;
        let mut depth = 0.0;
        loop {
            match self.nodes[id] {
                Node::Leaf { size } => return depth + average_path_length(size),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let next = if x[feature] <= threshold { left } else { right };
                    id = next as usize;
                    depth += 1.0;
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    fn validate(&self, feature_dim: usize) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(CbhsError::IncompatibleModel("empty tree".into()));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            if let Node::Split {
                feature,
                threshold,
                left,
                right,
            } = *node
            {
                let (l, r) = (left as usize, right as usize);
                if feature >= feature_dim
                    || !threshold.is_finite()
                    || l <= i
                    || r <= i
                    || l >= self.nodes.len()
                    || r >= self.nodes.len()
                {
                    return Err(CbhsError::IncompatibleModel(format!(
                        "corrupt split node {}",
                        i
                    )));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_samples: usize,
    pub seed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    /// Per-tree subsample size ψ
    sample_size: usize,
    feature_dim: usize,
}

impl IsolationForest {
    pub fn fit(data: &Array2<f64>, params: ForestParams) -> Result<Self> {
        let n = data.nrows();
        if n == 0 {
            return Err(CbhsError::InvalidInput("empty training matrix".into()));
        }
        if params.n_estimators == 0 || params.max_samples == 0 {
            return Err(CbhsError::InvalidInput(
                "n_estimators and max_samples must be positive".into(),
            ));
        }

        let sample_size = params.max_samples.min(n);
        let height_limit = (sample_size as f64).log2().ceil() as usize;

        // Seeds drawn up front so the forest does not depend on thread scheduling
        let mut master = StdRng::seed_from_u64(params.seed);
        let seeds: Vec<u64> = (0..params.n_estimators).map(|_| master.gen()).collect();

        let trees = seeds
            .into_par_iter()
            .map(|seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                let rows = rand::seq::index::sample(&mut rng, n, sample_size).into_vec();
                IsolationTree::build(data, rows, height_limit, &mut rng)
            })
            .collect();

        Ok(Self {
            trees,
            sample_size,
            feature_dim: data.ncols(),
        })
    }

    /// s(x) = 2^(-E[h(x)] / c(ψ)) in (0, 1]; higher is more anomalous.
    pub fn anomaly_score(&self, x: ArrayView1<'_, f64>) -> f64 {
        let mean_path =
            self.trees.iter().map(|t| t.path_length(x)).sum::<f64>() / self.trees.len() as f64;
        let c = average_path_length(self.sample_size);
        if c > 0.0 {
            2f64.powf(-mean_path / c)
        } else {
            1.0
        }
    }

    pub fn trees(&self) -> &[IsolationTree] {
        &self.trees
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    pub fn feature_dim(&self) -> usize {
        self.feature_dim
    }

    pub(crate) fn validate(&self, feature_dim: usize) -> Result<()> {
        if self.feature_dim != feature_dim {
            return Err(CbhsError::IncompatibleModel(format!(
                "forest built on {} features, expected {}",
                self.feature_dim, feature_dim
            )));
        }
        if self.trees.is_empty() || self.sample_size == 0 {
            return Err(CbhsError::IncompatibleModel("forest has no trees".into()));
        }
        self.trees.iter().try_for_each(|t| t.validate(feature_dim))
    }
}

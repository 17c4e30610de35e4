//! CART regression tree
//!
//! Binary tree grown depth-first on squared error. Candidate splits are
//! ranked with Friedman's improvement score:
//!
//! ```text
//! improvement = n_left * n_right / (n_left + n_right) * (mean_left - mean_right)^2
//! ```
//!
//! Thresholds sit halfway between adjacent distinct feature values; a row
//! goes left when `value <= threshold`.

use tracing::trace;

/// Feature values closer than this are treated as equal when splitting
const FEATURE_THRESHOLD: f64 = 1e-7;

/// Tree growth limits
#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: 3,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, Copy)]
struct Split {
    feature: usize,
    threshold: f64,
    improvement: f64,
}

/// Fitted regression tree, nodes stored in a flat arena (root at 0)
#[derive(Debug, Clone)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    /// Fit on the rows of `x` listed in `rows` against targets `y`.
    ///
    /// `x` and `y` are indexed by sample; `rows` must be non-empty.
    pub fn fit(x: &[Vec<f64>], y: &[f64], rows: &[usize], params: &TreeParams) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(x, y, rows.to_vec(), 0, params);
        trace!("Grew regression tree with {} nodes", tree.nodes.len());
        tree
    }

    pub fn predict(&self, sample: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if sample[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[cfg(test)]
    pub(crate) fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    fn grow(&mut self, x: &[Vec<f64>], y: &[f64], rows: Vec<usize>, depth: usize, params: &TreeParams) -> usize {
        let n = rows.len();
        let mean = rows.iter().map(|&r| y[r]).sum::<f64>() / n as f64;
        let index = self.nodes.len();
        self.nodes.push(Node::Leaf { value: mean });

        let variance = rows.iter().map(|&r| (y[r] - mean).powi(2)).sum::<f64>() / n as f64;
        if depth >= params.max_depth
            || n < params.min_samples_split
            || n < 2 * params.min_samples_leaf
            || variance <= f64::EPSILON
        {
            return index;
        }

        let Some(split) = best_split(x, y, &rows, params) else {
            return index;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&r| x[r][split.feature] <= split.threshold);

        let left = self.grow(x, y, left_rows, depth + 1, params);
        let right = self.grow(x, y, right_rows, depth + 1, params);
        self.nodes[index] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        index
    }
}

fn best_split(x: &[Vec<f64>], y: &[f64], rows: &[usize], params: &TreeParams) -> Option<Split> {
    let n = rows.len();
    let n_features = x[rows[0]].len();
    let total: f64 = rows.iter().map(|&r| y[r]).sum();
    let min_leaf = params.min_samples_leaf.max(1);

    let mut best: Option<Split> = None;
    let mut sorted = rows.to_vec();

    for feature in 0..n_features {
        sorted.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));

        let mut left_sum = 0.0;
        for i in 1..n {
            left_sum += y[sorted[i - 1]];

            let (n_left, n_right) = (i, n - i);
            if n_left < min_leaf || n_right < min_leaf {
                continue;
            }

            let lo = x[sorted[i - 1]][feature];
            let hi = x[sorted[i]][feature];
            if hi <= lo + FEATURE_THRESHOLD {
                continue;
            }

            let diff = left_sum / n_left as f64 - (total - left_sum) / n_right as f64;
            let improvement = (n_left * n_right) as f64 / n as f64 * diff * diff;

            if best.map_or(true, |b| improvement > b.improvement) {
                let mut threshold = lo / 2.0 + hi / 2.0;
                if threshold == hi || !threshold.is_finite() {
                    threshold = lo;
                }
                best = Some(Split {
                    feature,
                    threshold,
                    improvement,
                });
            }
        }
    }

    best.filter(|b| b.improvement > 0.0)
}

//! CART regression tree
//!
//! Splits minimise the summed squared error of the two children. Thresholds
//! sit halfway between adjacent distinct feature values, samples with
//! `x[feature] <= threshold` go left. Leaves hold the mean label of their
//! samples, so a prediction never leaves the range of the training labels.

use biochamber_common::FEATURE_COUNT;
use rand::rngs::StdRng;
use rand::seq::index;

/// Smallest SSE reduction accepted as a real split
const MIN_IMPROVEMENT: f64 = 1e-12;

/// Growth limits for a single tree
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features considered per split; `None` means all of them
    pub max_features: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
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
    sse: f64,
}

/// Borrowed training matrix
pub(crate) struct Dataset<'a> {
    pub features: &'a [[f64; FEATURE_COUNT]],
    pub labels: &'a [f64],
}

/// Fitted regression tree stored as a flat node arena (root at index 0)
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    /// Grow a tree over the rows listed in `rows` (duplicates allowed)
    pub(crate) fn fit(
        data: &Dataset<'_>,
        mut rows: Vec<usize>,
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(data, &mut rows, 0, params, rng);
        tree
    }

    pub fn predict(&self, x: &[f64; FEATURE_COUNT]) -> f64 {
        let mut at = 0;
        loop {
            match self.nodes[at] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => at = if x[feature] <= threshold { left } else { right },
            }
        }
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], at: usize) -> usize {
            match nodes[at] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, left).max(walk(nodes, right)),
            }
        }
        walk(&self.nodes, 0)
    }

    fn grow(
        &mut self,
        data: &Dataset<'_>,
        rows: &mut [usize],
        depth: usize,
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> usize {
        let n = rows.len();
        let mean = rows.iter().map(|&r| data.labels[r]).sum::<f64>() / n as f64;
        let at = self.nodes.len();
        self.nodes.push(Node::Leaf { value: mean });

        let depth_reached = params.max_depth.is_some_and(|max| depth >= max);
        if n < params.min_samples_split || depth_reached {
            return at;
        }

        let Some(split) = best_split(data, rows, params, rng) else {
            return at;
        };

        let mut mid = 0;
        for j in 0..n {
            if data.features[rows[j]][split.feature] <= split.threshold {
                rows.swap(mid, j);
                mid += 1;
            }
        }

        let (left_rows, right_rows) = rows.split_at_mut(mid);
        let left = self.grow(data, left_rows, depth + 1, params, rng);
        let right = self.grow(data, right_rows, depth + 1, params, rng);
        self.nodes[at] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        at
    }
}

fn best_split(
    data: &Dataset<'_>,
    rows: &[usize],
    params: &TreeParams,
    rng: &mut StdRng,
) -> Option<Split> {
    let n = rows.len();
    let (total, total_sq) = rows.iter().fold((0.0, 0.0), |(s, sq), &r| {
        let y = data.labels[r];
        (s + y, sq + y * y)
    });
    let parent_sse = total_sq - total * total / n as f64;
    if parent_sse <= MIN_IMPROVEMENT {
        return None;
    }

    let candidates: Vec<usize> = match params.max_features {
        Some(k) if k < FEATURE_COUNT => index::sample(rng, FEATURE_COUNT, k.max(1)).into_vec(),
        _ => (0..FEATURE_COUNT).collect(),
    };

    let min_leaf = params.min_samples_leaf.max(1);
    let mut best: Option<Split> = None;
    let mut sorted = rows.to_vec();

    for feature in candidates {
        sorted.sort_by(|&a, &b| data.features[a][feature].total_cmp(&data.features[b][feature]));

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        for k in 1..n {
            let y = data.labels[sorted[k - 1]];
            left_sum += y;
            left_sq += y * y;

            let lo = data.features[sorted[k - 1]][feature];
            let hi = data.features[sorted[k]][feature];
            if lo == hi || k < min_leaf || n - k < min_leaf {
                continue;
            }

            let right_sum = total - left_sum;
            let right_sq = total_sq - left_sq;
            let sse = (left_sq - left_sum * left_sum / k as f64)
                + (right_sq - right_sum * right_sum / (n - k) as f64);

            if best.map_or(true, |b| sse < b.sse) {
                let mut threshold = lo + (hi - lo) / 2.0;
                if threshold >= hi {
                    threshold = lo;
                }
                best = Some(Split {
                    feature,
                    threshold,
                    sse,
                });
            }
        }
    }

    best.filter(|b| b.sse < parent_sse - MIN_IMPROVEMENT)
}

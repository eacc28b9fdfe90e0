//! Binary decision trees shared by the random forest and gradient boosting.
//!
//! Trees are stored as a flat node arena so they serialize to compact JSON
//! and predict without recursion.

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::domain::{FeatureRow, NUM_FEATURES};

/// A node of a fitted tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Node {
    /// Rows with `row[feature] <= threshold` go to `left`, others to `right`.
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

/// Fitted decision tree. Node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    /// Walk the tree and return the leaf value for a row.
    #[must_use]
    pub fn predict(&self, row: &FeatureRow) -> f64 {
        let mut idx = 0usize;
        loop {
            match self.nodes.get(idx) {
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = row.get(*feature).copied().unwrap_or(0.0);
                    idx = if value <= *threshold { *left } else { *right };
                }
                Some(Node::Leaf { value }) => return *value,
                None => return 0.0,
            }
        }
    }

    /// Validate child links and feature indices.
    ///
    /// # Errors
    /// Returns a description of the first broken node.
    pub fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= NUM_FEATURES {
                        return Err(format!("node {idx} splits on unknown feature {feature}"));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {idx} has a non-finite threshold"));
                    }
                    // Children are always allocated after their parent.
                    if *left <= idx || *right <= idx {
                        return Err(format!("node {idx} links backwards"));
                    }
                    if *left >= self.nodes.len() || *right >= self.nodes.len() {
                        return Err(format!("node {idx} links past the end of the tree"));
                    }
                }
                Node::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(format!("leaf {idx} has a non-finite value"));
                    }
                }
            }
        }
        Ok(())
    }

    /// Maximum depth of the tree (a lone leaf has depth 0).
    #[must_use]
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match nodes.get(idx) {
                Some(Node::Split { left, right, .. }) => {
                    1 + walk(nodes, *left).max(walk(nodes, *right))
                }
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }
}

/// Per-row targets a tree is grown against.
pub(crate) enum Targets<'a> {
    /// Binary labels; leaves hold the positive fraction, splits minimize Gini impurity.
    Labels(&'a [u8]),
    /// Gradient/hessian pairs of a second-order loss; leaves hold the Newton step.
    Gradients {
        grad: &'a [f64],
        hess: &'a [f64],
        lambda: f64,
        min_child_weight: f64,
    },
}

impl Targets<'_> {
    /// Sufficient statistics of one row: (weight, positive/gradient sum, hessian sum).
    fn stats(&self, i: usize) -> (f64, f64, f64) {
        match self {
            Targets::Labels(y) => (1.0, f64::from(y[i]), 0.0),
            Targets::Gradients { grad, hess, .. } => (1.0, grad[i], hess[i]),
        }
    }

    fn leaf_value(&self, s: &Stats) -> f64 {
        match self {
            Targets::Labels(_) => {
                if s.count == 0.0 {
                    0.0
                } else {
                    s.sum / s.count
                }
            }
            Targets::Gradients { lambda, .. } => -s.sum / (s.hess + lambda),
        }
    }

    /// Node score to minimize: weighted Gini impurity or negative structure score.
    fn score(&self, s: &Stats) -> f64 {
        match self {
            Targets::Labels(_) => {
                if s.count == 0.0 {
                    return 0.0;
                }
                let p = s.sum / s.count;
                s.count * 2.0 * p * (1.0 - p)
            }
            Targets::Gradients { lambda, .. } => -(s.sum * s.sum) / (s.hess + lambda),
        }
    }

    fn is_pure(&self, s: &Stats) -> bool {
        match self {
            Targets::Labels(_) => s.sum == 0.0 || s.sum == s.count,
            Targets::Gradients { .. } => false,
        }
    }

    fn child_allowed(&self, s: &Stats) -> bool {
        match self {
            Targets::Labels(_) => s.count >= 1.0,
            Targets::Gradients {
                min_child_weight, ..
            } => s.count >= 1.0 && s.hess >= *min_child_weight,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Stats {
    count: f64,
    sum: f64,
    hess: f64,
}

impl Stats {
    fn add(&mut self, (count, sum, hess): (f64, f64, f64)) {
        self.count += count;
        self.sum += sum;
        self.hess += hess;
    }

    fn minus(&self, other: &Stats) -> Stats {
        Stats {
            count: self.count - other.count,
            sum: self.sum - other.sum,
            hess: self.hess - other.hess,
        }
    }
}

struct BestSplit {
    score: f64,
    feature: usize,
    threshold: f64,
}

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy)]
pub(crate) struct GrowOptions {
    pub max_depth: usize,
    /// Features examined per split; `None` examines all of them.
    pub max_features: Option<usize>,
}

/// Grow a tree over the given row indices (duplicates allowed, e.g. bootstrap samples).
///
/// `rng` drives per-split feature sampling. Without one, every split
/// examines all features regardless of `max_features`.
pub(crate) fn grow(
    x: &[FeatureRow],
    targets: &Targets<'_>,
    indices: Vec<usize>,
    options: GrowOptions,
    rng: Option<&mut dyn RngCore>,
) -> Tree {
    let mut builder = Builder {
        x,
        targets,
        options,
        rng,
        nodes: Vec::new(),
    };
    builder.build(indices, 0);
    Tree {
        nodes: builder.nodes,
    }
}

struct Builder<'a, 't, 'r> {
    x: &'a [FeatureRow],
    targets: &'a Targets<'t>,
    options: GrowOptions,
    rng: Option<&'r mut dyn RngCore>,
    nodes: Vec<Node>,
}

impl Builder<'_, '_, '_> {
    fn build(&mut self, indices: Vec<usize>, depth: usize) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { value: 0.0 });

        let mut total = Stats::default();
        for &i in &indices {
            total.add(self.targets.stats(i));
        }
        let leaf = Node::Leaf {
            value: self.targets.leaf_value(&total),
        };

        if depth >= self.options.max_depth || indices.len() < 2 || self.targets.is_pure(&total) {
            self.nodes[id] = leaf;
            return id;
        }

        let features = self.candidate_features();
        let Some(best) = self.best_split(&indices, &total, &features) else {
            self.nodes[id] = leaf;
            return id;
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| self.x[i][best.feature] <= best.threshold);

        let left = self.build(left_idx, depth + 1);
        let right = self.build(right_idx, depth + 1);
        self.nodes[id] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        id
    }

    fn candidate_features(&mut self) -> Vec<usize> {
        match (self.options.max_features, self.rng.as_deref_mut()) {
            (Some(k), Some(rng)) if k < NUM_FEATURES => {
                rand::seq::index::sample(rng, NUM_FEATURES, k.max(1)).into_vec()
            }
            _ => (0..NUM_FEATURES).collect(),
        }
    }

    fn best_split(
        &self,
        indices: &[usize],
        total: &Stats,
        features: &[usize],
    ) -> Option<BestSplit> {
        let parent_score = self.targets.score(total);
        let mut best: Option<BestSplit> = None;
        let mut sorted = indices.to_vec();

        for &feature in features {
            sorted.sort_by(|&a, &b| self.x[a][feature].total_cmp(&self.x[b][feature]));

            let mut left = Stats::default();
            for pos in 0..sorted.len() - 1 {
                left.add(self.targets.stats(sorted[pos]));
                let here = self.x[sorted[pos]][feature];
                let next = self.x[sorted[pos + 1]][feature];
                if here == next {
                    continue;
                }
                let right = total.minus(&left);
                if !self.targets.child_allowed(&left) || !self.targets.child_allowed(&right) {
                    continue;
                }
                let score = self.targets.score(&left) + self.targets.score(&right);
                if score < parent_score - 1e-12
                    && best.as_ref().map_or(true, |b| score < b.score)
                {
                    best = Some(BestSplit {
                        score,
                        feature,
                        threshold: here + (next - here) / 2.0,
                    });
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn row(a: f64, b: f64) -> FeatureRow {
        let mut r = [0.0; NUM_FEATURES];
        r[0] = a;
        r[1] = b;
        r
    }

    #[test]
    fn test_predict_follows_threshold() {
        let tree = Tree {
            nodes: vec![
                Node::Split {
                    feature: 0,
                    threshold: 0.5,
                    left: 1,
                    right: 2,
                },
                Node::Leaf { value: -1.0 },
                Node::Leaf { value: 2.0 },
            ],
        };
        assert!(tree.validate().is_ok());
        assert_eq!(tree.predict(&row(0.5, 0.0)), -1.0);
        assert_eq!(tree.predict(&row(0.6, 0.0)), 2.0);
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn test_validate_rejects_backward_links() {
        let tree = Tree {
            nodes: vec![Node::Split {
                feature: 0,
                threshold: 0.0,
                left: 0,
                right: 0,
            }],
        };
        assert!(tree.validate().is_err());
        assert!(Tree { nodes: vec![] }.validate().is_err());
    }

    #[test]
    fn test_gini_tree_separates_labels() {
        let x = vec![row(0.0, 5.0), row(1.0, 5.0), row(2.0, 5.0), row(3.0, 5.0)];
        let y = [0u8, 0, 1, 1];
        let tree = grow(
            &x,
            &Targets::Labels(&y),
            (0..4).collect(),
            GrowOptions {
                max_depth: 3,
                max_features: None,
            },
            None,
        );

        assert!(tree.validate().is_ok());
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.predict(&row(0.5, 0.0)), 0.0);
        assert_eq!(tree.predict(&row(2.5, 0.0)), 1.0);
        // Midpoint threshold between 1.0 and 2.0.
        assert!(matches!(tree.nodes[0], Node::Split { feature: 0, threshold, .. } if (threshold - 1.5).abs() < 1e-12));
    }

    #[test]
    fn test_depth_limit_is_respected() {
        let x: Vec<FeatureRow> = (0..32).map(|i| row(i as f64, 0.0)).collect();
        let y: Vec<u8> = (0..32).map(|i| (i % 2) as u8).collect();
        let tree = grow(
            &x,
            &Targets::Labels(&y),
            (0..32).collect(),
            GrowOptions {
                max_depth: 2,
                max_features: None,
            },
            None,
        );
        assert!(tree.depth() <= 2);
    }

    #[test]
    fn test_gradient_tree_leaf_is_newton_step() {
        let x = vec![row(0.0, 0.0), row(0.0, 0.0)];
        let grad = [0.5, 0.5];
        let hess = [0.25, 0.25];
        let tree = grow(
            &x,
            &Targets::Gradients {
                grad: &grad,
                hess: &hess,
                lambda: 1.0,
                min_child_weight: 0.0,
            },
            vec![0, 1],
            GrowOptions {
                max_depth: 3,
                max_features: None,
            },
            None,
        );
        // Identical rows cannot be split: a single leaf with -G / (H + lambda).
        assert_eq!(tree.nodes.len(), 1);
        assert!((tree.predict(&x[0]) - (-1.0 / 1.5)).abs() < 1e-12);
    }

    #[test]
    fn test_feature_sampling_needs_rng() {
        // Only feature 1 separates the labels.
        let x: Vec<FeatureRow> = (0..8).map(|i| row(0.0, i as f64)).collect();
        let y: Vec<u8> = (0..8).map(|i| u8::from(i >= 4)).collect();
        let options = GrowOptions {
            max_depth: 1,
            max_features: Some(1),
        };

        let unsampled = grow(&x, &Targets::Labels(&y), (0..8).collect(), options, None);
        assert!(matches!(unsampled.nodes[0], Node::Split { feature: 1, .. }));

        // A one-feature draw that misses feature 1 cannot split at all.
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        for _ in 0..20 {
            let tree = grow(&x, &Targets::Labels(&y), (0..8).collect(), options, Some(&mut rng));
            assert!(tree.validate().is_ok());
            if let Node::Split { feature, .. } = tree.nodes[0] {
                assert_eq!(feature, 1);
            }
        }
    }
}

// src/tree.rs

use crate::error::{Error, Result};

/// A phylogenetic tree as an arena of nodes joined by weighted, undirected
/// edges. Leaves carry OTU labels; branch lengths are non-negative.
#[derive(Debug, Clone, Default)]
pub struct WeightedTree {
    labels: Vec<Option<String>>,
    adjacency: Vec<Vec<(usize, f64)>>,
}

impl WeightedTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node and returns its index.
    pub fn add_node(&mut self, label: Option<String>) -> usize {
        self.labels.push(label);
        self.adjacency.push(Vec::new());
        self.labels.len() - 1
    }

    /// Joins two existing nodes with a branch of the given length.
    pub fn add_edge(&mut self, a: usize, b: usize, weight: f64) {
        self.adjacency[a].push((b, weight));
        self.adjacency[b].push((a, weight));
    }

    pub fn node_count(&self) -> usize {
        self.labels.len()
    }

    /// A node with at most one neighbour is a leaf (a degree-one root
    /// counts, matching the unrooted reading used for diameters).
    pub fn is_leaf(&self, node: usize) -> bool {
        self.adjacency[node].len() <= 1
    }

    pub fn label(&self, node: usize) -> Option<&str> {
        self.labels[node].as_deref()
    }

    pub fn set_label(&mut self, node: usize, label: String) {
        self.labels[node] = Some(label);
    }

    pub fn leaves(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.node_count()).filter(|&n| self.is_leaf(n))
    }

    /// From `start`, the farthest node by summed branch length and its
    /// distance. Single depth-first traversal; also detects disconnected
    /// and cyclic structure.
    fn farthest_from(&self, start: usize) -> Result<(usize, f64)> {
        let n = self.node_count();
        let mut visited = vec![false; n];
        let mut stack = vec![(start, usize::MAX, 0.0_f64)];
        let mut best = (start, 0.0_f64);
        let mut seen = 0usize;

        while let Some((node, parent, dist)) = stack.pop() {
            if visited[node] {
                return Err(Error::MalformedTree("cycle detected".into()));
            }
            visited[node] = true;
            seen += 1;
            if dist > best.1 {
                best = (node, dist);
            }
            for &(next, weight) in &self.adjacency[node] {
                if next != parent {
                    stack.push((next, node, dist + weight));
                }
            }
        }

        if seen != n {
            return Err(Error::MalformedTree("tree is disconnected".into()));
        }
        Ok(best)
    }

    /// Weighted diameter: the longest path weight between any two leaves.
    ///
    /// Two-pass farthest-node technique: from an arbitrary leaf find the
    /// farthest node `u`, then the farthest node from `u`; their distance is
    /// the diameter. Linear in the node count, correct for non-negative
    /// branch lengths.
    pub fn diameter(&self) -> Result<f64> {
        if self.node_count() == 0 {
            return Err(Error::MalformedTree("tree has no nodes".into()));
        }
        let start = self.leaves().next().unwrap_or(0);
        let (u, _) = self.farthest_from(start)?;
        let (_, diameter) = self.farthest_from(u)?;
        Ok(diameter)
    }
}

/// Min/max/mean/median over the closed set of per-tree diameters of a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DiameterSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
}

impl DiameterSummary {
    /// Summarizes a non-empty batch of diameters. The all-zero fallback for
    /// a tree-less run belongs to the pipeline, not here.
    pub fn from_diameters(diameters: &[f64]) -> Result<Self> {
        if diameters.is_empty() {
            return Err(Error::EmptyInput("no tree diameters to summarize"));
        }

        let mut sorted = diameters.to_vec();
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len();
        let median = if n % 2 == 1 {
            sorted[n / 2]
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        };

        Ok(Self {
            min: sorted[0],
            max: sorted[n - 1],
            mean: sorted.iter().sum::<f64>() / n as f64,
            median,
        })
    }
}

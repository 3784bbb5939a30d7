//! Candidate weight configurations for tuning.
//!
//! ## Search Strategies
//!
//! | Strategy | When to use                                             |
//! |----------|---------------------------------------------------------|
//! | Grid     | Default: every combination of the per-weight values     |
//! | Random   | Quick runs: a seeded, shuffled subset of the same grid  |
//!
//! ## Grid Order
//!
//! The cartesian product is enumerated with recency as the outermost loop and
//! graph weight as the innermost, so trial numbers are stable across runs:
//!
//! ```text
//! trial 1: (0.8, 0.8, 0.8, 0.05)
//! trial 2: (0.8, 0.8, 0.8, 0.10)
//! trial 3: (0.8, 0.8, 0.8, 0.20)
//! trial 4: (0.8, 0.8, 1.0, 0.05)
//! ...
//! trial 81: (1.2, 1.2, 1.2, 0.20)
//! ```
//!
//! Early stopping makes the order matter: a shuffled grid stops at different
//! trials than the ordered one.

use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::types::ScoreConfig;

/// Discrete values to try for each weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterGrid {
    pub recency: Vec<f64>,
    pub marks: Vec<f64>,
    pub frequency: Vec<f64>,
    pub graph: Vec<f64>,
}

impl Default for ParameterGrid {
    fn default() -> Self {
        let multipliers = vec![0.8, 1.0, 1.2];
        Self {
            recency: multipliers.clone(),
            marks: multipliers.clone(),
            frequency: multipliers,
            graph: vec![0.05, 0.1, 0.2],
        }
    }
}

impl ParameterGrid {
    /// Number of combinations.
    pub fn size(&self) -> usize {
        self.recency.len() * self.marks.len() * self.frequency.len() * self.graph.len()
    }

    /// Every combination, recency-major and graph-minor.
    pub fn candidates(&self) -> Vec<ScoreConfig> {
        (0..self.size()).map(|idx| self.decode(idx)).collect()
    }

    /// Convert a linear index to its combination.
    fn decode(&self, idx: usize) -> ScoreConfig {
        let mut remaining = idx;

        let graph = self.graph[remaining % self.graph.len()];
        remaining /= self.graph.len();
        let frequency = self.frequency[remaining % self.frequency.len()];
        remaining /= self.frequency.len();
        let marks = self.marks[remaining % self.marks.len()];
        remaining /= self.marks.len();
        let recency = self.recency[remaining % self.recency.len()];

        ScoreConfig::new(recency, marks, frequency, graph)
    }
}

/// How to pick candidates from the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchStrategy {
    /// Full grid in its fixed order.
    Grid,
    /// `samples` distinct grid points in seeded random order.
    Random { samples: usize },
}

/// Candidate configurations for a search.
pub fn sample_points(grid: &ParameterGrid, strategy: SearchStrategy, seed: u64) -> Vec<ScoreConfig> {
    match strategy {
        SearchStrategy::Grid => grid.candidates(),
        SearchStrategy::Random { samples } => {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut points = grid.candidates();
            points.shuffle(&mut rng);
            points.truncate(samples);
            points
        }
    }
}

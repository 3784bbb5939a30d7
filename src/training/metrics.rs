//! Ranking quality metrics.
//!
//! ## Metrics Overview
//!
//! | Metric         | What it measures                                    | Range   |
//! |----------------|-----------------------------------------------------|---------|
//! | Recall@k       | Fraction of gold topics found in the top k          | 0.0-1.0 |
//! | Precision@k    | Fraction of the top k that are gold topics          | 0.0-1.0 |
//! | MAP@k          | Average precision at each gold hit in the top k     | 0.0-1.0 |
//! | NDCG@k         | Position-discounted gain against the ideal ordering | 0.0-1.0 |
//!
//! Relevance is binary: a topic is either in a question's gold set or not.
//!
//! ## Discount
//!
//! NDCG here uses a linear discount, not the usual log₂:
//!
//! ```text
//! DCG@k  = Σ  1 / rank      over gold topics at rank 1..=k
//! IDCG@k = Σ  1 / i         for i in 1..=min(k, |gold|)
//! ```
//!
//! Scores from earlier runs were produced with this formula, so it stays.
//!
//! ## Aggregation
//!
//! Per-question scores are macro-averaged into a split score, and split scores
//! are macro-averaged again into a configuration score.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// The four ranking scores for one cutoff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub recall_at_k: f64,
    pub precision_at_k: f64,
    pub map_at_k: f64,
    pub ndcg_at_k: f64,
}

impl Metrics {
    /// Score one ranking against one gold set.
    ///
    /// # Arguments
    ///
    /// * `predicted` - Topic ids in ranked order, best first
    /// * `gold` - Relevant topic ids (order and duplicates are ignored)
    /// * `k` - Cutoff rank
    pub fn compute(predicted: &[String], gold: &[String], k: usize) -> Self {
        Self {
            recall_at_k: recall_at_k(predicted, gold, k),
            precision_at_k: precision_at_k(predicted, gold, k),
            map_at_k: average_precision_at_k(predicted, gold, k),
            ndcg_at_k: ndcg_at_k(predicted, gold, k),
        }
    }

    /// Unweighted mean of each field. Empty input gives all zeros.
    pub fn macro_average(metrics: &[Metrics]) -> Self {
        if metrics.is_empty() {
            return Self::default();
        }

        let field = |f: fn(&Metrics) -> f64| -> f64 {
            mean(&metrics.iter().map(f).collect::<Vec<_>>())
        };

        Self {
            recall_at_k: field(|m| m.recall_at_k),
            precision_at_k: field(|m| m.precision_at_k),
            map_at_k: field(|m| m.map_at_k),
            ndcg_at_k: field(|m| m.ndcg_at_k),
        }
    }
}

/// Recall at position k.
///
/// ```text
/// R@k = |gold ∩ top-k| / |gold|
/// ```
pub fn recall_at_k(predicted: &[String], gold: &[String], k: usize) -> f64 {
    let relevant = gold_set(gold);
    if relevant.is_empty() {
        return 0.0;
    }

    let top_k: HashSet<&str> = predicted.iter().take(k).map(String::as_str).collect();
    let hits = relevant.intersection(&top_k).count();

    hits as f64 / relevant.len() as f64
}

/// Precision at position k.
///
/// The denominator is the number of predictions actually inspected, so a
/// short ranking is not penalized for the ranks it lacks.
///
/// ```text
/// P@k = |gold ∩ top-k| / min(k, |predicted|)
/// ```
pub fn precision_at_k(predicted: &[String], gold: &[String], k: usize) -> f64 {
    let inspected = k.min(predicted.len());
    if inspected == 0 {
        return 0.0;
    }

    let relevant = gold_set(gold);
    let top_k: HashSet<&str> = predicted[..inspected].iter().map(String::as_str).collect();
    let hits = top_k.intersection(&relevant).count();

    hits as f64 / inspected as f64
}

/// Average precision at position k.
///
/// ```text
/// AP@k = (1 / min(|gold|, k)) × Σ hits_so_far / rank    over gold hits in top-k
/// ```
pub fn average_precision_at_k(predicted: &[String], gold: &[String], k: usize) -> f64 {
    let relevant = gold_set(gold);
    if relevant.is_empty() || k == 0 {
        return 0.0;
    }

    let mut hits = 0;
    let mut precision_sum = 0.0;

    for (rank, topic) in predicted.iter().take(k).enumerate() {
        if relevant.contains(topic.as_str()) {
            hits += 1;
            precision_sum += hits as f64 / (rank as f64 + 1.0);
        }
    }

    precision_sum / relevant.len().min(k) as f64
}

/// Normalized discounted cumulative gain at position k, linear discount.
pub fn ndcg_at_k(predicted: &[String], gold: &[String], k: usize) -> f64 {
    let relevant = gold_set(gold);

    // The ideal ranking lists every gold topic first.
    let idcg: f64 = (1..=relevant.len().min(k)).map(|rank| 1.0 / rank as f64).sum();
    if idcg == 0.0 {
        return 0.0;
    }

    let dcg: f64 = predicted
        .iter()
        .take(k)
        .enumerate()
        .filter(|(_, topic)| relevant.contains(topic.as_str()))
        .map(|(rank, _)| 1.0 / (rank as f64 + 1.0))
        .sum();

    dcg / idcg
}

fn gold_set(gold: &[String]) -> HashSet<&str> {
    gold.iter().map(String::as_str).collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

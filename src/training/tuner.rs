//! Weight tuning with early stopping.
//!
//! Trials run one after another in candidate order:
//!
//! ```text
//! for trial in candidates:
//!     metrics = evaluate(trial)
//!     if best is None or metrics.recall > best.recall:   strict: ties keep the old best
//!         best = trial; stale = 0
//!     else:
//!         stale += 1
//!     if stale >= max_rounds: stop
//! ```
//!
//! A trial within `epsilon` of the best recall is logged as a plateau. It does
//! not change the search.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info};

use super::evaluate::RollingEvaluator;
use super::gridsearch::{sample_points, ParameterGrid, SearchStrategy};
use super::metrics::Metrics;
use crate::config::save_score_config;
use crate::error::Result;
use crate::ranking::TopicPredictor;
use crate::types::ScoreConfig;

/// One evaluated candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TuneResult {
    /// 1-based position in the candidate list.
    pub trial: usize,
    pub config: ScoreConfig,
    pub metrics: Metrics,
}

impl TuneResult {
    /// Report label, e.g. `candidate_7`.
    pub fn label(&self) -> String {
        format!("candidate_{}", self.trial)
    }
}

/// Search knobs.
#[derive(Debug, Clone)]
pub struct TuneSettings {
    /// Consecutive non-improving trials before stopping.
    pub max_rounds: usize,
    /// Recall distance from the best that counts as a plateau (logging only).
    pub epsilon: f64,
    pub grid: ParameterGrid,
    pub strategy: SearchStrategy,
    pub seed: u64,
    /// Where to write the best configuration, if anywhere.
    pub best_config_path: Option<PathBuf>,
}

impl Default for TuneSettings {
    fn default() -> Self {
        Self {
            max_rounds: 12,
            epsilon: 0.001,
            grid: ParameterGrid::default(),
            strategy: SearchStrategy::Grid,
            seed: 42,
            best_config_path: None,
        }
    }
}

/// Outcome of a search.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TuneOutcome {
    /// Best result by recall@k; `None` only when there were no candidates.
    pub best: Option<TuneResult>,
    /// Every evaluated trial, in order.
    pub history: Vec<TuneResult>,
    pub stopped_early: bool,
    /// Trials since the last improvement when the search ended.
    pub rounds_without_improvement: usize,
}

impl TuneOutcome {
    pub fn best_config(&self) -> Option<ScoreConfig> {
        self.best.as_ref().map(|b| b.config)
    }
}

/// Run the trial loop over `candidates`.
///
/// `evaluate` is called once per trial, in order; the first error aborts the
/// search.
pub fn search<F>(candidates: &[ScoreConfig], max_rounds: usize, epsilon: f64, mut evaluate: F) -> Result<TuneOutcome>
where
    F: FnMut(&ScoreConfig) -> Result<Metrics>,
{
    let mut outcome = TuneOutcome::default();
    let mut rounds_without_improvement = 0;

    for (idx, config) in candidates.iter().enumerate() {
        let result = TuneResult {
            trial: idx + 1,
            config: *config,
            metrics: evaluate(config)?,
        };
        outcome.history.push(result.clone());

        let (improved, on_plateau) = match &outcome.best {
            None => (true, false),
            Some(best) => {
                let delta = result.metrics.recall_at_k - best.metrics.recall_at_k;
                (delta > 0.0, delta <= 0.0 && delta.abs() < epsilon)
            }
        };
        if on_plateau {
            debug!("{} is on a plateau with the best", result.label());
        }

        if improved {
            info!(
                "{}: recall@k {:.4} (new best) {:?}",
                result.label(),
                result.metrics.recall_at_k,
                result.config
            );
            outcome.best = Some(result);
            rounds_without_improvement = 0;
        } else {
            rounds_without_improvement += 1;
            debug!(
                "{}: recall@k {:.4} ({} without improvement)",
                result.label(),
                result.metrics.recall_at_k,
                rounds_without_improvement
            );
        }

        if rounds_without_improvement >= max_rounds {
            info!(
                "stopping after trial {}: {} rounds without improvement",
                idx + 1,
                rounds_without_improvement
            );
            outcome.stopped_early = idx + 1 < candidates.len();
            break;
        }
    }
    outcome.rounds_without_improvement = rounds_without_improvement;

    Ok(outcome)
}

/// Grid search over the rolling evaluator.
pub struct AutoTuner<'e, 'c, P> {
    evaluator: &'e RollingEvaluator<'c>,
    predictor: P,
}

impl<'e, 'c, P> AutoTuner<'e, 'c, P>
where
    P: TopicPredictor + Sync,
{
    pub fn new(evaluator: &'e RollingEvaluator<'c>, predictor: P) -> Self {
        Self {
            evaluator,
            predictor,
        }
    }

    /// Search the configured candidates and persist the best configuration.
    pub fn tune(&self, settings: &TuneSettings) -> Result<TuneOutcome> {
        let candidates = sample_points(&settings.grid, settings.strategy, settings.seed);
        info!(
            "tuning over {} candidates ({} splits, k = {})",
            candidates.len(),
            self.evaluator.splits().len(),
            self.evaluator.k()
        );

        let outcome = search(&candidates, settings.max_rounds, settings.epsilon, |config| {
            Ok(self.evaluator.evaluate(&self.predictor, config).overall)
        })?;

        if let (Some(best), Some(path)) = (&outcome.best, &settings.best_config_path) {
            save_score_config(path, &best.config)?;
            info!("best configuration ({}) written to {}", best.label(), path.display());
        }

        Ok(outcome)
    }
}

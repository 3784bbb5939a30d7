//! Rolling-split evaluation of a predictor configuration.
//!
//! Preparation happens once per run: year files are already in the corpus,
//! each question's candidate topics are resolved once per year, and each test
//! question's gold set is resolved up front (manual label, else catalog
//! match). No catalog matching happens while scoring a configuration:
//!
//! ```text
//! for each split:
//!     ranking  = predict(resolved train questions, config)  one per split
//!     per-q    = Metrics(ranking, gold[q], k)           for every test question
//!     split    = macro_average(per-q)
//!     per-paper= macro_average(per-q grouped by paper)
//! overall = macro_average(splits)
//! ```
//!
//! Splits are independent, so they are scored in parallel; results are
//! collected in split order and the output does not depend on scheduling.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use super::metrics::Metrics;
use super::splits::{rolling_splits, Split};
use crate::corpus::{gold_for, Corpus, GoldLabels};
use crate::error::Result;
use crate::ontology::Catalog;
use crate::ranking::{ResolvedQuestion, TopicPredictor};
use crate::types::{Question, ScoreConfig};

/// Paper key for questions that carry no paper number.
pub const UNKNOWN_PAPER: u32 = 0;

/// A split with its questions and resolved gold sets.
#[derive(Debug, Clone)]
pub struct PreparedSplit {
    pub split: Split,
    pub train: Vec<Question>,
    /// Scoring view of `train`, aligned with it.
    pub train_resolved: Vec<ResolvedQuestion>,
    pub test: Vec<Question>,
    /// Gold topics per test question, aligned with `test`.
    pub gold: Vec<Vec<String>>,
}

/// Scores for one split.
#[derive(Debug, Clone, Serialize)]
pub struct SplitResult {
    pub name: String,
    pub split: Split,
    pub metrics: Metrics,
    pub per_paper: BTreeMap<u32, Metrics>,
    pub n_test_questions: usize,
}

/// Scores for a full rolling evaluation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EvalReport {
    pub splits: Vec<SplitResult>,
    /// Macro-average over splits.
    pub overall: Metrics,
}

/// Evaluates configurations over a fixed set of rolling splits.
pub struct RollingEvaluator<'a> {
    catalog: &'a Catalog,
    splits: Vec<PreparedSplit>,
    k: usize,
}

impl<'a> RollingEvaluator<'a> {
    /// Build the rolling splits over `years` and resolve their gold sets.
    ///
    /// Fails if the corpus lacks any of the years.
    pub fn prepare(
        corpus: &Corpus,
        catalog: &'a Catalog,
        labels: &GoldLabels,
        years: &[i32],
        k: usize,
    ) -> Result<Self> {
        let splits_to_run = rolling_splits(years);

        // Every year except the last trains some split; match each one once.
        let mut resolved_years: BTreeMap<i32, Vec<ResolvedQuestion>> = BTreeMap::new();
        for split in &splits_to_run {
            for &year in &split.train_years {
                if !resolved_years.contains_key(&year) {
                    let resolved = ResolvedQuestion::resolve_all(corpus.year(year)?, catalog);
                    resolved_years.insert(year, resolved);
                }
            }
        }

        let mut splits = Vec::new();
        for split in splits_to_run {
            let train = corpus.questions_for(&split.train_years)?;
            let train_resolved: Vec<ResolvedQuestion> = split
                .train_years
                .iter()
                .filter_map(|year| resolved_years.get(year))
                .flatten()
                .cloned()
                .collect();
            let test = corpus.year(split.test_year)?.to_vec();
            let gold = test.iter().map(|q| gold_for(q, labels, catalog)).collect();

            debug!(
                "split {}: {} train / {} test questions",
                split.name(),
                train.len(),
                test.len()
            );
            splits.push(PreparedSplit {
                split,
                train,
                train_resolved,
                test,
                gold,
            });
        }

        Ok(Self { catalog, splits, k })
    }

    /// Score `config` on every split.
    pub fn evaluate<P>(&self, predictor: &P, config: &ScoreConfig) -> EvalReport
    where
        P: TopicPredictor + Sync,
    {
        let splits: Vec<SplitResult> = self
            .splits
            .par_iter()
            .map(|prepared| self.evaluate_split(prepared, predictor, config))
            .collect();

        let split_metrics: Vec<Metrics> = splits.iter().map(|s| s.metrics).collect();
        EvalReport {
            overall: Metrics::macro_average(&split_metrics),
            splits,
        }
    }

    fn evaluate_split<P>(&self, prepared: &PreparedSplit, predictor: &P, config: &ScoreConfig) -> SplitResult
    where
        P: TopicPredictor + Sync,
    {
        let ranking = predictor.predict_resolved(&prepared.train_resolved, self.catalog, config);
        let predicted = ranking.topic_ids();

        let per_question: Vec<Metrics> = prepared
            .gold
            .iter()
            .map(|gold| Metrics::compute(&predicted, gold, self.k))
            .collect();

        let mut by_paper: BTreeMap<u32, Vec<Metrics>> = BTreeMap::new();
        for (question, metrics) in prepared.test.iter().zip(&per_question) {
            by_paper
                .entry(question.paper_id.unwrap_or(UNKNOWN_PAPER))
                .or_default()
                .push(*metrics);
        }

        SplitResult {
            name: prepared.split.name(),
            split: prepared.split.clone(),
            metrics: Metrics::macro_average(&per_question),
            per_paper: by_paper
                .into_iter()
                .map(|(paper, metrics)| (paper, Metrics::macro_average(&metrics)))
                .collect(),
            n_test_questions: prepared.test.len(),
        }
    }

    pub fn splits(&self) -> &[PreparedSplit] {
        &self.splits
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn catalog(&self) -> &Catalog {
        self.catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DataError;
    use crate::ontology::Topic;
    use crate::ranking::FrequencyPredictor;

    fn catalog() -> Catalog {
        Catalog::new(vec![
            Topic::new("HF", "heart failure"),
            Topic::new("TB", "tuberculosis"),
            Topic::new("GOUT", "gout"),
        ])
        .unwrap()
    }

    fn corpus() -> Corpus {
        Corpus::from_questions(vec![
            Question::new("a1", "Heart failure management").with_year(2022).with_paper(1),
            Question::new("a2", "Tuberculosis treatment").with_year(2022).with_paper(2),
            Question::new("b1", "Heart failure drugs").with_year(2023).with_paper(1),
            Question::new("b2", "Gout").with_year(2023).with_paper(2),
            Question::new("c1", "Tuberculosis in HIV").with_year(2024).with_paper(1),
        ])
    }

    #[test]
    fn test_prepare_builds_rolling_splits() {
        let catalog = catalog();
        let evaluator =
            RollingEvaluator::prepare(&corpus(), &catalog, &GoldLabels::new(), &[2022, 2023, 2024], 5)
                .unwrap();

        assert_eq!(evaluator.splits().len(), 2);
        assert_eq!(evaluator.splits()[0].train.len(), 2);
        assert_eq!(evaluator.splits()[1].train.len(), 4);
        assert_eq!(evaluator.splits()[1].gold, vec![vec!["TB".to_string()]]);
    }

    #[test]
    fn test_train_questions_resolved_once_per_split() {
        let catalog = catalog();
        let evaluator =
            RollingEvaluator::prepare(&corpus(), &catalog, &GoldLabels::new(), &[2022, 2023, 2024], 5)
                .unwrap();

        for prepared in evaluator.splits() {
            assert_eq!(prepared.train_resolved.len(), prepared.train.len());
            assert_eq!(
                prepared.train_resolved,
                ResolvedQuestion::resolve_all(&prepared.train, &catalog)
            );
        }
        let candidates: Vec<_> = evaluator.splits()[1]
            .train_resolved
            .iter()
            .map(|r| r.candidates.clone())
            .collect();
        assert_eq!(
            candidates,
            vec![vec!["HF"], vec!["TB"], vec!["HF"], vec!["GOUT"]]
        );
    }

    #[test]
    fn test_prepare_missing_year() {
        let catalog = catalog();
        let result =
            RollingEvaluator::prepare(&corpus(), &catalog, &GoldLabels::new(), &[2022, 2030], 5);
        assert!(matches!(result, Err(DataError::MissingInput { .. })));
    }

    #[test]
    fn test_evaluate_scores_and_papers() {
        let catalog = catalog();
        let evaluator =
            RollingEvaluator::prepare(&corpus(), &catalog, &GoldLabels::new(), &[2022, 2023], 1)
                .unwrap();

        // Train 2022 ranks HF and TB at 1.0 each, HF first seen.
        let report = evaluator.evaluate(&FrequencyPredictor, &ScoreConfig::default());
        let split = &report.splits[0];

        assert_eq!(split.name, "train_2022_test_2023");
        assert_eq!(split.n_test_questions, 2);
        // b1 (HF) is hit at rank 1, b2 (GOUT) is never predicted.
        assert!((split.metrics.recall_at_k - 0.5).abs() < 1e-9);
        assert!((split.per_paper[&1].recall_at_k - 1.0).abs() < 1e-9);
        assert_eq!(split.per_paper[&2].recall_at_k, 0.0);
        assert_eq!(report.overall, split.metrics);
    }

    #[test]
    fn test_manual_labels_used_for_gold() {
        let catalog = catalog();
        let mut labels = GoldLabels::new();
        labels.insert("b2".to_string(), vec!["TB".to_string()]);

        let evaluator =
            RollingEvaluator::prepare(&corpus(), &catalog, &labels, &[2022, 2023], 2).unwrap();
        let report = evaluator.evaluate(&FrequencyPredictor, &ScoreConfig::default());

        assert!((report.overall.recall_at_k - 1.0).abs() < 1e-9);
    }
}

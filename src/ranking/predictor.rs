//! Topic scoring from historical questions.
//!
//! Every question votes for its candidate topics. A vote is worth
//! `frequency_weight × mark_multiplier`, and each candidate's parent receives
//! a smaller `graph_weight × mark_multiplier` vote:
//!
//! ```text
//! mark_multiplier = 1 + (marks / 15) × marks_weight     (1.0 when unmarked)
//!
//! score[topic]  += frequency_weight × mark_multiplier
//! score[parent] += graph_weight     × mark_multiplier
//! ```
//!
//! Candidates come from the question's own topic tags when it has any, and
//! from catalog matching (top 3) otherwise. Questions with neither are
//! skipped. `recency_weight` is not read here.

use std::collections::HashMap;

use rayon::prelude::*;

use crate::ontology::Catalog;
use crate::types::{Question, RankedPrediction, ScoreConfig, TopicScore};

/// Marks that double a question's weight at `marks_weight = 1.0`.
pub const FULL_MARKS: f64 = 15.0;

/// How many matched topics an untagged question contributes.
pub const MATCHED_CANDIDATES: usize = 3;

/// A question reduced to what scoring reads: its candidate topics and marks.
///
/// Candidates do not depend on the weights, so callers that score the same
/// questions under many configurations resolve them once up front.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedQuestion {
    pub candidates: Vec<String>,
    pub marks: Option<f64>,
}

impl ResolvedQuestion {
    /// Candidates from the question's own topic tags when it has any, else
    /// its top catalog matches.
    pub fn resolve(question: &Question, catalog: &Catalog) -> Self {
        let tagged = question.pre_tagged_topics();
        let candidates = if tagged.is_empty() {
            catalog
                .match_topics(&question.text, MATCHED_CANDIDATES)
                .into_iter()
                .map(|(id, _)| id)
                .collect()
        } else {
            tagged
        };
        Self {
            candidates,
            marks: question.marks,
        }
    }

    /// Resolve a batch in parallel, keeping input order.
    pub fn resolve_all(questions: &[Question], catalog: &Catalog) -> Vec<Self> {
        questions
            .par_iter()
            .map(|q| Self::resolve(q, catalog))
            .collect()
    }
}

/// Produces a topic ranking from a set of training questions.
pub trait TopicPredictor {
    /// Rank topics from already-resolved questions.
    fn predict_resolved(
        &self,
        questions: &[ResolvedQuestion],
        catalog: &Catalog,
        config: &ScoreConfig,
    ) -> RankedPrediction;

    fn predict(
        &self,
        questions: &[Question],
        catalog: &Catalog,
        config: &ScoreConfig,
    ) -> RankedPrediction {
        let resolved = ResolvedQuestion::resolve_all(questions, catalog);
        self.predict_resolved(&resolved, catalog, config)
    }
}

/// Weighted frequency predictor with parent propagation.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrequencyPredictor;

impl FrequencyPredictor {
    pub fn new() -> Self {
        Self
    }

    pub fn mark_multiplier(marks: Option<f64>, config: &ScoreConfig) -> f64 {
        match marks {
            Some(marks) => 1.0 + (marks / FULL_MARKS) * config.marks_weight,
            None => 1.0,
        }
    }
}

impl TopicPredictor for FrequencyPredictor {
    fn predict_resolved(
        &self,
        questions: &[ResolvedQuestion],
        catalog: &Catalog,
        config: &ScoreConfig,
    ) -> RankedPrediction {
        let mut scores = ScoreAccumulator::default();

        for question in questions {
            if question.candidates.is_empty() {
                continue;
            }

            let multiplier = Self::mark_multiplier(question.marks, config);
            for topic_id in &question.candidates {
                scores.add(topic_id, config.frequency_weight * multiplier);
                if let Some(parent) = catalog.parent_of(topic_id) {
                    scores.add(parent, config.graph_weight * multiplier);
                }
            }
        }

        RankedPrediction::from_insertion_order(scores.into_entries())
    }
}

/// Running totals that remember first-seen order for tie-breaking.
#[derive(Debug, Default)]
struct ScoreAccumulator {
    entries: Vec<TopicScore>,
    position: HashMap<String, usize>,
}

impl ScoreAccumulator {
    fn add(&mut self, topic_id: &str, amount: f64) {
        match self.position.get(topic_id) {
            Some(&i) => self.entries[i].score += amount,
            None => {
                self.position.insert(topic_id.to_string(), self.entries.len());
                self.entries.push(TopicScore {
                    topic_id: topic_id.to_string(),
                    score: amount,
                });
            }
        }
    }

    fn into_entries(self) -> Vec<TopicScore> {
        self.entries
    }
}

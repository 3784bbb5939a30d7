//! Core types for examcast.
//!
//! - `Question`: one exam question as loaded from a per-year paper file
//! - `ScoreConfig`: the four tunable scoring weights
//! - `TopicScore` / `RankedPrediction`: predictor output, best first
//!
//! Everything here is immutable once built. Records are deserialized straight
//! from the corpus JSON, so field renames track the on-disk names.

use serde::{Deserialize, Serialize};

use crate::error::{DataError, Result};

/// Delimiter used by external topic tagging (`"T12;T40"`).
pub const TAG_DELIMITER: char = ';';

/// A single exam question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Stable question identifier.
    #[serde(rename = "q_id")]
    pub id: String,
    /// Raw question text as printed on the paper.
    #[serde(rename = "raw_text")]
    pub text: String,
    #[serde(default)]
    pub year: Option<i32>,
    /// Paper number within the year (1-4 for a typical sitting).
    #[serde(default)]
    pub paper_id: Option<u32>,
    /// Exam weight of the question (5, 10, 15...).
    #[serde(default)]
    pub marks: Option<f64>,
    /// Pre-existing topic tags, joined with [`TAG_DELIMITER`].
    #[serde(default, rename = "harrison_tag_ids")]
    pub topic_tag_ids: Option<String>,
    /// Free-text tag terms accompanying the topic tags.
    #[serde(default, rename = "harrison_tag_terms")]
    pub tag_terms: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Question {
    /// Minimal question with only the required fields set.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            year: None,
            paper_id: None,
            marks: None,
            topic_tag_ids: None,
            tag_terms: None,
            tags: Vec::new(),
        }
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_paper(mut self, paper_id: u32) -> Self {
        self.paper_id = Some(paper_id);
        self
    }

    pub fn with_marks(mut self, marks: f64) -> Self {
        self.marks = Some(marks);
        self
    }

    pub fn with_topic_tags(mut self, tags: impl Into<String>) -> Self {
        self.topic_tag_ids = Some(tags.into());
        self
    }

    /// Topic ids from the external tagging, empties dropped. Ids are taken
    /// verbatim: `" T1"` and `"T1"` are different topics.
    pub fn pre_tagged_topics(&self) -> Vec<String> {
        self.topic_tag_ids
            .as_deref()
            .map(|raw| {
                raw.split(TAG_DELIMITER)
                    .filter(|id| !id.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Reject records without a usable id.
    ///
    /// Serde already rejects records where `q_id` or `raw_text` is absent.
    /// Empty text is accepted; such a question matches no topic.
    pub fn validate(&self, source_name: &str) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(DataError::malformed(source_name, "question with empty q_id"));
        }
        Ok(())
    }
}

/// Scoring weights for the predictor.
///
/// `recency_weight` is part of the schema and the tuning grid but the scoring
/// path does not read it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreConfig {
    #[serde(default = "default_weight")]
    pub recency_weight: f64,
    #[serde(default = "default_weight")]
    pub marks_weight: f64,
    #[serde(default = "default_weight")]
    pub frequency_weight: f64,
    #[serde(default = "default_graph_weight")]
    pub graph_weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

fn default_graph_weight() -> f64 {
    0.1
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            recency_weight: default_weight(),
            marks_weight: default_weight(),
            frequency_weight: default_weight(),
            graph_weight: default_graph_weight(),
        }
    }
}

impl ScoreConfig {
    pub fn new(recency: f64, marks: f64, frequency: f64, graph: f64) -> Self {
        Self {
            recency_weight: recency,
            marks_weight: marks,
            frequency_weight: frequency,
            graph_weight: graph,
        }
    }

    /// Weights must be finite and non-negative.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in self.named_weights() {
            if !value.is_finite() || value < 0.0 {
                return Err(DataError::InvalidConfig(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    /// Weights paired with their document keys, in schema order.
    pub fn named_weights(&self) -> [(&'static str, f64); 4] {
        [
            ("recency_weight", self.recency_weight),
            ("marks_weight", self.marks_weight),
            ("frequency_weight", self.frequency_weight),
            ("graph_weight", self.graph_weight),
        ]
    }
}

/// A topic with its accumulated score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicScore {
    pub topic_id: String,
    pub score: f64,
}

/// Predictor output: topics sorted by score, highest first.
///
/// Equal scores keep the order in which the predictor first saw the topic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankedPrediction {
    entries: Vec<TopicScore>,
}

impl RankedPrediction {
    /// Build from scores in first-seen order. Sorting is stable, so ties keep
    /// that order.
    pub fn from_insertion_order(mut entries: Vec<TopicScore>) -> Self {
        entries.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Self { entries }
    }

    pub fn entries(&self) -> &[TopicScore] {
        &self.entries
    }

    /// Topic ids in rank order, the shape the metrics take.
    pub fn topic_ids(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.topic_id.clone()).collect()
    }

    pub fn score_of(&self, topic_id: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.topic_id == topic_id)
            .map(|e| e.score)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_from_corpus_json() {
        let json = r#"{
            "q_id": "2023-P1-Q4",
            "raw_text": "Discuss the management of heart failure.",
            "year": 2023,
            "paper_id": 1,
            "marks": 15,
            "tags": ["cardio"],
            "harrison_tag_ids": "T1;;T7",
            "harrison_tag_terms": "heart failure"
        }"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.id, "2023-P1-Q4");
        assert_eq!(q.marks, Some(15.0));
        assert_eq!(q.pre_tagged_topics(), vec!["T1", "T7"]);
    }

    #[test]
    fn test_question_missing_text_fails() {
        let json = r#"{ "q_id": "x", "year": 2022 }"#;
        assert!(serde_json::from_str::<Question>(json).is_err());
    }

    #[test]
    fn test_question_blank_id_is_malformed() {
        let q = Question::new("  ", "text");
        assert!(matches!(
            q.validate("papers_2022.json"),
            Err(DataError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn test_empty_text_is_accepted() {
        let q = Question::new("a", "");
        assert!(q.validate("papers_2022.json").is_ok());
    }

    #[test]
    fn test_tag_ids_taken_verbatim() {
        let q = Question::new("a", "b").with_topic_tags(" T1;T2;;");
        assert_eq!(q.pre_tagged_topics(), vec![" T1", "T2"]);
    }

    #[test]
    fn test_null_marks_and_tags() {
        let json = r#"{ "q_id": "a", "raw_text": "b", "marks": null, "harrison_tag_ids": "" }"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.marks, None);
        assert!(q.pre_tagged_topics().is_empty());
    }

    #[test]
    fn test_score_config_defaults() {
        let config = ScoreConfig::default();
        assert_eq!(config.recency_weight, 1.0);
        assert_eq!(config.marks_weight, 1.0);
        assert_eq!(config.frequency_weight, 1.0);
        assert_eq!(config.graph_weight, 0.1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_score_config_rejects_negative() {
        let config = ScoreConfig::new(1.0, -0.5, 1.0, 0.1);
        assert!(matches!(config.validate(), Err(DataError::InvalidConfig(_))));
    }

    #[test]
    fn test_ranked_prediction_stable_ties() {
        let ranked = RankedPrediction::from_insertion_order(vec![
            TopicScore { topic_id: "b".into(), score: 1.0 },
            TopicScore { topic_id: "a".into(), score: 2.0 },
            TopicScore { topic_id: "c".into(), score: 1.0 },
        ]);
        assert_eq!(ranked.topic_ids(), vec!["a", "b", "c"]);
        assert_eq!(ranked.score_of("c"), Some(1.0));
    }
}

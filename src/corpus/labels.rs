//! Gold labels and auto-label suggestions.
//!
//! Manual labels come from a CSV with one row per (question, topic) pair:
//!
//! ```text
//! q_id,topic_id
//! 2024-P1-Q3,T12
//! 2024-P1-Q3,T40
//! ```
//!
//! A missing label file means "no manual labels"; evaluation then falls back
//! to catalog matching for every question. Suggestions go the other way: one
//! row per question with its matched topics `;`-joined, for manual review.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{DataError, Result};
use crate::ontology::Catalog;
use crate::types::{Question, TAG_DELIMITER};

/// Question id → gold topic ids (de-duplicated, file order).
pub type GoldLabels = HashMap<String, Vec<String>>;

/// Topics suggested per question when no manual label exists.
pub const AUTO_LABEL_TOPICS: usize = 3;

#[derive(Debug, Deserialize)]
struct LabelRow {
    q_id: String,
    topic_id: String,
}

/// Load manual gold labels. An absent file yields no labels.
pub fn load_gold_labels(path: &Path) -> Result<GoldLabels> {
    if !path.exists() {
        warn!("no gold labels at {}, falling back to auto-labels", path.display());
        return Ok(GoldLabels::new());
    }

    let source_name = path.display().to_string();
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| DataError::malformed(&source_name, e.to_string()))?;

    let mut labels = GoldLabels::new();
    for (row_idx, result) in reader.deserialize::<LabelRow>().enumerate() {
        let row = result.map_err(|e| DataError::malformed(&source_name, e.to_string()))?;
        let q_id = row.q_id.trim();
        let topic_id = row.topic_id.trim();
        if q_id.is_empty() || topic_id.is_empty() {
            return Err(DataError::malformed(
                &source_name,
                format!("row {} has an empty q_id or topic_id", row_idx + 1),
            ));
        }

        let topics = labels.entry(q_id.to_string()).or_default();
        if !topics.iter().any(|t| t == topic_id) {
            topics.push(topic_id.to_string());
        }
    }

    info!("loaded gold labels for {} questions", labels.len());
    Ok(labels)
}

/// Catalog-matched topics for each question, in question order.
pub fn auto_label(
    questions: &[Question],
    catalog: &Catalog,
    max_topics: usize,
) -> Vec<(String, Vec<String>)> {
    questions
        .iter()
        .map(|q| (q.id.clone(), matched_ids(q, catalog, max_topics)))
        .collect()
}

/// Gold set for one question: the manual label when present, else the top
/// catalog matches.
pub fn gold_for(question: &Question, labels: &GoldLabels, catalog: &Catalog) -> Vec<String> {
    match labels.get(&question.id) {
        Some(topics) => topics.clone(),
        None => matched_ids(question, catalog, AUTO_LABEL_TOPICS),
    }
}

fn matched_ids(question: &Question, catalog: &Catalog, max_topics: usize) -> Vec<String> {
    catalog
        .match_topics(&question.text, max_topics)
        .into_iter()
        .map(|(id, _)| id)
        .collect()
}

/// Write suggestions as `q_id,topic_ids` CSV, creating parent directories.
pub fn export_suggestions(path: &Path, suggestions: &[(String, Vec<String>)]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let source_name = path.display().to_string();
    let csv_err = |e: csv::Error| DataError::malformed(&source_name, e.to_string());

    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    writer.write_record(["q_id", "topic_ids"]).map_err(csv_err)?;

    let delimiter = TAG_DELIMITER.to_string();
    for (q_id, topic_ids) in suggestions {
        writer
            .write_record([q_id.as_str(), topic_ids.join(&delimiter).as_str()])
            .map_err(csv_err)?;
    }
    writer.flush()?;

    info!("wrote {} label suggestions to {}", suggestions.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ontology::Topic;

    fn catalog() -> Catalog {
        Catalog::new(vec![
            Topic::new("T1", "heart failure"),
            Topic::new("T2", "gout"),
        ])
        .unwrap()
    }

    #[test]
    fn test_load_gold_labels_many_to_many() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gold_labels.csv");
        std::fs::write(&path, "q_id,topic_id\nq1,T1\nq1,T2\nq2,T2\nq1,T1\n").unwrap();

        let labels = load_gold_labels(&path).unwrap();
        assert_eq!(labels["q1"], vec!["T1", "T2"]);
        assert_eq!(labels["q2"], vec!["T2"]);
    }

    #[test]
    fn test_absent_gold_labels_are_empty() {
        let dir = tempfile::tempdir().unwrap();
        let labels = load_gold_labels(&dir.path().join("gold_labels.csv")).unwrap();
        assert!(labels.is_empty());
    }

    #[test]
    fn test_missing_column_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gold_labels.csv");
        std::fs::write(&path, "q_id,topic\nq1,T1\n").unwrap();
        assert!(matches!(
            load_gold_labels(&path),
            Err(DataError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn test_manual_label_wins_over_matching() {
        let mut labels = GoldLabels::new();
        labels.insert("q1".to_string(), vec!["T2".to_string()]);

        let labelled = Question::new("q1", "Heart failure");
        let unlabelled = Question::new("q2", "Heart failure");

        assert_eq!(gold_for(&labelled, &labels, &catalog()), vec!["T2"]);
        assert_eq!(gold_for(&unlabelled, &labels, &catalog()), vec!["T1"]);
    }

    #[test]
    fn test_export_suggestions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("auto_label_suggestions.csv");
        let questions = vec![
            Question::new("q1", "Gout and heart failure"),
            Question::new("q2", "Nothing known"),
        ];

        let suggestions = auto_label(&questions, &catalog(), AUTO_LABEL_TOPICS);
        export_suggestions(&path, &suggestions).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = written.lines().collect();
        assert_eq!(lines, vec!["q_id,topic_ids", "q1,T1;T2", "q2,"]);
    }
}

//! Per-paper topic forecasts.
//!
//! Each paper gets its own ranking, built only from that paper's historical
//! questions. The top of the ranking becomes the high-confidence list; the
//! next slice is kept as coverage backup. Every entry carries a handful of
//! practice question stems for the topic.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::ontology::Catalog;
use crate::ranking::TopicPredictor;
use crate::types::{Question, ScoreConfig, TopicScore};

/// Entries in the high-confidence list.
pub const HIGH_CONFIDENCE: usize = 30;
/// Entries in the coverage backup list.
pub const COVERAGE_BACKUP: usize = 30;

pub const BACKUP_TEMPLATES: &[&str] = &[
    "Define and classify {topic}.",
    "Discuss the clinical features and management of {topic}.",
    "Approach to diagnosis of {topic}.",
    "Complications and monitoring in {topic}.",
    "Outline the pathophysiology and treatment of {topic}.",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastEntry {
    pub topic_id: String,
    pub topic_name: String,
    /// Score rounded to three decimals.
    pub confidence: f64,
    pub backup_questions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaperForecast {
    pub paper_id: u32,
    pub year: i32,
    pub generated_at: DateTime<Utc>,
    pub high_confidence: Vec<ForecastEntry>,
    pub coverage_backup: Vec<ForecastEntry>,
}

pub fn forecast_path(dir: &Path, year: i32, paper_id: u32) -> PathBuf {
    dir.join(format!("predicted_{}_paper{}.json", year, paper_id))
}

fn entry(score: &TopicScore, catalog: &Catalog) -> ForecastEntry {
    let name = catalog.display_name(&score.topic_id);
    ForecastEntry {
        topic_id: score.topic_id.clone(),
        topic_name: name.to_string(),
        confidence: (score.score * 1000.0).round() / 1000.0,
        backup_questions: BACKUP_TEMPLATES
            .iter()
            .map(|t| t.replace("{topic}", name))
            .collect(),
    }
}

/// Rank one paper's history and split it into the two forecast lists.
pub fn build_forecast<P: TopicPredictor>(
    predictor: &P,
    questions: &[Question],
    catalog: &Catalog,
    config: &ScoreConfig,
    paper_id: u32,
    year: i32,
    generated_at: DateTime<Utc>,
) -> PaperForecast {
    let paper_questions: Vec<Question> = questions
        .iter()
        .filter(|q| q.paper_id == Some(paper_id))
        .cloned()
        .collect();
    let ranking = predictor.predict(&paper_questions, catalog, config);
    let entries = ranking.entries();

    let high_end = entries.len().min(HIGH_CONFIDENCE);
    let backup_end = entries.len().min(HIGH_CONFIDENCE + COVERAGE_BACKUP);

    PaperForecast {
        paper_id,
        year,
        generated_at,
        high_confidence: entries[..high_end].iter().map(|s| entry(s, catalog)).collect(),
        coverage_backup: entries[high_end..backup_end]
            .iter()
            .map(|s| entry(s, catalog))
            .collect(),
    }
}

/// Write one forecast file per paper. Returns the written paths.
pub fn write_forecasts<P: TopicPredictor>(
    dir: &Path,
    predictor: &P,
    questions: &[Question],
    catalog: &Catalog,
    config: &ScoreConfig,
    papers: &[u32],
    year: i32,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let generated_at = Utc::now();

    let mut written = Vec::with_capacity(papers.len());
    for &paper_id in papers {
        let forecast =
            build_forecast(predictor, questions, catalog, config, paper_id, year, generated_at);
        let body = serde_json::to_string_pretty(&forecast).map_err(std::io::Error::from)?;

        let path = forecast_path(dir, year, paper_id);
        std::fs::write(&path, body)?;
        info!(
            "paper {}: {} high-confidence, {} backup topics -> {}",
            paper_id,
            forecast.high_confidence.len(),
            forecast.coverage_backup.len(),
            path.display()
        );
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ontology::Topic;
    use crate::ranking::FrequencyPredictor;

    fn fixed_time() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn many_topics(n: usize) -> (Catalog, Vec<Question>) {
        let topics: Vec<Topic> = (0..n).map(|i| Topic::new(format!("T{}", i), format!("topic{}", i))).collect();
        // Earlier topics appear more often so the ranking is strict.
        let mut questions = Vec::new();
        for i in 0..n {
            for j in 0..(n - i) {
                questions.push(
                    Question::new(format!("q{}_{}", i, j), "text")
                        .with_paper(1)
                        .with_topic_tags(format!("T{}", i)),
                );
            }
        }
        (Catalog::new(topics).unwrap(), questions)
    }

    #[test]
    fn test_splits_high_confidence_and_backup() {
        let (catalog, questions) = many_topics(70);
        let forecast = build_forecast(
            &FrequencyPredictor,
            &questions,
            &catalog,
            &ScoreConfig::default(),
            1,
            2026,
            fixed_time(),
        );

        assert_eq!(forecast.high_confidence.len(), 30);
        assert_eq!(forecast.coverage_backup.len(), 30);
        assert_eq!(forecast.high_confidence[0].topic_id, "T0");
        assert_eq!(forecast.coverage_backup[0].topic_id, "T30");
    }

    #[test]
    fn test_only_paper_questions_counted() {
        let catalog = Catalog::new(vec![Topic::new("HF", "heart failure")]).unwrap();
        let questions = vec![
            Question::new("a", "Heart failure").with_paper(1),
            Question::new("b", "Heart failure").with_paper(2),
        ];

        let forecast = build_forecast(
            &FrequencyPredictor,
            &questions,
            &catalog,
            &ScoreConfig::default(),
            3,
            2026,
            fixed_time(),
        );
        assert!(forecast.high_confidence.is_empty());
        assert!(forecast.coverage_backup.is_empty());
    }

    #[test]
    fn test_entry_rounding_and_templates() {
        let catalog = Catalog::new(vec![Topic::new("HF", "heart failure")]).unwrap();
        let questions = vec![Question::new("a", "Heart failure").with_paper(1).with_marks(10.0)];
        let config = ScoreConfig::default();

        let forecast =
            build_forecast(&FrequencyPredictor, &questions, &catalog, &config, 1, 2026, fixed_time());
        let top = &forecast.high_confidence[0];

        // 1 + 10/15 = 1.6666...
        assert_eq!(top.confidence, 1.667);
        assert_eq!(top.backup_questions.len(), BACKUP_TEMPLATES.len());
        assert_eq!(top.backup_questions[0], "Define and classify heart failure.");
    }

    #[test]
    fn test_write_forecasts_files() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Catalog::new(vec![Topic::new("HF", "heart failure")]).unwrap();
        let questions = vec![Question::new("a", "Heart failure").with_paper(2)];

        let paths = write_forecasts(
            dir.path(),
            &FrequencyPredictor,
            &questions,
            &catalog,
            &ScoreConfig::default(),
            &[1, 2],
            2026,
        )
        .unwrap();

        assert_eq!(paths[1], dir.path().join("predicted_2026_paper2.json"));
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&paths[1]).unwrap()).unwrap();
        assert_eq!(json["paper_id"], 2);
        assert_eq!(json["high_confidence"][0]["topic_id"], "HF");
        assert!(json["generated_at"].is_string());
    }
}

//! Per-year question files.
//!
//! Each year lives in `papers_<year>.json`:
//!
//! ```json
//! { "year": 2024, "paper_id": "all", "questions": [ { "q_id": "...", "raw_text": "...", ... } ] }
//! ```
//!
//! A missing year file is an error. Evaluating a split without its data would
//! silently score it as empty.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{DataError, Result};
use crate::types::Question;

#[derive(Debug, Deserialize)]
struct YearBundle {
    questions: Vec<Question>,
}

/// Path of the question file for `year`.
pub fn year_path(data_dir: &Path, year: i32) -> PathBuf {
    data_dir.join(format!("papers_{}.json", year))
}

/// Load and validate every question of one year.
///
/// Questions without a `year` field inherit the file's year.
pub fn load_year(data_dir: &Path, year: i32) -> Result<Vec<Question>> {
    let path = year_path(data_dir, year);
    if !path.exists() {
        return Err(DataError::MissingInput { path });
    }

    let source_name = path.display().to_string();
    let content = std::fs::read_to_string(&path)?;
    let bundle: YearBundle = serde_json::from_str(&content)
        .map_err(|e| DataError::malformed(&source_name, e.to_string()))?;

    let mut questions = bundle.questions;
    for question in &mut questions {
        question.validate(&source_name)?;
        question.year.get_or_insert(year);
    }

    debug!("loaded {} questions from {}", questions.len(), source_name);
    Ok(questions)
}

/// Questions of several years, loaded once and kept in memory.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    by_year: BTreeMap<i32, Vec<Question>>,
}

impl Corpus {
    /// Load every year in `years`, failing on the first missing or bad file.
    pub fn load(data_dir: &Path, years: &[i32]) -> Result<Self> {
        let mut by_year = BTreeMap::new();
        for &year in years {
            if by_year.contains_key(&year) {
                continue;
            }
            by_year.insert(year, load_year(data_dir, year)?);
        }

        let corpus = Self { by_year };
        info!(
            "loaded {} questions across {} years from {}",
            corpus.len(),
            corpus.by_year.len(),
            data_dir.display()
        );
        Ok(corpus)
    }

    /// Build from questions already in memory, grouped by their `year`.
    /// Questions without a year are dropped.
    pub fn from_questions(questions: impl IntoIterator<Item = Question>) -> Self {
        let mut by_year: BTreeMap<i32, Vec<Question>> = BTreeMap::new();
        for question in questions {
            if let Some(year) = question.year {
                by_year.entry(year).or_default().push(question);
            }
        }
        Self { by_year }
    }

    /// Questions of `year`, or an error if that year was never loaded.
    pub fn year(&self, year: i32) -> Result<&[Question]> {
        self.by_year
            .get(&year)
            .map(Vec::as_slice)
            .ok_or_else(|| DataError::MissingInput {
                path: PathBuf::from(format!("papers_{}.json", year)),
            })
    }

    /// Questions of several years concatenated in the given order.
    pub fn questions_for(&self, years: &[i32]) -> Result<Vec<Question>> {
        let mut questions = Vec::new();
        for &year in years {
            questions.extend_from_slice(self.year(year)?);
        }
        Ok(questions)
    }

    /// Every question, oldest year first.
    pub fn all_questions(&self) -> impl Iterator<Item = &Question> {
        self.by_year.values().flatten()
    }

    pub fn years(&self) -> Vec<i32> {
        self.by_year.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.by_year.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_year(dir: &Path, year: i32, body: &str) {
        std::fs::write(year_path(dir, year), body).unwrap();
    }

    #[test]
    fn test_load_year_fills_missing_year() {
        let dir = tempfile::tempdir().unwrap();
        write_year(
            dir.path(),
            2023,
            r#"{"year": 2023, "paper_id": "all", "questions": [
                {"q_id": "a", "raw_text": "Heart failure", "paper_id": 1, "marks": 10},
                {"q_id": "b", "raw_text": "Gout", "year": 2023, "paper_id": 2, "marks": null}
            ]}"#,
        );

        let questions = load_year(dir.path(), 2023).unwrap();
        assert_eq!(questions.len(), 2);
        assert!(questions.iter().all(|q| q.year == Some(2023)));
        assert_eq!(questions[0].marks, Some(10.0));
    }

    #[test]
    fn test_missing_year_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let err = Corpus::load(dir.path(), &[2022]).unwrap_err();
        assert!(matches!(err, DataError::MissingInput { .. }));
    }

    #[test]
    fn test_record_without_text_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        write_year(dir.path(), 2022, r#"{"questions": [{"q_id": "a"}]}"#);
        assert!(matches!(
            load_year(dir.path(), 2022),
            Err(DataError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn test_empty_text_does_not_abort_year() {
        let dir = tempfile::tempdir().unwrap();
        write_year(
            dir.path(),
            2022,
            r#"{"questions": [{"q_id": "a", "raw_text": ""}, {"q_id": "b", "raw_text": "Gout"}]}"#,
        );

        let questions = load_year(dir.path(), 2022).unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].text, "");
    }

    #[test]
    fn test_corpus_questions_for_years() {
        let corpus = Corpus::from_questions(vec![
            Question::new("a", "x").with_year(2022),
            Question::new("b", "y").with_year(2023),
            Question::new("c", "z").with_year(2022),
            Question::new("orphan", "w"),
        ]);
        assert_eq!(corpus.years(), vec![2022, 2023]);
        assert_eq!(corpus.len(), 3);

        let train = corpus.questions_for(&[2022, 2023]).unwrap();
        let ids: Vec<_> = train.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c", "b"]);

        assert!(corpus.questions_for(&[2030]).is_err());
    }
}

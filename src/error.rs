//! Error types for examcast.
//!
//! Loading is where things fail: a year file that is missing, a record without
//! an id, a hierarchy that loops. Matching, scoring and metrics are pure and
//! never return errors; degenerate inputs (empty gold set, empty ranking,
//! `k == 0`) score 0 instead.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating input data.
#[derive(Debug, Error)]
pub enum DataError {
    /// A required input file does not exist.
    #[error("missing input: {}", path.display())]
    MissingInput { path: PathBuf },

    /// A record is missing a required field or cannot be parsed.
    #[error("malformed record in {source_name}: {detail}")]
    MalformedRecord { source_name: String, detail: String },

    /// Parent links loop back on themselves.
    #[error("topic hierarchy contains a cycle through '{topic_id}'")]
    CyclicHierarchy { topic_id: String },

    /// Weight configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DataError {
    pub fn malformed(source_name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::MalformedRecord {
            source_name: source_name.into(),
            detail: detail.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_input_message() {
        let err = DataError::MissingInput {
            path: PathBuf::from("data/papers_2024.json"),
        };
        assert_eq!(err.to_string(), "missing input: data/papers_2024.json");
    }

    #[test]
    fn test_malformed_helper() {
        let err = DataError::malformed("papers_2023.json", "question 4 has no q_id");
        assert!(matches!(err, DataError::MalformedRecord { .. }));
        assert!(err.to_string().contains("question 4 has no q_id"));
    }
}

//! Ranking - from historical questions to a scored topic list.
//!
//! The predictor combines:
//! - Topic frequency (pre-tagged or catalog-matched candidates)
//! - Exam marks as a per-question multiplier
//! - Propagation of each vote to the topic's parent

mod predictor;

pub use predictor::{
    FrequencyPredictor, ResolvedQuestion, TopicPredictor, FULL_MARKS, MATCHED_CANDIDATES,
};

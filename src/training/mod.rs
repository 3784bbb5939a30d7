//! Evaluation and tuning.
//!
//! 1. Splitting the corpus into rolling train/test years
//! 2. Defining quality metrics (recall, precision, MAP, NDCG at k)
//! 3. Scoring a weight configuration across all splits
//! 4. Searching the weight grid with early stopping
//!
//! ## Gold Sets
//!
//! A test question's gold topics are its manual labels when the label file
//! has them, and its top catalog matches otherwise. They are resolved once
//! per run, before any configuration is scored.

pub mod evaluate;
pub mod gridsearch;
pub mod metrics;
pub mod splits;
pub mod tuner;

pub use evaluate::{EvalReport, PreparedSplit, RollingEvaluator, SplitResult, UNKNOWN_PAPER};
pub use gridsearch::{sample_points, ParameterGrid, SearchStrategy};
pub use metrics::{average_precision_at_k, ndcg_at_k, precision_at_k, recall_at_k, Metrics};
pub use splits::{rolling_splits, temporal_split, Split};
pub use tuner::{search, AutoTuner, TuneOutcome, TuneResult, TuneSettings};

//! examcast - exam topic forecasting
//!
//! Ranks syllabus topics by how likely they are to appear in an upcoming
//! exam, from past papers, and measures that ranking against held-out years.
//!
//! # Architecture
//!
//! ```text
//! Year files → Catalog matching → Predictor → Metrics → Tuner → Reports / Forecasts
//!     ↓              ↓                ↓          ↓        ↓            ↓
//!   serde       regex set +       weighted   rolling    grid +     markdown,
//!   json         petgraph         frequency   splits    early       JSON
//!                hierarchy                  (rayon)     stop
//! ```

pub mod config;
pub mod corpus;
pub mod error;
pub mod ontology;
pub mod ranking;
pub mod rendering;
pub mod training;
pub mod types;

pub use config::{load_score_config, save_score_config, Config};
pub use error::{DataError, Result};
pub use ontology::{Catalog, Topic};
pub use ranking::{FrequencyPredictor, TopicPredictor};
pub use types::{Question, RankedPrediction, ScoreConfig, TopicScore};

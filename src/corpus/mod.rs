//! Question corpus and labels.
//!
//! - `loader`: per-year question files and the in-memory `Corpus`
//! - `labels`: manual gold labels, catalog-derived fallbacks, suggestion export

mod labels;
mod loader;

pub use labels::{
    auto_label, export_suggestions, gold_for, load_gold_labels, GoldLabels, AUTO_LABEL_TOPICS,
};
pub use loader::{load_year, year_path, Corpus};

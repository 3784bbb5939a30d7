//! Topic ontology - the canonical catalog and the text matcher.
//!
//! - `normalize`: the single text normalization shared by terms and questions
//! - `catalog`: topics, single-parent hierarchy, compiled term patterns

mod catalog;
mod normalize;

pub use catalog::{Catalog, Topic};
pub use normalize::{normalize_text, word_count};

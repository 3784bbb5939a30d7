//! Topic catalog and term matching.
//!
//! The catalog owns every topic in seed order, an id lookup table, and one
//! compiled word-boundary pattern per normalized name/synonym term. All terms
//! go into a single `RegexSet`, so matching a question is one pass over its
//! normalized text:
//!
//! ```text
//! text ──normalize──▶ "management of acute mi"
//!                         │ RegexSet
//!                         ▼
//!          matched terms: "acute mi" (T3, 2 words), "mi" (T3, 1 word)
//!                         │ max per topic of min(1, 0.2 + 0.2 × words)
//!                         ▼
//!                     [("T3", 0.6)]
//! ```
//!
//! The hierarchy is single-parent: each topic stores its parent's id and the
//! catalog resolves it through the lookup table. Duplicate ids and parent
//! cycles are rejected at build time. A parent id that names no topic is
//! dropped with a warning.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use regex::{RegexSet, RegexSetBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::normalize::{normalize_text, word_count};
use crate::error::{DataError, Result};

/// Compiled term automata can get large with Unicode word boundaries.
const REGEX_SIZE_LIMIT: usize = 256 * (1 << 20);

/// Base score of a one-word match; each extra word adds the same again.
const TERM_SCORE_STEP: f64 = 0.2;

/// A canonical topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub parent_name: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
}

impl Topic {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            synonyms: Vec::new(),
            parent_id: None,
            parent_name: None,
            domain: None,
        }
    }

    pub fn with_synonyms<I, S>(mut self, synonyms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.synonyms = synonyms.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }
}

/// Topic record as stored in the seed file.
#[derive(Debug, Deserialize)]
struct SeedRecord {
    topic_id: String,
    name: String,
    #[serde(default)]
    synonyms: Vec<String>,
    #[serde(default)]
    parent_id: Option<String>,
    #[serde(default)]
    parent_name: Option<String>,
    #[serde(default)]
    domain: Option<String>,
    /// Pre-normalized form of the name; treated as one more synonym.
    #[serde(default)]
    term_norm: Option<String>,
}

impl SeedRecord {
    fn into_topic(self) -> Topic {
        let mut synonyms = self.synonyms;
        if let Some(term) = self.term_norm.filter(|t| !t.trim().is_empty()) {
            if !synonyms.contains(&term) {
                synonyms.push(term);
            }
        }
        Topic {
            id: self.topic_id,
            name: self.name,
            synonyms,
            parent_id: self.parent_id.filter(|p| !p.trim().is_empty()),
            parent_name: self.parent_name,
            domain: self.domain,
        }
    }
}

/// One normalized term and the topic it belongs to.
#[derive(Debug, Clone)]
struct CompiledTerm {
    topic: usize,
    term: String,
    score: f64,
}

/// The topic catalog with its compiled match patterns.
#[derive(Debug, Clone)]
pub struct Catalog {
    topics: Vec<Topic>,
    index: HashMap<String, usize>,
    terms: Vec<CompiledTerm>,
    matcher: RegexSet,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            topics: Vec::new(),
            index: HashMap::new(),
            terms: Vec::new(),
            matcher: RegexSet::empty(),
        }
    }
}

impl Catalog {
    /// Load the catalog from a JSON seed file.
    ///
    /// An absent seed is not an error: matching then finds nothing and the
    /// predictor relies on pre-tagged questions only.
    pub fn from_seed(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!("topic seed {} not found, using an empty catalog", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let source_name = path.display().to_string();
        let records: Vec<SeedRecord> = serde_json::from_str(&content)
            .map_err(|e| DataError::malformed(&source_name, e.to_string()))?;

        let catalog = Self::new(records.into_iter().map(SeedRecord::into_topic))?;
        info!(
            "loaded {} topics ({} match terms) from {}",
            catalog.len(),
            catalog.terms.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Build a catalog from topics, validating ids and the parent hierarchy.
    pub fn new(topics: impl IntoIterator<Item = Topic>) -> Result<Self> {
        let mut topics: Vec<Topic> = topics.into_iter().collect();

        let mut index = HashMap::with_capacity(topics.len());
        for (i, topic) in topics.iter().enumerate() {
            if topic.id.trim().is_empty() {
                return Err(DataError::malformed("topic catalog", format!("topic #{} has empty id", i)));
            }
            if topic.name.trim().is_empty() {
                return Err(DataError::malformed(
                    "topic catalog",
                    format!("topic '{}' has empty name", topic.id),
                ));
            }
            if index.insert(topic.id.clone(), i).is_some() {
                return Err(DataError::malformed(
                    "topic catalog",
                    format!("duplicate topic id '{}'", topic.id),
                ));
            }
        }

        for topic in &mut topics {
            if let Some(parent) = &topic.parent_id {
                if !index.contains_key(parent) {
                    warn!("topic '{}' names unknown parent '{}', dropping link", topic.id, parent);
                    topic.parent_id = None;
                }
            }
        }

        check_acyclic(&topics, &index)?;

        let terms = compile_terms(&topics);
        // Terms and text are both lower-cased by normalization; the set is
        // case-sensitive.
        let matcher = RegexSetBuilder::new(terms.iter().map(|t| term_pattern(&t.term)))
            .size_limit(REGEX_SIZE_LIMIT)
            .build()
            .map_err(|e| DataError::malformed("topic catalog", format!("term patterns: {}", e)))?;

        debug!("compiled {} terms for {} topics", terms.len(), topics.len());

        Ok(Self {
            topics,
            index,
            terms,
            matcher,
        })
    }

    /// Match free text against the catalog.
    ///
    /// Returns at most `max_topics` `(topic_id, score)` pairs, best first. A
    /// topic scores the best of its matching terms, where a term of `n` words
    /// is worth `min(1.0, 0.2 + 0.2n)`. Equal scores keep catalog order.
    pub fn match_topics(&self, text: &str, max_topics: usize) -> Vec<(String, f64)> {
        if self.terms.is_empty() || max_topics == 0 {
            return Vec::new();
        }

        let normalized = normalize_text(text);
        if normalized.is_empty() {
            return Vec::new();
        }

        let mut best = vec![0.0_f64; self.topics.len()];
        for term_idx in self.matcher.matches(&normalized).iter() {
            let term = &self.terms[term_idx];
            best[term.topic] = best[term.topic].max(term.score);
        }

        let mut scores: Vec<(String, f64)> = best
            .into_iter()
            .enumerate()
            .filter(|(_, score)| *score > 0.0)
            .map(|(i, score)| (self.topics[i].id.clone(), score))
            .collect();

        scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scores.truncate(max_topics);
        scores
    }

    /// Parent of `topic_id`, as a list (empty for roots and unknown ids).
    pub fn related_topics(&self, topic_id: &str) -> Vec<String> {
        self.parent_of(topic_id)
            .map(|p| vec![p.to_string()])
            .unwrap_or_default()
    }

    pub fn parent_of(&self, topic_id: &str) -> Option<&str> {
        self.get(topic_id).and_then(|t| t.parent_id.as_deref())
    }

    pub fn get(&self, topic_id: &str) -> Option<&Topic> {
        self.index.get(topic_id).map(|&i| &self.topics[i])
    }

    /// Human-readable name, falling back to the id for unknown topics.
    pub fn display_name<'a>(&'a self, topic_id: &'a str) -> &'a str {
        self.get(topic_id).map(|t| t.name.as_str()).unwrap_or(topic_id)
    }

    /// Normalized match terms of a topic.
    pub fn terms_for(&self, topic_id: &str) -> Vec<&str> {
        match self.index.get(topic_id) {
            Some(&i) => self
                .terms
                .iter()
                .filter(|t| t.topic == i)
                .map(|t| t.term.as_str())
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

/// Normalize and de-duplicate each topic's name and synonyms.
fn compile_terms(topics: &[Topic]) -> Vec<CompiledTerm> {
    let mut terms = Vec::new();
    for (i, topic) in topics.iter().enumerate() {
        let mut seen = HashSet::new();
        for raw in std::iter::once(&topic.name).chain(topic.synonyms.iter()) {
            let term = normalize_text(raw);
            if term.is_empty() || !seen.insert(term.clone()) {
                continue;
            }
            let score = (TERM_SCORE_STEP + TERM_SCORE_STEP * word_count(&term) as f64).min(1.0);
            terms.push(CompiledTerm { topic: i, term, score });
        }
    }
    terms
}

fn term_pattern(term: &str) -> String {
    format!(r"\b{}\b", regex::escape(term))
}

/// Reject parent links that loop, including a topic that is its own parent.
fn check_acyclic(topics: &[Topic], index: &HashMap<String, usize>) -> Result<()> {
    let mut graph: DiGraph<usize, ()> = DiGraph::with_capacity(topics.len(), topics.len());
    let nodes: Vec<NodeIndex> = (0..topics.len()).map(|i| graph.add_node(i)).collect();

    for (i, topic) in topics.iter().enumerate() {
        if let Some(&parent) = topic.parent_id.as_ref().and_then(|p| index.get(p)) {
            graph.add_edge(nodes[i], nodes[parent], ());
        }
    }

    toposort(&graph, None).map(|_| ()).map_err(|cycle| DataError::CyclicHierarchy {
        topic_id: topics[graph[cycle.node_id()]].id.clone(),
    })
}

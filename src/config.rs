//! Configuration loading from examcast.toml, plus the stored best weights.
//!
//! Project settings live in `examcast.toml`, found in the working directory or
//! any parent (like ruff finding pyproject.toml). Every key is optional:
//!
//! ```toml
//! data-dir = "data"
//! reports-dir = "reports"
//! predictions-dir = "predictions"
//! best-config = "configs/best_config.toml"
//! years = [2022, 2023, 2024, 2025]
//! papers = [1, 2, 3, 4]
//! k = 40
//! epsilon = 0.001
//! max-rounds = 12
//! seed = 42
//! forecast-year = 2026
//! ```
//!
//! Relative paths resolve against the directory holding the file.
//!
//! The tuned weights are a separate, flat document written by the tuner:
//!
//! ```toml
//! recency_weight = 0.8
//! marks_weight = 1.2
//! frequency_weight = 1.0
//! graph_weight = 0.2
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{DataError, Result};
use crate::types::ScoreConfig;

pub const CONFIG_FILE: &str = "examcast.toml";

/// Run settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// File these settings came from (for display).
    pub source: Option<PathBuf>,
    pub data_dir: PathBuf,
    pub reports_dir: PathBuf,
    pub predictions_dir: PathBuf,
    pub best_config: PathBuf,
    /// Years with question files, evaluated as rolling splits.
    pub years: Vec<i32>,
    /// Papers that get a forecast file.
    pub papers: Vec<u32>,
    /// Ranking cutoff for metrics.
    pub k: usize,
    /// Recall distance treated as a plateau by the tuner.
    pub epsilon: f64,
    /// Non-improving trials before the tuner stops.
    pub max_rounds: usize,
    /// Seed for random search.
    pub seed: u64,
    /// Year written into forecast file names.
    pub forecast_year: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: None,
            data_dir: PathBuf::from("data"),
            reports_dir: PathBuf::from("reports"),
            predictions_dir: PathBuf::from("predictions"),
            best_config: PathBuf::from("configs/best_config.toml"),
            years: vec![2022, 2023, 2024, 2025],
            papers: vec![1, 2, 3, 4],
            k: 40,
            epsilon: 0.001,
            max_rounds: 12,
            seed: 42,
            forecast_year: 2026,
        }
    }
}

/// Raw config as deserialized from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawConfig {
    data_dir: Option<String>,
    reports_dir: Option<String>,
    predictions_dir: Option<String>,
    best_config: Option<String>,
    years: Option<Vec<i32>>,
    papers: Option<Vec<u32>>,
    k: Option<usize>,
    epsilon: Option<f64>,
    max_rounds: Option<usize>,
    seed: Option<u64>,
    forecast_year: Option<i32>,
}

impl Config {
    /// Load configuration for `directory`.
    ///
    /// Search order:
    /// 1. examcast.toml in directory
    /// 2. examcast.toml in each parent, nearest first
    /// 3. Defaults rooted at `directory`
    pub fn load(directory: &Path) -> Result<Self> {
        for dir in directory.ancestors() {
            let candidate = dir.join(CONFIG_FILE);
            if candidate.is_file() {
                info!("using config {}", candidate.display());
                return Self::from_file(&candidate);
            }
        }

        debug!("no {} above {}, using defaults", CONFIG_FILE, directory.display());
        Ok(Self::default().rooted_at(directory))
    }

    /// Parse one config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let raw: RawConfig = toml::from_str(&content)
            .map_err(|e| DataError::InvalidConfig(format!("{}: {}", path.display(), e)))?;

        let root = path.parent().unwrap_or(Path::new("."));
        let config = Self::from_raw(raw, path.to_path_buf()).rooted_at(root);
        config.validate()?;
        Ok(config)
    }

    fn from_raw(raw: RawConfig, source: PathBuf) -> Self {
        let defaults = Self::default();
        Self {
            source: Some(source),
            data_dir: raw.data_dir.map(PathBuf::from).unwrap_or(defaults.data_dir),
            reports_dir: raw.reports_dir.map(PathBuf::from).unwrap_or(defaults.reports_dir),
            predictions_dir: raw
                .predictions_dir
                .map(PathBuf::from)
                .unwrap_or(defaults.predictions_dir),
            best_config: raw.best_config.map(PathBuf::from).unwrap_or(defaults.best_config),
            years: raw.years.unwrap_or(defaults.years),
            papers: raw.papers.unwrap_or(defaults.papers),
            k: raw.k.unwrap_or(defaults.k),
            epsilon: raw.epsilon.unwrap_or(defaults.epsilon),
            max_rounds: raw.max_rounds.unwrap_or(defaults.max_rounds),
            seed: raw.seed.unwrap_or(defaults.seed),
            forecast_year: raw.forecast_year.unwrap_or(defaults.forecast_year),
        }
    }

    /// Resolve relative directories against `root`.
    pub fn rooted_at(mut self, root: &Path) -> Self {
        for path in [
            &mut self.data_dir,
            &mut self.reports_dir,
            &mut self.predictions_dir,
            &mut self.best_config,
        ] {
            if path.is_relative() {
                *path = root.join(&*path);
            }
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(DataError::InvalidConfig(format!(
                "epsilon must be a non-negative number, got {}",
                self.epsilon
            )));
        }
        if self.max_rounds == 0 {
            return Err(DataError::InvalidConfig("max-rounds must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn seed_path(&self) -> PathBuf {
        self.data_dir.join("topic_ontology_seed.json")
    }

    pub fn gold_labels_path(&self) -> PathBuf {
        self.data_dir.join("gold_labels.csv")
    }

    pub fn suggestions_path(&self) -> PathBuf {
        self.data_dir.join("auto_label_suggestions.csv")
    }

    /// Format config for verbose display.
    pub fn display_summary(&self) -> String {
        let mut lines = Vec::new();

        match &self.source {
            Some(source) => lines.push(format!("   Config: {}", source.display())),
            None => lines.push("   Config: (defaults)".to_string()),
        }
        lines.push(format!("   Data: {}", self.data_dir.display()));

        let years: Vec<_> = self.years.iter().map(|y| y.to_string()).collect();
        lines.push(format!("   Years: {}", years.join(", ")));
        lines.push(format!(
            "   k = {}, epsilon = {}, max rounds = {}",
            self.k, self.epsilon, self.max_rounds
        ));

        lines.join("\n")
    }
}

/// Write `config` as a flat TOML document, creating parent directories.
pub fn save_score_config(path: &Path, config: &ScoreConfig) -> Result<()> {
    config.validate()?;
    let body = toml::to_string(config).map_err(|e| DataError::InvalidConfig(e.to_string()))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, body)?;
    Ok(())
}

/// Read stored weights. An absent file yields the defaults; missing keys take
/// their default values.
pub fn load_score_config(path: &Path) -> Result<ScoreConfig> {
    if !path.exists() {
        debug!("no stored weights at {}, using defaults", path.display());
        return Ok(ScoreConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: ScoreConfig = toml::from_str(&content)
        .map_err(|e| DataError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
    config.validate()?;
    Ok(config)
}

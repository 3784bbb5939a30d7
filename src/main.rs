//! examcast CLI - exam topic forecasting
//!
//! Orchestrates the pipeline over a data directory of per-year papers:
//!
//! 1. Load: topic catalog, year files, manual gold labels
//! 2. Evaluate: default weights over rolling year splits
//! 3. Tune: grid search over weights with early stopping
//! 4. Label: catalog-matched topic suggestions for manual review
//! 5. Predict: per-paper forecasts with the tuned weights
//!
//! Logs go to stderr through tracing; summaries go to stdout.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use examcast::config::{load_score_config, Config};
use examcast::corpus::{
    auto_label, export_suggestions, load_gold_labels, Corpus, GoldLabels, AUTO_LABEL_TOPICS,
};
use examcast::ontology::Catalog;
use examcast::ranking::FrequencyPredictor;
use examcast::rendering::{
    eval_summary, tune_summary, write_baseline_report, write_forecasts, write_tuning_reports, Paint,
};
use examcast::training::{
    AutoTuner, EvalReport, Metrics, ParameterGrid, RollingEvaluator, SearchStrategy, TuneSettings,
};
use examcast::types::{Question, ScoreConfig};

/// Forecast exam topics from past papers
///
/// Reads `papers_<year>.json` files and `topic_ontology_seed.json` from the
/// data directory. Settings come from the nearest examcast.toml; flags
/// override it.
///
/// Examples:
///   examcast run                    # Full pipeline
///   examcast evaluate --k 20        # Baseline metrics at k = 20
///   examcast tune --random 20       # 20 random grid points
///   examcast predict --year 2027    # Forecast files for 2027
#[derive(Parser, Debug)]
#[command(name = "examcast")]
#[command(version)]
#[command(about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Project root directory
    ///
    /// Where examcast.toml is looked up (then its parents).
    #[arg(short, long, default_value = ".", global = true)]
    pub root: PathBuf,

    /// Data directory (overrides the config file)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Ranking cutoff for metrics (overrides the config file)
    #[arg(short, long, global = true)]
    pub k: Option<usize>,

    /// Verbose output
    ///
    /// Enables debug logging (per-trial tuner progress, split sizes).
    /// RUST_LOG takes precedence when set.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Score the default weights over rolling splits
    Evaluate,

    /// Search the weight grid and store the best configuration
    Tune {
        /// Try N random grid points instead of the full grid
        #[arg(long, value_name = "N")]
        random: Option<usize>,

        /// Non-improving trials before stopping
        #[arg(long)]
        max_rounds: Option<usize>,

        /// Recall distance treated as a plateau
        #[arg(long)]
        epsilon: Option<f64>,
    },

    /// Write catalog-matched topic suggestions for every question
    Label,

    /// Write per-paper forecasts using the stored weights
    Predict {
        /// Forecast year (overrides the config file)
        #[arg(long)]
        year: Option<i32>,
    },

    /// Evaluate, tune, label and predict in one go
    Run,
}

/// Everything loaded from the data directory.
struct Inputs {
    catalog: Catalog,
    corpus: Corpus,
    labels: GoldLabels,
}

impl Inputs {
    fn load(config: &Config) -> Result<Self> {
        let catalog = Catalog::from_seed(&config.seed_path())
            .with_context(|| format!("loading catalog from {}", config.seed_path().display()))?;
        let corpus = Corpus::load(&config.data_dir, &config.years)
            .with_context(|| format!("loading papers from {}", config.data_dir.display()))?;
        let labels = load_gold_labels(&config.gold_labels_path())
            .context("loading gold labels")?;

        info!(
            "{} topics, {} questions over {} years",
            catalog.len(),
            corpus.len(),
            config.years.len()
        );
        Ok(Self {
            catalog,
            corpus,
            labels,
        })
    }

    fn evaluator(&self, config: &Config) -> Result<RollingEvaluator<'_>> {
        RollingEvaluator::prepare(&self.corpus, &self.catalog, &self.labels, &config.years, config.k)
            .context("preparing rolling splits")
    }

    fn all_questions(&self) -> Vec<Question> {
        self.corpus.all_questions().cloned().collect()
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let root = cli
        .root
        .canonicalize()
        .with_context(|| format!("failed to resolve root path '{}'", cli.root.display()))?;
    let config = resolve_config(&cli, &root)?;
    if cli.verbose {
        eprintln!("{}", config.display_summary());
    }

    let inputs = Inputs::load(&config)?;

    match &cli.command {
        Command::Evaluate => {
            run_evaluate(&inputs.evaluator(&config)?, &config)?;
        }
        Command::Tune {
            random,
            max_rounds,
            epsilon,
        } => {
            let mut config = config.clone();
            config.max_rounds = max_rounds.unwrap_or(config.max_rounds);
            config.epsilon = epsilon.unwrap_or(config.epsilon);
            config.validate()?;

            let evaluator = inputs.evaluator(&config)?;
            let baseline = evaluator
                .evaluate(&FrequencyPredictor, &ScoreConfig::default())
                .overall;
            run_tune(&evaluator, &config, &baseline, *random)?;
        }
        Command::Label => run_label(&inputs, &config)?,
        Command::Predict { year } => {
            let mut config = config.clone();
            config.forecast_year = year.unwrap_or(config.forecast_year);
            run_predict(&inputs, &config)?;
        }
        Command::Run => {
            let evaluator = inputs.evaluator(&config)?;
            let baseline = run_evaluate(&evaluator, &config)?;
            run_tune(&evaluator, &config, &baseline.overall, None)?;
            run_label(&inputs, &config)?;
            run_predict(&inputs, &config)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "examcast=debug,info" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .init();
}

/// Config file values with command-line overrides applied.
fn resolve_config(cli: &Cli, root: &Path) -> Result<Config> {
    let mut config = Config::load(root).context("loading examcast.toml")?;

    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = if data_dir.is_absolute() {
            data_dir.clone()
        } else {
            root.join(data_dir)
        };
    }
    if let Some(k) = cli.k {
        config.k = k;
    }
    Ok(config)
}

fn run_evaluate(evaluator: &RollingEvaluator<'_>, config: &Config) -> Result<EvalReport> {
    let report = evaluator.evaluate(&FrequencyPredictor, &ScoreConfig::default());

    println!("{}", eval_summary("Baseline", &report));
    let path = write_baseline_report(&config.reports_dir, &report)
        .context("writing baseline report")?;
    println!("{}", Paint::dim(&format!("  report: {}", path.display())));
    Ok(report)
}

fn run_tune(
    evaluator: &RollingEvaluator<'_>,
    config: &Config,
    baseline: &Metrics,
    random: Option<usize>,
) -> Result<()> {
    let settings = TuneSettings {
        max_rounds: config.max_rounds,
        epsilon: config.epsilon,
        grid: ParameterGrid::default(),
        strategy: match random {
            Some(samples) => SearchStrategy::Random { samples },
            None => SearchStrategy::Grid,
        },
        seed: config.seed,
        best_config_path: Some(config.best_config.clone()),
    };

    let outcome = AutoTuner::new(evaluator, FrequencyPredictor)
        .tune(&settings)
        .context("tuning weights")?;

    println!("{}", tune_summary(&outcome));
    let paths = write_tuning_reports(&config.reports_dir, &outcome, baseline, &config.years)
        .context("writing tuning reports")?;
    for path in paths {
        println!("{}", Paint::dim(&format!("  report: {}", path.display())));
    }
    Ok(())
}

fn run_label(inputs: &Inputs, config: &Config) -> Result<()> {
    let questions = inputs.all_questions();
    let suggestions = auto_label(&questions, &inputs.catalog, AUTO_LABEL_TOPICS);
    let unmatched = suggestions.iter().filter(|(_, topics)| topics.is_empty()).count();

    let path = config.suggestions_path();
    export_suggestions(&path, &suggestions).context("writing label suggestions")?;
    println!(
        "{} {} questions labelled, {} without a match -> {}",
        Paint::header("Labels"),
        suggestions.len(),
        unmatched,
        path.display()
    );
    Ok(())
}

fn run_predict(inputs: &Inputs, config: &Config) -> Result<()> {
    let weights = load_score_config(&config.best_config)
        .with_context(|| format!("reading {}", config.best_config.display()))?;

    let paths = write_forecasts(
        &config.predictions_dir,
        &FrequencyPredictor,
        &inputs.all_questions(),
        &inputs.catalog,
        &weights,
        &config.papers,
        config.forecast_year,
    )
    .context("writing forecasts")?;

    println!("{}", Paint::header("Forecasts"));
    for path in paths {
        println!("  {}", path.display());
    }
    Ok(())
}

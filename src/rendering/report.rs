//! Markdown reports: baseline evaluation, tuning history, model card.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::Result;
use crate::training::{EvalReport, Metrics, TuneOutcome, UNKNOWN_PAPER};

pub const BASELINE_REPORT: &str = "baseline_report.md";
pub const TUNING_REPORT: &str = "tuning_report.md";
pub const MODEL_CARD: &str = "final_model_card.md";

/// Markdown table with one row per labelled metrics set.
pub fn metrics_table<'a, I>(rows: I) -> String
where
    I: IntoIterator<Item = (String, &'a Metrics)>,
{
    let mut lines = vec![
        "| Split | Recall@K | Precision@K | MAP@K | NDCG@K |".to_string(),
        "| --- | --- | --- | --- | --- |".to_string(),
    ];
    for (label, m) in rows {
        lines.push(format!(
            "| {} | {:.3} | {:.3} | {:.3} | {:.3} |",
            label, m.recall_at_k, m.precision_at_k, m.map_at_k, m.ndcg_at_k
        ));
    }
    lines.join("\n")
}

fn paper_label(paper: u32) -> String {
    if paper == UNKNOWN_PAPER {
        "Unassigned".to_string()
    } else {
        format!("Paper {}", paper)
    }
}

pub fn baseline_report(report: &EvalReport) -> String {
    let mut out = String::from("# Baseline Report\n\n");
    out.push_str(&metrics_table(
        report.splits.iter().map(|s| (s.name.clone(), &s.metrics)),
    ));
    out.push_str("\n\n## Per-Paper Metrics\n\n");

    for split in &report.splits {
        out.push_str(&format!("### {}\n\n", split.name));
        out.push_str(&metrics_table(
            split.per_paper.iter().map(|(paper, m)| (paper_label(*paper), m)),
        ));
        out.push_str("\n\n");
    }
    out
}

pub fn tuning_report(outcome: &TuneOutcome) -> Result<String> {
    let mut lines = vec!["# Tuning Report".to_string(), String::new(), "## All Runs".to_string()];
    lines.push(metrics_table(
        outcome.history.iter().map(|r| (r.label(), &r.metrics)),
    ));

    if outcome.stopped_early {
        lines.push(String::new());
        lines.push(format!(
            "Stopped early after {} trials ({} without improvement).",
            outcome.history.len(),
            outcome.rounds_without_improvement
        ));
    }

    lines.push("\n## Best Configuration".to_string());
    let best = match &outcome.best {
        Some(best) => serde_json::to_string_pretty(&best.config).map_err(std::io::Error::from)?,
        None => "{}".to_string(),
    };
    lines.push(best);
    Ok(lines.join("\n"))
}

/// Summary card for the tuned model. `metrics` is the best trial's score, or
/// the baseline when tuning produced nothing.
pub fn model_card(metrics: &Metrics, years: &[i32]) -> String {
    let span = match (years.iter().min(), years.iter().max()) {
        (Some(first), Some(last)) => format!(" ({}-{})", first, last),
        _ => String::new(),
    };

    [
        "# Final Model Card".to_string(),
        String::new(),
        "## Purpose".to_string(),
        "Topic-level predictor for exam papers using topic frequency and ontology boosts."
            .to_string(),
        String::new(),
        format!("## Metrics (Rolling{})", span),
        metrics_table([("macro".to_string(), metrics)]),
        String::new(),
        "## Limitations".to_string(),
        "- Relies on auto-matched topics where manual gold labels are missing.".to_string(),
        "- Topic canonicalization uses exact term matching and may miss paraphrases.".to_string(),
    ]
    .join("\n")
}

fn write(dir: &Path, name: &str, body: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(name);
    std::fs::write(&path, body)?;
    info!("wrote {}", path.display());
    Ok(path)
}

pub fn write_baseline_report(dir: &Path, report: &EvalReport) -> Result<PathBuf> {
    write(dir, BASELINE_REPORT, &baseline_report(report))
}

/// Write the tuning report and model card.
pub fn write_tuning_reports(
    dir: &Path,
    outcome: &TuneOutcome,
    baseline: &Metrics,
    years: &[i32],
) -> Result<Vec<PathBuf>> {
    let best_metrics = outcome.best.as_ref().map(|b| &b.metrics).unwrap_or(baseline);
    Ok(vec![
        write(dir, TUNING_REPORT, &tuning_report(outcome)?)?,
        write(dir, MODEL_CARD, &model_card(best_metrics, years))?,
    ])
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::training::{Split, SplitResult, TuneResult};
    use crate::types::ScoreConfig;

    fn metrics(recall: f64) -> Metrics {
        Metrics {
            recall_at_k: recall,
            precision_at_k: 0.25,
            map_at_k: 0.5,
            ndcg_at_k: 0.125,
        }
    }

    fn eval_report() -> EvalReport {
        let mut per_paper = BTreeMap::new();
        per_paper.insert(1, metrics(1.0));
        per_paper.insert(UNKNOWN_PAPER, metrics(0.0));

        let split = Split {
            train_years: vec![2022],
            test_year: 2023,
        };
        EvalReport {
            splits: vec![SplitResult {
                name: split.name(),
                split,
                metrics: metrics(0.5),
                per_paper,
                n_test_questions: 4,
            }],
            overall: metrics(0.5),
        }
    }

    #[test]
    fn test_metrics_table_format() {
        let m = metrics(0.5);
        let table = metrics_table([("macro".to_string(), &m)]);
        let lines: Vec<_> = table.lines().collect();

        assert_eq!(lines[0], "| Split | Recall@K | Precision@K | MAP@K | NDCG@K |");
        assert_eq!(lines[2], "| macro | 0.500 | 0.250 | 0.500 | 0.125 |");
    }

    #[test]
    fn test_baseline_report_sections() {
        let text = baseline_report(&eval_report());

        assert!(text.starts_with("# Baseline Report"));
        assert!(text.contains("| train_2022_test_2023 | 0.500 |"));
        assert!(text.contains("### train_2022_test_2023"));
        assert!(text.contains("| Paper 1 | 1.000 |"));
        assert!(text.contains("| Unassigned | 0.000 |"));
    }

    #[test]
    fn test_tuning_report_lists_trials_and_best() {
        let best = TuneResult {
            trial: 2,
            config: ScoreConfig::new(0.8, 1.0, 1.2, 0.05),
            metrics: metrics(0.75),
        };
        let outcome = TuneOutcome {
            history: vec![
                TuneResult {
                    trial: 1,
                    config: ScoreConfig::default(),
                    metrics: metrics(0.5),
                },
                best.clone(),
            ],
            best: Some(best),
            stopped_early: false,
            rounds_without_improvement: 0,
        };

        let text = tuning_report(&outcome).unwrap();
        assert!(text.contains("| candidate_1 | 0.500 |"));
        assert!(text.contains("| candidate_2 | 0.750 |"));
        assert!(text.contains("\"frequency_weight\": 1.2"));
        assert!(!text.contains("Stopped early"));
    }

    #[test]
    fn test_tuning_report_early_stop_counts() {
        let trials: Vec<TuneResult> = [0.1, 0.2, 0.1, 0.1, 0.1]
            .iter()
            .enumerate()
            .map(|(i, &recall)| TuneResult {
                trial: i + 1,
                config: ScoreConfig::default(),
                metrics: metrics(recall),
            })
            .collect();
        let outcome = TuneOutcome {
            best: Some(trials[1].clone()),
            history: trials,
            stopped_early: true,
            rounds_without_improvement: 3,
        };

        let text = tuning_report(&outcome).unwrap();
        assert!(text.contains("Stopped early after 5 trials (3 without improvement)."));
    }

    #[test]
    fn test_model_card_falls_back_to_baseline() {
        let dir = tempfile::tempdir().unwrap();
        let baseline = metrics(0.3);

        let paths =
            write_tuning_reports(dir.path(), &TuneOutcome::default(), &baseline, &[2022, 2025])
                .unwrap();
        assert_eq!(paths.len(), 2);

        let card = std::fs::read_to_string(dir.path().join(MODEL_CARD)).unwrap();
        assert!(card.contains("## Metrics (Rolling 2022-2025)"));
        assert!(card.contains("| macro | 0.300 |"));

        let tuning = std::fs::read_to_string(dir.path().join(TUNING_REPORT)).unwrap();
        assert!(tuning.ends_with("{}"));
    }
}

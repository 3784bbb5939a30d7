//! ANSI summaries for the command line.
//!
//! Recall values carry a grade so weak splits stand out:
//! - [strong] recall ≥ 0.6
//! - [fair]   recall ≥ 0.3
//! - [weak]   everything below

use std::fmt;

use owo_colors::{OwoColorize, Style};

use crate::training::{EvalReport, Metrics, TuneOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grade {
    Strong,
    Fair,
    Weak,
}

impl Grade {
    pub fn for_recall(recall: f64) -> Self {
        if recall >= 0.6 {
            Grade::Strong
        } else if recall >= 0.3 {
            Grade::Fair
        } else {
            Grade::Weak
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Grade::Strong => "strong",
            Grade::Fair => "fair",
            Grade::Weak => "weak",
        }
    }

    pub fn style(&self) -> Style {
        match self {
            Grade::Strong => Style::new().green().bold(),
            Grade::Fair => Style::new().yellow(),
            Grade::Weak => Style::new().bright_red(),
        }
    }

    pub fn render(&self) -> String {
        format!("[{}]", self.label().style(self.style()))
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

pub struct Paint;

impl Paint {
    pub fn header(s: &str) -> String {
        s.bright_blue().bold().to_string()
    }

    pub fn label(s: &str) -> String {
        s.cyan().to_string()
    }

    pub fn dim(s: &str) -> String {
        s.dimmed().to_string()
    }
}

/// One aligned line: label, four metrics, recall grade.
pub fn metrics_line(label: &str, m: &Metrics) -> String {
    format!(
        "  {:<24} R@k {:.3}  P@k {:.3}  MAP {:.3}  NDCG {:.3}  {}",
        Paint::label(label),
        m.recall_at_k,
        m.precision_at_k,
        m.map_at_k,
        m.ndcg_at_k,
        Grade::for_recall(m.recall_at_k)
    )
}

pub fn eval_summary(title: &str, report: &EvalReport) -> String {
    let mut lines = vec![Paint::header(title)];
    for split in &report.splits {
        lines.push(format!(
            "{} {}",
            metrics_line(&split.name, &split.metrics),
            Paint::dim(&format!("({} questions)", split.n_test_questions))
        ));
    }
    lines.push(metrics_line("overall", &report.overall));
    lines.join("\n")
}

pub fn tune_summary(outcome: &TuneOutcome) -> String {
    let mut lines = vec![Paint::header("Tuning")];
    let status = if outcome.stopped_early {
        "stopped early"
    } else {
        "all candidates tried"
    };
    lines.push(Paint::dim(&format!("  {} trials, {}", outcome.history.len(), status)));

    match &outcome.best {
        Some(best) => {
            lines.push(metrics_line(&best.label(), &best.metrics));
            let weights: Vec<String> = best
                .config
                .named_weights()
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect();
            lines.push(format!("  {}", Paint::dim(&weights.join(" "))));
        }
        None => lines.push(Paint::dim("  no candidates evaluated")),
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_bands() {
        assert_eq!(Grade::for_recall(0.9), Grade::Strong);
        assert_eq!(Grade::for_recall(0.6), Grade::Strong);
        assert_eq!(Grade::for_recall(0.45), Grade::Fair);
        assert_eq!(Grade::for_recall(0.1), Grade::Weak);
    }

    #[test]
    fn test_grade_render_contains_label() {
        assert!(Grade::Fair.render().contains("fair"));
        assert!(Grade::Weak.to_string().contains("weak"));
    }

    #[test]
    fn test_tune_summary_without_trials() {
        let text = tune_summary(&TuneOutcome::default());
        assert!(text.contains("0 trials"));
        assert!(text.contains("no candidates evaluated"));
    }
}

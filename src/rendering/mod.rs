//! Output rendering - from metrics and rankings to files and terminal text.
//!
//! - report: markdown reports (baseline, tuning, model card)
//! - forecast: per-paper JSON topic forecasts
//! - terminal: colored summaries for the CLI

mod forecast;
mod report;
mod terminal;

pub use forecast::{
    build_forecast, forecast_path, write_forecasts, ForecastEntry, PaperForecast,
    BACKUP_TEMPLATES, COVERAGE_BACKUP, HIGH_CONFIDENCE,
};
pub use report::{
    baseline_report, metrics_table, model_card, tuning_report, write_baseline_report,
    write_tuning_reports, BASELINE_REPORT, MODEL_CARD, TUNING_REPORT,
};
pub use terminal::{eval_summary, metrics_line, tune_summary, Grade, Paint};

// JSON run summary.
//
// Non-finite statistics serialize as `null`.

use agecurve_baseball::pipeline::aggregate::CohortStats;
use agecurve_baseball::{DropCounts, MetricOutcome, PipelineError, ReportOutcome};
use agecurve_core::{Discipline, Polarity};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const SUMMARY_FILE_NAME: &str = "summary.json";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize run summary: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A report that failed before any metric ran.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedReport {
    pub name: String,
    pub discipline: Discipline,
    pub error: PipelineError,
}

/// How one configured report ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportResult {
    Completed(ReportOutcome),
    Failed(FailedReport),
}

impl ReportResult {
    pub fn name(&self) -> &str {
        match self {
            ReportResult::Completed(outcome) => &outcome.name,
            ReportResult::Failed(failed) => &failed.name,
        }
    }
}

/// Everything one run produced, in configuration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub reports: Vec<ReportResult>,
}

impl RunSummary {
    pub fn push_completed(&mut self, outcome: ReportOutcome) {
        self.reports.push(ReportResult::Completed(outcome));
    }

    pub fn push_failed(&mut self, failed: FailedReport) {
        self.reports.push(ReportResult::Failed(failed));
    }

    /// A completed report by name.
    pub fn report(&self, name: &str) -> Option<&ReportOutcome> {
        self.completed().find(|r| r.name == name)
    }

    pub fn completed(&self) -> impl Iterator<Item = &ReportOutcome> {
        self.reports.iter().filter_map(|r| match r {
            ReportResult::Completed(outcome) => Some(outcome),
            ReportResult::Failed(_) => None,
        })
    }

    pub fn failed(&self) -> impl Iterator<Item = &FailedReport> {
        self.reports.iter().filter_map(|r| match r {
            ReportResult::Failed(failed) => Some(failed),
            ReportResult::Completed(_) => None,
        })
    }
}

// ---------------------------------------------------------------------------
// Serialized shape
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct RunView<'a> {
    reports: Vec<ReportView<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum ReportView<'a> {
    Completed {
        name: &'a str,
        discipline: Discipline,
        counts: DropCounts,
        metrics: Vec<MetricView<'a>>,
    },
    Failed {
        name: &'a str,
        discipline: Discipline,
        error: String,
    },
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum MetricView<'a> {
    Ok {
        metric: &'a str,
        polarity: Polarity,
        peak: &'a str,
        cohorts: &'a [CohortStats],
    },
    Failed {
        metric: &'a str,
        error: String,
    },
}

impl<'a> From<&'a MetricOutcome> for MetricView<'a> {
    fn from(outcome: &'a MetricOutcome) -> Self {
        match &outcome.result {
            Ok(report) => MetricView::Ok {
                metric: &outcome.metric,
                polarity: report.polarity,
                peak: &report.peak.label,
                cohorts: &report.summary.rows,
            },
            Err(e) => MetricView::Failed {
                metric: &outcome.metric,
                error: e.to_string(),
            },
        }
    }
}

impl<'a> From<&'a RunSummary> for RunView<'a> {
    fn from(summary: &'a RunSummary) -> Self {
        let reports = summary
            .reports
            .iter()
            .map(|entry| match entry {
                ReportResult::Completed(r) => ReportView::Completed {
                    name: &r.name,
                    discipline: r.discipline,
                    counts: r.counts,
                    metrics: r.metrics.iter().map(MetricView::from).collect(),
                },
                ReportResult::Failed(f) => ReportView::Failed {
                    name: &f.name,
                    discipline: f.discipline,
                    error: f.error.to_string(),
                },
            })
            .collect();
        RunView { reports }
    }
}

pub fn to_json(summary: &RunSummary) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(&RunView::from(summary))?)
}

/// Write `summary.json` into `dir` and return its path.
pub fn write_summary_json(summary: &RunSummary, dir: &Path) -> Result<PathBuf, ExportError> {
    let path = dir.join(SUMMARY_FILE_NAME);
    let json = to_json(summary)?;
    std::fs::write(&path, json).map_err(|source| ExportError::Io {
        path: path.clone(),
        source,
    })?;
    info!("Wrote run summary to {}", path.display());
    Ok(path)
}

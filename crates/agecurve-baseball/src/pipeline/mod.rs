// Age-cohort pipeline: join, age, derive, filter, bucket, aggregate, rank.

pub mod aggregate;
pub mod age;
pub mod cohort;
pub mod derive;
pub mod filter;
pub mod join;
pub mod peak;

use crate::records::{PlayerIndex, StatTable};
use agecurve_core::{AgeConvention, Config, DerivedMetricConfig, Discipline, Polarity, ReportConfig};
use aggregate::{CohortStats, CohortSummary};
use cohort::AgePartition;
use derive::DerivedMetric;
use filter::Threshold;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    #[error("{discipline} source has no `{column}` column (needed by `{metric}`)")]
    MissingColumn {
        metric: String,
        column: String,
        discipline: Discipline,
    },

    #[error("no cohort has a defined median for `{metric}`")]
    EmptyCohortSet { metric: String },

    #[error("invalid age partition: {0}")]
    InvalidPartition(String),
}

// ---------------------------------------------------------------------------
// Outcome types
// ---------------------------------------------------------------------------

/// Where the records of one report run went.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DropCounts {
    /// Performance records read from the source.
    pub input: usize,
    /// No player with a matching identifier.
    pub unmatched: usize,
    /// Birth year or season year missing.
    pub undefined_age: usize,
    /// Failed at least one filter threshold.
    pub filtered_out: usize,
    /// Age outside every cohort.
    pub unbucketed: usize,
    /// Records that reached aggregation.
    pub retained: usize,
    /// Derived values replaced by zero (zero or absent denominator).
    pub zero_fallbacks: usize,
}

/// A successfully summarized metric.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricReport {
    pub summary: CohortSummary,
    pub peak: CohortStats,
    pub polarity: Polarity,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricOutcome {
    pub metric: String,
    pub result: Result<MetricReport, PipelineError>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportOutcome {
    pub name: String,
    pub discipline: Discipline,
    pub y_floor_zero: bool,
    pub counts: DropCounts,
    /// One entry per requested metric, in request order.
    pub metrics: Vec<MetricOutcome>,
}

// ---------------------------------------------------------------------------
// Settings shared by every report in a run
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct PipelineSettings {
    pub age_convention: AgeConvention,
    /// Metrics whose peak is the minimal median.
    pub lower_is_better: Vec<String>,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            age_convention: config.age_convention,
            lower_is_better: config.lower_is_better.clone(),
        }
    }

    pub fn polarity_of(&self, metric: &str) -> Polarity {
        if self.lower_is_better.iter().any(|m| m == metric) {
            Polarity::LowerIsBetter
        } else {
            Polarity::HigherIsBetter
        }
    }
}

// ---------------------------------------------------------------------------
// Report run
// ---------------------------------------------------------------------------

/// First input column of a derived metric the table lacks, if any.
fn missing_input<'c>(table: &StatTable, metric: &'c DerivedMetricConfig) -> Option<&'c str> {
    [metric.numerator.as_str(), metric.denominator.as_str()]
        .into_iter()
        .find(|column| !table.has_column(column))
}

/// Run one report variant over a loaded table.
///
/// Fails as a whole only for an invalid partition or a filter naming an
/// unknown field. A metric that cannot be resolved or has no defined
/// cohort median fails on its own inside the returned outcome.
pub fn run_report(
    players: &PlayerIndex,
    table: &StatTable,
    report: &ReportConfig,
    settings: &PipelineSettings,
) -> Result<ReportOutcome, PipelineError> {
    let partition = AgePartition::try_from(&report.partition)?;

    let mut derived = Vec::new();
    let mut unusable: HashMap<&str, &str> = HashMap::new();
    for config in &report.derived {
        match missing_input(table, config) {
            None => derived.push(DerivedMetric::from(config)),
            Some(column) => {
                unusable.insert(config.name.as_str(), column);
            }
        }
    }

    let resolve = |field: &str| -> Result<(), PipelineError> {
        if derived.iter().any(|d| d.name == field) {
            return Ok(());
        }
        let column = match unusable.get(field) {
            Some(column) => *column,
            None if table.has_column(field) => return Ok(()),
            None => field,
        };
        Err(PipelineError::MissingColumn {
            metric: field.to_string(),
            column: column.to_string(),
            discipline: table.discipline,
        })
    };

    let thresholds = report
        .filters
        .iter()
        .map(|f| resolve(f.field.as_str()).map(|()| Threshold::from(f)))
        .collect::<Result<Vec<_>, _>>()?;

    let resolutions: Vec<(&String, Result<(), PipelineError>)> =
        report.metrics.iter().map(|m| (m, resolve(m.as_str()))).collect();
    let requested: Vec<String> = resolutions
        .iter()
        .filter(|(_, resolution)| resolution.is_ok())
        .map(|(metric, _)| (*metric).clone())
        .collect();

    let mut counts = DropCounts {
        input: table.records.len(),
        ..DropCounts::default()
    };

    let (joined, unmatched) = join::inner_join(players, &table.records);
    counts.unmatched = unmatched;
    debug!("{}: {} joined, {} unmatched", report.name, joined.len(), unmatched);

    let (aged, undefined) = age::derive_ages(joined, settings.age_convention);
    counts.undefined_age = undefined;

    let (with_metrics, fallbacks) = derive::derive_metrics(aged, &derived);
    counts.zero_fallbacks = fallbacks;

    let (filtered, dropped) = filter::apply_filters(with_metrics, &thresholds);
    counts.filtered_out = dropped;
    debug!("{}: {} passed filters, {} dropped", report.name, filtered.len(), dropped);

    let (bucketed, unbucketed) = partition.assign(filtered);
    counts.unbucketed = unbucketed;
    counts.retained = bucketed.len();

    info!(
        "Report '{}': {} records in, {} unmatched, {} undefined age, {} filtered, {} outside cohorts, {} retained",
        report.name,
        counts.input,
        counts.unmatched,
        counts.undefined_age,
        counts.filtered_out,
        counts.unbucketed,
        counts.retained
    );

    let summaries = aggregate::aggregate(&bucketed, &partition, &requested);

    let metrics = resolutions
        .into_iter()
        .map(|(metric, resolution)| {
            let result = resolution.and_then(|()| {
                let summary = summaries
                    .iter()
                    .find(|s| &s.metric == metric)
                    .cloned()
                    .unwrap_or_else(|| CohortSummary {
                        metric: metric.clone(),
                        rows: Vec::new(),
                    });
                let polarity = settings.polarity_of(metric);
                let peak = peak::select_peak(&summary, polarity)?.clone();
                Ok(MetricReport {
                    summary,
                    peak,
                    polarity,
                })
            });
            MetricOutcome {
                metric: metric.clone(),
                result,
            }
        })
        .collect();

    Ok(ReportOutcome {
        name: report.name.clone(),
        discipline: report.discipline,
        y_floor_zero: report.y_floor_zero,
        counts,
        metrics,
    })
}

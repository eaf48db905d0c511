// Peak cohort selection by median, honoring metric polarity.

use super::aggregate::{CohortStats, CohortSummary};
use super::PipelineError;
use agecurve_core::Polarity;

fn is_better(candidate: f64, incumbent: f64, polarity: Polarity) -> bool {
    match polarity {
        Polarity::HigherIsBetter => candidate > incumbent,
        Polarity::LowerIsBetter => candidate < incumbent,
    }
}

/// The cohort with the best median. Ties keep the earliest cohort; NaN
/// medians never win.
pub fn select_peak(
    summary: &CohortSummary,
    polarity: Polarity,
) -> Result<&CohortStats, PipelineError> {
    let mut best: Option<&CohortStats> = None;
    for row in summary.rows.iter().filter(|r| !r.median.is_nan()) {
        match best {
            Some(current) if !is_better(row.median, current.median, polarity) => {}
            _ => best = Some(row),
        }
    }
    best.ok_or_else(|| PipelineError::EmptyCohortSet {
        metric: summary.metric.clone(),
    })
}

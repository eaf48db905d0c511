// Per-metric cohort summary tables for the terminal.

use agecurve_baseball::pipeline::aggregate::{CohortStats, CohortSummary};
use agecurve_baseball::MetricReport;
use agecurve_core::Polarity;
use tabled::{Table, Tabled};

/// One cohort row as printed.
#[derive(Debug, Clone, PartialEq, Tabled)]
pub struct SummaryRow {
    #[tabled(rename = "Cohort")]
    pub cohort: String,
    #[tabled(rename = "N")]
    pub count: usize,
    #[tabled(rename = "Mean")]
    pub mean: String,
    #[tabled(rename = "Median")]
    pub median: String,
    #[tabled(rename = "Std Dev")]
    pub std_dev: String,
}

impl From<&CohortStats> for SummaryRow {
    fn from(stats: &CohortStats) -> Self {
        Self {
            cohort: stats.label.clone(),
            count: stats.count,
            mean: format_value(stats.mean),
            median: format_value(stats.median),
            std_dev: format_value(stats.std_dev),
        }
    }
}

/// Three decimals, or `NaN` for an undefined statistic.
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else {
        format!("{value:.3}")
    }
}

fn polarity_label(polarity: Polarity) -> &'static str {
    match polarity {
        Polarity::HigherIsBetter => "highest median",
        Polarity::LowerIsBetter => "lowest median",
    }
}

/// Title line naming the report, the metric, and the peak cohort.
pub fn table_title(report: &str, metric: &MetricReport) -> String {
    format!(
        "{report}: {} (peak {} by {}, median {})",
        metric.summary.metric,
        metric.peak.label,
        polarity_label(metric.polarity),
        format_value(metric.peak.median),
    )
}

/// Format a summary as an underlined title followed by an ASCII table.
pub fn format_summary_table(summary: &CohortSummary, title: &str) -> String {
    if summary.rows.is_empty() {
        return format!("{title}\nNo cohorts with data");
    }
    let rows: Vec<SummaryRow> = summary.rows.iter().map(SummaryRow::from).collect();
    let table = Table::new(rows).to_string();
    format!("{}\n{}\n{}", title, "=".repeat(title.len()), table)
}

pub fn format_metric_table(report: &str, metric: &MetricReport) -> String {
    format_summary_table(&metric.summary, &table_title(report, metric))
}

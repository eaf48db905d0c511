// Run orchestration for the `agecurve` binary.
//
// Loads every source once, runs each configured report, then prints a table
// and writes a chart per metric, and finally writes the JSON summary. Load
// failures abort the run; report and metric failures are logged and the
// run continues.

use agecurve_baseball::loader;
use agecurve_baseball::{run_report, PipelineSettings};
use agecurve_core::Config;
use agecurve_report::{
    chart_file_name, format_metric_table, render_cohort_chart, write_summary_json, FailedReport,
    RunSummary,
};

use anyhow::Context;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// What a run produced.
#[derive(Debug, Clone, Default)]
pub struct RunOutput {
    pub summary: RunSummary,
    /// Chart files written, in report then metric order.
    pub charts: Vec<PathBuf>,
    /// Path of `summary.json`, when JSON output is enabled.
    pub json: Option<PathBuf>,
}

/// Run every report, printing summary tables to stdout.
pub fn run(config: &Config, base_dir: &Path) -> anyhow::Result<RunOutput> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run_with_writer(config, base_dir, &mut out)
}

/// Run every report, printing summary tables to `out`.
pub fn run_with_writer<W: Write>(
    config: &Config,
    base_dir: &Path,
    out: &mut W,
) -> anyhow::Result<RunOutput> {
    let sources = loader::load_all(&config.sources, base_dir, &config.disciplines())
        .context("failed to load input sources")?;
    let settings = PipelineSettings::from_config(config);

    let output_dir = base_dir.join(&config.output.dir);
    if config.output.charts || config.output.json {
        std::fs::create_dir_all(&output_dir).with_context(|| {
            format!("failed to create output directory {}", output_dir.display())
        })?;
    }

    let mut output = RunOutput::default();

    for report in &config.reports {
        let table = sources
            .table(report.discipline)
            .with_context(|| format!("{} source was not loaded", report.discipline))?;

        let outcome = match run_report(&sources.players, table, report, &settings) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Report '{}' skipped: {}", report.name, e);
                output.summary.push_failed(FailedReport {
                    name: report.name.clone(),
                    discipline: report.discipline,
                    error: e,
                });
                continue;
            }
        };

        for metric in &outcome.metrics {
            let metric_report = match &metric.result {
                Ok(metric_report) => metric_report,
                Err(e) => {
                    warn!("Report '{}': metric '{}' skipped: {}", outcome.name, metric.metric, e);
                    continue;
                }
            };

            writeln!(out, "{}\n", format_metric_table(&outcome.name, metric_report))
                .context("failed to write summary table")?;

            if config.output.charts {
                let path = output_dir.join(chart_file_name(&outcome.name, &metric.metric));
                let title = format!("{}: {}", outcome.name, metric.metric);
                match render_cohort_chart(
                    &metric_report.summary,
                    &title,
                    &path,
                    outcome.y_floor_zero,
                ) {
                    Ok(()) => output.charts.push(path),
                    Err(e) => warn!("Chart for '{}' not written: {}", title, e),
                }
            }
        }

        output.summary.push_completed(outcome);
    }

    if config.output.json {
        let path = write_summary_json(&output.summary, &output_dir)
            .context("failed to write run summary")?;
        output.json = Some(path);
    }

    info!(
        "Run complete: {} reports, {} failed, {} charts written",
        output.summary.completed().count(),
        output.summary.failed().count(),
        output.charts.len()
    );

    Ok(output)
}

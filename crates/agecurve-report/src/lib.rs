// Library root: terminal tables, SVG charts, and the JSON run summary.

pub mod chart;
pub mod export;
pub mod table;

pub use chart::{chart_file_name, render_cohort_chart, ChartError};
pub use export::{
    write_summary_json, ExportError, FailedReport, ReportResult, RunSummary, SUMMARY_FILE_NAME,
};
pub use table::{format_metric_table, format_value, SummaryRow};

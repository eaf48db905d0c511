// Library root: source loading, record types, and the age-cohort pipeline.

pub mod loader;
pub mod pipeline;
pub mod records;

pub use loader::{LoadError, LoadedSources};
pub use pipeline::{
    run_report, DropCounts, MetricOutcome, MetricReport, PipelineError, PipelineSettings,
    ReportOutcome,
};

// Library root: configuration model shared by the pipeline, the reporter,
// and the `agecurve` binary.

pub mod config;

pub use config::{
    AgeConvention, Comparison, Config, ConfigError, DerivedMetricConfig, Discipline,
    FilterConfig, OutputConfig, PartitionConfig, Polarity, ReportConfig, SourcePaths,
};

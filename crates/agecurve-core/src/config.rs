// Configuration loading and parsing (config/agecurve.toml).

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// File name of the run configuration inside `config/` and `defaults/`.
pub const CONFIG_FILE_NAME: &str = "agecurve.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Shared enums
// ---------------------------------------------------------------------------

/// Which performance source a report reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Discipline {
    Batting,
    Pitching,
}

impl Discipline {
    pub fn label(&self) -> &'static str {
        match self {
            Discipline::Batting => "batting",
            Discipline::Pitching => "pitching",
        }
    }
}

impl fmt::Display for Discipline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Comparison operator used by record filter thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    Gt,
    Ge,
    Lt,
    Le,
}

impl Comparison {
    /// Whether `value <op> threshold` holds.
    pub fn holds(&self, value: f64, threshold: f64) -> bool {
        match self {
            Comparison::Gt => value > threshold,
            Comparison::Ge => value >= threshold,
            Comparison::Lt => value < threshold,
            Comparison::Le => value <= threshold,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
            Comparison::Lt => "<",
            Comparison::Le => "<=",
        }
    }
}

/// Which direction of a metric counts as better performance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    HigherIsBetter,
    LowerIsBetter,
}

/// How the day-granularity age computation anchors its two dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeConvention {
    /// Season and birth are both anchored at January 1 of their year.
    #[default]
    CalendarYear,
    /// Season anchored at June 30; birth at the recorded birth date when
    /// month and day are known, January 1 otherwise.
    MidSeason,
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub sources: SourcePaths,
    pub output: OutputConfig,
    pub age_convention: AgeConvention,
    /// Metric names whose peak is the minimal median.
    pub lower_is_better: Vec<String>,
    pub reports: Vec<ReportConfig>,
}

impl Config {
    /// Disciplines referenced by at least one report, in first-use order.
    pub fn disciplines(&self) -> Vec<Discipline> {
        let mut seen = Vec::new();
        for report in &self.reports {
            if !seen.contains(&report.discipline) {
                seen.push(report.discipline);
            }
        }
        seen
    }
}

// ---------------------------------------------------------------------------
// agecurve.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire agecurve.toml file.
#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    sources: SourcePaths,
    #[serde(default)]
    output: OutputConfig,
    #[serde(default)]
    age: AgeSection,
    #[serde(default)]
    polarity: PolaritySection,
    #[serde(default)]
    reports: Vec<ReportConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct AgeSection {
    #[serde(default)]
    convention: AgeConvention,
}

#[derive(Debug, Clone, Deserialize)]
struct PolaritySection {
    lower_is_better: Vec<String>,
}

impl Default for PolaritySection {
    fn default() -> Self {
        Self {
            lower_is_better: vec!["ERA".into(), "BAOpp".into()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourcePaths {
    pub people: String,
    pub batting: String,
    pub pitching: String,
    /// Player identifier column in the performance sources.
    #[serde(default = "default_id_column")]
    pub id_column: String,
    /// Season year column in the performance sources.
    #[serde(default = "default_year_column")]
    pub year_column: String,
}

impl SourcePaths {
    pub fn for_discipline(&self, discipline: Discipline) -> &str {
        match discipline {
            Discipline::Batting => &self.batting,
            Discipline::Pitching => &self.pitching,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub dir: String,
    #[serde(default = "default_true")]
    pub charts: bool,
    #[serde(default = "default_true")]
    pub json: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: "reports".into(),
            charts: true,
            json: true,
        }
    }
}

/// One report variant: a discipline, a partition, filters, and metrics.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    pub name: String,
    pub discipline: Discipline,
    pub metrics: Vec<String>,
    pub partition: PartitionConfig,
    #[serde(default)]
    pub derived: Vec<DerivedMetricConfig>,
    #[serde(default)]
    pub filters: Vec<FilterConfig>,
    /// Clamp the chart's y-axis floor at zero.
    #[serde(default)]
    pub y_floor_zero: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PartitionConfig {
    pub boundaries: Vec<i32>,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DerivedMetricConfig {
    pub name: String,
    pub numerator: String,
    pub denominator: String,
    #[serde(default = "default_scale")]
    pub scale: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FilterConfig {
    pub field: String,
    pub op: Comparison,
    pub value: f64,
}

fn default_id_column() -> String {
    "playerID".into()
}

fn default_year_column() -> String {
    "yearID".into()
}

fn default_true() -> bool {
    true
}

fn default_scale() -> f64 {
    1.0
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/agecurve.toml` relative to `base_dir`.
///
/// Does not copy defaults; `load_config()` does that first.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    load_config_file(&base_dir.join("config").join(CONFIG_FILE_NAME))
}

/// Load and validate a single config file at an explicit path.
pub fn load_config_file(path: &Path) -> Result<Config, ConfigError> {
    let text = read_file(path)?;
    parse_config(&text, path)
}

fn parse_config(text: &str, path: &Path) -> Result<Config, ConfigError> {
    let file: ConfigFile = toml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config = Config {
        sources: file.sources,
        output: file.output,
        age_convention: file.age.convention,
        lower_is_better: file.polarity.lower_is_better,
        reports: file.reports,
    };

    validate(&config)?;

    Ok(config)
}

/// Copy `defaults/agecurve.toml` to `config/agecurve.toml` unless the
/// latter already exists. Returns the path written, if any.
pub fn ensure_config_file(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let target = base_dir.join("config").join(CONFIG_FILE_NAME);
    if target.exists() {
        return Ok(None);
    }

    let source = base_dir.join("defaults").join(CONFIG_FILE_NAME);
    if !source.is_file() {
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "no config/{name} or defaults/{name} in {}; \
                 run from the project root or pass it as the first argument",
                base_dir.display(),
                name = CONFIG_FILE_NAME,
            ),
        });
    }

    let copy = || -> std::io::Result<()> {
        if let Some(dir) = target.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::copy(&source, &target).map(|_| ())
    };
    copy().map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to copy {} to {}: {e}", source.display(), target.display()),
    })?;

    info!("Copied default config {}", target.display());
    Ok(Some(target))
}

/// Convenience wrapper: loads config relative to `base_dir`, copying the
/// default config first.
pub fn load_config(base_dir: &Path) -> Result<Config, ConfigError> {
    ensure_config_file(base_dir)?;
    load_config_from(base_dir)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn invalid(field: impl Into<String>, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let sources = &config.sources;
    let source_fields: &[(&str, &str)] = &[
        ("sources.people", &sources.people),
        ("sources.batting", &sources.batting),
        ("sources.pitching", &sources.pitching),
        ("sources.id_column", &sources.id_column),
        ("sources.year_column", &sources.year_column),
    ];
    for (name, val) in source_fields {
        if val.trim().is_empty() {
            return Err(invalid(*name, "must not be empty"));
        }
    }

    if config.output.dir.trim().is_empty() {
        return Err(invalid("output.dir", "must not be empty"));
    }

    if config.reports.is_empty() {
        return Err(invalid("reports", "at least one report must be configured"));
    }

    let mut names = HashSet::new();
    for (i, report) in config.reports.iter().enumerate() {
        let prefix = format!("reports[{i}]");
        if report.name.trim().is_empty() {
            return Err(invalid(format!("{prefix}.name"), "must not be empty"));
        }
        if !names.insert(report.name.as_str()) {
            return Err(invalid(
                format!("{prefix}.name"),
                format!("duplicate report name '{}'", report.name),
            ));
        }
        validate_report(report, &prefix)?;
    }

    Ok(())
}

fn validate_report(report: &ReportConfig, prefix: &str) -> Result<(), ConfigError> {
    if report.metrics.is_empty() {
        return Err(invalid(format!("{prefix}.metrics"), "must list at least one metric"));
    }

    validate_partition(&report.partition, &format!("{prefix}.partition"))?;

    let mut derived_names = HashSet::new();
    for (j, derived) in report.derived.iter().enumerate() {
        let field = format!("{prefix}.derived[{j}]");
        if derived.name.trim().is_empty()
            || derived.numerator.trim().is_empty()
            || derived.denominator.trim().is_empty()
        {
            return Err(invalid(field, "name, numerator and denominator must not be empty"));
        }
        if !derived_names.insert(derived.name.as_str()) {
            return Err(invalid(
                format!("{field}.name"),
                format!("duplicate derived metric '{}'", derived.name),
            ));
        }
        if !derived.scale.is_finite() || derived.scale == 0.0 {
            return Err(invalid(
                format!("{field}.scale"),
                format!("must be finite and non-zero, got {}", derived.scale),
            ));
        }
    }

    for (j, filter) in report.filters.iter().enumerate() {
        let field = format!("{prefix}.filters[{j}]");
        if filter.field.trim().is_empty() {
            return Err(invalid(format!("{field}.field"), "must not be empty"));
        }
        if !filter.value.is_finite() {
            return Err(invalid(
                format!("{field}.value"),
                format!("must be finite, got {}", filter.value),
            ));
        }
    }

    Ok(())
}

fn validate_partition(partition: &PartitionConfig, field: &str) -> Result<(), ConfigError> {
    let bounds = &partition.boundaries;
    if bounds.len() < 2 {
        return Err(invalid(
            format!("{field}.boundaries"),
            "must contain at least two boundaries",
        ));
    }
    if let Some(w) = bounds.windows(2).find(|w| w[0] >= w[1]) {
        return Err(invalid(
            format!("{field}.boundaries"),
            format!("must be strictly increasing, found {} then {}", w[0], w[1]),
        ));
    }
    if partition.labels.len() != bounds.len() - 1 {
        return Err(invalid(
            format!("{field}.labels"),
            format!(
                "expected {} labels for {} boundaries, got {}",
                bounds.len() - 1,
                bounds.len(),
                partition.labels.len()
            ),
        ));
    }
    if partition.labels.iter().any(|l| l.trim().is_empty()) {
        return Err(invalid(format!("{field}.labels"), "labels must not be empty"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

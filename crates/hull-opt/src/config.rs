use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use hull_core::oracle::BlockCoefficientHull;
use hull_core::{FeasibilityBounds, GridAxes, MAX_HEEL_SAMPLES, ParetoStrategy, SyntheticGz};
use serde::Deserialize;
use thiserror::Error;
use tracing::Level;

const DEFAULT_RUN_ID: &str = "grid_search";
const DEFAULT_OUTPUT_DIR: &str = "out/{run_id}";
const DEFAULT_BASENAME: &str = "cli_grid";
const DEFAULT_TOP_ROWS: usize = 30;
const DEFAULT_LEGACY_BLOCK_COEFFICIENT: f64 = 0.55;
const MAX_HEEL_DEG: f64 = 90.0;
const NAME_ALLOWED: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._-";

/// Root search configuration loaded from YAML. Every block is optional.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    pub run_id: String,
    pub grid: GridAxes,
    pub feasibility: FeasibilityBounds,
    pub oracle: OracleConfig,
    pub stability: SyntheticGz,
    pub execution: ExecutionConfig,
    pub outputs: OutputsConfig,
    pub report: ReportConfig,
    pub logging: LoggingConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            run_id: DEFAULT_RUN_ID.to_string(),
            grid: GridAxes::default(),
            feasibility: FeasibilityBounds::default(),
            oracle: OracleConfig::default(),
            stability: SyntheticGz::default(),
            execution: ExecutionConfig::default(),
            outputs: OutputsConfig::default(),
            report: ReportConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl SearchConfig {
    /// Load configuration from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path_buf.clone(),
        })?;
        let reader = BufReader::new(file);
        let mut cfg: SearchConfig =
            serde_yaml::from_reader(reader).map_err(|source| ConfigError::Parse {
                source,
                path: path_buf.clone(),
            })?;
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path_buf,
            source,
        })?;
        Ok(cfg)
    }

    /// Validate the configuration without performing I/O.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        validate_name("run_id", &self.run_id)?;
        self.grid
            .validate()
            .map_err(|err| ValidationError::InvalidField {
                field: grid_field(&err),
                message: err.to_string(),
            })?;
        self.feasibility
            .validate()
            .map_err(|err| ValidationError::InvalidField {
                field: "feasibility".to_string(),
                message: err.to_string(),
            })?;
        self.oracle.validate()?;
        validate_stability(&self.stability)?;
        self.execution.validate()?;
        self.outputs.validate(&self.run_id)?;
        self.report.validate()?;
        self.logging.normalize();
        Ok(())
    }

    /// Resolve output templates (e.g., `{run_id}` placeholders) into concrete paths.
    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        let dir = resolve_template(&self.run_id, &self.outputs.dir);
        let base = &self.outputs.basename;
        let pareto = format!("{base}_pareto");
        ResolvedOutputs {
            results_csv: dir.join(format!("{base}.csv")),
            results_jsonl: dir.join(format!("{base}.jsonl")),
            pareto_csv: dir.join(format!("{pareto}.csv")),
            pareto_jsonl: dir.join(format!("{pareto}.jsonl")),
            report_md: dir.join(format!("{base}.md")),
            gz_chart: dir.join(format!("{base}_gz.png")),
            pareto_chart: dir.join(format!("{base}_pareto.png")),
            telemetry: dir.join(format!("{base}_telemetry.jsonl")),
            dir,
        }
    }
}

fn grid_field(err: &hull_core::GridError) -> String {
    match err {
        hull_core::GridError::EmptyAxis(axis)
        | hull_core::GridError::InvalidValue { axis, .. } => format!("grid.{}", axis.field()),
        _ => "grid".to_string(),
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OracleKind {
    /// Pure ρ·L·B·T·Cb model.
    #[default]
    Block,
    /// Stateful mock oracle behind the legacy adapter.
    LegacyMock,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct OracleConfig {
    pub kind: OracleKind,
    pub hull: BlockCoefficientHull,
    /// Cb held by the mock oracle's loaded model.
    pub legacy_block_coefficient: f64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            kind: OracleKind::default(),
            hull: BlockCoefficientHull::default(),
            legacy_block_coefficient: DEFAULT_LEGACY_BLOCK_COEFFICIENT,
        }
    }
}

impl OracleConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        for (label, value) in [
            ("oracle.hull.density", self.hull.density),
            ("oracle.hull.midship_coefficient", self.hull.midship_coefficient),
            ("oracle.hull.lcb_fraction", self.hull.lcb_fraction),
            ("oracle.legacy_block_coefficient", self.legacy_block_coefficient),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ValidationError::InvalidField {
                    field: label.to_string(),
                    message: format!("must be a finite positive number, got {value}"),
                });
            }
        }
        Ok(())
    }
}

fn validate_stability(stability: &SyntheticGz) -> Result<(), ValidationError> {
    if !(stability.step_deg.is_finite() && stability.step_deg > 0.0) {
        return Err(ValidationError::InvalidField {
            field: "stability.step_deg".to_string(),
            message: "heel step must be greater than zero".to_string(),
        });
    }
    if !(stability.max_heel_deg >= stability.step_deg && stability.max_heel_deg <= MAX_HEEL_DEG) {
        return Err(ValidationError::InvalidField {
            field: "stability.max_heel_deg".to_string(),
            message: format!("max heel must lie in [step_deg, {MAX_HEEL_DEG}]"),
        });
    }
    if stability.max_heel_deg / stability.step_deg > MAX_HEEL_SAMPLES as f64 {
        return Err(ValidationError::InvalidField {
            field: "stability.step_deg".to_string(),
            message: format!(
                "heel step too fine: at most {MAX_HEEL_SAMPLES} samples up to max_heel_deg"
            ),
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExecutionConfig {
    pub workers: usize,
    pub ranking: ParetoStrategy,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            ranking: ParetoStrategy::default(),
        }
    }
}

impl ExecutionConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.workers == 0 {
            return Err(ValidationError::InvalidField {
                field: "execution.workers".to_string(),
                message: "workers must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Output artifact configuration. `dir` may contain `{run_id}`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputsConfig {
    pub dir: String,
    pub basename: String,
}

impl Default for OutputsConfig {
    fn default() -> Self {
        Self {
            dir: DEFAULT_OUTPUT_DIR.to_string(),
            basename: DEFAULT_BASENAME.to_string(),
        }
    }
}

impl OutputsConfig {
    fn validate(&self, run_id: &str) -> Result<(), ValidationError> {
        if self.dir.trim().is_empty() {
            return Err(ValidationError::InvalidField {
                field: "outputs.dir".to_string(),
                message: "path must not be empty".to_string(),
            });
        }
        if resolve_template(run_id, &self.dir).components().count() == 0 {
            return Err(ValidationError::InvalidField {
                field: "outputs.dir".to_string(),
                message: "resolved path is invalid".to_string(),
            });
        }
        validate_name("outputs.basename", &self.basename)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReportConfig {
    /// Rows listed in the report table.
    pub top_rows: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_rows: DEFAULT_TOP_ROWS,
        }
    }
}

impl ReportConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.top_rows == 0 {
            return Err(ValidationError::InvalidField {
                field: "report.top_rows".to_string(),
                message: "report must list at least one row".to_string(),
            });
        }
        Ok(())
    }
}

/// Logging configuration defaults to a compact stderr log.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub enable_structured: bool,
    pub tracing_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: default_tracing_level(),
        }
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        if self.tracing_level.trim().is_empty() {
            self.tracing_level = default_tracing_level();
        }
    }

    pub fn level(&self) -> Option<Level> {
        match self.tracing_level.to_ascii_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }
}

fn default_tracing_level() -> String {
    "info".to_string()
}

fn validate_name(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::InvalidField {
            field: field.to_string(),
            message: "must not be empty".to_string(),
        });
    }

    if !value.chars().all(|c| NAME_ALLOWED.contains(c)) {
        return Err(ValidationError::InvalidField {
            field: field.to_string(),
            message: "may only contain alphanumeric characters, '.', '_' or '-'".to_string(),
        });
    }

    Ok(())
}

fn resolve_template(run_id: &str, template: &str) -> PathBuf {
    PathBuf::from(template.replace("{run_id}", run_id))
}

/// Fully resolved output paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub dir: PathBuf,
    pub results_csv: PathBuf,
    pub results_jsonl: PathBuf,
    pub pareto_csv: PathBuf,
    pub pareto_jsonl: PathBuf,
    pub report_md: PathBuf,
    pub gz_chart: PathBuf,
    pub pareto_chart: PathBuf,
    pub telemetry: PathBuf,
}

/// Errors surfaced when loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Invalid { path, .. } => path.as_path(),
        }
    }
}

/// Validation failures captured with contextual metadata.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}

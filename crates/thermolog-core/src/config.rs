use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thermolog_parser::{Calibration, CleanerOptions, ColumnNames};

use crate::error::{PipelineError, Result};

pub const DEFAULT_ALERT_THRESHOLD: f64 = 80.0;
pub const DEFAULT_HISTOGRAM_BINS: usize = 20;
pub const DEFAULT_PATTERN: &str = "*.csv";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    pub enabled: bool,
    pub histogram_bins: usize,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
        }
    }
}

/// Everything a pipeline run needs. Missing keys fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub input_dir: PathBuf,
    pub processed_dir: PathBuf,
    pub plots_dir: PathBuf,
    pub reports_dir: PathBuf,
    pub pattern: String,
    pub alert_threshold: f64,
    /// Abort the run on the first file that cannot be read or written.
    pub fail_fast: bool,
    pub columns: ColumnNames,
    pub calibration: Calibration,
    pub plots: PlotConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::rooted_at(Path::new("."))
    }
}

impl PipelineConfig {
    /// Default layout under `root`: `data/raw`, `data/processed`, `plots`, `reports`.
    pub fn rooted_at(root: &Path) -> Self {
        Self {
            input_dir: root.join("data").join("raw"),
            processed_dir: root.join("data").join("processed"),
            plots_dir: root.join("plots"),
            reports_dir: root.join("reports"),
            pattern: DEFAULT_PATTERN.to_string(),
            alert_threshold: DEFAULT_ALERT_THRESHOLD,
            fail_fast: false,
            columns: ColumnNames::default(),
            calibration: Calibration::default(),
            plots: PlotConfig::default(),
        }
    }

    pub fn from_toml_str(content: &str, origin: &Path) -> Result<Self> {
        let config: PipelineConfig =
            toml::from_str(content).map_err(|source| PipelineError::ConfigParse {
                path: origin.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| PipelineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content, path)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.alert_threshold.is_finite() {
            return Err(PipelineError::Config(format!(
                "alert_threshold must be finite, got {}",
                self.alert_threshold
            )));
        }
        if self.plots.histogram_bins == 0 {
            return Err(PipelineError::Config(
                "plots.histogram_bins must be at least 1".to_string(),
            ));
        }
        if self.columns.timestamp.trim().is_empty() {
            return Err(PipelineError::Config(
                "columns.timestamp must not be empty".to_string(),
            ));
        }
        if self.columns.value_candidates.is_empty() {
            return Err(PipelineError::Config(
                "columns.value_candidates must list at least one column".to_string(),
            ));
        }
        if self.pattern.trim().is_empty() {
            return Err(PipelineError::Config("pattern must not be empty".to_string()));
        }
        if same_dir(&self.input_dir, &self.processed_dir) {
            return Err(PipelineError::Config(format!(
                "processed_dir must differ from input_dir ({})",
                self.input_dir.display()
            )));
        }
        Ok(())
    }

    pub fn cleaner_options(&self) -> CleanerOptions {
        CleanerOptions {
            columns: self.columns.clone(),
            calibration: self.calibration,
        }
    }

    pub fn report_path(&self) -> PathBuf {
        self.reports_dir.join(crate::report::REPORT_FILE_NAME)
    }
}

/// Compares canonical paths when both exist, the literal paths otherwise.
fn same_dir(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a.components().eq(b.components()),
    }
}

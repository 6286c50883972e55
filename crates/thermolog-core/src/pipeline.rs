use std::path::{Path, PathBuf};

use thermolog_parser::{clean_file, CleanedFile, CleanerError, CleaningStats};
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::discovery::{clean_name, ensure_dirs, list_raw_csvs, safe_stem};
use crate::error::Result;
use crate::kpi::{compute_kpis, KpiSummary};
use crate::plots::{
    hist_file_name, hist_title, line_file_name, line_title, plot_boxplot_by_sensor,
    plot_temperature_hist, plot_temperature_line, BOXPLOT_FILE_NAME,
};
use crate::report::{write_report, ReportRow};
use crate::sensors::{sensor_key, SensorSeries};

#[derive(Debug)]
pub enum FileStatus {
    Cleaned {
        stats: CleaningStats,
        kpis: KpiSummary,
        sensor_key: String,
    },
    /// The file was read but every row was discarded.
    NoValidRows { stats: CleaningStats },
    /// The file could not be read or its cleaned copy could not be written.
    Failed { error: CleanerError },
}

#[derive(Debug)]
pub struct FileOutcome {
    pub input: PathBuf,
    pub output: PathBuf,
    pub status: FileStatus,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub files: Vec<FileOutcome>,
    pub report_path: Option<PathBuf>,
    pub boxplot_path: Option<PathBuf>,
    pub sensors: SensorSeries,
}

impl RunSummary {
    /// True when discovery found no raw files at all.
    pub fn no_input(&self) -> bool {
        self.files.is_empty()
    }

    pub fn cleaned_count(&self) -> usize {
        self.count(|status| matches!(status, FileStatus::Cleaned { .. }))
    }

    pub fn empty_count(&self) -> usize {
        self.count(|status| matches!(status, FileStatus::NoValidRows { .. }))
    }

    pub fn failed_count(&self) -> usize {
        self.count(|status| matches!(status, FileStatus::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&FileStatus) -> bool) -> usize {
        self.files.iter().filter(|f| pred(&f.status)).count()
    }
}

/// Runs discovery, cleaning, KPIs, reporting and plotting over the configured directories.
///
/// Files are processed one after another. A file that cannot be read or written is
/// recorded as failed and the run moves on, unless `fail_fast` is set.
pub fn run(config: &PipelineConfig) -> Result<RunSummary> {
    config.validate()?;
    ensure_dirs(&[
        &config.input_dir,
        &config.processed_dir,
        &config.plots_dir,
        &config.reports_dir,
    ])?;

    let raw_files = list_raw_csvs(&config.input_dir, &config.pattern)?;
    let mut summary = RunSummary::default();
    if raw_files.is_empty() {
        warn!(dir = %config.input_dir.display(), "no raw CSV files found");
        return Ok(summary);
    }

    let options = config.cleaner_options();
    let mut report_rows = Vec::new();

    for input in raw_files {
        let output = config.processed_dir.join(clean_name(&input));
        let input_name = file_name(&input);
        let output_name = file_name(&output);

        let cleaned = match clean_file(&input, &output, &options) {
            Ok(cleaned) => cleaned,
            Err(error) if config.fail_fast => return Err(error.into()),
            Err(error) => {
                warn!(input = %input.display(), %error, "skipping unreadable file");
                summary.files.push(FileOutcome {
                    input,
                    output,
                    status: FileStatus::Failed { error },
                });
                continue;
            }
        };

        let temperatures = cleaned.temperatures();
        let kpis = compute_kpis(&temperatures, config.alert_threshold);
        report_rows.push(ReportRow::new(
            input_name,
            output_name,
            &cleaned.stats,
            &kpis,
        ));

        if cleaned.is_empty() {
            warn!(
                input = %input.display(),
                total_rows = cleaned.stats.total_rows,
                "no valid rows"
            );
            summary.files.push(FileOutcome {
                input,
                output,
                status: FileStatus::NoValidRows {
                    stats: cleaned.stats,
                },
            });
            continue;
        }

        info!(
            input = %input.display(),
            total_rows = cleaned.stats.total_rows,
            valid_rows = cleaned.stats.valid_rows,
            discard_pct = cleaned.stats.discard_pct(),
            alerts = kpis.alert_count,
            "cleaned file"
        );

        if config.plots.enabled {
            render_file_plots(config, &output, &cleaned, &temperatures);
        }

        let key = sensor_key(&stem(&output));
        summary.sensors.extend(&key, &temperatures);
        summary.files.push(FileOutcome {
            input,
            output,
            status: FileStatus::Cleaned {
                stats: cleaned.stats,
                kpis,
                sensor_key: key,
            },
        });
    }

    if !report_rows.is_empty() {
        let report_path = config.report_path();
        write_report(&report_path, &report_rows)?;
        info!(path = %report_path.display(), rows = report_rows.len(), "wrote KPI report");
        summary.report_path = Some(report_path);
    }

    if config.plots.enabled && !summary.sensors.is_empty() {
        let boxplot_path = config.plots_dir.join(BOXPLOT_FILE_NAME);
        match plot_boxplot_by_sensor(&summary.sensors, &boxplot_path) {
            Ok(()) => {
                info!(path = %boxplot_path.display(), sensors = summary.sensors.len(), "wrote boxplot");
                summary.boxplot_path = Some(boxplot_path);
            }
            Err(error) => warn!(path = %boxplot_path.display(), %error, "boxplot failed"),
        }
    }

    Ok(summary)
}

/// Chart failures are logged and never affect the cleaned data or the report.
fn render_file_plots(
    config: &PipelineConfig,
    output: &Path,
    cleaned: &CleanedFile,
    temperatures: &[f64],
) {
    let stem = safe_stem(output);
    let name = file_name(output);
    let line_path = config
        .plots_dir
        .join(line_file_name(&stem, config.alert_threshold));
    if let Err(error) = plot_temperature_line(
        &cleaned.samples,
        config.alert_threshold,
        &line_title(&name),
        &line_path,
    ) {
        warn!(path = %line_path.display(), %error, "line chart failed");
    } else {
        debug!(path = %line_path.display(), "wrote line chart");
    }

    let hist_path = config.plots_dir.join(hist_file_name(&stem));
    if let Err(error) = plot_temperature_hist(
        temperatures,
        config.plots.histogram_bins,
        &hist_title(&name),
        &hist_path,
    ) {
        warn!(path = %hist_path.display(), %error, "histogram failed");
    } else {
        debug!(path = %hist_path.display(), "wrote histogram");
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

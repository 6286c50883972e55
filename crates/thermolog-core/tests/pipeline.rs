use anyhow::Result;
use std::fs;
use std::path::Path;

use thermolog_core::{
    config::PipelineConfig,
    pipeline::{run, FileStatus},
    report::REPORT_FILE_NAME,
    PipelineError,
};
use thermolog_parser::CleanerError;

fn fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../thermolog-parser/tests/data")
        .join(name);
    fs::read_to_string(path).expect("read fixture")
}

fn stage(config: &PipelineConfig, name: &str, content: &str) {
    fs::create_dir_all(&config.input_dir).expect("create raw dir");
    fs::write(config.input_dir.join(name), content).expect("write raw file");
}

fn quiet_config(root: &Path) -> PipelineConfig {
    let mut config = PipelineConfig::rooted_at(root);
    config.plots.enabled = false;
    config
}

#[test]
fn empty_input_directory_produces_no_artifacts() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = quiet_config(dir.path());

    let summary = run(&config)?;

    assert!(summary.no_input());
    assert!(summary.report_path.is_none());
    assert!(summary.boxplot_path.is_none());
    assert!(config.input_dir.is_dir());
    assert!(config.processed_dir.is_dir());
    assert!(config.plots_dir.is_dir());
    assert!(config.reports_dir.is_dir());
    assert!(!config.report_path().exists());
    Ok(())
}

#[test]
fn cleans_every_file_and_writes_report() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = quiet_config(dir.path());
    stage(&config, "voltaje_sensor_1007.csv", &fixture("voltaje_sensor_1007.csv"));
    stage(&config, "semicolon_day_first.csv", &fixture("semicolon_day_first.csv"));
    stage(&config, "notes.txt", "ignored");

    let summary = run(&config)?;

    assert_eq!(summary.files.len(), 2);
    assert_eq!(summary.cleaned_count(), 2);
    assert_eq!(summary.failed_count(), 0);
    assert_eq!(
        summary.report_path.as_deref(),
        Some(config.reports_dir.join(REPORT_FILE_NAME).as_path())
    );

    let cleaned = fs::read_to_string(config.processed_dir.join("voltaje_sensor_1007.csv"))?;
    assert_eq!(cleaned.lines().count(), 5);
    assert!(cleaned.starts_with("timestamp,voltage_V,temperatura\n"));

    let keys: Vec<&str> = summary.sensors.iter().map(|(key, _)| key).collect();
    assert_eq!(keys, vec!["semicolon_day_first", "S-1007"]);
    assert_eq!(summary.sensors.get("S-1007").map(<[f64]>::len), Some(4));

    let report = fs::read_to_string(config.report_path())?;
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("semicolon_day_first.csv,semicolon_day_first.csv,4,2,1,1,50.0,2,"));
    assert!(lines[2].starts_with("voltaje_sensor_1007.csv,voltaje_sensor_1007.csv,8,4,2,2,50.0,4,-30.0,120.0,"));
    assert!(lines[2].ends_with(",2,50.0"));
    Ok(())
}

#[test]
fn file_without_valid_rows_gets_report_row_only() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = quiet_config(dir.path());
    stage(
        &config,
        "voltaje_sensor_9.csv",
        "timestamp,voltage_V\nnot-a-date,1.0\n2024-01-01T00:00:00,NaN\n",
    );

    let summary = run(&config)?;

    assert_eq!(summary.empty_count(), 1);
    match &summary.files[0].status {
        FileStatus::NoValidRows { stats } => {
            assert_eq!(stats.total_rows, 2);
            assert_eq!(stats.bad_timestamp_count, 1);
            assert_eq!(stats.bad_value_count, 1);
        }
        other => panic!("unexpected status: {other:?}"),
    }
    assert!(summary.sensors.is_empty());
    assert!(summary.boxplot_path.is_none());

    let report = fs::read_to_string(config.report_path())?;
    assert!(report.contains("voltaje_sensor_9.csv,voltaje_sensor_9.csv,2,0,1,1,100.0,0,,,,0,0.0"));
    Ok(())
}

#[test]
fn unreadable_file_is_recorded_and_run_continues() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = quiet_config(dir.path());
    stage(&config, "a_single_column.csv", &fixture("single_column.csv"));
    stage(&config, "voltaje_sensor_1007.csv", &fixture("voltaje_sensor_1007.csv"));

    let summary = run(&config)?;

    assert_eq!(summary.failed_count(), 1);
    assert_eq!(summary.cleaned_count(), 1);
    assert!(matches!(
        summary.files[0].status,
        FileStatus::Failed {
            error: CleanerError::UndetectableDelimiter { .. }
        }
    ));
    assert!(!summary.files[0].output.exists());

    let report = fs::read_to_string(config.report_path())?;
    assert_eq!(report.lines().count(), 2);
    Ok(())
}

#[test]
fn fail_fast_aborts_on_first_unreadable_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut config = quiet_config(dir.path());
    config.fail_fast = true;
    stage(&config, "a_single_column.csv", &fixture("single_column.csv"));
    stage(&config, "voltaje_sensor_1007.csv", &fixture("voltaje_sensor_1007.csv"));

    let err = run(&config).unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Cleaner(CleanerError::UndetectableDelimiter { .. })
    ));
    assert!(!config.processed_dir.join("voltaje_sensor_1007.csv").exists());
    assert!(!config.report_path().exists());
    Ok(())
}

#[test]
fn renders_per_file_charts_and_boxplot() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = PipelineConfig::rooted_at(dir.path());
    stage(&config, "voltaje_sensor_1007.csv", &fixture("voltaje_sensor_1007.csv"));

    let summary = run(&config)?;

    assert!(config
        .plots_dir
        .join("voltaje_sensor_1007__volt_line__80.0.png")
        .exists());
    assert!(config.plots_dir.join("voltaje_sensor_1007__volt_hist.png").exists());
    let boxplot = summary.boxplot_path.expect("boxplot rendered");
    assert_eq!(boxplot, config.plots_dir.join("boxplot_todos_sensores.png"));
    assert!(boxplot.exists());
    Ok(())
}

#[test]
fn invalid_configuration_is_rejected_before_touching_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = quiet_config(dir.path());
    config.alert_threshold = f64::NAN;

    let err = run(&config).unwrap_err();

    assert!(matches!(err, PipelineError::Config(_)));
    assert!(!config.input_dir.exists());
}

#[test]
fn processed_dir_shared_with_input_leaves_raw_files_alone() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut config = quiet_config(dir.path());
    let raw = fixture("voltaje_sensor_1007.csv");
    stage(&config, "voltaje_sensor_1007.csv", &raw);
    config.processed_dir = config.input_dir.clone();

    let err = run(&config).unwrap_err();

    assert!(matches!(err, PipelineError::Config(_)));
    assert_eq!(
        fs::read_to_string(config.input_dir.join("voltaje_sensor_1007.csv"))?,
        raw
    );
    Ok(())
}

#[test]
fn boxplot_failure_keeps_summary_and_report() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = PipelineConfig::rooted_at(dir.path());
    stage(&config, "voltaje_sensor_1007.csv", &fixture("voltaje_sensor_1007.csv"));
    fs::create_dir_all(config.plots_dir.join("boxplot_todos_sensores.png"))?;

    let summary = run(&config)?;

    assert!(summary.boxplot_path.is_none());
    assert_eq!(summary.cleaned_count(), 1);
    assert_eq!(summary.sensors.len(), 1);
    assert!(config.report_path().exists());
    Ok(())
}

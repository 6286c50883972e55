use std::fs;
use std::path::Path;

use serde::Serialize;
use thermolog_parser::CleaningStats;

use crate::error::{PipelineError, Result};
use crate::kpi::KpiSummary;

pub const REPORT_FILE_NAME: &str = "kpis_por_archivo.csv";

/// One report line per processed input file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    #[serde(rename = "archivo")]
    pub input_name: String,
    #[serde(rename = "salida")]
    pub output_name: String,
    #[serde(rename = "filas_totales")]
    pub total_rows: usize,
    #[serde(rename = "filas_validas")]
    pub valid_rows: usize,
    #[serde(rename = "descartes_timestamp")]
    pub bad_timestamp_count: usize,
    #[serde(rename = "descartes_valor")]
    pub bad_value_count: usize,
    #[serde(rename = "%descartadas")]
    pub discard_pct: f64,
    pub n: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    #[serde(rename = "prom")]
    pub mean: Option<f64>,
    #[serde(rename = "alerts")]
    pub alert_count: usize,
    #[serde(rename = "alerts_pct")]
    pub alert_pct: f64,
}

impl ReportRow {
    pub fn new(
        input_name: impl Into<String>,
        output_name: impl Into<String>,
        stats: &CleaningStats,
        kpis: &KpiSummary,
    ) -> Self {
        Self {
            input_name: input_name.into(),
            output_name: output_name.into(),
            total_rows: stats.total_rows,
            valid_rows: stats.valid_rows,
            bad_timestamp_count: stats.bad_timestamp_count,
            bad_value_count: stats.bad_value_count,
            discard_pct: stats.discard_pct(),
            n: kpis.n,
            min: kpis.min,
            max: kpis.max,
            mean: kpis.mean,
            alert_count: kpis.alert_count,
            alert_pct: kpis.alert_pct,
        }
    }
}

pub fn write_report(path: &Path, rows: &[ReportRow]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| PipelineError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let report_err = |source: csv::Error| PipelineError::Report {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::Writer::from_path(path).map_err(report_err)?;
    for row in rows {
        writer.serialize(row).map_err(report_err)?;
    }
    writer.flush().map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

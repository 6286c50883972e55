//! PNG charts of cleaned temperature series.
//!
//! Text is rendered with an embedded DejaVu Sans face registered under
//! `sans-serif`, so charts never depend on system fonts.

use std::fmt::Display;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use chrono::{Duration, NaiveDateTime};
use plotters::prelude::*;
use plotters::style::register_font;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use thermolog_parser::ParsedSample;
use thiserror::Error;

use crate::sensors::SensorSeries;

#[derive(Error, Debug)]
pub enum PlotError {
    #[error("IO error on '{}': {source}", path.display())]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Rendering error: {0}")]
    Render(String),

    #[error("Embedded chart font could not be loaded")]
    Font,

    #[error("No data to plot")]
    NoData,
}

pub type Result<T> = std::result::Result<T, PlotError>;

pub const BOXPLOT_FILE_NAME: &str = "boxplot_todos_sensores.png";
pub const BOXPLOT_TITLE: &str = "Boxplot de Temperatura por Sensor";

const FONT_FAMILY: &str = "sans-serif";
static EMBEDDED_FONT: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

const LINE_SIZE: (u32, u32) = (1350, 600);
const HIST_SIZE: (u32, u32) = (900, 600);
/// Above this many sensors the boxplot is laid out horizontally.
const HORIZONTAL_BOXPLOT_AFTER: usize = 10;

const SERIES_COLOR: RGBColor = RGBColor(31, 119, 180);
const ALERT_COLOR: RGBColor = RGBColor(244, 4, 4);
const THRESHOLD_COLOR: RGBColor = RGBColor(255, 127, 14);
const MEAN_COLOR: RGBColor = RGBColor(44, 160, 44);

const TEMPERATURE_AXIS: &str = "Temperatura (°C)";

pub fn line_file_name(stem: &str, threshold: f64) -> String {
    format!("{stem}__volt_line__{threshold:.1}.png")
}

pub fn hist_file_name(stem: &str) -> String {
    format!("{stem}__volt_hist.png")
}

pub fn line_title(file_name: &str) -> String {
    format!("Temperatura vs Tiempo - {file_name}")
}

pub fn hist_title(file_name: &str) -> String {
    format!("Histograma Temperatura - {file_name}")
}

/// Registers the embedded font once per process.
fn ensure_font() -> Result<()> {
    static REGISTERED: OnceLock<bool> = OnceLock::new();
    let ok = *REGISTERED
        .get_or_init(|| register_font(FONT_FAMILY, FontStyle::Normal, EMBEDDED_FONT).is_ok());
    if ok {
        Ok(())
    } else {
        Err(PlotError::Font)
    }
}

fn render_err<E: Display>(err: E) -> PlotError {
    PlotError::Render(err.to_string())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| PlotError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

/// Padded `(min, max)` of the values; a flat series is widened by one unit each side.
fn padded_bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        return None;
    }
    if (max - min).abs() < f64::EPSILON {
        return Some((min - 1.0, max + 1.0));
    }
    let pad = (max - min) * 0.05;
    Some((min - pad, max + pad))
}

/// Wall-clock `HH:MM:SS` of a point `offset_secs` after `start`.
pub fn time_label(start: NaiveDateTime, offset_secs: f64) -> String {
    let offset = Duration::milliseconds((offset_secs * 1000.0).round() as i64);
    (start + offset).format("%H:%M:%S").to_string()
}

pub fn alert_label(temperature: f64) -> String {
    format!("{temperature:.2}°C")
}

/// Tick text for a segmented sensor axis.
pub fn segment_label(names: &[&str], value: &SegmentValue<u32>) -> String {
    match value {
        SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => names
            .get(*i as usize)
            .map(|name| name.to_string())
            .unwrap_or_default(),
        SegmentValue::Last => String::new(),
    }
}

/// Temperature over time with a dashed threshold line and labelled alert points.
///
/// The x axis is seconds since the first sample, printed as wall-clock time.
pub fn plot_temperature_line(
    samples: &[ParsedSample],
    threshold: f64,
    title: &str,
    out: &Path,
) -> Result<()> {
    let first = samples.first().ok_or(PlotError::NoData)?;
    let start = first.timestamp;
    let points: Vec<(f64, f64)> = samples
        .iter()
        .map(|s| {
            let offset = (s.timestamp - start).num_milliseconds() as f64 / 1000.0;
            (offset, s.temperature)
        })
        .collect();

    let (x_min, x_max) = padded_bounds(points.iter().map(|p| p.0)).ok_or(PlotError::NoData)?;
    let (y_min, y_max) = padded_bounds(
        points
            .iter()
            .map(|p| p.1)
            .chain(std::iter::once(threshold)),
    )
    .ok_or(PlotError::NoData)?;

    ensure_font()?;
    ensure_parent(out)?;
    let root = BitMapBackend::new(out, LINE_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, (FONT_FAMILY, 22))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(render_err)?;

    let x_formatter = |x: &f64| time_label(start, *x);
    chart
        .configure_mesh()
        .x_desc("Tiempo")
        .y_desc(TEMPERATURE_AXIS)
        .x_label_formatter(&x_formatter)
        .draw()
        .map_err(render_err)?;

    chart
        .draw_series(LineSeries::new(points.iter().copied(), &SERIES_COLOR))
        .map_err(render_err)?
        .label(TEMPERATURE_AXIS)
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &SERIES_COLOR));

    chart
        .draw_series(DashedLineSeries::new(
            vec![(x_min, threshold), (x_max, threshold)],
            10,
            6,
            THRESHOLD_COLOR.stroke_width(2),
        ))
        .map_err(render_err)?
        .label(format!("Umbral {threshold:.1} °C"))
        .legend(|(x, y)| {
            PathElement::new(vec![(x, y), (x + 20, y)], THRESHOLD_COLOR.stroke_width(2))
        });

    let annotation = TextStyle::from((FONT_FAMILY, 12).into_font())
        .pos(Pos::new(HPos::Center, VPos::Bottom));
    chart
        .draw_series(points.iter().filter(|(_, t)| *t > threshold).map(|&(x, t)| {
            EmptyElement::at((x, t))
                + Circle::new((0, 0), 4, ALERT_COLOR.filled())
                + Text::new(alert_label(t), (0, -8), annotation.clone())
        }))
        .map_err(render_err)?
        .label(format!("Alertas (> {threshold:.1} °C)"))
        .legend(|(x, y)| Circle::new((x + 10, y), 4, ALERT_COLOR.filled()));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font((FONT_FAMILY, 14))
        .draw()
        .map_err(render_err)?;

    root.present().map_err(render_err)?;
    Ok(())
}

/// Equal-width bins over `[start, start + width * counts.len()]`.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBins {
    pub start: f64,
    pub width: f64,
    pub counts: Vec<u32>,
}

impl HistogramBins {
    pub fn end(&self) -> f64 {
        self.start + self.width * self.counts.len() as f64
    }
}

/// Counts per equal-width bin over `[min, max]`; the maximum lands in the last bin.
pub fn histogram_bins(values: &[f64], bins: usize) -> HistogramBins {
    let bins = bins.max(1);
    let mut counts = vec![0u32; bins];
    if values.is_empty() {
        return HistogramBins {
            start: 0.0,
            width: 1.0,
            counts,
        };
    }
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let width = if max > min {
        (max - min) / bins as f64
    } else {
        1.0
    };
    for v in values {
        let idx = (((v - min) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }
    HistogramBins {
        start: min,
        width,
        counts,
    }
}

pub fn plot_temperature_hist(
    temperatures: &[f64],
    bins: usize,
    title: &str,
    out: &Path,
) -> Result<()> {
    if temperatures.is_empty() {
        return Err(PlotError::NoData);
    }
    let hist = histogram_bins(temperatures, bins);
    let y_max = hist.counts.iter().copied().max().unwrap_or(0) + 1;

    ensure_font()?;
    ensure_parent(out)?;
    let root = BitMapBackend::new(out, HIST_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, (FONT_FAMILY, 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(hist.start..hist.end(), 0u32..y_max)
        .map_err(render_err)?;
    chart
        .configure_mesh()
        .x_desc(TEMPERATURE_AXIS)
        .y_desc("Frecuencia")
        .draw()
        .map_err(render_err)?;

    let gap = hist.width * 0.02;
    chart
        .draw_series(hist.counts.iter().enumerate().map(|(i, count)| {
            let left = hist.start + hist.width * i as f64;
            Rectangle::new(
                [(left + gap, 0), (left + hist.width - gap, *count)],
                SERIES_COLOR.filled(),
            )
        }))
        .map_err(render_err)?;

    root.present().map_err(render_err)?;
    Ok(())
}

/// One box per sensor in the series' key order, each labelled with its key and
/// marked at its mean.
pub fn plot_boxplot_by_sensor(series: &SensorSeries, out: &Path) -> Result<()> {
    if series.is_empty() {
        return Err(PlotError::NoData);
    }
    let (lo, hi) = padded_bounds(series.iter().flat_map(|(_, values)| values.iter().copied()))
        .ok_or(PlotError::NoData)?;
    let (lo, hi) = (lo as f32, hi as f32);
    let names: Vec<&str> = series.iter().map(|(key, _)| key).collect();
    let means: Vec<f32> = series
        .iter()
        .map(|(_, values)| (values.iter().sum::<f64>() / values.len() as f64) as f32)
        .collect();
    let count = names.len();
    let keys = 0u32..count as u32;
    let key_formatter = |value: &SegmentValue<u32>| segment_label(&names, value);

    ensure_font()?;
    ensure_parent(out)?;
    if count > HORIZONTAL_BOXPLOT_AFTER {
        let size = (800, (count as u32 * 60).max(600));
        let root = BitMapBackend::new(out, size).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(BOXPLOT_TITLE, (FONT_FAMILY, 20))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(120)
            .build_cartesian_2d(lo..hi, keys.into_segmented())
            .map_err(render_err)?;
        chart
            .configure_mesh()
            .disable_y_mesh()
            .y_labels(count)
            .y_label_formatter(&key_formatter)
            .x_desc(TEMPERATURE_AXIS)
            .y_desc("Sensor")
            .draw()
            .map_err(render_err)?;
        chart
            .draw_series(series.iter().enumerate().map(|(i, (_, values))| {
                Boxplot::new_horizontal(SegmentValue::CenterOf(i as u32), &Quartiles::new(values))
                    .width(20)
                    .style(&SERIES_COLOR)
            }))
            .map_err(render_err)?;
        chart
            .draw_series(means.iter().enumerate().map(|(i, mean)| {
                Cross::new((*mean, SegmentValue::CenterOf(i as u32)), 5, MEAN_COLOR)
            }))
            .map_err(render_err)?;
        root.present().map_err(render_err)?;
    } else {
        let size = ((count as u32 * 80).max(800), 500);
        let root = BitMapBackend::new(out, size).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(BOXPLOT_TITLE, (FONT_FAMILY, 20))
            .margin(10)
            .x_label_area_size(50)
            .y_label_area_size(60)
            .build_cartesian_2d(keys.into_segmented(), lo..hi)
            .map_err(render_err)?;
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(count)
            .x_label_formatter(&key_formatter)
            .x_desc("Sensor")
            .y_desc(TEMPERATURE_AXIS)
            .draw()
            .map_err(render_err)?;
        chart
            .draw_series(series.iter().enumerate().map(|(i, (_, values))| {
                Boxplot::new_vertical(SegmentValue::CenterOf(i as u32), &Quartiles::new(values))
                    .width(20)
                    .style(&SERIES_COLOR)
            }))
            .map_err(render_err)?;
        chart
            .draw_series(means.iter().enumerate().map(|(i, mean)| {
                Cross::new((SegmentValue::CenterOf(i as u32), *mean), 5, MEAN_COLOR)
            }))
            .map_err(render_err)?;
        root.present().map_err(render_err)?;
    }
    Ok(())
}

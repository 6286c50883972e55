use serde::Serialize;
use thermolog_parser::round_pct;

/// Summary of a temperature series against an alert threshold.
///
/// `min`, `max` and `mean` are `None` for an empty series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KpiSummary {
    pub n: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub alert_count: usize,
    pub alert_pct: f64,
}

pub fn compute_kpis(values: &[f64], threshold: f64) -> KpiSummary {
    let n = values.len();
    if n == 0 {
        return KpiSummary {
            n,
            min: None,
            max: None,
            mean: None,
            alert_count: 0,
            alert_pct: 0.0,
        };
    }

    let (min, max, sum) = values.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY, 0.0),
        |(min, max, sum), &v| (min.min(v), max.max(v), sum + v),
    );
    let alert_count = values.iter().filter(|&&v| v > threshold).count();

    KpiSummary {
        n,
        min: Some(min),
        max: Some(max),
        mean: Some(sum / n as f64),
        alert_count,
        alert_pct: round_pct(alert_count as f64 / n as f64 * 100.0),
    }
}

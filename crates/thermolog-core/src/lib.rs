pub mod config;
pub mod discovery;
pub mod error;
pub mod kpi;
pub mod pipeline;
pub mod plots;
pub mod report;
pub mod sensors;

pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use kpi::{compute_kpis, KpiSummary};
pub use pipeline::{run, FileOutcome, FileStatus, RunSummary};
pub use sensors::{sensor_key, SensorSeries};

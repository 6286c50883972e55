use serde::{Deserialize, Serialize};

use crate::errors::CalibrationError;

pub const DEFAULT_V1: f64 = 0.4;
pub const DEFAULT_T1: f64 = -30.0;
pub const DEFAULT_V2: f64 = 5.6;
pub const DEFAULT_T2: f64 = 120.0;

/// Linear voltage to temperature mapping through two anchor points.
///
/// Values outside the anchor range are extrapolated, never clamped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CalibrationAnchors", into = "CalibrationAnchors")]
pub struct Calibration {
    v1: f64,
    t1: f64,
    v2: f64,
    t2: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct CalibrationAnchors {
    #[serde(default = "default_v1")]
    v1: f64,
    #[serde(default = "default_t1")]
    t1: f64,
    #[serde(default = "default_v2")]
    v2: f64,
    #[serde(default = "default_t2")]
    t2: f64,
}

fn default_v1() -> f64 {
    DEFAULT_V1
}

fn default_t1() -> f64 {
    DEFAULT_T1
}

fn default_v2() -> f64 {
    DEFAULT_V2
}

fn default_t2() -> f64 {
    DEFAULT_T2
}

impl Calibration {
    pub fn new(v1: f64, t1: f64, v2: f64, t2: f64) -> Result<Self, CalibrationError> {
        for (name, value) in [("v1", v1), ("t1", t1), ("v2", v2), ("t2", t2)] {
            if !value.is_finite() {
                return Err(CalibrationError::NonFinite { name, value });
            }
        }
        if v1 == v2 {
            return Err(CalibrationError::DegenerateVoltage { voltage: v1 });
        }
        Ok(Self { v1, t1, v2, t2 })
    }

    pub fn apply(&self, voltage: f64) -> f64 {
        self.t1 + (self.t2 - self.t1) * (voltage - self.v1) / (self.v2 - self.v1)
    }

    pub fn anchors(&self) -> [(f64, f64); 2] {
        [(self.v1, self.t1), (self.v2, self.t2)]
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            v1: DEFAULT_V1,
            t1: DEFAULT_T1,
            v2: DEFAULT_V2,
            t2: DEFAULT_T2,
        }
    }
}

impl TryFrom<CalibrationAnchors> for Calibration {
    type Error = CalibrationError;

    fn try_from(value: CalibrationAnchors) -> Result<Self, Self::Error> {
        Calibration::new(value.v1, value.t1, value.v2, value.t2)
    }
}

impl From<Calibration> for CalibrationAnchors {
    fn from(value: Calibration) -> Self {
        Self {
            v1: value.v1,
            t1: value.t1,
            v2: value.v2,
            t2: value.t2,
        }
    }
}

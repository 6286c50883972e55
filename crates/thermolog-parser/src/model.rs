use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One delimited record viewed through the configured column names.
///
/// A field is `None` when the column is absent from the header or the record
/// is too short to reach it. An empty cell is `Some("")`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSample<'a> {
    pub timestamp: Option<&'a str>,
    pub value: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParsedSample {
    pub timestamp: NaiveDateTime,
    pub voltage: f64,
    pub temperature: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RowOutcome {
    Valid(ParsedSample),
    BadTimestamp,
    BadValue,
}

impl RowOutcome {
    pub fn sample(&self) -> Option<&ParsedSample> {
        match self {
            RowOutcome::Valid(sample) => Some(sample),
            RowOutcome::BadTimestamp | RowOutcome::BadValue => None,
        }
    }
}

/// Row accounting for one cleaned file.
///
/// Every row lands in exactly one bucket, so
/// `valid_rows + bad_timestamp_count + bad_value_count == total_rows`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningStats {
    pub total_rows: usize,
    pub valid_rows: usize,
    pub bad_timestamp_count: usize,
    pub bad_value_count: usize,
}

impl CleaningStats {
    pub fn record(&mut self, outcome: &RowOutcome) {
        self.total_rows += 1;
        match outcome {
            RowOutcome::Valid(_) => self.valid_rows += 1,
            RowOutcome::BadTimestamp => self.bad_timestamp_count += 1,
            RowOutcome::BadValue => self.bad_value_count += 1,
        }
    }

    pub fn discarded_rows(&self) -> usize {
        self.bad_timestamp_count + self.bad_value_count
    }

    /// Percentage of discarded rows rounded to two decimals, `0.0` for an empty file.
    pub fn discard_pct(&self) -> f64 {
        if self.total_rows == 0 {
            return 0.0;
        }
        round_pct(self.discarded_rows() as f64 / self.total_rows as f64 * 100.0)
    }
}

impl<'a> FromIterator<&'a RowOutcome> for CleaningStats {
    fn from_iter<I: IntoIterator<Item = &'a RowOutcome>>(iter: I) -> Self {
        iter.into_iter().fold(Self::default(), |mut stats, outcome| {
            stats.record(outcome);
            stats
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct CleanedFile {
    pub samples: Vec<ParsedSample>,
    pub stats: CleaningStats,
}

impl CleanedFile {
    pub fn temperatures(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.temperature).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Rounds to two decimals, ties to even on the exact binary value.
pub fn round_pct(value: f64) -> f64 {
    format!("{value:.2}").parse().unwrap_or(value)
}

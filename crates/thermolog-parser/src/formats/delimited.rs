use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use csv::StringRecord;

use crate::errors::CleanerError;
use crate::model::RawSample;

const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];
const UTF8_BOM: char = '\u{feff}';

/// Picks the delimiter that occurs most often on the first non-blank line.
pub fn detect_delimiter(path: &Path) -> Result<u8, CleanerError> {
    let file = File::open(path).map_err(|source| CleanerError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    for line in BufReader::new(file).lines() {
        let line = line.map_err(|source| CleanerError::Inspect {
            path: path.to_path_buf(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        return sniff_line(&line).ok_or_else(|| CleanerError::UndetectableDelimiter {
            path: path.to_path_buf(),
        });
    }

    Err(CleanerError::UndetectableDelimiter {
        path: path.to_path_buf(),
    })
}

pub fn sniff_line(line: &str) -> Option<u8> {
    let mut best: Option<(u8, usize)> = None;
    for delimiter in CANDIDATE_DELIMITERS {
        let count = line.bytes().filter(|b| *b == delimiter).count();
        if count == 0 {
            continue;
        }
        match best {
            Some((_, best_count)) if best_count >= count => {}
            _ => best = Some((delimiter, count)),
        }
    }
    best.map(|(delimiter, _)| delimiter)
}

/// Header positions of the timestamp column and the ordered value candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    timestamp: Option<usize>,
    value_candidates: Vec<usize>,
}

impl ColumnLayout {
    pub fn resolve(header: &StringRecord, timestamp: &str, value_candidates: &[String]) -> Self {
        let names: Vec<&str> = header
            .iter()
            .map(|name| name.trim_start_matches(UTF8_BOM).trim())
            .collect();
        let position = |wanted: &str| names.iter().position(|name| *name == wanted);

        Self {
            timestamp: position(timestamp),
            value_candidates: value_candidates
                .iter()
                .filter_map(|candidate| position(candidate.as_str()))
                .collect(),
        }
    }

    pub fn has_timestamp(&self) -> bool {
        self.timestamp.is_some()
    }

    pub fn has_value(&self) -> bool {
        !self.value_candidates.is_empty()
    }

    /// The first candidate present in this record wins, even when its cell is empty.
    pub fn sample<'r>(&self, record: &'r StringRecord) -> RawSample<'r> {
        RawSample {
            timestamp: self.timestamp.and_then(|idx| record.get(idx)),
            value: self
                .value_candidates
                .iter()
                .find_map(|idx| record.get(*idx)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates() -> Vec<String> {
        ["voltage_V", "voltaje", "value"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn sniffs_most_frequent_delimiter() {
        assert_eq!(sniff_line("timestamp,voltage_V"), Some(b','));
        assert_eq!(sniff_line("timestamp;voltaje;note"), Some(b';'));
        assert_eq!(sniff_line("timestamp\tvalue"), Some(b'\t'));
        assert_eq!(sniff_line("a|b|c,d"), Some(b'|'));
        assert_eq!(sniff_line("a,b;c"), Some(b','));
        assert_eq!(sniff_line("timestamp"), None);
    }

    #[test]
    fn resolves_candidates_in_configured_order() {
        let header = StringRecord::from(vec!["\u{feff}timestamp", "value", " voltaje "]);
        let layout = ColumnLayout::resolve(&header, "timestamp", &candidates());
        assert!(layout.has_timestamp());
        assert!(layout.has_value());

        let record = StringRecord::from(vec!["2024-01-01T00:00:00", "9.9", "1.5"]);
        let sample = layout.sample(&record);
        assert_eq!(sample.timestamp, Some("2024-01-01T00:00:00"));
        assert_eq!(sample.value, Some("1.5"));
    }

    #[test]
    fn empty_cell_still_counts_as_present() {
        let header = StringRecord::from(vec!["timestamp", "voltaje", "value"]);
        let layout = ColumnLayout::resolve(&header, "timestamp", &candidates());
        let record = StringRecord::from(vec!["2024-01-01T00:00:00", "", "3.0"]);
        assert_eq!(layout.sample(&record).value, Some(""));
    }

    #[test]
    fn short_record_falls_through_to_later_candidate() {
        let header = StringRecord::from(vec!["timestamp", "value", "voltage_V"]);
        let layout = ColumnLayout::resolve(&header, "timestamp", &candidates());
        let record = StringRecord::from(vec!["2024-01-01T00:00:00", "2.0"]);
        assert_eq!(layout.sample(&record).value, Some("2.0"));
    }

    #[test]
    fn missing_columns_resolve_to_none() {
        let header = StringRecord::from(vec!["time", "reading"]);
        let layout = ColumnLayout::resolve(&header, "timestamp", &candidates());
        assert!(!layout.has_timestamp());
        assert!(!layout.has_value());
        let record = StringRecord::from(vec!["x", "y"]);
        assert_eq!(
            layout.sample(&record),
            RawSample {
                timestamp: None,
                value: None
            }
        );
    }
}

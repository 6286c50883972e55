use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calibration::Calibration;
use crate::errors::CleanerError;
use crate::formats::{
    detect_delimiter, format_fixed3, format_timestamp, parse_timestamp, parse_value, ColumnLayout,
};
use crate::model::{CleanedFile, CleaningStats, ParsedSample, RawSample, RowOutcome};

pub const OUTPUT_HEADER: [&str; 3] = ["timestamp", "voltage_V", "temperatura"];

pub const DEFAULT_TIMESTAMP_COLUMN: &str = "timestamp";
pub const DEFAULT_VALUE_CANDIDATES: [&str; 3] = ["voltage_V", "voltaje", "value"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub timestamp: String,
    pub value_candidates: Vec<String>,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            timestamp: DEFAULT_TIMESTAMP_COLUMN.to_string(),
            value_candidates: DEFAULT_VALUE_CANDIDATES
                .iter()
                .map(|name| name.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanerOptions {
    pub columns: ColumnNames,
    pub calibration: Calibration,
}

/// Validates one row. The timestamp is checked first and a failure there
/// short-circuits, so the value is never looked at.
pub fn classify_row(raw: &RawSample<'_>, calibration: &Calibration) -> RowOutcome {
    let Some(timestamp) = raw.timestamp.and_then(parse_timestamp) else {
        return RowOutcome::BadTimestamp;
    };
    let Some(voltage) = parse_value(raw.value) else {
        return RowOutcome::BadValue;
    };
    RowOutcome::Valid(ParsedSample {
        timestamp,
        voltage,
        temperature: calibration.apply(voltage),
    })
}

/// Cleans `input` into `output`, returning the kept samples and row accounting.
///
/// Malformed rows are counted and skipped. File-system failures and inputs
/// whose delimiter cannot be determined are returned as errors.
pub fn clean_file(
    input: &Path,
    output: &Path,
    options: &CleanerOptions,
) -> Result<CleanedFile, CleanerError> {
    if same_file(input, output) {
        return Err(CleanerError::OutputIsInput {
            path: input.to_path_buf(),
        });
    }
    let delimiter = detect_delimiter(input)?;
    debug!(
        input = %input.display(),
        delimiter = %char::from(delimiter).escape_default(),
        "detected delimiter"
    );

    let source = File::open(input).map_err(|source| CleanerError::Open {
        path: input.to_path_buf(),
        source,
    })?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| CleanerError::CreateDirectory {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let sink = File::create(output).map_err(|source| CleanerError::Create {
        path: output.to_path_buf(),
        source,
    })?;

    clean_stream(
        BufReader::new(source),
        BufWriter::new(sink),
        delimiter,
        options,
        input,
        output,
    )
}

/// True when both paths resolve to the same existing file.
fn same_file(input: &Path, output: &Path) -> bool {
    match (fs::canonicalize(input), fs::canonicalize(output)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn clean_stream<R: Read, W: Write>(
    source: R,
    sink: W,
    delimiter: u8,
    options: &CleanerOptions,
    input: &Path,
    output: &Path,
) -> Result<CleanedFile, CleanerError> {
    let read_err = |source: csv::Error| CleanerError::Read {
        path: input.to_path_buf(),
        source,
    };
    let write_err = |source: csv::Error| CleanerError::Write {
        path: output.to_path_buf(),
        source,
    };

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(source);
    let mut writer = WriterBuilder::new().from_writer(sink);

    let header = StringRecord::from_byte_record_lossy(reader.byte_headers().map_err(read_err)?.clone());
    let layout = ColumnLayout::resolve(
        &header,
        &options.columns.timestamp,
        &options.columns.value_candidates,
    );
    if !layout.has_timestamp() {
        warn!(
            input = %input.display(),
            column = %options.columns.timestamp,
            "timestamp column not found; every row will be discarded"
        );
    } else if !layout.has_value() {
        warn!(
            input = %input.display(),
            candidates = ?options.columns.value_candidates,
            "no value column found; every row will be discarded"
        );
    }

    writer.write_record(OUTPUT_HEADER).map_err(write_err)?;

    let mut stats = CleaningStats::default();
    let mut samples = Vec::new();
    for result in reader.byte_records() {
        let record = StringRecord::from_byte_record_lossy(result.map_err(read_err)?);
        let outcome = classify_row(&layout.sample(&record), &options.calibration);
        stats.record(&outcome);

        if let RowOutcome::Valid(sample) = outcome {
            writer
                .write_record([
                    format_timestamp(&sample.timestamp),
                    format_fixed3(sample.voltage),
                    format_fixed3(sample.temperature),
                ])
                .map_err(write_err)?;
            samples.push(sample);
        }
    }

    writer.flush().map_err(|source| CleanerError::Flush {
        path: output.to_path_buf(),
        source,
    })?;

    Ok(CleanedFile { samples, stats })
}

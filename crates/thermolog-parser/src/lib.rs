pub mod calibration;
pub mod cleaner;
pub mod errors;
pub mod formats;
pub mod model;

pub use calibration::Calibration;
pub use cleaner::{
    classify_row, clean_file, CleanerOptions, ColumnNames, DEFAULT_TIMESTAMP_COLUMN,
    DEFAULT_VALUE_CANDIDATES, OUTPUT_HEADER,
};
pub use errors::{CalibrationError, CleanerError};
pub use model::{round_pct, CleanedFile, CleaningStats, ParsedSample, RawSample, RowOutcome};

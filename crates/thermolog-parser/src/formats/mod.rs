mod common;
mod delimited;

pub use common::{
    format_fixed3, format_timestamp, parse_timestamp, parse_value, DAY_FIRST_FORMAT, ISO_FORMAT,
    NA_TOKENS,
};
pub use delimited::{detect_delimiter, sniff_line, ColumnLayout};

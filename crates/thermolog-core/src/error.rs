// crates/thermolog-core/src/error.rs

use std::path::PathBuf;

use thermolog_parser::CleanerError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Cleaning failed: {0}")]
    Cleaner(#[from] CleanerError),

    #[error("File I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Could not parse configuration '{}': {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Could not serialize configuration: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Invalid discovery pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Could not read discovered path: {0}")]
    Glob(#[from] glob::GlobError),

    #[error("Report writing failed for '{}': {source}", path.display())]
    Report {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

pub type Result<T> = std::result::Result<T, PipelineError>;

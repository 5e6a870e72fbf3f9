//! Error types for pet-denoise
//!
//! Defines all error types used throughout the library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for pet-denoise operations
#[derive(Debug, Error)]
pub enum PetDenoiseError {
    /// Restriction site loading errors
    #[error("Restriction site error: {0}")]
    SiteLoad(#[from] SiteLoadError),

    /// BEDPE parsing errors
    #[error("BEDPE parse error: {0}")]
    BedpeParse(#[from] BedpeParseError),

    /// Noise reduction pipeline errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while loading restriction sites
#[derive(Debug, Error)]
pub enum SiteLoadError {
    /// The source held no restriction sites at all
    #[error("No restriction sites found in source")]
    Empty,

    /// Malformed site record
    #[error("Invalid restriction site record at line {line}: {message}")]
    InvalidLine { line: usize, message: String },

    /// The first site defines a zero length restriction sequence
    #[error("Restriction site length must be greater than 0, got {0}")]
    InvalidSiteLength(u64),

    /// Sites file not found
    #[error("Restriction site file not found: {0}")]
    FileNotFound(PathBuf),

    /// I/O error during loading
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised when assigning an interval to a restriction fragment
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocateError {
    /// The interval is too short for its two search points to be ordered
    #[error(
        "Interval {start}-{end} is too short for restriction site length {rest_site_len}: \
         start must be < end - rest_site_len - 1"
    )]
    IntervalTooShort {
        start: u64,
        end: u64,
        rest_site_len: u64,
    },
}

/// Errors raised while classifying one pair
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
    /// Chromosome absent from the restriction site index
    #[error("Chromosome not found in restriction sites: {0}")]
    UnknownChromosome(String),

    /// Fragment assignment contract violation
    #[error(transparent)]
    Locate(#[from] LocateError),
}

/// BEDPE parsing error
#[derive(Debug, Error)]
pub enum BedpeParseError {
    #[error("Empty line")]
    EmptyLine,

    #[error("Too few fields: expected at least {expected}, found {found}")]
    TooFewFields { expected: usize, found: usize },

    #[error("Invalid UTF-8 in field: {0}")]
    InvalidUtf8(&'static str),

    #[error("Invalid number in field {0}: {1}")]
    InvalidNumber(&'static str, String),

    #[error("Line {line}: {source}")]
    AtLine {
        line: usize,
        #[source]
        source: Box<BedpeParseError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BedpeParseError {
    /// Attach a 1-based line number to a parse error
    pub fn at_line(self, line: usize) -> Self {
        BedpeParseError::AtLine {
            line,
            source: Box::new(self),
        }
    }
}

/// Errors that abort a noise reduction run
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input record could not be parsed
    #[error(transparent)]
    Parse(#[from] BedpeParseError),

    /// A record violated the fragment assignment contract
    #[error("Worker {worker} failed: {source}")]
    Locate {
        worker: usize,
        #[source]
        source: LocateError,
    },

    /// A worker thread panicked
    #[error("Worker {0} panicked")]
    WorkerPanicked(usize),

    /// Every worker exited before the input was fully distributed
    #[error("All workers exited before the input was fully distributed")]
    WorkersGone,

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O error in a sink or during aggregation
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for pet-denoise operations
pub type Result<T> = std::result::Result<T, PetDenoiseError>;

/// Result type alias for restriction site loading
pub type SiteResult<T> = std::result::Result<T, SiteLoadError>;

/// Result type alias for pipeline operations
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

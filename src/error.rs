//! Error types for coefficient loading

use std::path::PathBuf;
use thiserror::Error;

/// Failure to load a geomagnetic coefficient table
///
/// These never escape the model: [`GeomagneticModel::from_source`] logs them
/// and falls back to the embedded table.
///
/// [`GeomagneticModel::from_source`]: crate::GeomagneticModel::from_source
#[derive(Error, Debug)]
pub enum CoefficientError {
    #[error("failed to read coefficient file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("coefficient data is empty")]
    Empty,

    #[error("coefficient header is missing the {0}")]
    MissingHeader(&'static str),

    #[error("invalid number `{token}` at token {position}")]
    InvalidNumber { token: String, position: usize },

    #[error("degree {n} order {m} outside the supported range (1..={max})")]
    DegreeOutOfRange { n: i64, m: i64, max: usize },

    #[error("coefficient row at token {position} is truncated")]
    TruncatedRow { position: usize },

    #[error("missing end-of-table marker (a value >= 9999)")]
    MissingTerminator,

    #[error("coefficient table has no rows")]
    NoCoefficients,
}

/// Result type for coefficient loading
pub type CoefficientResult<T> = Result<T, CoefficientError>;

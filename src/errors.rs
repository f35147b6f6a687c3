//! Central error taxonomy for the extraction pipeline.
//!
//! Every pipeline step reports failures through [`PipelineError`], carrying the
//! offending source locator where one is known. Errors are non-recoverable at
//! their point of origin: a single bad source aborts the whole stitch, since a
//! silently dropped segment would corrupt the time alignment of every segment
//! after it.

use thiserror::Error;

use crate::storage::StorageError;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors raised while turning a set of NetCDF sources into a regional series
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("source '{source_name}' unavailable: {cause}")]
    SourceUnavailable { source_name: String, cause: String },

    #[error("variable '{var}' not found in source '{source_name}'")]
    VariableNotFound { var: String, source_name: String },

    #[error("malformed time units '{units}' in source '{source_name}': {reason}")]
    MalformedTimeUnits {
        units: String,
        source_name: String,
        reason: String,
    },

    #[error("unknown calendar '{calendar}' in source '{source_name}'")]
    UnknownCalendar { calendar: String, source_name: String },

    #[error(
        "{axis} axis mismatch: source '{source_name}' has length {got}, expected {expected} (from '{reference}')"
    )]
    AxisMismatch {
        axis: String,
        expected: usize,
        got: usize,
        reference: String,
        source_name: String,
    },

    #[error("sources are not in chronological order: {detail}")]
    SegmentsOutOfOrder { detail: String },

    #[error("malformed field in source '{source_name}': {detail}")]
    ShapeError { source_name: String, detail: String },

    #[error("region selection is empty: {detail}")]
    EmptyRegion { detail: String },

    #[error("all selected cells are missing at time step {time_index}")]
    AllMissing { time_index: usize },

    #[error("NetCDF error: {0}")]
    NetCdf(#[from] netcdf::Error),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("output error: {0}")]
    Output(#[from] polars::prelude::PolarsError),
}

impl PipelineError {
    /// Wraps a NetCDF error with the locator of the source it came from.
    pub fn unavailable(source: &str, cause: impl std::fmt::Display) -> Self {
        PipelineError::SourceUnavailable {
            source_name: source.to_string(),
            cause: cause.to_string(),
        }
    }
}

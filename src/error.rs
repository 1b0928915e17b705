use std::path::PathBuf;

use thiserror::Error;

/// Error type for all fallible operations in the crate.
///
/// The first four variants are the failure taxonomy of the extraction
/// pipeline; the remainder wrap library errors from the NetCDF layer and
/// the filesystem.
#[derive(Debug, Error)]
pub enum SdmError {
    /// A required input (CoD file, mask, archive month, point-list file)
    /// does not exist at the resolved path.
    #[error("{what} not found: {}", path.display())]
    NotFound {
        /// What kind of input was being looked up.
        what: &'static str,
        /// Path that could not be found.
        path: PathBuf,
    },

    /// Malformed text input, e.g. a CoD data line with too few fields or a
    /// non-numeric field, or an unreadable settings file.
    #[error("parse error: {0}")]
    Parse(String),

    /// A variable or dimension expected by the extraction is missing from a
    /// loaded grid file.
    #[error("variable '{name}' missing from {}", path.display())]
    Schema {
        /// Name of the missing variable.
        name: String,
        /// File that was inspected.
        path: PathBuf,
    },

    /// Dimensions of a grid file or layout disagree with the mask or with
    /// each other.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// A compact date code whose components do not form a real calendar
    /// date, detected when formatting or building a time axis.
    #[error("date code {0} is not a valid calendar date")]
    InvalidDate(i32),

    /// Error from the NetCDF library.
    #[error("netcdf error: {0}")]
    Netcdf(#[from] netcdf::Error),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SdmError>;

//! Centralized error handling for assemblies
//!
//! Every engine returns [`Result`], so failures surface at the call site of
//! `multi_groupby` / `multi_dim_apply` before any output array exists.

use thiserror::Error;

/// Main error type for assembly operations
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// Requested grouping coordinate is not a coordinate of the array
    #[error("Coordinate '{coord}' not found in array")]
    UnknownCoordinate { coord: String },

    /// Dimension not found in array
    #[error("Dimension '{dim}' not found in array")]
    DimensionNotFound { dim: String },

    /// Select-by-label found no matching position
    #[error("Label {label} not found on coordinate '{coord}'")]
    LabelNotFound { coord: String, label: String },

    /// Select-by-position went past the end of a dimension
    #[error("Position {position} is out of bounds for dimension '{dim}' of size {size}")]
    IndexOutOfBounds {
        dim: String,
        position: usize,
        size: usize,
    },

    /// Coordinate metadata inconsistent with the array shape
    #[error("Invalid coordinate '{coord}': {message}")]
    InvalidCoordinate { coord: String, message: String },

    /// Applied function returned data that cannot fill its partition
    #[error("Incompatible shape: expected {expected:?}, found {found:?}")]
    IncompatibleShape {
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    /// Reduction name could not be parsed
    #[error("Unknown reduction '{0}'")]
    UnknownReduction(String),

    /// Statistics computation errors
    #[error("Statistics computation error: {0}")]
    StatisticsError(String),

    /// Thread pool configuration error
    #[error("Thread pool error: {0}")]
    ThreadPoolError(String),

    /// Array shape or dimension error
    #[error("Array error: {0}")]
    ArrayError(#[from] ndarray::ShapeError),
}

/// Result type alias for assembly operations
pub type Result<T> = std::result::Result<T, AssemblyError>;

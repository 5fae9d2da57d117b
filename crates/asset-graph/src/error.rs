//! Error types for asset-graph.
//!
//! This module defines the error type shared by every stage of the
//! similarity pipeline: the distance and correlation engines, the matrix and
//! graph builders, and the clustering algorithms.
//!
//! Errors carry enough context (identifier pairs, offending parameters) to
//! be actionable without a debugger.

use thiserror::Error;

/// The main error type for asset-graph operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A series is empty or otherwise malformed.
    ///
    /// Returned by the distance engine for empty or non-finite input and by
    /// series construction for inconsistent timestamps.
    #[error("invalid input for series '{series}': {reason}")]
    InvalidInput {
        /// Identifier (or positional role such as `left`) of the offending series.
        series: String,
        /// Description of what is wrong with the series.
        reason: String,
    },

    /// Correlation was requested on series that are not index-aligned.
    #[error("misaligned input: left series has {left_len} samples, right series has {right_len}")]
    MisalignedInput {
        /// Number of samples in the left series.
        left_len: usize,
        /// Number of samples in the right series.
        right_len: usize,
    },

    /// Clustering was requested on a graph without nodes or edges.
    #[error("empty graph: {operation} requires at least one edge")]
    EmptyGraph {
        /// The clustering operation that was attempted.
        operation: &'static str,
    },

    /// A threshold, fraction, cluster count or other parameter is out of range.
    #[error("invalid parameter {parameter} = {value}: {reason}")]
    InvalidParameter {
        /// Name of the parameter.
        parameter: &'static str,
        /// The rejected value, rendered as text.
        value: String,
        /// Description of the accepted range.
        reason: &'static str,
    },

    /// A pair metric failed while building a matrix in strict mode.
    #[error("failed to compute pair ({left}, {right}): {source}")]
    PairFailed {
        /// First identifier of the pair.
        left: String,
        /// Second identifier of the pair.
        right: String,
        /// The underlying engine error.
        source: Box<Error>,
    },

    /// Two series with the same identifier were added to a store.
    #[error("duplicate series identifier '{id}'")]
    DuplicateSeries {
        /// The repeated identifier.
        id: String,
    },

    /// An identifier was looked up that is not part of the store, matrix or graph.
    #[error("unknown series identifier '{id}'")]
    UnknownSeries {
        /// The identifier that was not found.
        id: String,
    },

    /// A compute budget stopped a long-running build before it finished.
    #[error("compute budget exhausted after {completed} of {total} pairs")]
    BudgetExhausted {
        /// Number of pairs evaluated before the budget ran out.
        completed: usize,
        /// Total number of pairs requested.
        total: usize,
    },

    /// Failed to convert a numeric value to the target type.
    #[error("numeric conversion failed: {context}")]
    NumericConversion {
        /// Description of the conversion that failed.
        context: &'static str,
    },

    /// Writing an exported table failed.
    #[error("export failed: {message}")]
    Export {
        /// Description of the underlying I/O or CSV failure.
        message: String,
    },

    /// A configuration document could not be parsed.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the parse failure.
        message: String,
    },
}

impl Error {
    /// Creates an [`Error::InvalidParameter`] from any displayable value.
    pub fn invalid_parameter(
        parameter: &'static str,
        value: impl std::fmt::Display,
        reason: &'static str,
    ) -> Self {
        Self::InvalidParameter {
            parameter,
            value: value.to_string(),
            reason,
        }
    }

    /// Creates an [`Error::InvalidInput`] for the named series.
    pub fn invalid_input(series: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            series: series.into(),
            reason: reason.into(),
        }
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Self::Export {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Export {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Config {
            message: err.to_string(),
        }
    }
}

/// Convenience type alias for Results using the asset-graph Error type.
pub type Result<T> = std::result::Result<T, Error>;

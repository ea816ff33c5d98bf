//! Error types for manifold-engine-core.
//!
//! Defines the central [`EngineError`] type and the [`EngineResult<T>`]
//! alias. Parameter clamps are deliberately NOT errors: they are recovered
//! locally and reported through result metadata (`ParamClamp`), so the only
//! variants here are conditions that abort the current request.
//!
//! # Examples
//!
//! ```rust
//! use manifold_engine_core::error::EngineError;
//!
//! let err = EngineError::InsufficientData { required: 4, actual: 2 };
//! assert!(err.to_string().contains("4"));
//! ```

use thiserror::Error;

/// Top-level error type for structuring operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Too few distinct data points to run an algorithm.
    ///
    /// # When This Occurs
    ///
    /// - Curvature estimation over fewer than 4 distinct points
    /// - Spectral filtering of an empty or length-1 sequence
    /// - Clustering an empty unit set
    ///
    /// Never silently defaulted; the caller decides how to proceed.
    #[error("Insufficient data: need at least {required} distinct points, got {actual}")]
    InsufficientData {
        /// Minimum number of distinct points the algorithm needs
        required: usize,
        /// Number of distinct points actually supplied
        actual: usize,
    },

    /// A packet assembly invariant was broken.
    ///
    /// # When This Occurs
    ///
    /// - A constellation would be emitted with zero points
    /// - Attribution weights do not sum to 1 within tolerance
    /// - An unrecognized `spec_version` reached the encoder
    ///
    /// Fatal: assembly aborts and no partial packet escapes.
    #[error("Schema violation: {detail}")]
    SchemaViolation {
        /// Description of the violated invariant
        detail: String,
    },

    /// Embedding vectors within one request disagree on dimensionality.
    #[error("Invalid embedding dimension: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension established by the first unit in the request
        expected: usize,
        /// Offending dimension
        actual: usize,
    },

    /// A configuration field failed validation.
    #[error("Invalid config: {field} - {message}")]
    InvalidConfig {
        /// Name of the offending field
        field: &'static str,
        /// Description of the constraint that was violated
        message: String,
    },

    /// An attribution-subsystem failure propagated into packet assembly.
    #[error("Attribution error: {0}")]
    Attribution(#[from] manifold_engine_attribution::AttributionError),

    /// Packet (de)serialization failure.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

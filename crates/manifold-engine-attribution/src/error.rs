//! Error types for manifold-engine-attribution.
//!
//! Defines [`AttributionError`] and the [`AttributionResult<T>`] alias used
//! throughout the attribution crate.

use thiserror::Error;

/// Top-level error type for attribution operations.
#[derive(Debug, Error)]
pub enum AttributionError {
    /// The contribution ledger could not be locked for appending.
    ///
    /// # When This Occurs
    ///
    /// - Another writer held the ledger past the retry budget
    ///
    /// Appends are retried internally with backoff before this surfaces,
    /// so callers should treat it as a transient failure.
    #[error("Ledger contention: gave up after {attempts} append attempts")]
    LedgerContention {
        /// Number of lock acquisition attempts made before giving up
        attempts: u32,
    },

    /// A configuration field failed validation.
    #[error("Invalid attribution config: {field} - {message}")]
    InvalidConfig {
        /// Name of the offending field
        field: &'static str,
        /// Description of the constraint that was violated
        message: String,
    },

    /// A contribution event carried a non-finite or negative amount.
    #[error("Invalid contribution amount {amount} from contributor {contributor_id}")]
    InvalidAmount {
        /// Contributor that submitted the event
        contributor_id: String,
        /// The rejected amount
        amount: f64,
    },

    /// A proof was requested for a record index outside the tree.
    #[error("Record index {index} out of range for tree of {leaf_count} leaves")]
    RecordOutOfRange {
        /// Requested leaf index
        index: usize,
        /// Number of leaves in the tree
        leaf_count: usize,
    },

    /// Tried to build a Merkle tree over an empty record set.
    #[error("Cannot build a proof chain over zero records")]
    EmptyRecordSet,
}

/// Result alias for attribution operations.
pub type AttributionResult<T> = Result<T, AttributionError>;

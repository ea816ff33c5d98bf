//! Attribution subsystem for the geometric structuring engine.
//!
//! Three pieces, layered bottom-up:
//!
//! - [`ledger`] — an injectable, append-only contribution ledger handle.
//! - [`weigher`] — Dirichlet-smoothed, exponentially decayed weights that
//!   always sum to 1 for a non-empty contributor set.
//! - [`merkle`] — a Merkle proof chain over the resulting records, with a
//!   pure [`merkle::verify`] usable by any independent auditor.
//!
//! The subsystem consumes only [`ledger::ContributionEvent`]s; it knows
//! nothing about embeddings or clustering.

pub mod error;
pub mod ledger;
pub mod merkle;
pub mod weigher;

pub use error::{AttributionError, AttributionResult};
pub use ledger::{ContributionEvent, ContributionLedger};
pub use merkle::{verify, Hash, MerkleProof, ProofChain};
pub use weigher::{
    AttributionRecord, AttributionSnapshot, AttributionWeigher, WeigherConfig,
    WEIGHT_SUM_TOLERANCE,
};

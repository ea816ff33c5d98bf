//! Entropy-regularized clustering (CHR).
//!
//! Groups embedded units into K clusters under an objective of
//! `intra_cluster_distance + beta * entropy_penalty`, with deterministic
//! seeded initialization and multi-restart selection.

mod chr;

pub use chr::{cluster_units, ChrParams};

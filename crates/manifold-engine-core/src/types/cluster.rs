//! Clustering output types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::unit::SourceLocation;

/// Record of a parameter the engine clamped instead of failing on.
///
/// Clamps are reported, never silently applied and never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamClamp {
    /// Value the caller asked for
    pub requested: usize,
    /// Value actually used
    pub applied: usize,
    /// Why the clamp happened
    pub reason: String,
}

/// One cluster produced by a CHR run.
///
/// Returned to the caller, never persisted by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Cluster index within this run (0-based, dense)
    pub id: usize,
    /// Member unit ids, sorted for reproducible output
    ///
    /// INVARIANT: non-empty; each unit id appears in exactly one cluster
    pub member_ids: Vec<Uuid>,
    /// Mean of member vectors
    pub centroid: Vec<f32>,
    /// Shannon entropy of the members' similarity-to-centroid histogram
    pub intra_entropy: f64,
    /// Member count (== member_ids.len(), kept for serialized consumers)
    pub size: usize,
}

/// One row of the tabular preview: `(cluster_id, text, location)` plus
/// provenance flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewRow {
    /// Cluster the unit landed in
    pub cluster_id: usize,
    /// Originating unit id
    pub unit_id: Uuid,
    /// The unit's reference text
    pub text: String,
    /// Source location, possibly inherited (see `location_inherited`)
    pub location: SourceLocation,
    /// Cosine similarity of the unit to its cluster centroid
    pub similarity: f32,
    /// True when a sentence-level unit inherited its nearest preceding
    /// parent's page/paragraph instead of carrying its own
    pub location_inherited: bool,
    /// True when the entropy histogram used fewer bins than requested
    pub bins_clamped: bool,
}

/// Complete result of one CHR run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteringResult {
    /// Non-empty clusters covering every input unit exactly once
    pub clusters: Vec<Cluster>,
    /// Hg: entropy of the corpus-wide similarity-to-global-centroid
    /// histogram
    pub global_entropy: f64,
    /// Hs: mean of per-cluster intra entropies
    pub mean_cluster_entropy: f64,
    /// mhep = Hg * 100 / max(Hs, 1e-9).
    ///
    /// A normalized ratio: large when the corpus-wide distribution stays
    /// rich while the average within-cluster spread is small. Downstream
    /// consumers observe only this scalar, so the derivation is fixed here.
    pub mean_harvest_entropy_proxy: f64,
    /// One row per input unit, in input order
    pub preview_rows: Vec<PreviewRow>,
    /// Set when K was reduced to the distinct-embedding count
    pub clamped_k: Option<ParamClamp>,
    /// Set when the entropy histogram bin count was reduced
    pub clamped_bins: Option<ParamClamp>,
}

impl ClusteringResult {
    /// Total units across all clusters.
    pub fn total_members(&self) -> usize {
        self.clusters.iter().map(|c| c.size).sum()
    }
}

//! Geometry packet schema (CGP): the engine's sole output artifact.
//!
//! Hierarchy:
//!
//! ```text
//! GeometryPacket
//! └── SuperNode (one per top-K cluster)
//!     └── Constellation
//!         ├── spectrum (zeta-filtered cluster signal)
//!         └── Point (one per preview row)
//! ```
//!
//! Consumers must tolerate unknown additional fields (`meta.extra` captures
//! them on round-trip) and must reject unknown `spec_version` values, which
//! the [`SpecVersion`] enum enforces at deserialization time.

use chrono::{DateTime, Utc};
use manifold_engine_attribution::AttributionSnapshot;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::manifold::ManifoldSample;

/// Packet schema version.
///
/// Modeled as a closed enum so version dispatch is an exhaustive match at
/// the encoder boundary rather than string branching. Deserializing an
/// unknown version string fails, which is the required consumer behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpecVersion {
    /// Clusters + spectrum only; no attribution or hyperbolic meta
    #[serde(rename = "v0.1")]
    V0_1,
    /// Adds `meta.attribution` and `meta.hyperbolic_encoding`
    #[default]
    #[serde(rename = "v0.2")]
    V0_2,
}

impl SpecVersion {
    /// Canonical string form, matching the serialized representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SpecVersion::V0_1 => "v0.1",
            SpecVersion::V0_2 => "v0.2",
        }
    }

    /// Whether this version carries attribution / hyperbolic metadata.
    pub fn carries_meta(&self) -> bool {
        match self {
            SpecVersion::V0_1 => false,
            SpecVersion::V0_2 => true,
        }
    }
}

/// One rendered unit inside a constellation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Point identifier (fresh per packet)
    pub id: Uuid,
    /// Source modality of the underlying unit (currently always "text")
    pub modality: String,
    /// Similarity-derived magnitude in [0, 1]
    pub magnitude: f32,
    /// Confidence in the cluster assignment, in [0, 1]
    pub confidence: f32,
    /// Back-reference to the originating `EmbeddedUnit`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_id: Option<Uuid>,
}

/// One cluster's renderable grouping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constellation {
    /// Constellation identifier
    pub id: Uuid,
    /// Short human-readable summary of the cluster
    pub summary: String,
    /// First three centroid components (zero-padded)
    pub anchor: [f32; 3],
    /// Zeta-filtered per-member magnitude sequence
    pub spectrum: Vec<f32>,
    /// Member points
    ///
    /// INVARIANT: non-empty in any packet that passed validation
    pub points: Vec<Point>,
}

/// Top-level renderable node: one per top-K cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuperNode {
    /// Node identifier
    pub id: Uuid,
    /// Display label
    pub label: String,
    /// Layout position in the unit square
    pub x: f32,
    /// Layout position in the unit square
    pub y: f32,
    /// Display radius, proportional to the cluster's size share
    pub r: f32,
    /// Constellations under this node (currently exactly one)
    pub constellations: Vec<Constellation>,
}

/// Attribution metadata attached under `meta.attribution` in v0.2 packets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionMeta {
    /// The weight snapshot the packet commits to
    pub snapshot: AttributionSnapshot,
    /// Hex-encoded SHA-256 Merkle root over the snapshot's records
    pub merkle_root: String,
}

/// Manifold-derived coordinates attached under `meta.hyperbolic_encoding`.
pub type HyperbolicEncoding = ManifoldSample;

/// Packet metadata envelope.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PacketMeta {
    /// Present only in versions where `carries_meta()` is true
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribution: Option<AttributionMeta>,
    /// Present only in versions where `carries_meta()` is true
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hyperbolic_encoding: Option<HyperbolicEncoding>,
    /// Entropy metrics carried for downstream dashboards
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entropy: Option<EntropyMeta>,
    /// Unknown fields from future minor versions survive round-trips here
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Corpus-level entropy metrics mirrored into the packet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntropyMeta {
    /// Hg
    pub global_entropy: f64,
    /// Hs
    pub mean_cluster_entropy: f64,
    /// mhep
    pub mean_harvest_entropy_proxy: f64,
}

/// The geometry packet: hierarchical, JSON-serializable, versioned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryPacket {
    /// Schema version; consumers reject unknown values
    pub spec_version: SpecVersion,
    /// One-line description of the structured corpus
    pub summary: String,
    /// Assembly timestamp (UTC)
    pub created_at: DateTime<Utc>,
    /// Top-K cluster nodes
    pub super_nodes: Vec<SuperNode>,
    /// Optional metadata envelope
    pub meta: PacketMeta,
}

impl GeometryPacket {
    /// Total points across all constellations.
    pub fn total_points(&self) -> usize {
        self.super_nodes
            .iter()
            .flat_map(|n| &n.constellations)
            .map(|c| c.points.len())
            .sum()
    }
}

//! Geometry packet assembly and validation.
//!
//! Pure assembly: no new algorithms live here. Clusters become super
//! nodes on a deterministic ring layout, each carrying one constellation
//! whose spectrum comes from the cluster's filtered signal and whose
//! points come from the cluster's preview rows. Version dispatch is an
//! exhaustive match on [`SpecVersion`]; a packet either passes full
//! validation or the request fails with `SchemaViolation` — partially
//! assembled packets never escape.

use std::collections::BTreeMap;

use chrono::Utc;
use manifold_engine_attribution::{AttributionSnapshot, Hash};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::spectral::SpectralResponse;
use crate::types::{
    AttributionMeta, Cluster, ClusteringResult, Constellation, EntropyMeta, GeometryPacket,
    ManifoldSample, PacketMeta, Point, SpecVersion, SuperNode,
};

/// Tolerance on the attribution weight-sum check at the encoder boundary.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Ring layout constants for super node placement in the unit square.
const RING_CENTER: f32 = 0.5;
const RING_RADIUS: f32 = 0.35;
const NODE_RADIUS_BASE: f32 = 0.05;
const NODE_RADIUS_SPAN: f32 = 0.15;

/// Encoder configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Packet schema version to emit
    pub spec_version: SpecVersion,
    /// Number of largest clusters promoted to super nodes
    pub max_super_nodes: usize,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            spec_version: SpecVersion::V0_2,
            max_super_nodes: 8,
        }
    }
}

impl EncoderConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> EngineResult<()> {
        if self.max_super_nodes == 0 {
            return Err(EngineError::InvalidConfig {
                field: "max_super_nodes",
                message: "expected >= 1".into(),
            });
        }
        Ok(())
    }
}

/// Attribution payload handed to the encoder: a snapshot plus the Merkle
/// root committed over its records.
#[derive(Debug, Clone)]
pub struct AttributionPayload {
    pub snapshot: AttributionSnapshot,
    pub merkle_root: Hash,
}

/// Assembles validated [`GeometryPacket`]s.
#[derive(Debug, Clone)]
pub struct PacketEncoder {
    config: EncoderConfig,
}

impl PacketEncoder {
    /// Create an encoder with a validated configuration.
    pub fn new(config: EncoderConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Assemble a packet from the engine's per-request outputs.
    ///
    /// `spectra` maps cluster id to that cluster's filter response;
    /// clusters without an entry emit an empty spectrum (single-member
    /// clusters carry no frequency content). Attribution and manifold
    /// metadata are attached only for versions whose `carries_meta()` is
    /// true; supplying them for v0.1 is not an error, they are simply
    /// omitted.
    pub fn encode(
        &self,
        clustering: &ClusteringResult,
        manifold: Option<&ManifoldSample>,
        spectra: &BTreeMap<usize, SpectralResponse>,
        attribution: Option<&AttributionPayload>,
    ) -> EngineResult<GeometryPacket> {
        if clustering.clusters.is_empty() {
            return Err(EngineError::SchemaViolation {
                detail: "cannot encode a packet over zero clusters".into(),
            });
        }

        let top = self.select_top_clusters(clustering);
        let total_units: usize = clustering.clusters.iter().map(|c| c.size).sum();

        let mut super_nodes = Vec::with_capacity(top.len());
        for (slot, cluster) in top.iter().enumerate() {
            super_nodes.push(self.build_super_node(
                cluster,
                clustering,
                spectra.get(&cluster.id),
                slot,
                top.len(),
                total_units,
            )?);
        }

        let meta = self.build_meta(clustering, manifold, attribution)?;

        let summary = format!(
            "{} clusters over {} units; top {} rendered",
            clustering.clusters.len(),
            total_units,
            super_nodes.len()
        );

        let packet = GeometryPacket {
            spec_version: self.config.spec_version,
            summary,
            created_at: Utc::now(),
            super_nodes,
            meta,
        };
        validate_packet(&packet)?;

        info!(
            version = packet.spec_version.as_str(),
            super_nodes = packet.super_nodes.len(),
            points = packet.total_points(),
            "geometry packet assembled"
        );
        Ok(packet)
    }

    /// Largest clusters first, ties broken by cluster id.
    fn select_top_clusters<'a>(&self, clustering: &'a ClusteringResult) -> Vec<&'a Cluster> {
        let mut ordered: Vec<&Cluster> = clustering.clusters.iter().collect();
        ordered.sort_by(|a, b| b.size.cmp(&a.size).then(a.id.cmp(&b.id)));
        ordered.truncate(self.config.max_super_nodes);
        ordered
    }

    fn build_super_node(
        &self,
        cluster: &Cluster,
        clustering: &ClusteringResult,
        spectrum: Option<&SpectralResponse>,
        slot: usize,
        slot_count: usize,
        total_units: usize,
    ) -> EngineResult<SuperNode> {
        let points: Vec<Point> = clustering
            .preview_rows
            .iter()
            .filter(|row| row.cluster_id == cluster.id)
            .map(|row| Point {
                id: Uuid::new_v4(),
                modality: "text".into(),
                magnitude: row.similarity.clamp(0.0, 1.0),
                confidence: confidence_from_similarity(row.similarity),
                ref_id: Some(row.unit_id),
            })
            .collect();

        if points.is_empty() {
            return Err(EngineError::SchemaViolation {
                detail: format!("cluster {} produced a constellation with zero points", cluster.id),
            });
        }

        let mut anchor = [0.0f32; 3];
        for (dst, &value) in anchor.iter_mut().zip(cluster.centroid.iter()) {
            *dst = value;
        }

        let constellation = Constellation {
            id: Uuid::new_v4(),
            summary: format!("cluster {} ({} units)", cluster.id, cluster.size),
            anchor,
            spectrum: spectrum
                .map(|s| s.filtered.iter().map(|&v| v as f32).collect())
                .unwrap_or_default(),
            points,
        };

        let angle = std::f32::consts::TAU * slot as f32 / slot_count as f32;
        let share = cluster.size as f32 / total_units.max(1) as f32;

        debug!(cluster = cluster.id, slot, share, "super node placed");

        Ok(SuperNode {
            id: Uuid::new_v4(),
            label: format!("cluster-{}", cluster.id),
            x: RING_CENTER + RING_RADIUS * angle.cos(),
            y: RING_CENTER + RING_RADIUS * angle.sin(),
            r: NODE_RADIUS_BASE + NODE_RADIUS_SPAN * share.sqrt(),
            constellations: vec![constellation],
        })
    }

    fn build_meta(
        &self,
        clustering: &ClusteringResult,
        manifold: Option<&ManifoldSample>,
        attribution: Option<&AttributionPayload>,
    ) -> EngineResult<PacketMeta> {
        let mut meta = PacketMeta {
            entropy: Some(EntropyMeta {
                global_entropy: clustering.global_entropy,
                mean_cluster_entropy: clustering.mean_cluster_entropy,
                mean_harvest_entropy_proxy: clustering.mean_harvest_entropy_proxy,
            }),
            ..PacketMeta::default()
        };

        // Exhaustive version dispatch: the one place the schema branches.
        match self.config.spec_version {
            SpecVersion::V0_1 => {}
            SpecVersion::V0_2 => {
                meta.hyperbolic_encoding = manifold.copied();
                if let Some(payload) = attribution {
                    meta.attribution = Some(AttributionMeta {
                        snapshot: payload.snapshot.clone(),
                        merkle_root: hex_encode(&payload.merkle_root),
                    });
                }
            }
        }
        Ok(meta)
    }
}

fn confidence_from_similarity(similarity: f32) -> f32 {
    // Map [-1, 1] similarity onto [0, 1].
    ((similarity + 1.0) / 2.0).clamp(0.0, 1.0)
}

fn hex_encode(hash: &Hash) -> String {
    let mut out = String::with_capacity(64);
    for byte in hash {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// Validate a packet against the schema invariants.
///
/// Also usable by consumers on packets received over the wire.
pub fn validate_packet(packet: &GeometryPacket) -> EngineResult<()> {
    if packet.super_nodes.is_empty() {
        return Err(EngineError::SchemaViolation {
            detail: "packet has no super nodes".into(),
        });
    }
    for node in &packet.super_nodes {
        if node.constellations.is_empty() {
            return Err(EngineError::SchemaViolation {
                detail: format!("super node {} has no constellations", node.label),
            });
        }
        for constellation in &node.constellations {
            if constellation.points.is_empty() {
                return Err(EngineError::SchemaViolation {
                    detail: format!("constellation {} has zero points", constellation.id),
                });
            }
        }
    }

    if let Some(attribution) = &packet.meta.attribution {
        if !packet.spec_version.carries_meta() {
            return Err(EngineError::SchemaViolation {
                detail: format!(
                    "spec_version {} cannot carry attribution metadata",
                    packet.spec_version.as_str()
                ),
            });
        }
        let snapshot = &attribution.snapshot;
        if !snapshot.weights.is_empty() {
            let sum: f64 = snapshot.weights.values().sum();
            // NaN compares false against any threshold, so the check is
            // phrased as "not within tolerance" rather than "over it".
            if !((sum - 1.0).abs() <= WEIGHT_SUM_TOLERANCE) {
                return Err(EngineError::SchemaViolation {
                    detail: format!("attribution weights sum to {sum}, expected 1.0"),
                });
            }
        }
        if attribution.merkle_root.len() != 64
            || !attribution.merkle_root.bytes().all(|b| b.is_ascii_hexdigit())
        {
            return Err(EngineError::SchemaViolation {
                detail: "merkle_root is not a 64-char hex digest".into(),
            });
        }
    }
    Ok(())
}

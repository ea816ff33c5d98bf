//! One-call structuring pipeline.
//!
//! Runs clustering -> curvature -> per-cluster spectral filtering ->
//! packet assembly, optionally committing an attribution snapshot under a
//! Merkle root. Requests over the same input set are serialized through a
//! per-fingerprint mutex: the attribution ledger is shared append-only
//! state, so two interleaved runs over one input could otherwise commit
//! different roots for the same packet. Requests over different inputs run
//! fully in parallel.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash as _, Hasher};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use manifold_engine_attribution::{
    AttributionWeigher, ContributionLedger, ProofChain, WeigherConfig,
};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::clustering::cluster_units;
use crate::config::EngineConfig;
use crate::curvature;
use crate::encoder::{AttributionPayload, PacketEncoder};
use crate::error::EngineResult;
use crate::spectral::filter_sequence;
use crate::types::{EmbeddedUnit, GeometryPacket};

/// Attribution context for one structuring request.
#[derive(Debug, Clone)]
pub struct AttributionContext {
    /// The shared, injectable ledger to snapshot
    pub ledger: ContributionLedger,
    /// Period the snapshot is computed for
    pub period: u32,
}

/// Orchestrates one structuring request end to end.
#[derive(Debug)]
pub struct StructuringPipeline {
    config: EngineConfig,
    encoder: PacketEncoder,
    weigher: AttributionWeigher,
    inflight: Mutex<HashMap<u64, Arc<Mutex<()>>>>,
}

impl StructuringPipeline {
    /// Create a pipeline with a fully validated configuration.
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        let encoder = PacketEncoder::new(config.encoder.clone())?;
        let weigher = AttributionWeigher::new(config.weigher)?;
        Ok(Self {
            config,
            encoder,
            weigher,
            inflight: Mutex::new(HashMap::new()),
        })
    }

    /// Structure one embedding set into a geometry packet.
    ///
    /// The cancellation flag is honored between clustering iterations;
    /// cancellation yields the best clustering found so far, never a
    /// partial packet. A concurrent call over the same input set waits for
    /// the in-flight one to finish.
    pub fn structure(
        &self,
        units: &[EmbeddedUnit],
        attribution: Option<&AttributionContext>,
        cancel: &AtomicBool,
    ) -> EngineResult<GeometryPacket> {
        let key = input_fingerprint(units);
        let gate = self.gate_for(key);
        let result = {
            let _serialized = gate.lock();
            debug!(key, units = units.len(), "structuring request admitted");
            self.run_structuring(key, units, attribution, cancel)
        };
        drop(gate);
        self.release_gate(key);
        result
    }

    fn run_structuring(
        &self,
        key: u64,
        units: &[EmbeddedUnit],
        attribution: Option<&AttributionContext>,
        cancel: &AtomicBool,
    ) -> EngineResult<GeometryPacket> {
        let clustering = cluster_units(units, &self.config.chr, cancel)?;

        let points: Vec<Vec<f32>> = units.iter().map(|u| u.vector.clone()).collect();
        let manifold = curvature::estimate(&points, &self.config.curvature)?;

        // Per-cluster signal: member similarities in preview-row order.
        // Single-member clusters carry no frequency content and are skipped.
        let mut spectra = BTreeMap::new();
        for cluster in &clustering.clusters {
            let signal: Vec<f64> = clustering
                .preview_rows
                .iter()
                .filter(|row| row.cluster_id == cluster.id)
                .map(|row| row.similarity as f64)
                .collect();
            if signal.len() >= 2 {
                let response = filter_sequence(&signal, &self.config.spectral)?;
                spectra.insert(cluster.id, response);
            }
        }

        let payload = match attribution {
            Some(ctx) => self.commit_attribution(ctx)?,
            None => None,
        };

        let packet = self
            .encoder
            .encode(&clustering, Some(&manifold), &spectra, payload.as_ref())?;

        info!(
            key,
            clusters = clustering.clusters.len(),
            shape = ?manifold.shape,
            attributed = payload.is_some(),
            "structuring request complete"
        );
        Ok(packet)
    }

    /// Snapshot the ledger and commit the records under a Merkle root.
    /// An empty ledger contributes no attribution metadata.
    fn commit_attribution(
        &self,
        ctx: &AttributionContext,
    ) -> EngineResult<Option<AttributionPayload>> {
        let snapshot = self.weigher.snapshot(&ctx.ledger, ctx.period);
        if snapshot.is_empty() {
            return Ok(None);
        }
        let records = snapshot.to_records();
        let chain = ProofChain::build(&records)?;
        Ok(Some(AttributionPayload {
            merkle_root: chain.root(),
            snapshot,
        }))
    }

    /// Weigher configuration in effect (handy for callers verifying roots).
    pub fn weigher_config(&self) -> WeigherConfig {
        self.config.weigher
    }

    fn gate_for(&self, key: u64) -> Arc<Mutex<()>> {
        let mut inflight = self.inflight.lock();
        inflight.entry(key).or_default().clone()
    }

    /// Drop a fingerprint's gate once no request holds it.
    ///
    /// Callers must release their own `Arc` clone first: a strong count of 1
    /// means the map holds the only reference, so no waiter can be stranded.
    fn release_gate(&self, key: u64) {
        let mut inflight = self.inflight.lock();
        if let Some(gate) = inflight.get(&key) {
            if Arc::strong_count(gate) == 1 {
                inflight.remove(&key);
            }
        }
    }
}

/// Order-insensitive fingerprint of an input set's unit ids.
fn input_fingerprint(units: &[EmbeddedUnit]) -> u64 {
    let mut ids: Vec<_> = units.iter().map(|u| u.id).collect();
    ids.sort();
    let mut hasher = DefaultHasher::new();
    for id in ids {
        id.hash(&mut hasher);
    }
    hasher.finish()
}

//! CHR: cluster-with-entropy-regularization.
//!
//! # Algorithm
//!
//! ```text
//! units ──> seeded farthest-point init ──> Lloyd iterations
//!                │                              │
//!            restart r: seed + r        objective per iterate:
//!                │                      mean_dist + beta * Hs
//!                ▼                              │
//!        best iterate per restart ──> best restart overall
//!                                     (ties: lowest restart index)
//! ```
//!
//! Assignment stays pure nearest-centroid; the beta-weighted entropy term
//! selects which iterate and which restart win, keeping the whole run
//! deterministic for a fixed seed.
//!
//! # Determinism
//!
//! - `ChaCha8Rng` seeded per restart (`seed + restart_index`)
//! - All argmin/argmax ties resolved toward the lower index
//! - Member ids sorted before emission
//!
//! Same seed + inputs therefore yields byte-identical results.

use std::sync::atomic::{AtomicBool, Ordering};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::entropy::shannon_entropy;
use crate::error::{EngineError, EngineResult};
use crate::math::{cosine_similarity, mean_vector, norm};
use crate::types::{
    Cluster, ClusteringResult, EmbeddedUnit, ParamClamp, PreviewRow, UnitGranularity,
};

/// Floor applied to Hs in the mhep ratio.
const MHEP_EPSILON: f64 = 1e-9;

/// Parameters for one CHR run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChrParams {
    /// Requested cluster count (clamped to the distinct-embedding count)
    pub k: usize,
    /// Maximum Lloyd iterations per restart
    pub iters: usize,
    /// Histogram bucket count for entropy computation (clamped down when
    /// the similarity distribution has fewer distinct values)
    pub bins: usize,
    /// Weight of the entropy penalty in the objective
    pub beta: f64,
    /// Base RNG seed; restart r uses `seed + r`
    pub seed: u64,
    /// Extraction granularity of the input units (drives location fallback)
    pub granularity: UnitGranularity,
    /// Independent seeded restarts; the lowest-objective restart wins
    pub restarts: usize,
}

impl Default for ChrParams {
    fn default() -> Self {
        Self {
            k: 8,
            iters: 20,
            bins: 10,
            beta: 0.3,
            seed: 42,
            granularity: UnitGranularity::Sentences,
            restarts: 3,
        }
    }
}

impl ChrParams {
    /// Validate parameter ranges.
    pub fn validate(&self) -> EngineResult<()> {
        if self.k == 0 {
            return Err(EngineError::InvalidConfig {
                field: "k",
                message: "expected >= 1".into(),
            });
        }
        if self.iters == 0 {
            return Err(EngineError::InvalidConfig {
                field: "iters",
                message: "expected >= 1".into(),
            });
        }
        if self.bins == 0 {
            return Err(EngineError::InvalidConfig {
                field: "bins",
                message: "expected >= 1".into(),
            });
        }
        if !self.beta.is_finite() || self.beta < 0.0 {
            return Err(EngineError::InvalidConfig {
                field: "beta",
                message: format!("expected finite >= 0.0, got {}", self.beta),
            });
        }
        if self.restarts == 0 {
            return Err(EngineError::InvalidConfig {
                field: "restarts",
                message: "expected >= 1".into(),
            });
        }
        Ok(())
    }
}

/// State of the best iterate seen so far within/across restarts.
struct BestState {
    assignments: Vec<usize>,
    centroids: Vec<Vec<f32>>,
    objective: f64,
}

/// Partition `units` into at most `params.k` non-empty clusters.
///
/// The cancellation flag is checked between Lloyd iterations; when raised,
/// the best iterate found so far is returned rather than a partial state.
///
/// # Guarantees
///
/// - Every unit id appears in exactly one cluster; clusters are non-empty
/// - Identical `(units, params)` produce identical results
/// - K and bins clamps are reported via `clamped_k` / `clamped_bins`
pub fn cluster_units(
    units: &[EmbeddedUnit],
    params: &ChrParams,
    cancel: &AtomicBool,
) -> EngineResult<ClusteringResult> {
    params.validate()?;

    if units.is_empty() {
        return Err(EngineError::InsufficientData {
            required: 1,
            actual: 0,
        });
    }

    let dim = units[0].vector.len();
    for unit in units {
        if unit.vector.len() != dim {
            return Err(EngineError::DimensionMismatch {
                expected: dim,
                actual: unit.vector.len(),
            });
        }
    }

    let distinct = distinct_nondegenerate(units);
    let k_eff = params.k.min(distinct.max(1));
    let clamped_k = (k_eff < params.k).then(|| ParamClamp {
        requested: params.k,
        applied: k_eff,
        reason: format!("only {distinct} distinct non-degenerate embeddings available"),
    });

    // Multi-restart: lowest objective wins, ties resolved by restart index.
    let mut best: Option<BestState> = None;
    for restart in 0..params.restarts {
        let state = run_restart(
            units,
            k_eff,
            params,
            params.seed.wrapping_add(restart as u64),
            cancel,
        );
        debug!(
            restart,
            objective = state.objective,
            "CHR restart complete"
        );
        let better = best
            .as_ref()
            .map(|b| state.objective < b.objective)
            .unwrap_or(true);
        if better {
            best = Some(state);
        }
        if cancel.load(Ordering::Relaxed) {
            debug!(restart, "CHR cancelled, keeping best-so-far");
            break;
        }
    }
    let best = best.expect("at least one restart ran");

    let (result, bins_clamped_any) =
        assemble_result(units, params, &best, k_eff, clamped_k)?;

    info!(
        clusters = result.clusters.len(),
        hg = result.global_entropy,
        hs = result.mean_cluster_entropy,
        mhep = result.mean_harvest_entropy_proxy,
        bins_clamped = bins_clamped_any,
        "CHR run complete"
    );
    Ok(result)
}

/// Count distinct non-degenerate (non-zero-norm) embedding vectors.
fn distinct_nondegenerate(units: &[EmbeddedUnit]) -> usize {
    let mut seen: Vec<Vec<u32>> = units
        .iter()
        .filter(|u| norm(&u.vector) > f32::EPSILON)
        .map(|u| u.vector.iter().map(|x| x.to_bits()).collect())
        .collect();
    seen.sort_unstable();
    seen.dedup();
    seen.len()
}

/// One seeded restart: init + Lloyd iterations, returning the iterate with
/// the lowest `mean_distance + beta * Hs` objective.
fn run_restart(
    units: &[EmbeddedUnit],
    k: usize,
    params: &ChrParams,
    seed: u64,
    cancel: &AtomicBool,
) -> BestState {
    let n = units.len();
    let dim = units[0].vector.len();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut centroids = init_centroids(units, k, &mut rng);
    let mut assignments = vec![0usize; n];
    let mut best: Option<BestState> = None;

    for iteration in 0..params.iters {
        if cancel.load(Ordering::Relaxed) {
            trace!(iteration, "restart cancelled between iterations");
            break;
        }

        let changed = assign_points(units, &centroids, &mut assignments);
        repair_empty_clusters(units, &centroids, &mut assignments, k);

        for (cid, centroid) in centroids.iter_mut().enumerate() {
            let members = units
                .iter()
                .zip(assignments.iter())
                .filter(|(_, &a)| a == cid)
                .map(|(u, _)| u.vector.as_slice());
            *centroid = mean_vector(members, dim);
        }

        let objective = objective_value(units, &assignments, &centroids, params);
        trace!(iteration, objective, "CHR iterate");

        let better = best
            .as_ref()
            .map(|b| objective < b.objective)
            .unwrap_or(true);
        if better {
            best = Some(BestState {
                assignments: assignments.clone(),
                centroids: centroids.clone(),
                objective,
            });
        }

        if !changed && iteration > 0 {
            break;
        }
    }

    best.unwrap_or(BestState {
        assignments,
        centroids,
        objective: f64::INFINITY,
    })
}

/// Seeded farthest-point initialization: random first pick, then the point
/// maximizing its minimum cosine distance to the chosen set.
fn init_centroids(units: &[EmbeddedUnit], k: usize, rng: &mut ChaCha8Rng) -> Vec<Vec<f32>> {
    let n = units.len();
    let first = rng.gen_range(0..n);
    let mut chosen = vec![first];

    while chosen.len() < k {
        let mut best_idx = 0;
        let mut best_dist = f64::NEG_INFINITY;
        for (i, unit) in units.iter().enumerate() {
            if chosen.contains(&i) {
                continue;
            }
            let min_dist = chosen
                .iter()
                .map(|&c| 1.0 - cosine_similarity(&unit.vector, &units[c].vector) as f64)
                .fold(f64::INFINITY, f64::min);
            if min_dist > best_dist {
                best_dist = min_dist;
                best_idx = i;
            }
        }
        chosen.push(best_idx);
    }

    chosen
        .into_iter()
        .map(|i| units[i].vector.clone())
        .collect()
}

/// Nearest-centroid assignment; returns whether any assignment changed.
fn assign_points(
    units: &[EmbeddedUnit],
    centroids: &[Vec<f32>],
    assignments: &mut [usize],
) -> bool {
    let mut changed = false;
    for (i, unit) in units.iter().enumerate() {
        let mut best_cid = 0;
        let mut best_dist = f64::INFINITY;
        for (cid, centroid) in centroids.iter().enumerate() {
            let dist = 1.0 - cosine_similarity(&unit.vector, centroid) as f64;
            if dist < best_dist {
                best_dist = dist;
                best_cid = cid;
            }
        }
        if assignments[i] != best_cid {
            assignments[i] = best_cid;
            changed = true;
        }
    }
    changed
}

/// Move the farthest point of a multi-member cluster into each empty
/// cluster, scanning in index order so repair is deterministic.
fn repair_empty_clusters(
    units: &[EmbeddedUnit],
    centroids: &[Vec<f32>],
    assignments: &mut [usize],
    k: usize,
) {
    for empty_cid in 0..k {
        if assignments.iter().any(|&a| a == empty_cid) {
            continue;
        }
        let mut sizes = vec![0usize; k];
        for &a in assignments.iter() {
            sizes[a] += 1;
        }
        let mut donor: Option<(f64, usize)> = None;
        for (i, unit) in units.iter().enumerate() {
            let cid = assignments[i];
            if sizes[cid] <= 1 {
                continue;
            }
            let dist = 1.0 - cosine_similarity(&unit.vector, &centroids[cid]) as f64;
            if donor.map(|(d, _)| dist > d).unwrap_or(true) {
                donor = Some((dist, i));
            }
        }
        if let Some((_, i)) = donor {
            assignments[i] = empty_cid;
        }
    }
}

/// Objective for iterate/restart selection:
/// mean cosine distance to assigned centroid + beta * mean cluster entropy.
fn objective_value(
    units: &[EmbeddedUnit],
    assignments: &[usize],
    centroids: &[Vec<f32>],
    params: &ChrParams,
) -> f64 {
    let n = units.len() as f64;
    let mut total_dist = 0.0;
    for (unit, &cid) in units.iter().zip(assignments.iter()) {
        total_dist += 1.0 - cosine_similarity(&unit.vector, &centroids[cid]) as f64;
    }
    let mean_dist = total_dist / n;

    let (hs, _) = mean_cluster_entropy(units, assignments, centroids, params.bins);
    mean_dist + params.beta * hs
}

/// Mean per-cluster entropy of similarity-to-centroid histograms.
/// Returns `(Hs, any_bins_clamped)`.
fn mean_cluster_entropy(
    units: &[EmbeddedUnit],
    assignments: &[usize],
    centroids: &[Vec<f32>],
    bins: usize,
) -> (f64, bool) {
    let k = centroids.len();
    let mut sum = 0.0;
    let mut populated = 0usize;
    let mut clamped = false;
    for cid in 0..k {
        let sims: Vec<f64> = units
            .iter()
            .zip(assignments.iter())
            .filter(|(_, &a)| a == cid)
            .map(|(u, _)| cosine_similarity(&u.vector, &centroids[cid]) as f64)
            .collect();
        if sims.is_empty() {
            continue;
        }
        let (h, applied) = shannon_entropy(&sims, bins);
        clamped |= applied < bins.min(sims.len());
        sum += h;
        populated += 1;
    }
    if populated == 0 {
        (0.0, clamped)
    } else {
        (sum / populated as f64, clamped)
    }
}

/// Build the final `ClusteringResult` from the winning iterate.
fn assemble_result(
    units: &[EmbeddedUnit],
    params: &ChrParams,
    best: &BestState,
    k: usize,
    clamped_k: Option<ParamClamp>,
) -> EngineResult<(ClusteringResult, bool)> {
    let dim = units[0].vector.len();

    // Per-cluster entropy and bins-clamp bookkeeping. Applied bin counts are
    // kept so the reported clamp can name the tightest one.
    let mut cluster_entropy = vec![0.0f64; k];
    let mut cluster_bins_clamped = vec![false; k];
    let mut cluster_bins_applied = vec![params.bins; k];
    for cid in 0..k {
        let sims: Vec<f64> = units
            .iter()
            .zip(best.assignments.iter())
            .filter(|(_, &a)| a == cid)
            .map(|(u, _)| cosine_similarity(&u.vector, &best.centroids[cid]) as f64)
            .collect();
        if sims.is_empty() {
            continue;
        }
        let (h, applied) = shannon_entropy(&sims, params.bins);
        cluster_entropy[cid] = h;
        cluster_bins_clamped[cid] = applied < params.bins.min(sims.len());
        cluster_bins_applied[cid] = applied;
    }

    let mut clusters = Vec::with_capacity(k);
    for cid in 0..k {
        let mut member_ids: Vec<_> = units
            .iter()
            .zip(best.assignments.iter())
            .filter(|(_, &a)| a == cid)
            .map(|(u, _)| u.id)
            .collect();
        if member_ids.is_empty() {
            continue;
        }
        member_ids.sort();
        let size = member_ids.len();
        clusters.push(Cluster {
            id: clusters.len(),
            member_ids,
            centroid: best.centroids[cid].clone(),
            intra_entropy: cluster_entropy[cid],
            size,
        });
    }

    // Hg over the corpus-wide similarity-to-global-centroid distribution.
    let global_centroid = mean_vector(units.iter().map(|u| u.vector.as_slice()), dim);
    let global_sims: Vec<f64> = units
        .iter()
        .map(|u| cosine_similarity(&u.vector, &global_centroid) as f64)
        .collect();
    let (hg, hg_applied) = shannon_entropy(&global_sims, params.bins);
    let hg_clamped = hg_applied < params.bins.min(global_sims.len());

    let hs = if clusters.is_empty() {
        0.0
    } else {
        clusters.iter().map(|c| c.intra_entropy).sum::<f64>() / clusters.len() as f64
    };
    let mhep = hg * 100.0 / hs.max(MHEP_EPSILON);

    // Report the smallest bin count any clamped histogram actually got,
    // whether that was the global one or a per-cluster one.
    let mut min_applied = usize::MAX;
    if hg_clamped {
        min_applied = min_applied.min(hg_applied);
    }
    for (&applied, &clamped) in cluster_bins_applied.iter().zip(cluster_bins_clamped.iter()) {
        if clamped {
            min_applied = min_applied.min(applied);
        }
    }
    let any_bins_clamped = min_applied != usize::MAX;
    let clamped_bins = any_bins_clamped.then(|| ParamClamp {
        requested: params.bins,
        applied: min_applied,
        reason: "similarity distribution has fewer distinct values than bins".into(),
    });

    // Dense cluster-id remap (empty slots compacted away above).
    let mut dense_id = vec![usize::MAX; k];
    for cluster in &clusters {
        let raw = best.assignments[units
            .iter()
            .position(|u| u.id == cluster.member_ids[0])
            .expect("member came from units")];
        dense_id[raw] = cluster.id;
    }

    let preview_rows = build_preview_rows(
        units,
        &best.assignments,
        &best.centroids,
        &dense_id,
        &cluster_bins_clamped,
        params.granularity,
    );

    Ok((
        ClusteringResult {
            clusters,
            global_entropy: hg,
            mean_cluster_entropy: hs,
            mean_harvest_entropy_proxy: mhep,
            preview_rows,
            clamped_k,
            clamped_bins,
        },
        any_bins_clamped,
    ))
}

/// One preview row per unit, in input order. Sentence-granularity units
/// with no page/paragraph inherit the nearest preceding anchored unit's
/// page and paragraph (char span stays their own), flagged as inherited.
fn build_preview_rows(
    units: &[EmbeddedUnit],
    assignments: &[usize],
    centroids: &[Vec<f32>],
    dense_id: &[usize],
    cluster_bins_clamped: &[bool],
    granularity: UnitGranularity,
) -> Vec<PreviewRow> {
    let mut last_anchor: Option<(Option<u32>, Option<usize>)> = None;
    let mut rows = Vec::with_capacity(units.len());

    for (unit, &raw_cid) in units.iter().zip(assignments.iter()) {
        let mut location = unit.location;
        let mut inherited = false;

        if granularity == UnitGranularity::Sentences {
            if location.is_unanchored() {
                if let Some((page, para)) = last_anchor {
                    location.page = page;
                    location.paragraph_index = para;
                    inherited = true;
                }
            } else {
                last_anchor = Some((location.page, location.paragraph_index));
            }
        }

        rows.push(PreviewRow {
            cluster_id: dense_id[raw_cid],
            unit_id: unit.id,
            text: unit.text_ref.clone(),
            location,
            similarity: cosine_similarity(&unit.vector, &centroids[raw_cid]),
            location_inherited: inherited,
            bins_clamped: cluster_bins_clamped[raw_cid],
        });
    }
    rows
}

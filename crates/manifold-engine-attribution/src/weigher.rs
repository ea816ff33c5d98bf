//! Dirichlet-smoothed, decay-weighted attribution.
//!
//! Converts the raw event stream into per-contributor weights for a period:
//!
//! ```text
//! Ledger events ──> decay by elapsed periods ──> per-contributor totals
//!                                                      │
//!                                  + smoothing_alpha per contributor
//!                                                      │
//!                                                      ▼
//!                                   normalize: weights sum to 1.0
//! ```
//!
//! Decay and smoothing are computed on read. The ledger's historical totals
//! are never rewritten, so an auditor can always re-derive any snapshot from
//! the raw events plus the config.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AttributionError, AttributionResult};
use crate::ledger::ContributionLedger;

/// Tolerance on the weight-sum invariant.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Configuration for the attribution weigher.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeigherConfig {
    /// Pseudo-count added to every known contributor's decayed total.
    /// Larger values flatten the distribution; 0.0 disables smoothing.
    pub smoothing_alpha: f64,
    /// Periods after which a contribution's influence halves.
    ///
    /// INVARIANT: > 0.0
    pub decay_half_life: f64,
}

impl Default for WeigherConfig {
    fn default() -> Self {
        Self {
            smoothing_alpha: 0.1,
            decay_half_life: 12.0,
        }
    }
}

impl WeigherConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> AttributionResult<()> {
        if !self.smoothing_alpha.is_finite() || self.smoothing_alpha < 0.0 {
            return Err(AttributionError::InvalidConfig {
                field: "smoothing_alpha",
                message: format!("expected finite >= 0.0, got {}", self.smoothing_alpha),
            });
        }
        if !self.decay_half_life.is_finite() || self.decay_half_life <= 0.0 {
            return Err(AttributionError::InvalidConfig {
                field: "decay_half_life",
                message: format!("expected finite > 0.0, got {}", self.decay_half_life),
            });
        }
        Ok(())
    }
}

/// Normalized attribution weights for one period.
///
/// INVARIANT: for a non-empty contributor set,
/// `weights.values().sum()` is within [`WEIGHT_SUM_TOLERANCE`] of 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionSnapshot {
    /// Period the snapshot was computed for
    pub period: u32,
    /// Contributor id -> normalized weight (BTreeMap keeps serialization
    /// order stable for hashing and comparison)
    pub weights: BTreeMap<String, f64>,
    /// Decayed raw totals per category, retained for audit
    pub category_totals: BTreeMap<String, f64>,
}

impl AttributionSnapshot {
    /// An empty snapshot for a period with no contributors.
    pub fn empty(period: u32) -> Self {
        Self {
            period,
            weights: BTreeMap::new(),
            category_totals: BTreeMap::new(),
        }
    }

    /// True when no contributor carries weight.
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Check the sum-to-one invariant. Trivially true for empty snapshots.
    pub fn weights_sum_to_one(&self) -> bool {
        if self.weights.is_empty() {
            return true;
        }
        let sum: f64 = self.weights.values().sum();
        (sum - 1.0).abs() <= WEIGHT_SUM_TOLERANCE
    }

    /// Flatten into ordered records suitable for Merkle leaf hashing.
    pub fn to_records(&self) -> Vec<AttributionRecord> {
        self.weights
            .iter()
            .map(|(contributor_id, weight)| AttributionRecord {
                contributor_id: contributor_id.clone(),
                weight: *weight,
                period: self.period,
            })
            .collect()
    }
}

/// One contributor's weight for a period; the unit committed under a
/// Merkle root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionRecord {
    /// Contributor identifier
    pub contributor_id: String,
    /// Normalized weight in [0, 1]
    pub weight: f64,
    /// Period the weight applies to
    pub period: u32,
}

/// Computes attribution snapshots from a ledger.
#[derive(Debug, Clone)]
pub struct AttributionWeigher {
    config: WeigherConfig,
}

impl AttributionWeigher {
    /// Create a weigher with the given (validated) configuration.
    pub fn new(config: WeigherConfig) -> AttributionResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Compute the weight snapshot for `current_period`.
    ///
    /// An empty ledger yields an empty snapshot, not an error. Events dated
    /// after `current_period` count with zero elapsed decay.
    pub fn snapshot(
        &self,
        ledger: &ContributionLedger,
        current_period: u32,
    ) -> AttributionSnapshot {
        let events = ledger.events();
        if events.is_empty() {
            return AttributionSnapshot::empty(current_period);
        }

        let mut totals: BTreeMap<String, f64> = BTreeMap::new();
        let mut category_totals: BTreeMap<String, f64> = BTreeMap::new();

        for event in &events {
            let elapsed = current_period.saturating_sub(event.period) as f64;
            let decayed = event.amount * 0.5_f64.powf(elapsed / self.config.decay_half_life);
            *totals.entry(event.contributor_id.clone()).or_insert(0.0) += decayed;
            *category_totals.entry(event.category.clone()).or_insert(0.0) += decayed;
        }

        let alpha = self.config.smoothing_alpha;
        let denom: f64 = totals.values().map(|t| t + alpha).sum();

        // With alpha = 0.0 and every total decayed or recorded to zero the
        // denominator vanishes; no contributor dominates, so each known
        // contributor gets an equal share instead of NaN.
        let weights: BTreeMap<String, f64> = if denom <= 0.0 {
            let uniform = 1.0 / totals.len() as f64;
            totals.keys().map(|id| (id.clone(), uniform)).collect()
        } else {
            totals
                .iter()
                .map(|(id, total)| (id.clone(), (total + alpha) / denom))
                .collect()
        };

        debug!(
            period = current_period,
            contributors = weights.len(),
            events = events.len(),
            "computed attribution snapshot"
        );

        AttributionSnapshot {
            period: current_period,
            weights,
            category_totals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::ContributionEvent;

    fn ledger_with(amounts: &[(&str, f64, u32)]) -> ContributionLedger {
        let ledger = ContributionLedger::new();
        for (id, amount, period) in amounts {
            ledger
                .append(ContributionEvent::new(*id, *amount, "documents", *period))
                .unwrap();
        }
        ledger
    }

    #[test]
    fn weights_sum_to_one() {
        let ledger = ledger_with(&[("a", 100.0, 1), ("b", 50.0, 1), ("c", 30.0, 1)]);
        let weigher = AttributionWeigher::new(WeigherConfig::default()).unwrap();

        let snapshot = weigher.snapshot(&ledger, 1);
        assert!(snapshot.weights_sum_to_one());
    }

    #[test]
    fn five_contributor_scenario_ranks_largest_first() {
        let ledger = ledger_with(&[
            ("c1", 100.0, 1),
            ("c2", 50.0, 1),
            ("c3", 30.0, 1),
            ("c4", 10.0, 1),
            ("c5", 5.0, 1),
        ]);
        let weigher = AttributionWeigher::new(WeigherConfig {
            smoothing_alpha: 0.1,
            decay_half_life: 12.0,
        })
        .unwrap();

        let snapshot = weigher.snapshot(&ledger, 1);
        assert_eq!(snapshot.weights.len(), 5);
        assert!(snapshot.weights_sum_to_one());

        let w1 = snapshot.weights["c1"];
        for id in ["c2", "c3", "c4", "c5"] {
            assert!(w1 > snapshot.weights[id], "c1 must dominate {id}");
        }
    }

    #[test]
    fn empty_ledger_yields_empty_snapshot() {
        let ledger = ContributionLedger::new();
        let weigher = AttributionWeigher::new(WeigherConfig::default()).unwrap();

        let snapshot = weigher.snapshot(&ledger, 3);
        assert!(snapshot.is_empty());
        assert!(snapshot.weights_sum_to_one());
    }

    #[test]
    fn decay_halves_influence_after_half_life() {
        // Same raw amount, one event decayed one full half-life.
        let ledger = ledger_with(&[("old", 100.0, 0), ("new", 100.0, 4)]);
        let weigher = AttributionWeigher::new(WeigherConfig {
            smoothing_alpha: 0.0,
            decay_half_life: 4.0,
        })
        .unwrap();

        let snapshot = weigher.snapshot(&ledger, 4);
        let old = snapshot.weights["old"];
        let new = snapshot.weights["new"];
        assert!((new - 2.0 * old).abs() < 1e-9, "old={old} new={new}");
    }

    #[test]
    fn smoothing_guarantees_nonzero_weight() {
        let ledger = ledger_with(&[("whale", 1_000_000.0, 1), ("minnow", 0.0, 1)]);
        let weigher = AttributionWeigher::new(WeigherConfig {
            smoothing_alpha: 0.1,
            decay_half_life: 12.0,
        })
        .unwrap();

        let snapshot = weigher.snapshot(&ledger, 1);
        assert!(snapshot.weights["minnow"] > 0.0);
    }

    #[test]
    fn zero_alpha_zero_amounts_fall_back_to_uniform_weights() {
        // No smoothing, no recorded value anywhere: the normalizing
        // denominator is exactly zero and must not poison the weights.
        let ledger = ledger_with(&[("a", 0.0, 1), ("b", 0.0, 1)]);
        let weigher = AttributionWeigher::new(WeigherConfig {
            smoothing_alpha: 0.0,
            decay_half_life: 12.0,
        })
        .unwrap();

        let snapshot = weigher.snapshot(&ledger, 1);
        assert!(snapshot.weights.values().all(|w| w.is_finite()));
        assert!(snapshot.weights_sum_to_one());
        assert!((snapshot.weights["a"] - 0.5).abs() < 1e-12);
        assert!((snapshot.weights["b"] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn config_validation_rejects_bad_values() {
        assert!(WeigherConfig {
            smoothing_alpha: -0.5,
            decay_half_life: 1.0
        }
        .validate()
        .is_err());
        assert!(WeigherConfig {
            smoothing_alpha: 0.1,
            decay_half_life: 0.0
        }
        .validate()
        .is_err());
    }
}

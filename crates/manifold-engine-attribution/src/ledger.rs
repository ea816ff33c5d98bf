//! Append-only contribution ledger.
//!
//! The ledger is the only long-lived mutable state in the engine. It is an
//! injectable handle (never a singleton): callers construct one, share clones
//! of it, and pass it to the weigher at snapshot time. Historical events are
//! never mutated in place; decay is applied on read by the weigher, which
//! preserves auditability of the raw amounts.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{AttributionError, AttributionResult};

/// Maximum lock acquisition attempts before surfacing contention.
const APPEND_RETRY_LIMIT: u32 = 5;

/// Base backoff between append retries.
const APPEND_RETRY_BACKOFF: Duration = Duration::from_millis(2);

/// A single contribution from an external usage/billing tracker.
///
/// Append-only: once recorded, an event is never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionEvent {
    /// Opaque contributor identifier (stable across periods)
    pub contributor_id: String,
    /// Contribution amount in the tracker's unit
    ///
    /// INVARIANT: finite and >= 0.0
    pub amount: f64,
    /// Category the contribution falls under (e.g. "documents", "reviews")
    pub category: String,
    /// Accounting period the contribution belongs to
    pub period: u32,
    /// Wall-clock time the event was appended
    pub recorded_at: DateTime<Utc>,
}

impl ContributionEvent {
    /// Create an event stamped with the current time.
    pub fn new(
        contributor_id: impl Into<String>,
        amount: f64,
        category: impl Into<String>,
        period: u32,
    ) -> Self {
        Self {
            contributor_id: contributor_id.into(),
            amount,
            category: category.into(),
            period,
            recorded_at: Utc::now(),
        }
    }
}

/// Shared handle to an append-only contribution ledger.
///
/// Cloning is cheap; all clones observe the same event stream. Reads take a
/// snapshot so the weigher never blocks appenders for long.
#[derive(Debug, Clone, Default)]
pub struct ContributionLedger {
    events: Arc<RwLock<Vec<ContributionEvent>>>,
}

impl ContributionLedger {
    /// Create an empty in-memory ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one event. The sole write path into the attribution subsystem.
    ///
    /// Lock contention is retried with linear backoff; only exhausted retries
    /// surface as [`AttributionError::LedgerContention`].
    pub fn append(&self, event: ContributionEvent) -> AttributionResult<()> {
        if !event.amount.is_finite() || event.amount < 0.0 {
            return Err(AttributionError::InvalidAmount {
                contributor_id: event.contributor_id,
                amount: event.amount,
            });
        }

        for attempt in 1..=APPEND_RETRY_LIMIT {
            if let Some(mut guard) = self.events.try_write_for(APPEND_RETRY_BACKOFF) {
                guard.push(event);
                debug!(len = guard.len(), "ledger append committed");
                return Ok(());
            }
            warn!(attempt, "ledger write lock contended, retrying");
            std::thread::sleep(APPEND_RETRY_BACKOFF * attempt);
        }

        Err(AttributionError::LedgerContention {
            attempts: APPEND_RETRY_LIMIT,
        })
    }

    /// Snapshot of all events in append order.
    pub fn events(&self) -> Vec<ContributionEvent> {
        self.events.read().clone()
    }

    /// Number of events appended so far.
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// True when no events have been appended.
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}

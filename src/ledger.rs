/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Append-only feedback ledger and per-cluster confidence.
//!
//! - [`FeedbackRecord`]: one human accept/reject judgment, immutable once created.
//! - [`FeedbackLedger`]: ordered history plus a running tally per [`ClusterId`].
//!
//! # Invariants
//!
//! - Confidence is `accepted / total` over the records for that cluster only,
//!   and [`NEUTRAL_CONFIDENCE`] when the cluster has no records.
//! - Confidence is reproducible from [`FeedbackLedger::history`] alone; the
//!   tally is a cache that [`FeedbackLedger::rebuild_index`] can recompute.
//! - A failed record call leaves the ledger exactly as it was.

use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::error::{Error, Result};
use crate::identity::ClusterId;

/// Confidence reported for a cluster with no recorded feedback.
pub const NEUTRAL_CONFIDENCE: f32 = 0.5;

// ─── Verdict ────────────────────────────────────────────────────────────────

/// A single human judgment about a cluster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Verdict {
    /// The grouping looks right.
    Accepted,
    /// The grouping looks wrong.
    Rejected,
}

impl Verdict {
    /// `true` → `Accepted`, `false` → `Rejected`.
    pub fn from_bool(accepted: bool) -> Self {
        if accepted {
            Verdict::Accepted
        } else {
            Verdict::Rejected
        }
    }

    /// Whether this verdict accepts the cluster.
    pub fn is_accepted(self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

impl From<bool> for Verdict {
    fn from(accepted: bool) -> Self {
        Verdict::from_bool(accepted)
    }
}

impl TryFrom<&str> for Verdict {
    type Error = Error;

    /// Parse raw human input. Case-insensitive, surrounding whitespace ignored.
    fn try_from(raw: &str) -> Result<Self> {
        let s = raw.trim();
        const YES: [&str; 5] = ["y", "yes", "accept", "1", "true"];
        const NO: [&str; 5] = ["n", "no", "reject", "0", "false"];
        if YES.iter().any(|w| w.eq_ignore_ascii_case(s)) {
            Ok(Verdict::Accepted)
        } else if NO.iter().any(|w| w.eq_ignore_ascii_case(s)) {
            Ok(Verdict::Rejected)
        } else {
            Err(Error::invalid(
                "verdict",
                alloc::format!("expected yes/no, got '{}'", raw),
            ))
        }
    }
}

impl TryFrom<u8> for Verdict {
    type Error = Error;

    fn try_from(raw: u8) -> Result<Self> {
        match raw {
            1 => Ok(Verdict::Accepted),
            0 => Ok(Verdict::Rejected),
            other => Err(Error::invalid(
                "verdict",
                alloc::format!("expected 0 or 1, got {}", other),
            )),
        }
    }
}

// ─── FeedbackRecord ─────────────────────────────────────────────────────────

/// One recorded judgment. Fields are read-only once created.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeedbackRecord {
    cluster_id: ClusterId,
    accepted: bool,
    timestamp: u64,
}

impl FeedbackRecord {
    /// Cluster the judgment is about.
    pub fn cluster_id(&self) -> ClusterId {
        self.cluster_id
    }

    /// Whether the cluster was accepted.
    pub fn accepted(&self) -> bool {
        self.accepted
    }

    /// Recording time in milliseconds (Unix millis when stamped by `record_now`).
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// The judgment as a [`Verdict`].
    pub fn verdict(&self) -> Verdict {
        Verdict::from_bool(self.accepted)
    }
}

// ─── Tally ──────────────────────────────────────────────────────────────────

/// Running accept/total counts for one cluster.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    /// Records that accepted the cluster.
    pub accepted: u32,
    /// All records for the cluster.
    pub total: u32,
}

impl Tally {
    fn push(&mut self, accepted: bool) {
        if accepted {
            self.accepted = self.accepted.saturating_add(1);
        }
        self.total = self.total.saturating_add(1);
    }

    /// `accepted / total`, or [`NEUTRAL_CONFIDENCE`] when empty.
    pub fn confidence(&self) -> f32 {
        if self.total == 0 {
            NEUTRAL_CONFIDENCE
        } else {
            self.accepted as f32 / self.total as f32
        }
    }
}

/// Ledger-wide counts, for "good vs bad clusters" reporting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FeedbackSummary {
    /// Accepted records.
    pub accepted: usize,
    /// Rejected records.
    pub rejected: usize,
    /// Distinct clusters with at least one record.
    pub clusters: usize,
}

/// One step of the acceptance-over-time series.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProgressPoint {
    /// Timestamp of the record.
    pub timestamp: u64,
    /// The record's own judgment.
    pub accepted: bool,
    /// Fraction of all records so far (inclusive) that were accepted.
    pub running_rate: f32,
}

// ─── FeedbackLedger ─────────────────────────────────────────────────────────

/// Append-only store of feedback records with O(1) confidence queries.
#[derive(Clone, Default)]
pub struct FeedbackLedger {
    history: Vec<FeedbackRecord>,
    index: HashMap<ClusterId, Tally>,
}

impl FeedbackLedger {
    /// Construct an empty ledger.
    pub fn new() -> Self {
        Self {
            history: Vec::new(),
            index: HashMap::new(),
        }
    }

    // ── Recording ──────────────────────────────────────────────────────────

    /// Append a judgment for `cluster_id` made at `timestamp` (milliseconds).
    pub fn record(&mut self, cluster_id: ClusterId, accepted: bool, timestamp: u64) {
        self.history.push(FeedbackRecord {
            cluster_id,
            accepted,
            timestamp,
        });
        self.index.entry(cluster_id).or_default().push(accepted);
    }

    /// Append a [`Verdict`].
    pub fn record_verdict(&mut self, cluster_id: ClusterId, verdict: Verdict, timestamp: u64) {
        self.record(cluster_id, verdict.is_accepted(), timestamp);
    }

    /// Parse raw human input and append it.
    ///
    /// Fails with [`Error::InvalidInput`] on anything that is not a yes/no
    /// answer; the ledger is left untouched in that case.
    pub fn record_raw(&mut self, cluster_id: ClusterId, raw: &str, timestamp: u64) -> Result<()> {
        let verdict = Verdict::try_from(raw)?;
        self.record_verdict(cluster_id, verdict, timestamp);
        Ok(())
    }

    /// Append a judgment stamped with the current wall-clock time.
    #[cfg(feature = "std")]
    pub fn record_now(&mut self, cluster_id: ClusterId, accepted: bool) {
        self.record(cluster_id, accepted, unix_millis());
    }

    // ── Read accessors ─────────────────────────────────────────────────────

    /// Acceptance ratio for `cluster_id`, [`NEUTRAL_CONFIDENCE`] if unseen.
    pub fn confidence(&self, cluster_id: ClusterId) -> f32 {
        self.index
            .get(&cluster_id)
            .map_or(NEUTRAL_CONFIDENCE, Tally::confidence)
    }

    /// Running counts for `cluster_id`, `None` if unseen.
    pub fn tally(&self, cluster_id: ClusterId) -> Option<Tally> {
        self.index.get(&cluster_id).copied()
    }

    /// All records in insertion order.
    pub fn history(&self) -> &[FeedbackRecord] {
        &self.history
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// `true` when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Number of distinct clusters with feedback.
    pub fn cluster_count(&self) -> usize {
        self.index.len()
    }

    /// Ledger-wide accepted/rejected counts.
    pub fn summary(&self) -> FeedbackSummary {
        let accepted = self.history.iter().filter(|r| r.accepted).count();
        FeedbackSummary {
            accepted,
            rejected: self.history.len() - accepted,
            clusters: self.index.len(),
        }
    }

    /// Acceptance over time: one point per record, in recorded order.
    pub fn progress(&self) -> Vec<ProgressPoint> {
        let mut accepted = 0usize;
        self.history
            .iter()
            .enumerate()
            .map(|(i, r)| {
                if r.accepted {
                    accepted += 1;
                }
                ProgressPoint {
                    timestamp: r.timestamp,
                    accepted: r.accepted,
                    running_rate: accepted as f32 / (i + 1) as f32,
                }
            })
            .collect()
    }

    /// Recompute every tally from history.
    pub fn rebuild_index(&mut self) {
        self.index.clear();
        for r in &self.history {
            self.index.entry(r.cluster_id).or_default().push(r.accepted);
        }
    }

    /// Rebuild a ledger from previously captured records.
    pub fn from_records(records: Vec<FeedbackRecord>) -> Self {
        let mut ledger = Self {
            history: records,
            index: HashMap::new(),
        };
        ledger.rebuild_index();
        ledger
    }
}

impl core::fmt::Debug for FeedbackLedger {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FeedbackLedger")
            .field("records", &self.history.len())
            .field("clusters", &self.index.len())
            .finish()
    }
}

#[cfg(feature = "std")]
pub(crate) fn unix_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

// ─── Tests ──────────────────────────────────────────────────────────────────

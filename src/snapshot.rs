/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Portable snapshot of the feedback state for persistence between runs.
//!
//! Holds the ordered feedback history and the live weights. Confidence is
//! not stored: it is rebuilt from the history on restore, which keeps the
//! "confidence is a pure function of the ledger" invariant across runs.
//!
//! # no_std
//!
//! This module requires the `serde` feature and only needs `alloc`.
//!
//! # Example
//!
//! ```rust,ignore
//! let snapshot = FeedbackSnapshot::capture(&ledger, &policy);
//! let json = serde_json::to_string(&snapshot).unwrap();
//! let restored: FeedbackSnapshot = serde_json::from_str(&json).unwrap();
//! let ledger = restored.restore_ledger()?;
//! restored.restore_weights(&mut policy)?;
//! ```

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::error::{Error, Result};
use crate::ledger::{FeedbackLedger, FeedbackRecord};
use crate::policy::{LearningRule, WeightPolicy};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u16 = 1;

/// One persisted weight.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
pub struct WeightEntry {
    /// Weight name.
    pub key: String,
    /// Value at capture time.
    pub value: f32,
}

/// Serializable ledger history plus weights.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
pub struct FeedbackSnapshot {
    /// Format version, [`SNAPSHOT_VERSION`] for new snapshots.
    pub version: u16,
    /// Feedback records in recorded order.
    pub records: Vec<FeedbackRecord>,
    /// Weights in configuration order.
    pub weights: Vec<WeightEntry>,
}

impl FeedbackSnapshot {
    /// Capture the current ledger and weights.
    pub fn capture<R: LearningRule>(ledger: &FeedbackLedger, policy: &WeightPolicy<R>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            records: ledger.history().to_vec(),
            weights: policy
                .current_weights()
                .iter()
                .map(|(k, v)| WeightEntry {
                    key: k.to_string(),
                    value: v,
                })
                .collect(),
        }
    }

    fn check_version(&self) -> Result<()> {
        if self.version != SNAPSHOT_VERSION {
            return Err(Error::invalid(
                "snapshot",
                alloc::format!(
                    "version {} not supported (expected {})",
                    self.version, SNAPSHOT_VERSION
                ),
            ));
        }
        Ok(())
    }

    /// Rebuild the ledger, tallies included.
    pub fn restore_ledger(&self) -> Result<FeedbackLedger> {
        self.check_version()?;
        Ok(FeedbackLedger::from_records(self.records.clone()))
    }

    /// Load the captured weights into `policy`.
    ///
    /// Keys must match the policy's configuration and values must be inside
    /// its bounds; otherwise the policy is left unchanged.
    pub fn restore_weights<R: LearningRule>(&self, policy: &mut WeightPolicy<R>) -> Result<()> {
        self.check_version()?;
        let set = policy.weights_from_pairs(self.weights.iter().map(|e| (e.key.as_str(), e.value)))?;
        policy.restore(set)
    }

    /// Number of feedback records in this snapshot.
    pub fn record_count(&self) -> usize {
        self.records.len()
    }
}

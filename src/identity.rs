/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Image and cluster identifiers.
//!
//! A cluster is the unit of feedback: one accept/reject decision per cluster,
//! never per image. [`ClusterId`] is the key the ledger correlates decisions
//! by, and how it is derived decides what a confidence score means.
//!
//! - [`IdentityPolicy::ContentHash`]: FNV-1a over the sorted member identifiers.
//!   The same images regrouped into the same cluster on a later run get the
//!   same id, so confidence follows the grouping.
//! - [`IdentityPolicy::DisplayIndex`]: the 1-based position in this run's
//!   layout. Confidence then describes "the N-th cluster shown", whatever it
//!   contains.

use alloc::string::String;
use alloc::vec::Vec;

/// Identifier of a single image (typically its file path).
pub type ImageId = String;

const FNV64_OFFSET: u64 = 14_695_981_039_346_656_037;
const FNV64_PRIME: u64 = 1_099_511_628_211;

/// Tag mixed into display-index ids so they never collide with small hashes
/// by construction.
const DISPLAY_INDEX_TAG: u64 = 0x8000_0000_0000_0000;

/// Opaque feedback key for one cluster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClusterId(pub u64);

impl ClusterId {
    /// Content-derived id: FNV-1a 64 over the sorted member identifiers.
    ///
    /// Member order does not matter. Each identifier is terminated by a zero
    /// byte so that `["ab", "c"]` and `["a", "bc"]` hash differently.
    pub fn from_members<S: AsRef<str>>(members: &[S]) -> Self {
        let mut sorted: Vec<&str> = members.iter().map(|s| s.as_ref()).collect();
        sorted.sort_unstable();

        let mut h = FNV64_OFFSET;
        for id in sorted {
            for &b in id.as_bytes().iter().chain(core::iter::once(&0u8)) {
                h ^= b as u64;
                h = h.wrapping_mul(FNV64_PRIME);
            }
        }
        Self(h)
    }

    /// Volatile per-run id: the cluster's 1-based display index.
    pub fn from_display_index(display_index: usize) -> Self {
        Self(DISPLAY_INDEX_TAG | display_index as u64)
    }

    /// Raw 64-bit value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for ClusterId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// How the orchestrator keys feedback for a rendered cluster.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IdentityPolicy {
    /// Stable across runs: hash of the sorted member identifiers.
    #[default]
    ContentHash,
    /// Volatile: position of the cluster in this run's layout.
    DisplayIndex,
}

impl IdentityPolicy {
    /// Derive the feedback key for a cluster under this policy.
    pub fn cluster_id<S: AsRef<str>>(self, members: &[S], display_index: usize) -> ClusterId {
        match self {
            IdentityPolicy::ContentHash => ClusterId::from_members(members),
            IdentityPolicy::DisplayIndex => ClusterId::from_display_index(display_index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_order_does_not_matter() {
        let a = ClusterId::from_members(&["x.png", "y.png", "z.png"]);
        let b = ClusterId::from_members(&["z.png", "x.png", "y.png"]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_boundary_between_identifiers_is_hashed() {
        let a = ClusterId::from_members(&["ab", "c"]);
        let b = ClusterId::from_members(&["a", "bc"]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_different_members_differ() {
        let a = ClusterId::from_members(&["a.png", "b.png"]);
        let b = ClusterId::from_members(&["a.png", "c.png"]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_display_index_policy_ignores_members() {
        let p = IdentityPolicy::DisplayIndex;
        assert_eq!(p.cluster_id(&["a"], 3), p.cluster_id(&["b", "c"], 3));
        assert_ne!(p.cluster_id(&["a"], 3), p.cluster_id(&["a"], 4));
    }

    #[test]
    fn test_content_policy_ignores_position() {
        let p = IdentityPolicy::ContentHash;
        assert_eq!(p.cluster_id(&["a", "b"], 1), p.cluster_id(&["b", "a"], 7));
    }
}

/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! The clustering output: clusters of image identifiers grouped by size.
//!
//! The external clustering function hands back `size -> [cluster, ...]`.
//! [`Partition`] keeps that shape and iterates it in layout order: increasing
//! cluster size, then the clusters' original order within the size group.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::identity::ImageId;

/// Number of clusters of one size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SizeStat {
    /// Cluster size (images per cluster).
    pub size: usize,
    /// How many clusters have that size.
    pub count: usize,
}

/// One cluster as seen while iterating a [`Partition`].
#[derive(Clone, Copy, Debug)]
pub struct ClusterRef<'a> {
    /// Size key the cluster is grouped under.
    pub size: usize,
    /// Position within its size group.
    pub index_in_size: usize,
    /// Member identifiers, in row order.
    pub members: &'a [ImageId],
}

/// Clusters grouped by size.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Partition {
    groups: BTreeMap<usize, Vec<Vec<ImageId>>>,
}

impl Partition {
    /// An empty partition.
    pub fn new() -> Self {
        Self {
            groups: BTreeMap::new(),
        }
    }

    /// Group flat clusters by their length, keeping their relative order.
    pub fn from_clusters<I>(clusters: I) -> Self
    where
        I: IntoIterator<Item = Vec<ImageId>>,
    {
        let mut p = Self::new();
        for c in clusters {
            p.insert_cluster(c);
        }
        p
    }

    /// Use an existing `size -> clusters` map as-is.
    pub fn from_groups(groups: BTreeMap<usize, Vec<Vec<ImageId>>>) -> Self {
        Self { groups }
    }

    /// Append a cluster to the group for its length.
    pub fn insert_cluster(&mut self, members: Vec<ImageId>) {
        self.groups.entry(members.len()).or_default().push(members);
    }

    /// Clusters grouped under `size`.
    pub fn clusters_of_size(&self, size: usize) -> &[Vec<ImageId>] {
        self.groups.get(&size).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of clusters across all sizes.
    pub fn cluster_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// `true` if there are no clusters at all.
    pub fn is_empty(&self) -> bool {
        self.cluster_count() == 0
    }

    /// Per-size cluster counts in increasing size order. Sizes with no
    /// clusters are omitted.
    pub fn stats(&self) -> Vec<SizeStat> {
        self.groups
            .iter()
            .filter(|(_, cs)| !cs.is_empty())
            .map(|(&size, cs)| SizeStat {
                size,
                count: cs.len(),
            })
            .collect()
    }

    /// Every cluster in layout order.
    pub fn iter_ordered(&self) -> impl Iterator<Item = ClusterRef<'_>> + '_ {
        self.groups.iter().flat_map(|(&size, cs)| {
            cs.iter().enumerate().map(move |(i, m)| ClusterRef {
                size,
                index_in_size: i,
                members: m.as_slice(),
            })
        })
    }

    /// The underlying `size -> clusters` map.
    pub fn groups(&self) -> &BTreeMap<usize, Vec<Vec<ImageId>>> {
        &self.groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use alloc::vec;

    fn ids(names: &[&str]) -> Vec<ImageId> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_from_clusters_groups_by_len() {
        let p = Partition::from_clusters(vec![
            ids(&["a", "b", "c"]),
            ids(&["d", "e"]),
            ids(&["f", "g", "h"]),
        ]);
        assert_eq!(p.cluster_count(), 3);
        assert_eq!(p.clusters_of_size(3).len(), 2);
        assert_eq!(p.clusters_of_size(2).len(), 1);
        assert!(p.clusters_of_size(7).is_empty());
        assert_eq!(
            p.stats(),
            vec![SizeStat { size: 2, count: 1 }, SizeStat { size: 3, count: 2 }]
        );
    }

    #[test]
    fn test_iter_ordered_size_then_original_order() {
        let p = Partition::from_clusters(vec![
            ids(&["x1", "x2", "x3"]),
            ids(&["y1", "y2"]),
            ids(&["z1", "z2", "z3"]),
        ]);
        let order: Vec<(usize, usize, &str)> = p
            .iter_ordered()
            .map(|c| (c.size, c.index_in_size, c.members[0].as_str()))
            .collect();
        assert_eq!(order, vec![(2, 0, "y1"), (3, 0, "x1"), (3, 1, "z1")]);
    }

    #[test]
    fn test_empty() {
        let mut groups = BTreeMap::new();
        groups.insert(4, Vec::new());
        let p = Partition::from_groups(groups);
        assert!(p.is_empty());
        assert!(p.stats().is_empty());
        assert!(Partition::new().is_empty());
    }
}

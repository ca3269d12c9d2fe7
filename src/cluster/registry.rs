// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use std::fmt;

use crate::cluster::MicroCluster;
use crate::common::euclidean_distance;
use crate::decay::Timestamp;

/// Which tier a registry holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistryKind {
    /// Long-lived clusters with weight at or above `beta * mu`.
    Potential,
    /// Provisional clusters still below the promotion threshold.
    Outlier,
}

impl RegistryKind {
    /// Convert this kind into static str.
    pub const fn into_static(self) -> &'static str {
        match self {
            RegistryKind::Potential => "potential",
            RegistryKind::Outlier => "outlier",
        }
    }
}

impl fmt::Display for RegistryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.into_static())
    }
}

/// An ordered, exclusively owned collection of microclusters of one tier.
///
/// Insertion order is preserved so that nearest-cluster ties resolve the same
/// way on every run.
#[derive(Debug, Clone)]
pub struct Registry {
    kind: RegistryKind,
    clusters: Vec<MicroCluster>,
}

impl Registry {
    /// Creates an empty registry of the given tier.
    pub fn new(kind: RegistryKind) -> Self {
        Self {
            kind,
            clusters: Vec::new(),
        }
    }

    /// Returns the tier of this registry.
    pub fn kind(&self) -> RegistryKind {
        self.kind
    }

    /// Returns the number of clusters.
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// Returns true if the registry holds no cluster.
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Returns an iterator over the clusters in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, MicroCluster> {
        self.clusters.iter()
    }

    /// Returns the cluster at `index`.
    pub fn get(&self, index: usize) -> Option<&MicroCluster> {
        self.clusters.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut MicroCluster> {
        self.clusters.get_mut(index)
    }

    /// Takes ownership of a cluster.
    pub fn push(&mut self, cluster: MicroCluster) {
        self.clusters.push(cluster);
    }

    /// Moves the cluster at `index` out of the registry.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn take(&mut self, index: usize) -> MicroCluster {
        self.clusters.remove(index)
    }

    /// Returns the index of the cluster nearest to `point` at `time`.
    ///
    /// Candidates are ranked by `distance(point, center) - radius`, so a wide
    /// cluster that already reaches toward the point beats a tight one whose
    /// center is closer. The score goes negative once the point lies inside a
    /// cluster. Ties go to the earliest cluster.
    ///
    /// # Panics
    ///
    /// Panics if the registry is empty.
    pub fn nearest(&self, point: &[f64], time: Timestamp) -> usize {
        if self.is_empty() {
            panic!("nearest-cluster query on an empty {} registry", self.kind);
        }
        let mut best = 0;
        let mut best_score = f64::INFINITY;
        for (index, cluster) in self.clusters.iter().enumerate() {
            let score =
                euclidean_distance(point, &cluster.center_at(time)) - cluster.radius_at(time);
            if score < best_score {
                best = index;
                best_score = score;
            }
        }
        best
    }

    /// Drops every cluster for which `keep` returns false and returns how many
    /// were removed.
    pub fn retain<F>(&mut self, keep: F) -> usize
    where
        F: FnMut(&MicroCluster) -> bool,
    {
        let before = self.clusters.len();
        self.clusters.retain(keep);
        before - self.clusters.len()
    }

    /// Removes every cluster.
    pub fn clear(&mut self) {
        self.clusters.clear();
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a MicroCluster;
    type IntoIter = std::slice::Iter<'a, MicroCluster>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decay::Decay;

    fn cluster(points: &[&[f64]]) -> MicroCluster {
        let decay = Decay::new(0.0);
        let mut mc = MicroCluster::new(points[0], 0, decay);
        for p in &points[1..] {
            mc.insert(p, 0);
        }
        mc
    }

    #[test]
    fn test_nearest_prefers_stretch_over_center_distance() {
        let mut registry = Registry::new(RegistryKind::Potential);
        // tight cluster centered at 10.0, radius 0
        registry.push(cluster(&[&[10.0], &[10.0]]));
        // wide cluster centered at 0.0, radius 4.0
        registry.push(cluster(&[&[-4.0], &[4.0]]));

        // center distances are 4.0 and 6.0, stretch scores 4.0 and 2.0
        assert_eq!(registry.nearest(&[6.0], 0), 1);
        // a point already inside the wide cluster scores negative
        assert_eq!(registry.nearest(&[0.0], 0), 1);
        // close to the tight cluster it wins again
        assert_eq!(registry.nearest(&[9.0], 0), 0);
    }

    #[test]
    fn test_nearest_ties_go_to_first() {
        let mut registry = Registry::new(RegistryKind::Outlier);
        registry.push(cluster(&[&[1.0]]));
        registry.push(cluster(&[&[-1.0]]));
        assert_eq!(registry.nearest(&[0.0], 0), 0);
    }

    #[test]
    #[should_panic(expected = "nearest-cluster query on an empty outlier registry")]
    fn test_nearest_on_empty() {
        let registry = Registry::new(RegistryKind::Outlier);
        let _ = registry.nearest(&[0.0], 0);
    }

    #[test]
    fn test_take_and_retain() {
        let mut registry = Registry::new(RegistryKind::Outlier);
        registry.push(cluster(&[&[1.0]]));
        registry.push(cluster(&[&[2.0], &[2.0]]));
        registry.push(cluster(&[&[3.0]]));

        let taken = registry.take(1);
        assert_eq!(taken.weight_at(0), 2.0);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(1).map(|mc| mc.center_at(0)), Some(vec![3.0]));

        let removed = registry.retain(|mc| mc.center_at(0)[0] > 1.5);
        assert_eq!(removed, 1);
        assert_eq!(registry.len(), 1);

        registry.clear();
        assert!(registry.is_empty());
        assert_eq!(registry.kind(), RegistryKind::Outlier);
    }
}

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

use crate::decay::Decay;
use crate::decay::Timestamp;

/// A decaying cluster-feature summary of one region of space.
///
/// The accumulators are stored as of `last_update`; every query fast-forwards
/// them to the requested time before use. Decay scales the weight and both
/// sums by the same factor, so the center and radius only change on insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct MicroCluster {
    decay: Decay,
    weight: f64,
    linear_sum: Vec<f64>,
    squared_sum: Vec<f64>,
    creation_time: Timestamp,
    last_update: Timestamp,
}

impl MicroCluster {
    /// Creates a cluster holding the single point `point` observed at `time`.
    ///
    /// # Panics
    ///
    /// Panics if `point` is empty.
    pub fn new(point: &[f64], time: Timestamp, decay: Decay) -> Self {
        assert!(!point.is_empty(), "a point must have at least one dimension");
        Self {
            decay,
            weight: 1.0,
            linear_sum: point.to_vec(),
            squared_sum: point.iter().map(|x| x * x).collect(),
            creation_time: time,
            last_update: time,
        }
    }

    /// Returns the dimensionality of the summarized points.
    pub fn dim(&self) -> usize {
        self.linear_sum.len()
    }

    /// Returns the time the first point was inserted.
    pub fn creation_time(&self) -> Timestamp {
        self.creation_time
    }

    /// Returns the time of the most recent insertion.
    pub fn last_update(&self) -> Timestamp {
        self.last_update
    }

    /// Inserts a point observed at `time`.
    ///
    /// Existing accumulators are decayed to `time` first, then the point adds
    /// an undecayed unit contribution. A `time` earlier than the last update
    /// is treated as the last update.
    ///
    /// # Panics
    ///
    /// Panics if the point dimension does not match this cluster.
    pub fn insert(&mut self, point: &[f64], time: Timestamp) {
        self.ensure_dim(point.len());
        let factor = self.decay.factor(self.elapsed(time));
        self.weight = self.weight * factor + 1.0;
        for ((ls, ss), x) in self
            .linear_sum
            .iter_mut()
            .zip(self.squared_sum.iter_mut())
            .zip(point.iter())
        {
            *ls = *ls * factor + x;
            *ss = *ss * factor + x * x;
        }
        self.last_update = self.last_update.max(time);
    }

    /// Returns the decayed weight at `time`.
    pub fn weight_at(&self, time: Timestamp) -> f64 {
        self.weight * self.decay.factor(self.elapsed(time))
    }

    /// Returns the center at `time`.
    ///
    /// Any `time` is accepted; the center only moves on insertion.
    pub fn center_at(&self, _time: Timestamp) -> Vec<f64> {
        self.linear_sum.iter().map(|ls| ls / self.weight).collect()
    }

    /// Returns the radius at `time`: the square root of the largest
    /// per-dimension variance, never negative.
    pub fn radius_at(&self, _time: Timestamp) -> f64 {
        radius_of(self.weight, &self.linear_sum, &self.squared_sum, 1.0, None)
    }

    /// Returns the radius this cluster would have if `point` were inserted at
    /// `time`, leaving the cluster untouched.
    ///
    /// # Panics
    ///
    /// Panics if the point dimension does not match this cluster.
    pub fn trial_radius_at(&self, point: &[f64], time: Timestamp) -> f64 {
        self.ensure_dim(point.len());
        let factor = self.decay.factor(self.elapsed(time));
        radius_of(
            self.weight,
            &self.linear_sum,
            &self.squared_sum,
            factor,
            Some(point),
        )
    }

    /// Returns a decay-adjusted summary of this cluster at `time`.
    pub fn summary_at(&self, time: Timestamp) -> MicroClusterSummary {
        MicroClusterSummary {
            center: self.center_at(time),
            radius: self.radius_at(time),
            weight: self.weight_at(time),
            creation_time: self.creation_time,
        }
    }

    fn elapsed(&self, time: Timestamp) -> Timestamp {
        time.saturating_sub(self.last_update)
    }

    fn ensure_dim(&self, point_len: usize) {
        if point_len != self.dim() {
            panic!("dimension mismatch");
        }
    }
}

/// Computes `sqrt(max_d(SS_d / W - (LS_d / W)^2))` over accumulators scaled
/// by `factor`, optionally with one extra unit-weight point.
fn radius_of(
    weight: f64,
    linear_sum: &[f64],
    squared_sum: &[f64],
    factor: f64,
    extra: Option<&[f64]>,
) -> f64 {
    let total = weight * factor + if extra.is_some() { 1.0 } else { 0.0 };
    if total <= 0.0 {
        return 0.0;
    }
    let mut max_variance = 0.0f64;
    for d in 0..linear_sum.len() {
        let x = extra.map_or(0.0, |p| p[d]);
        let ls = linear_sum[d] * factor + x;
        let ss = squared_sum[d] * factor + x * x;
        let center = ls / total;
        let variance = ss / total - center * center;
        if variance > max_variance {
            max_variance = variance;
        }
    }
    max_variance.sqrt()
}

/// A read-only snapshot of a microcluster, decay-adjusted to the time it was
/// taken.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MicroClusterSummary {
    /// Weighted mean of the summarized points.
    pub center: Vec<f64>,
    /// Square root of the largest per-dimension variance.
    pub radius: f64,
    /// Decayed weight.
    pub weight: f64,
    /// Logical time of the first point.
    pub creation_time: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decay() -> Decay {
        Decay::new(0.5)
    }

    #[test]
    fn test_singleton() {
        let mc = MicroCluster::new(&[1.0, -2.0], 3, decay());
        assert_eq!(mc.dim(), 2);
        assert_eq!(mc.creation_time(), 3);
        assert_eq!(mc.weight_at(3), 1.0);
        assert_eq!(mc.center_at(3), vec![1.0, -2.0]);
        assert_eq!(mc.radius_at(3), 0.0);
        assert_eq!(mc.weight_at(5), 0.5);
    }

    #[test]
    fn test_insert_decays_before_adding() {
        let mut mc = MicroCluster::new(&[0.0], 0, decay());
        mc.insert(&[2.0], 2);
        // old point is worth 0.5, new point 1.0
        assert_eq!(mc.weight_at(2), 1.5);
        let center = mc.center_at(2);
        assert!((center[0] - 2.0 / 1.5).abs() < 1e-12);
        assert_eq!(mc.last_update(), 2);
        assert_eq!(mc.creation_time(), 0);
    }

    #[test]
    fn test_radius_takes_max_dimension() {
        let mut mc = MicroCluster::new(&[0.0, 0.0], 0, Decay::new(0.0));
        mc.insert(&[2.0, 0.5], 0);
        // variances are 1.0 and 0.0625
        assert_eq!(mc.radius_at(0), 1.0);
    }

    #[test]
    fn test_trial_matches_real_insert() {
        let mut mc = MicroCluster::new(&[1.0, 1.0], 0, decay());
        mc.insert(&[1.5, 0.5], 1);
        let before = mc.clone();

        let trial = mc.trial_radius_at(&[3.0, 2.0], 4);
        assert_eq!(mc, before);

        mc.insert(&[3.0, 2.0], 4);
        assert!((mc.radius_at(4) - trial).abs() < 1e-12);
    }

    #[test]
    fn test_radius_never_negative_for_repeated_point() {
        let mut mc = MicroCluster::new(&[0.1, 1e8], 0, decay());
        for t in 1..50 {
            mc.insert(&[0.1, 1e8], t);
            assert!(mc.radius_at(t) >= 0.0);
            assert!(mc.trial_radius_at(&[0.1, 1e8], t + 1) >= 0.0);
        }
    }

    #[test]
    fn test_out_of_order_time_does_not_amplify() {
        let mut mc = MicroCluster::new(&[0.0], 4, decay());
        mc.insert(&[0.0], 2);
        assert_eq!(mc.weight_at(4), 2.0);
        assert_eq!(mc.last_update(), 4);
    }

    #[test]
    fn test_queries_between_insertions() {
        let mut mc = MicroCluster::new(&[0.0], 0, decay());
        mc.insert(&[1.0], 5);
        let radius = mc.radius_at(5);
        assert!(radius > 0.0);
        assert_eq!(mc.radius_at(2), radius);
        assert_eq!(mc.center_at(2), mc.center_at(5));
        assert_eq!(mc.summary_at(0).center, mc.center_at(5));
    }

    #[test]
    #[should_panic(expected = "dimension mismatch")]
    fn test_insert_dimension_mismatch() {
        let mut mc = MicroCluster::new(&[0.0, 0.0], 0, decay());
        mc.insert(&[0.0], 1);
    }
}

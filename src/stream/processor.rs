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

use tracing::debug;
use tracing::trace;
use tracing::warn;

use crate::cluster::MicroCluster;
use crate::cluster::MicroClusterSummary;
use crate::cluster::Registry;
use crate::cluster::RegistryKind;
use crate::decay::Decay;
use crate::decay::DecayClock;
use crate::decay::Timestamp;
use crate::error::Error;
use crate::seeding::Seeding;
use crate::stream::DenStreamConfig;

/// What happened to a point handed to [`DenStream::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The point was buffered for the initial pass.
    Buffered,
    /// The point filled the buffer and the initial pass produced `clusters`
    /// potential microclusters.
    Seeded {
        /// Number of potential microclusters seeded.
        clusters: usize,
    },
    /// The point was absorbed by a potential microcluster.
    MergedPotential,
    /// The point was absorbed by an outlier microcluster, which was moved to
    /// the potential tier if `promoted`.
    MergedOutlier {
        /// Whether the absorbing cluster crossed the promotion threshold.
        promoted: bool,
    },
    /// The point started a new outlier microcluster.
    Spawned,
}

/// Online density-based microclustering over an evolving stream.
///
/// Points are consumed one at a time in arrival order. The first
/// `init_points` points are buffered and clustered once by density
/// reachability; afterwards each point is merged into the nearest potential
/// microcluster, else into the nearest outlier microcluster, else starts a
/// new outlier microcluster, as long as the absorbing cluster's radius stays
/// within `epsilon`. Decayed-out clusters are pruned every
/// [`pruning_period`](Self::pruning_period) ticks.
///
/// # Usage
///
/// ```rust
/// # use denstream::stream::{DenStream, DenStreamConfig};
/// let config = DenStreamConfig::default()
///     .with_init_points(3)
///     .with_epsilon(1.0)
///     .with_min_points(1);
/// let mut stream = DenStream::new(config).unwrap();
/// stream.update(&[0.0, 0.0]);
/// stream.update(&[0.1, 0.0]);
/// stream.update(&[0.0, 0.1]);
/// assert!(stream.is_initialized());
/// assert_eq!(stream.micro_clusters().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct DenStream {
    config: DenStreamConfig,
    decay: Decay,
    promotion_weight: f64,
    pruning_period: Timestamp,
    clock: DecayClock,
    last_pruned: Option<Timestamp>,
    dimension: Option<usize>,
    init_buffer: Vec<Vec<f64>>,
    initialized: bool,
    potential: Registry,
    outliers: Registry,
}

impl DenStream {
    /// Creates a processor from a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ConfigInvalid`](crate::error::ErrorKind::ConfigInvalid)
    /// if the configuration does not validate.
    pub fn new(config: DenStreamConfig) -> Result<Self, Error> {
        config.validate()?;
        let decay = config.decay();
        let promotion_weight = config.promotion_weight();
        if promotion_weight <= 1.0 {
            warn!(
                beta = config.beta,
                mu = config.mu,
                "beta * mu <= 1, pruning every tick"
            );
        }
        let pruning_period = config.pruning_period();
        debug!(
            lambda = decay.lambda(),
            pruning_period, promotion_weight, "created microclustering processor"
        );
        Ok(Self {
            decay,
            promotion_weight,
            pruning_period,
            clock: DecayClock::new(config.stream_speed),
            last_pruned: None,
            dimension: None,
            init_buffer: Vec::new(),
            initialized: false,
            potential: Registry::new(RegistryKind::Potential),
            outliers: Registry::new(RegistryKind::Outlier),
            config,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &DenStreamConfig {
        &self.config
    }

    /// Returns the decay rate λ.
    pub fn lambda(&self) -> f64 {
        self.decay.lambda()
    }

    /// Returns the pruning period, in ticks.
    pub fn pruning_period(&self) -> Timestamp {
        self.pruning_period
    }

    /// Returns true once the initial pass has run.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Returns the number of points accepted so far.
    pub fn points_seen(&self) -> u64 {
        self.clock.points()
    }

    /// Returns the logical time of the most recent point.
    pub fn current_time(&self) -> Timestamp {
        self.clock.now()
    }

    /// Returns the model dimensionality, fixed by the first point.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Returns the number of potential microclusters.
    pub fn num_potential(&self) -> usize {
        self.potential.len()
    }

    /// Returns the number of outlier microclusters.
    pub fn num_outliers(&self) -> usize {
        self.outliers.len()
    }

    /// Returns an iterator over the potential microclusters.
    pub fn potential_clusters(&self) -> std::slice::Iter<'_, MicroCluster> {
        self.potential.iter()
    }

    /// Returns the potential microclusters, decay-adjusted to the current time.
    pub fn micro_clusters(&self) -> Vec<MicroClusterSummary> {
        let now = self.clock.now();
        self.potential.iter().map(|mc| mc.summary_at(now)).collect()
    }

    /// Processes one point.
    ///
    /// # Panics
    ///
    /// Panics if the point dimension does not match the model.
    pub fn update(&mut self, point: &[f64]) -> UpdateOutcome {
        match self.try_update(point) {
            Ok(outcome) => outcome,
            Err(err) => panic!("{}", err.message()),
        }
    }

    /// Processes one point.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::DimensionMismatch`](crate::error::ErrorKind::DimensionMismatch)
    /// if the point is empty or its dimension does not match the model. The
    /// processor is left untouched in that case.
    pub fn try_update(&mut self, point: &[f64]) -> Result<UpdateOutcome, Error> {
        self.ensure_dim(point.len())?;
        self.dimension = Some(point.len());

        let now = self.clock.advance();

        if !self.initialized {
            self.init_buffer.push(point.to_vec());
            if self.init_buffer.len() < self.config.init_points {
                return Ok(UpdateOutcome::Buffered);
            }
            let clusters = self.initialize(now);
            return Ok(UpdateOutcome::Seeded { clusters });
        }

        let outcome = self.absorb(point, now);
        trace!(time = now, ?outcome, "processed point");

        // at most once per tick, on its first steady-state point
        if now % self.pruning_period == 0 && self.last_pruned != Some(now) {
            self.prune(now);
            self.last_pruned = Some(now);
        }
        Ok(outcome)
    }

    /// Returns the processor to its freshly constructed state.
    pub fn reset(&mut self) {
        self.clock.reset();
        self.last_pruned = None;
        self.dimension = None;
        self.init_buffer.clear();
        self.initialized = false;
        self.potential.clear();
        self.outliers.clear();
    }

    fn initialize(&mut self, now: Timestamp) -> usize {
        let seeding = Seeding::new(self.config.epsilon, self.config.min_points);
        let buffer = std::mem::take(&mut self.init_buffer);
        let output = seeding.run(&buffer, now, self.decay);
        let clusters = output.clusters.len();
        debug!(
            buffered = buffer.len(),
            clusters,
            noise = output.noise,
            time = now,
            "initial density pass finished"
        );
        for cluster in output.clusters {
            self.potential.push(cluster);
        }
        self.initialized = true;
        clusters
    }

    fn absorb(&mut self, point: &[f64], now: Timestamp) -> UpdateOutcome {
        if self.try_merge(RegistryKind::Potential, point, now).is_some() {
            return UpdateOutcome::MergedPotential;
        }

        if let Some(index) = self.try_merge(RegistryKind::Outlier, point, now) {
            let weight = self
                .outliers
                .get(index)
                .map_or(0.0, |cluster| cluster.weight_at(now));
            let promoted = weight > self.promotion_weight;
            if promoted {
                let cluster = self.outliers.take(index);
                debug!(
                    weight,
                    creation_time = cluster.creation_time(),
                    time = now,
                    "promoted outlier microcluster"
                );
                self.potential.push(cluster);
            }
            return UpdateOutcome::MergedOutlier { promoted };
        }

        self.outliers.push(MicroCluster::new(point, now, self.decay));
        UpdateOutcome::Spawned
    }

    /// Inserts `point` into the nearest cluster of the `kind` registry if its
    /// radius stays within epsilon, returning the cluster's index.
    fn try_merge(&mut self, kind: RegistryKind, point: &[f64], now: Timestamp) -> Option<usize> {
        let epsilon = self.config.epsilon;
        let registry = match kind {
            RegistryKind::Potential => &mut self.potential,
            RegistryKind::Outlier => &mut self.outliers,
        };
        if registry.is_empty() {
            return None;
        }
        let index = registry.nearest(point, now);
        let cluster = registry.get_mut(index)?;
        if cluster.trial_radius_at(point, now) > epsilon {
            return None;
        }
        cluster.insert(point, now);
        Some(index)
    }

    fn prune(&mut self, now: Timestamp) {
        let promotion_weight = self.promotion_weight;
        let removed_potential = self
            .potential
            .retain(|cluster| cluster.weight_at(now) >= promotion_weight);

        let decay = self.decay;
        let period = self.pruning_period;
        let removed_outliers = self.outliers.retain(|cluster| {
            cluster.weight_at(now) >= survival_weight(decay, now, cluster.creation_time(), period)
        });

        debug!(
            time = now,
            removed_potential,
            removed_outliers,
            potential = self.potential.len(),
            outliers = self.outliers.len(),
            "pruned microclusters"
        );
    }

    fn ensure_dim(&self, point_len: usize) -> Result<(), Error> {
        if point_len == 0 {
            return Err(Error::dimension_mismatch(self.dimension.unwrap_or(0), 0));
        }
        match self.dimension {
            Some(dimension) if dimension != point_len => {
                Err(Error::dimension_mismatch(dimension, point_len))
            }
            _ => Ok(()),
        }
    }
}

/// Minimum weight an outlier created at `creation_time` must carry at `now`
/// to stay: `ξ = (2^(-λ(now - t0 + Tp)) - 1) / (2^(-λ·Tp) - 1)`.
fn survival_weight(decay: Decay, now: Timestamp, creation_time: Timestamp, period: Timestamp) -> f64 {
    let age = now.saturating_sub(creation_time) as f64;
    let numerator = decay.factor_f64(age + period as f64) - 1.0;
    let denominator = decay.factor(period) - 1.0;
    numerator / denominator
}

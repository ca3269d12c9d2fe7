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

//! One-shot density-reachability pass over the initial buffer.
//!
//! Each uncovered point whose ε-neighborhood (uncovered points strictly
//! closer than ε, the point itself excluded) holds more than `min_points`
//! points seeds a microcluster. The seed's neighborhood is then expanded
//! depth first: every uncovered neighbor is covered and inserted, and its own
//! neighborhood is explored next whenever the list that reached it was itself
//! larger than `min_points`. Points never covered are noise and are dropped.
//!
//! The traversal is driven by an explicit stack of partially consumed
//! neighbor lists, visiting points in buffer order, so deep components do not
//! grow the call stack and the result only depends on the buffer order.

use crate::cluster::MicroCluster;
use crate::common::neighborhood;
use crate::decay::Decay;
use crate::decay::Timestamp;

/// Parameters of the initial density-reachability pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Seeding {
    epsilon: f64,
    min_points: usize,
}

/// What the initial pass produced.
#[derive(Debug, Clone)]
pub struct SeedingOutput {
    /// The seeded microclusters, in the order their seeds appear in the buffer.
    pub clusters: Vec<MicroCluster>,
    /// Number of buffered points left uncovered.
    pub noise: usize,
}

/// A neighbor list and how far the expansion has consumed it.
struct Frame {
    members: Vec<usize>,
    next: usize,
}

impl Frame {
    fn new(members: Vec<usize>) -> Self {
        Self { members, next: 0 }
    }
}

impl Seeding {
    /// Creates a pass with neighborhood radius `epsilon` and density
    /// threshold `min_points`.
    pub fn new(epsilon: f64, min_points: usize) -> Self {
        Self {
            epsilon,
            min_points,
        }
    }

    /// Returns the neighborhood radius.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Returns the density threshold.
    pub fn min_points(&self) -> usize {
        self.min_points
    }

    /// Clusters `buffer`, stamping every insertion with `time`.
    ///
    /// # Panics
    ///
    /// Panics if the buffered points do not share one dimensionality.
    pub fn run(&self, buffer: &[Vec<f64>], time: Timestamp, decay: Decay) -> SeedingOutput {
        let mut covered = vec![false; buffer.len()];
        let mut clusters = Vec::new();

        for index in 0..buffer.len() {
            if covered[index] {
                continue;
            }
            covered[index] = true;
            let neighbors = neighborhood(&buffer[index], buffer, &covered, self.epsilon);
            if neighbors.len() > self.min_points {
                let mut cluster = MicroCluster::new(&buffer[index], time, decay);
                self.expand(&mut cluster, buffer, &mut covered, neighbors, time);
                clusters.push(cluster);
            } else {
                covered[index] = false;
            }
        }

        let noise = covered.iter().filter(|covered| !**covered).count();
        SeedingOutput { clusters, noise }
    }

    fn expand(
        &self,
        cluster: &mut MicroCluster,
        buffer: &[Vec<f64>],
        covered: &mut [bool],
        neighbors: Vec<usize>,
        time: Timestamp,
    ) {
        let mut stack = vec![Frame::new(neighbors)];
        while let Some(frame) = stack.last_mut() {
            let Some(&index) = frame.members.get(frame.next) else {
                stack.pop();
                continue;
            };
            frame.next += 1;
            let expandable = frame.members.len() > self.min_points;

            if covered[index] {
                continue;
            }
            covered[index] = true;
            cluster.insert(&buffer[index], time);

            if expandable {
                let reached = neighborhood(&buffer[index], buffer, covered, self.epsilon);
                stack.push(Frame::new(reached));
            }
        }
    }
}

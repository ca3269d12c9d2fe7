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

//! Distance and brute-force neighborhood primitives shared by seeding and the
//! online phase.

/// Euclidean distance between two points of equal dimensionality.
#[inline]
pub fn euclidean_distance(left: &[f64], right: &[f64]) -> f64 {
    debug_assert_eq!(left.len(), right.len(), "dimension mismatch");
    let mut sum = 0.0f64;
    for (a, b) in left.iter().zip(right.iter()) {
        let diff = a - b;
        sum += diff * diff;
    }
    sum.sqrt()
}

/// Returns the indices of every uncovered point strictly closer than `eps` to
/// `point`, in buffer order.
///
/// `covered` runs parallel to `points`. A point that is itself covered never
/// shows up in anyone's neighborhood, including its own.
pub(crate) fn neighborhood(
    point: &[f64],
    points: &[Vec<f64>],
    covered: &[bool],
    eps: f64,
) -> Vec<usize> {
    points
        .iter()
        .zip(covered.iter())
        .enumerate()
        .filter(|(_, (candidate, covered))| {
            !**covered && euclidean_distance(point, candidate) < eps
        })
        .map(|(index, _)| index)
        .collect()
}

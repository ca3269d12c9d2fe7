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

//! Microclusters and the registries that own them.
//!
//! A [`MicroCluster`] is a decaying cluster feature: a weight plus per-dimension
//! weighted linear and squared sums. Every cluster lives in exactly one
//! [`Registry`]; moving a cluster between registries is a move, never a copy.

mod micro_cluster;
mod registry;

pub use self::micro_cluster::MicroCluster;
pub use self::micro_cluster::MicroClusterSummary;
pub use self::registry::Registry;
pub use self::registry::RegistryKind;

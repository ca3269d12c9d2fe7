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

//! The online microclustering processor.
//!
//! [`DenStream`] consumes a forward-only sequence of fixed-dimensionality
//! points and maintains two tiers of decaying microclusters:
//!
//! - potential microclusters, whose weight reached `beta * mu`, which make up
//!   the reported result;
//! - outlier microclusters, provisional summaries that are either promoted
//!   once heavy enough or pruned once they fall behind the growth an eventual
//!   potential cluster would need.
//!
//! # References
//!
//! - Feng Cao, Martin Ester, Weining Qian, Aoying Zhou, "Density-Based
//!   Clustering over an Evolving Data Stream with Noise", SDM 2006.

mod config;
mod processor;

pub use self::config::DenStreamConfig;
pub use self::processor::DenStream;
pub use self::processor::UpdateOutcome;

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

//! Online density-based microclustering for unbounded data streams.
//!
//! The crate maintains a bounded set of exponentially decaying cluster
//! summaries over a stream that is read once, front to back. See
//! [`stream::DenStream`] for the entry point.

pub mod cluster;
pub mod common;
pub mod decay;
pub mod error;
pub mod seeding;
pub mod stream;

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
use crate::error::Error;

/// Configuration of a [`DenStream`](super::DenStream) processor.
///
/// Values are not checked when set; [`validate`](Self::validate) is called by
/// the processor before any point is accepted.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DenStreamConfig {
    /// Window length, in ticks, after which a contribution has decayed to
    /// `weight_threshold`.
    pub horizon: u64,
    /// Maximum radius a cluster may reach by absorbing a point; also the
    /// neighborhood radius of the initial pass.
    pub epsilon: f64,
    /// A point seeds a cluster in the initial pass when its neighborhood holds
    /// more than this many points.
    pub min_points: usize,
    /// Fraction of `mu` an outlier must exceed to be promoted.
    pub beta: f64,
    /// Base weight scale of the promotion and pruning thresholds.
    pub mu: f64,
    /// Number of points buffered before the initial pass runs.
    pub init_points: usize,
    /// Number of points sharing one logical tick.
    pub stream_speed: u64,
    /// Weight a contribution retains after `horizon` ticks.
    pub weight_threshold: f64,
}

impl Default for DenStreamConfig {
    fn default() -> Self {
        Self {
            horizon: 1000,
            epsilon: 3.0,
            min_points: 2,
            beta: 0.1,
            mu: 4.0,
            init_points: 1000,
            stream_speed: 1,
            weight_threshold: 0.01,
        }
    }
}

impl DenStreamConfig {
    /// Set the decay horizon.
    #[must_use]
    pub fn with_horizon(mut self, horizon: u64) -> Self {
        self.horizon = horizon;
        self
    }

    /// Set the merge radius.
    #[must_use]
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Set the density threshold of the initial pass.
    #[must_use]
    pub fn with_min_points(mut self, min_points: usize) -> Self {
        self.min_points = min_points;
        self
    }

    /// Set the promotion multiplier.
    #[must_use]
    pub fn with_beta(mut self, beta: f64) -> Self {
        self.beta = beta;
        self
    }

    /// Set the base weight scale.
    #[must_use]
    pub fn with_mu(mut self, mu: f64) -> Self {
        self.mu = mu;
        self
    }

    /// Set the initial buffer size.
    #[must_use]
    pub fn with_init_points(mut self, init_points: usize) -> Self {
        self.init_points = init_points;
        self
    }

    /// Set the number of points per tick.
    #[must_use]
    pub fn with_stream_speed(mut self, stream_speed: u64) -> Self {
        self.stream_speed = stream_speed;
        self
    }

    /// Set the weight retained after one horizon.
    #[must_use]
    pub fn with_weight_threshold(mut self, weight_threshold: f64) -> Self {
        self.weight_threshold = weight_threshold;
        self
    }

    /// Checks every parameter against its domain.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ConfigInvalid`](crate::error::ErrorKind::ConfigInvalid)
    /// naming the first offending parameter.
    pub fn validate(&self) -> Result<(), Error> {
        if self.horizon == 0 {
            return Err(invalid("horizon", self.horizon, "horizon must be positive"));
        }
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(invalid(
                "epsilon",
                self.epsilon,
                "epsilon must be finite and non-negative",
            ));
        }
        if !(0.0..=1.0).contains(&self.beta) {
            return Err(invalid("beta", self.beta, "beta must be in [0, 1]"));
        }
        if !self.mu.is_finite() || self.mu <= 0.0 {
            return Err(invalid("mu", self.mu, "mu must be finite and positive"));
        }
        if self.init_points == 0 {
            return Err(invalid(
                "init_points",
                self.init_points,
                "init_points must be positive",
            ));
        }
        if self.stream_speed == 0 {
            return Err(invalid(
                "stream_speed",
                self.stream_speed,
                "stream_speed must be at least 1",
            ));
        }
        if !(self.weight_threshold > 0.0 && self.weight_threshold < 1.0) {
            return Err(invalid(
                "weight_threshold",
                self.weight_threshold,
                "weight_threshold must be in (0, 1)",
            ));
        }
        Ok(())
    }

    /// Returns the decay law derived from `weight_threshold` and `horizon`.
    ///
    /// # Panics
    ///
    /// Panics if the configuration does not validate.
    pub fn decay(&self) -> Decay {
        Decay::from_horizon(self.weight_threshold, self.horizon)
    }

    /// Returns `beta * mu`, the promotion and potential-removal threshold.
    pub fn promotion_weight(&self) -> f64 {
        self.beta * self.mu
    }

    /// Returns the pruning period `Tp = round(ln(βμ / (βμ - 1)) / λ) + 1`.
    ///
    /// This is the time a cluster sitting exactly at `βμ` needs to decay below
    /// the removal boundary. When `βμ <= 1` the logarithm is undefined and the
    /// period is one tick. Periods beyond `u64::MAX` saturate.
    ///
    /// # Panics
    ///
    /// Panics if the configuration does not validate.
    pub fn pruning_period(&self) -> u64 {
        let lambda = self.decay().lambda();
        let beta_mu = self.promotion_weight();
        let period = ((beta_mu / (beta_mu - 1.0)).ln() / lambda).round();
        if beta_mu > 1.0 && period.is_finite() {
            (period as u64).saturating_add(1)
        } else {
            1
        }
    }
}

fn invalid(key: &'static str, value: impl ToString, message: &str) -> Error {
    Error::config_invalid(message).with_context(key, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_defaults_validate() {
        let config = DenStreamConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.horizon, 1000);
        assert_eq!(config.epsilon, 3.0);
        assert_eq!(config.min_points, 2);
        assert_eq!(config.init_points, 1000);
        assert_eq!(config.stream_speed, 1);
    }

    #[test]
    fn test_default_pruning_period_falls_back() {
        // beta * mu = 0.4, the period formula is undefined
        assert_eq!(DenStreamConfig::default().pruning_period(), 1);
    }

    #[test]
    fn test_pruning_period() {
        let config = DenStreamConfig::default().with_beta(0.5).with_mu(4.0);
        let lambda = config.decay().lambda();
        let expected = ((2.0f64 / 1.0).ln() / lambda).round() as u64 + 1;
        assert_eq!(config.pruning_period(), expected);
        // ln 2 / (log2(100) / 1000) ~ 104.3
        assert_eq!(expected, 105);
    }

    #[test]
    fn test_pruning_period_saturates() {
        // ln(1001) / (log2(100) / u64::MAX) exceeds u64::MAX
        let config = DenStreamConfig::default()
            .with_horizon(u64::MAX)
            .with_beta(1.0)
            .with_mu(1.001);
        assert!(config.validate().is_ok());
        assert_eq!(config.pruning_period(), u64::MAX);
    }

    #[test]
    fn test_each_parameter_is_checked() {
        let cases = [
            (DenStreamConfig::default().with_horizon(0), "horizon"),
            (DenStreamConfig::default().with_epsilon(-0.1), "epsilon"),
            (DenStreamConfig::default().with_epsilon(f64::NAN), "epsilon"),
            (DenStreamConfig::default().with_beta(1.5), "beta"),
            (DenStreamConfig::default().with_beta(-0.1), "beta"),
            (DenStreamConfig::default().with_mu(0.0), "mu"),
            (DenStreamConfig::default().with_mu(f64::INFINITY), "mu"),
            (DenStreamConfig::default().with_init_points(0), "init_points"),
            (DenStreamConfig::default().with_stream_speed(0), "stream_speed"),
            (
                DenStreamConfig::default().with_weight_threshold(1.0),
                "weight_threshold",
            ),
            (
                DenStreamConfig::default().with_weight_threshold(0.0),
                "weight_threshold",
            ),
        ];
        for (config, key) in cases {
            let err = config.validate().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
            assert!(err.context(key).is_some(), "missing context for {key}");
        }
    }

    #[test]
    fn test_boundary_values_accepted() {
        let config = DenStreamConfig::default()
            .with_epsilon(0.0)
            .with_beta(0.0)
            .with_beta(1.0)
            .with_min_points(0);
        assert!(config.validate().is_ok());
    }
}

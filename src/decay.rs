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

//! Exponential decay and the logical clock that drives it.
//!
//! A contribution made at time `t0` and observed at time `t >= t0` is weighted
//! by `2^(-λ(t - t0))`. Time is a logical tick count; callers pass it explicitly
//! to every decay-sensitive operation.

/// Logical time, in ticks.
pub type Timestamp = u64;

/// The decay law `2^(-λ·Δt)` for a fixed rate λ.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decay {
    lambda: f64,
}

impl Decay {
    /// Creates a decay law with the given rate.
    ///
    /// # Panics
    ///
    /// Panics if `lambda` is negative or not finite.
    pub fn new(lambda: f64) -> Self {
        assert!(
            lambda.is_finite() && lambda >= 0.0,
            "lambda must be finite and non-negative. Found: {lambda}"
        );
        Self { lambda }
    }

    /// Derives λ so that a contribution decays to `weight_threshold` after
    /// `horizon` ticks, i.e. `λ = -log2(weight_threshold) / horizon`.
    ///
    /// # Panics
    ///
    /// Panics if `horizon` is zero or `weight_threshold` is outside `(0, 1)`.
    pub fn from_horizon(weight_threshold: f64, horizon: u64) -> Self {
        assert!(horizon > 0, "horizon must be positive");
        assert!(
            weight_threshold > 0.0 && weight_threshold < 1.0,
            "weight threshold must be in (0, 1). Found: {weight_threshold}"
        );
        Self::new(-weight_threshold.log2() / horizon as f64)
    }

    /// Returns the rate λ.
    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    /// Returns `2^(-λ·elapsed)`.
    #[inline]
    pub fn factor(&self, elapsed: Timestamp) -> f64 {
        self.factor_f64(elapsed as f64)
    }

    #[inline]
    pub(crate) fn factor_f64(&self, elapsed: f64) -> f64 {
        (-self.lambda * elapsed).exp2()
    }
}

/// Monotone logical clock: every `stream_speed` accepted points share one tick.
#[derive(Debug, Clone)]
pub struct DecayClock {
    stream_speed: u64,
    points: u64,
}

impl DecayClock {
    /// Creates a clock at time zero.
    ///
    /// # Panics
    ///
    /// Panics if `stream_speed` is zero.
    pub fn new(stream_speed: u64) -> Self {
        assert!(stream_speed >= 1, "stream speed must be at least 1");
        Self {
            stream_speed,
            points: 0,
        }
    }

    /// Accounts for one more point and returns the tick it belongs to.
    pub fn advance(&mut self) -> Timestamp {
        let index = self.points;
        self.points += 1;
        index / self.stream_speed
    }

    /// Returns the time of the most recent point, or zero before any point.
    pub fn now(&self) -> Timestamp {
        self.points.saturating_sub(1) / self.stream_speed
    }

    /// Returns the number of points the clock has accounted for.
    pub fn points(&self) -> u64 {
        self.points
    }

    /// Rewinds the clock to time zero.
    pub fn reset(&mut self) {
        self.points = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lambda_from_horizon() {
        let decay = Decay::from_horizon(0.01, 1000);
        assert!((decay.lambda() - 0.01f64.log2().abs() / 1000.0).abs() < 1e-15);
        // after one horizon a contribution is worth the threshold
        assert!((decay.factor(1000) - 0.01).abs() < 1e-12);
        assert_eq!(decay.factor(0), 1.0);
    }

    #[test]
    fn test_factor_is_monotone() {
        let decay = Decay::new(0.25);
        let mut last = decay.factor(0);
        for elapsed in 1..64 {
            let next = decay.factor(elapsed);
            assert!(next <= last);
            last = next;
        }
        assert_eq!(decay.factor(4), 0.5);
    }

    #[test]
    fn test_clock_unit_speed() {
        let mut clock = DecayClock::new(1);
        assert_eq!(clock.now(), 0);
        for expected in 0..5 {
            assert_eq!(clock.advance(), expected);
        }
        assert_eq!(clock.now(), 4);
        assert_eq!(clock.points(), 5);
    }

    #[test]
    fn test_clock_shares_ticks() {
        let mut clock = DecayClock::new(3);
        let times: Vec<u64> = (0..7).map(|_| clock.advance()).collect();
        assert_eq!(times, vec![0, 0, 0, 1, 1, 1, 2]);
        assert_eq!(clock.now(), 2);

        clock.reset();
        assert_eq!(clock.points(), 0);
        assert_eq!(clock.advance(), 0);
    }

    #[test]
    #[should_panic(expected = "stream speed must be at least 1")]
    fn test_clock_zero_speed() {
        let _ = DecayClock::new(0);
    }
}

//! Deterministic PRNG and draw distributions for the simulation.
//!
//! Uses the SplitMix64 algorithm: fast, 8 bytes of state, excellent
//! statistical properties, and trivially serializable. Every draw consumes a
//! fixed number of generator steps so that runs with the same seed replay
//! the identical sequence regardless of which draw helpers are used.

use std::f64::consts::TAU;

/// SplitMix64 pseudo-random number generator.
///
/// Deterministic across platforms — the replay and determinism guarantees of
/// the whole simulation hang off this.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SimRng {
    state: u64,
}

impl SimRng {
    /// Create a new RNG with the given seed.
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Generate the next `u64` in the sequence.
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform draw in `[0, 1)` using the top 53 bits. One generator step.
    pub fn uniform(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Fair coin. One generator step.
    pub fn coin(&mut self) -> bool {
        self.uniform() < 0.5
    }

    /// Exponentially distributed draw with the given mean. One generator step.
    pub fn exponential(&mut self, mean: f64) -> f64 {
        // 1 - uniform() lies in (0, 1], keeping ln() finite.
        -mean * (1.0 - self.uniform()).ln()
    }

    /// Normally distributed draw via Box-Muller. Always exactly two generator
    /// steps; the second transform output is discarded to keep the draw count
    /// independent of call history.
    pub fn normal(&mut self, mean: f64, stddev: f64) -> f64 {
        let u1 = 1.0 - self.uniform();
        let u2 = self.uniform();
        let z = (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos();
        mean + stddev * z
    }

    /// Get the internal state (for diagnostics/serialization).
    pub fn state(&self) -> u64 {
        self.state
    }
}

/// A duration distribution, in minutes. Part of the scenario configuration.
///
/// Draws are clamped at zero: a negative delay is meaningless to the
/// scheduler, and clamping keeps the generator step count fixed (a redraw
/// loop would not).
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Distribution {
    /// Always the same value.
    Fixed(f64),
    /// Normal(mean, stddev), clamped at zero.
    Normal { mean: f64, stddev: f64 },
    /// Exponential with the given mean.
    Exponential { mean: f64 },
}

impl Distribution {
    /// Draw a non-negative duration in minutes.
    pub fn draw(&self, rng: &mut SimRng) -> f64 {
        let v = match *self {
            Distribution::Fixed(v) => v,
            Distribution::Normal { mean, stddev } => rng.normal(mean, stddev),
            Distribution::Exponential { mean } => rng.exponential(mean),
        };
        v.max(0.0)
    }
}

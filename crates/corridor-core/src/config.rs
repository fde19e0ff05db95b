//! Scenario configuration: plain numeric parameters and distributions
//! supplied at construction time. Not runtime-reloadable.
//!
//! The scenario variants differ only in these values and in
//! three policy toggles (`queueing`, `dual_locks`, `accidents`), so one
//! parameterized model drives all of them.

use crate::error::ConfigError;
use crate::id::{ShipClass, Side};
use crate::rng::Distribution;

/// Configuration for one arrival generator.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct GeneratorConfig {
    /// Size class of the ships this generator produces.
    pub class: ShipClass,
    /// Cargo per ship (tonnage for Panamax, TEU for Neopanamax).
    pub cargo: u64,
    /// Inter-arrival interval, in minutes.
    pub inter_arrival: Distribution,
    /// Fixed origin side, or `None` for a fair coin per ship.
    pub side: Option<Side>,
}

/// Configuration for the accident/repair subsystem.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AccidentConfig {
    /// Interval between accidents, in minutes.
    pub frequency: Distribution,
    /// Repair duration, in minutes.
    pub duration: Distribution,
}

/// Full scenario parameters.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ScenarioConfig {
    /// Total canal occupancy capacity (the counting resource), in ships.
    pub canal_capacity: u32,
    /// Time spent inside a lock chamber, in minutes.
    pub lock_time: f64,
    /// Travel time through the main channel, in minutes.
    pub travel_time: Distribution,
    /// Simulation horizon, in days.
    pub horizon_days: u32,
    /// Whether the hysteresis admission controller is active. When false,
    /// entrants block directly on the canal pool's FIFO.
    pub queueing: bool,
    /// Maximum length of each side wait queue; arrivals beyond it are
    /// rejected outright. Only meaningful when `queueing` is true.
    pub queue_bound: usize,
    /// Two parallel locks per directional role instead of one.
    pub dual_locks: bool,
    /// Accident/repair injection, if modeled.
    pub accidents: Option<AccidentConfig>,
    /// Arrival generators, one per ship class in play.
    pub generators: Vec<GeneratorConfig>,
    /// RNG seed for deterministic replay.
    pub seed: u64,
}

impl ScenarioConfig {
    /// Validate the parameters. Called once before the run starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.canal_capacity == 0 {
            return Err(ConfigError::NonPositiveCapacity(self.canal_capacity));
        }
        if self.lock_time <= 0.0 {
            return Err(ConfigError::NonPositiveLockTime(self.lock_time));
        }
        if self.horizon_days == 0 {
            return Err(ConfigError::EmptyHorizon(self.horizon_days));
        }
        if self.generators.is_empty() {
            return Err(ConfigError::NoGenerators);
        }
        if self.queueing && self.queue_bound == 0 {
            return Err(ConfigError::ZeroQueueBound);
        }
        Ok(())
    }
}

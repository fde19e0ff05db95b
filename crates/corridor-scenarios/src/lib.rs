//! Named scenario presets and the runner glue.
//!
//! The scenario variants differ only in parameter values and policy
//! toggles, so each preset is just a [`ScenarioConfig`] constructor:
//!
//! - **validation** -- the baseline canal: dual chambers per side, Panamax
//!   traffic only, no admission controller, no accidents.
//! - **experiment 1** -- saturation study: both ship classes, the
//!   hysteresis admission controller active over a capacity-8 canal.
//! - **experiment 2** -- fault tolerance: experiment 1 plus accident
//!   injection (one strike every 10 days on average, 12-hour repairs).

use corridor_core::config::{AccidentConfig, GeneratorConfig, ScenarioConfig};
use corridor_core::error::ConfigError;
use corridor_core::id::ShipClass;
use corridor_core::rng::Distribution;
use corridor_core::sim::Simulation;
use corridor_stats::Report;

/// Default simulation horizon, one month.
pub const HORIZON_DAYS: u32 = 31;

/// Default seed; override for replication studies.
pub const DEFAULT_SEED: u64 = 0x5EAFA2E;

/// The selectable scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    Validation,
    Experiment1,
    Experiment2,
}

impl Scenario {
    /// Parse an experiment id as given on the command line.
    pub fn from_experiment_id(id: &str) -> Result<Self, ConfigError> {
        match id {
            "1" => Ok(Scenario::Experiment1),
            "2" => Ok(Scenario::Experiment2),
            other => Err(ConfigError::UnknownExperiment(other.to_owned())),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Scenario::Validation => "validation",
            Scenario::Experiment1 => "experiment 1 (admission control)",
            Scenario::Experiment2 => "experiment 2 (accidents)",
        }
    }

    pub fn config(self) -> ScenarioConfig {
        match self {
            Scenario::Validation => validation(),
            Scenario::Experiment1 => experiment_1(),
            Scenario::Experiment2 => experiment_2(),
        }
    }
}

fn panamax_generator() -> GeneratorConfig {
    GeneratorConfig {
        class: ShipClass::Panamax,
        cargo: 50_000,
        inter_arrival: Distribution::Normal {
            mean: 50.0,
            stddev: 3.0,
        },
        side: None,
    }
}

fn neopanamax_generator() -> GeneratorConfig {
    GeneratorConfig {
        class: ShipClass::Neopanamax,
        cargo: 14_000,
        inter_arrival: Distribution::Exponential { mean: 40.0 },
        side: None,
    }
}

/// The baseline canal: Panamax traffic, two chambers per side, admission
/// left to the chamber FIFOs alone.
pub fn validation() -> ScenarioConfig {
    ScenarioConfig {
        // Generous enough that the pool never binds; the chambers stay
        // the bottleneck.
        canal_capacity: 50,
        lock_time: 90.0,
        travel_time: Distribution::Fixed(11.0 * 60.0),
        horizon_days: HORIZON_DAYS,
        queueing: false,
        queue_bound: 5,
        dual_locks: true,
        accidents: None,
        generators: vec![panamax_generator()],
        seed: DEFAULT_SEED,
    }
}

/// Saturation study: both ship classes against the hysteresis admission
/// controller.
pub fn experiment_1() -> ScenarioConfig {
    ScenarioConfig {
        canal_capacity: 8,
        queueing: true,
        generators: vec![panamax_generator(), neopanamax_generator()],
        ..validation()
    }
}

/// Fault tolerance: experiment 1 plus accident injection.
pub fn experiment_2() -> ScenarioConfig {
    ScenarioConfig {
        accidents: Some(AccidentConfig {
            frequency: Distribution::Exponential {
                mean: 10.0 * 24.0 * 60.0,
            },
            duration: Distribution::Fixed(12.0 * 60.0),
        }),
        ..experiment_1()
    }
}

/// Run a scenario to its horizon and fold the trace into a report.
pub fn run(scenario: Scenario) -> Result<Report, ConfigError> {
    let cfg = scenario.config();
    let mut sim = Simulation::new(&cfg)?;
    sim.run();
    Ok(Report::build(&sim))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_presets_validate() {
        for scenario in [
            Scenario::Validation,
            Scenario::Experiment1,
            Scenario::Experiment2,
        ] {
            assert!(scenario.config().validate().is_ok(), "{}", scenario.name());
        }
    }

    #[test]
    fn experiment_id_parsing() {
        assert_eq!(
            Scenario::from_experiment_id("1").unwrap(),
            Scenario::Experiment1
        );
        assert_eq!(
            Scenario::from_experiment_id("2").unwrap(),
            Scenario::Experiment2
        );
        assert!(Scenario::from_experiment_id("3").is_err());
        assert!(Scenario::from_experiment_id("").is_err());
    }

    #[test]
    fn validation_run_produces_traffic() {
        let report = run(Scenario::Validation).unwrap();
        // ~50-minute arrivals over 31 days: hundreds of completions.
        assert!(report.counters.completed > 500);
        assert_eq!(report.counters.rejected, 0);
        assert_eq!(report.counters.interrupted, 0);
        assert_eq!(report.transit.count(), report.counters.completed);
        // Fastest possible transit is 840 minutes.
        assert!(report.transit.min() >= 840.0);
    }

    #[test]
    fn runs_are_reproducible() {
        let a = run(Scenario::Experiment1).unwrap();
        let b = run(Scenario::Experiment1).unwrap();
        assert_eq!(a.counters, b.counters);
        assert_eq!(a.transit.count(), b.transit.count());
        assert_eq!(a.to_string(), b.to_string());
    }
}

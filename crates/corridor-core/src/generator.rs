//! Arrival generators: one recurring process per configured ship class.
//!
//! A generator spawns a ship at every wakeup, then sleeps for a freshly
//! drawn inter-arrival interval. The per-ship draw order is fixed — origin
//! coin (when the side is not pinned), then interval — so a given seed
//! always produces the same arrival stream.

use crate::config::GeneratorConfig;
use crate::id::{ProcessId, Side};
use crate::process::{ProcessState, StepOutcome, Wakeup};
use crate::sim::Simulation;
use crate::time::f64_minutes;

#[derive(Debug)]
pub struct ArrivalGenerator {
    cfg: GeneratorConfig,
}

impl ArrivalGenerator {
    pub fn new(cfg: GeneratorConfig) -> Self {
        Self { cfg }
    }

    pub fn step(&mut self, sim: &mut Simulation, pid: ProcessId, _wakeup: Wakeup) -> StepOutcome {
        // The run loop never dispatches past the horizon; this guards
        // manually driven runs as well.
        if sim.now() > sim.horizon() {
            return StepOutcome::Terminated;
        }
        let side = match self.cfg.side {
            Some(side) => side,
            None if sim.rng.coin() => Side::Atlantic,
            None => Side::Pacific,
        };
        sim.spawn_ship(self.cfg.class, self.cfg.cargo, side);

        let interval = f64_minutes(self.cfg.inter_arrival.draw(&mut sim.rng));
        sim.wait(pid, interval);
        StepOutcome::Suspend(ProcessState::WaitingOnTimer)
    }
}

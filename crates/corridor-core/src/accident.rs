//! The repair crew: periodic accident injection and chamber repair.
//!
//! At each strike the crew targets the next chamber in a fixed round-robin
//! over all chambers (deterministic, unlike arrival randomness), marks the
//! current occupant interrupted, and then queues for the chamber through
//! the ordinary FIFO — the marked ship still finishes its lockage timer and
//! aborts on waking, at which point the crew is granted holdership. The
//! chamber stays seized for the repair duration, blocking traffic through
//! it, then the crew sleeps until the next strike.

use crate::config::AccidentConfig;
use crate::id::{LockId, ProcessId};
use crate::process::{ProcessState, StepOutcome, Wakeup};
use crate::resource::Admission;
use crate::sim::Simulation;
use crate::time::{f64_minutes, SimDuration};
use crate::trace::TraceEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Sleeping until the next strike.
    Dormant,
    /// Queued on the struck chamber's FIFO, repair duration already drawn.
    AwaitingLock { lock: LockId, duration: SimDuration },
    /// Holding the chamber under repair.
    Repairing { lock: LockId },
}

#[derive(Debug)]
pub struct RepairCrew {
    cfg: AccidentConfig,
    /// All chambers, strike order. Round-robin cursor below.
    targets: Vec<LockId>,
    next_target: usize,
    phase: Phase,
}

impl RepairCrew {
    pub fn new(cfg: AccidentConfig, targets: Vec<LockId>) -> Self {
        assert!(!targets.is_empty(), "repair crew needs at least one chamber");
        Self {
            cfg,
            targets,
            next_target: 0,
            phase: Phase::Dormant,
        }
    }

    pub fn step(&mut self, sim: &mut Simulation, pid: ProcessId, wakeup: Wakeup) -> StepOutcome {
        match (self.phase, wakeup) {
            // Strike. The repair duration is drawn now, at the accident,
            // not at the later grant — this keeps the draw sequence
            // independent of queue timing.
            (Phase::Dormant, Wakeup::Timer | Wakeup::Activated) => {
                if sim.now() > sim.horizon() {
                    return StepOutcome::Terminated;
                }
                let lock = self.targets[self.next_target];
                self.next_target = (self.next_target + 1) % self.targets.len();

                let interrupted = sim.mark_interrupted(lock);
                sim.trace.push(TraceEvent::AccidentStruck {
                    lock,
                    interrupted,
                    at: sim.now(),
                });
                tracing::debug!(?lock, ?interrupted, "accident struck");

                let duration = f64_minutes(self.cfg.duration.draw(&mut sim.rng));
                match sim.seize_lock(pid, lock) {
                    Admission::Admitted => self.start_repair(sim, pid, lock, duration),
                    Admission::Queued => {
                        self.phase = Phase::AwaitingLock { lock, duration };
                        StepOutcome::Suspend(ProcessState::WaitingOnResource)
                    }
                }
            }

            (Phase::AwaitingLock { lock, duration }, Wakeup::Granted) => {
                self.start_repair(sim, pid, lock, duration)
            }

            (Phase::Repairing { lock }, Wakeup::Timer) => {
                sim.release_lock(pid, lock);
                sim.trace.push(TraceEvent::RepairCompleted {
                    lock,
                    at: sim.now(),
                });

                let until_next = f64_minutes(self.cfg.frequency.draw(&mut sim.rng));
                sim.wait(pid, until_next);
                self.phase = Phase::Dormant;
                StepOutcome::Suspend(ProcessState::WaitingOnTimer)
            }

            (phase, wakeup) => unreachable!("repair crew woke with {wakeup:?} in {phase:?}"),
        }
    }

    fn start_repair(
        &mut self,
        sim: &mut Simulation,
        pid: ProcessId,
        lock: LockId,
        duration: SimDuration,
    ) -> StepOutcome {
        sim.wait(pid, duration);
        self.phase = Phase::Repairing { lock };
        StepOutcome::Suspend(ProcessState::WaitingOnTimer)
    }
}

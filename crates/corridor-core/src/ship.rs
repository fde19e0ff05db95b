//! The ship process: arrival, admission, entry lock, channel passage, exit
//! lock, departure.
//!
//! The body is a phase machine. Each `step` call runs from the wakeup that
//! resumed it to the next suspension point; the phase records where to pick
//! up. Interruption by an accident is checked only on waking from an
//! in-lock timer — that is the only point where the flag can have been set
//! while the ship was suspended inside a chamber.

use crate::id::{LockId, ProcessId, Side, ShipClass};
use crate::process::{ProcessState, StepOutcome, Wakeup};
use crate::resource::Admission;
use crate::sim::Simulation;
use crate::time::SimTime;
use crate::trace::TraceEvent;

/// Where the ship resumes after its next wakeup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// First activation: record arrival, request admission.
    Arriving,
    /// Passivated in a side wait queue; resumed by a drain.
    AwaitingDrain,
    /// Queued on the canal pool FIFO; resumed by a grant.
    AwaitingCanal,
    /// Queued on a lock FIFO on the way in.
    AwaitingEntryLock(LockId),
    /// Inside the entry chamber; resumed by the lockage timer.
    InEntryLock(LockId),
    /// In the main channel; resumed by the travel timer.
    InChannel,
    /// Queued on a lock FIFO on the way out.
    AwaitingExitLock(LockId),
    /// Inside the exit chamber; resumed by the lockage timer.
    InExitLock(LockId),
}

/// A ship in transit. Created by an arrival generator, destroyed on
/// completion, rejection, or interruption.
#[derive(Debug)]
pub struct Ship {
    class: ShipClass,
    cargo: u64,
    side: Side,
    arrival: SimTime,
    /// Set by the repair crew when an accident strikes the chamber this ship
    /// occupies. Observed on the next in-lock timer wakeup.
    pub(crate) interrupted: bool,
    phase: Phase,
}

impl Ship {
    pub fn new(class: ShipClass, cargo: u64, side: Side) -> Self {
        Self {
            class,
            cargo,
            side,
            arrival: SimTime::ZERO,
            interrupted: false,
            phase: Phase::Arriving,
        }
    }

    pub fn class(&self) -> ShipClass {
        self.class
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Run from `wakeup` to the next suspension point.
    pub fn step(&mut self, sim: &mut Simulation, pid: ProcessId, wakeup: Wakeup) -> StepOutcome {
        match (self.phase, wakeup) {
            (Phase::Arriving, Wakeup::Activated) => {
                self.arrival = sim.now();
                match self.side {
                    Side::Atlantic => sim.counters.atlantic_ships += 1,
                    Side::Pacific => sim.counters.pacific_ships += 1,
                }
                sim.trace.push(TraceEvent::ShipArrived {
                    ship: pid,
                    side: self.side,
                    class: self.class,
                    at: sim.now(),
                });
                self.request_admission(sim, pid)
            }

            // A drain reactivated us; the controller may have restricted
            // again in the meantime, so the full admission decision reruns.
            (Phase::AwaitingDrain, Wakeup::Activated) => self.request_admission(sim, pid),

            (Phase::AwaitingCanal, Wakeup::Granted) => self.approach_entry_lock(sim, pid),

            (Phase::AwaitingEntryLock(lock), Wakeup::Granted) => self.lock_through(sim, pid, lock, true),

            (Phase::InEntryLock(lock), Wakeup::Timer) => {
                if self.interrupted {
                    return self.abort(sim, pid, lock);
                }
                sim.release_lock(pid, lock);
                let travel = sim.draw_travel();
                sim.wait(pid, travel);
                self.phase = Phase::InChannel;
                StepOutcome::Suspend(ProcessState::WaitingOnTimer)
            }

            (Phase::InChannel, Wakeup::Timer) => {
                let lock = sim.choose_exit_lock(self.side);
                match sim.seize_lock(pid, lock) {
                    Admission::Admitted => self.lock_through(sim, pid, lock, false),
                    Admission::Queued => {
                        self.phase = Phase::AwaitingExitLock(lock);
                        StepOutcome::Suspend(ProcessState::WaitingOnResource)
                    }
                }
            }

            (Phase::AwaitingExitLock(lock), Wakeup::Granted) => {
                self.lock_through(sim, pid, lock, false)
            }

            (Phase::InExitLock(lock), Wakeup::Timer) => {
                if self.interrupted {
                    return self.abort(sim, pid, lock);
                }
                sim.release_lock(pid, lock);
                sim.canal_leave(pid);
                self.complete(sim, pid)
            }

            (phase, wakeup) => unreachable!("ship {pid:?} woke with {wakeup:?} in {phase:?}"),
        }
    }

    /// Ask the admission controller for entry, then act on the decision.
    fn request_admission(&mut self, sim: &mut Simulation, pid: ProcessId) -> StepOutcome {
        match sim.request_entry(pid, self.side) {
            crate::controller::EntryDecision::Proceed => match sim.canal_enter(pid) {
                Admission::Admitted => self.approach_entry_lock(sim, pid),
                Admission::Queued => {
                    self.phase = Phase::AwaitingCanal;
                    StepOutcome::Suspend(ProcessState::WaitingOnResource)
                }
            },
            crate::controller::EntryDecision::Parked => {
                sim.trace.push(TraceEvent::ShipParked {
                    ship: pid,
                    side: self.side,
                    at: sim.now(),
                });
                self.phase = Phase::AwaitingDrain;
                StepOutcome::Suspend(ProcessState::Passivated)
            }
            crate::controller::EntryDecision::Rejected => {
                sim.counters.rejected += 1;
                sim.trace.push(TraceEvent::ShipRejected {
                    ship: pid,
                    side: self.side,
                    at: sim.now(),
                });
                tracing::debug!(?pid, side = ?self.side, "wait queue full, ship rejected");
                StepOutcome::Terminated
            }
        }
    }

    /// Inside the canal pool: head for this side's entry chamber.
    fn approach_entry_lock(&mut self, sim: &mut Simulation, pid: ProcessId) -> StepOutcome {
        let lock = sim.choose_entry_lock(self.side);
        match sim.seize_lock(pid, lock) {
            Admission::Admitted => self.lock_through(sim, pid, lock, true),
            Admission::Queued => {
                self.phase = Phase::AwaitingEntryLock(lock);
                StepOutcome::Suspend(ProcessState::WaitingOnResource)
            }
        }
    }

    /// Holding `lock`: start the lockage timer.
    fn lock_through(
        &mut self,
        sim: &mut Simulation,
        pid: ProcessId,
        lock: LockId,
        entering: bool,
    ) -> StepOutcome {
        sim.wait(pid, sim.lock_time());
        self.phase = if entering {
            Phase::InEntryLock(lock)
        } else {
            Phase::InExitLock(lock)
        };
        StepOutcome::Suspend(ProcessState::WaitingOnTimer)
    }

    /// An accident struck while we occupied `lock`: free everything held and
    /// leave the system without producing a statistics sample.
    fn abort(&mut self, sim: &mut Simulation, pid: ProcessId, lock: LockId) -> StepOutcome {
        sim.release_lock(pid, lock);
        sim.canal_leave(pid);
        sim.counters.interrupted += 1;
        sim.trace.push(TraceEvent::ShipInterrupted {
            ship: pid,
            at: sim.now(),
        });
        tracing::debug!(?pid, "transit aborted by accident");
        StepOutcome::Terminated
    }

    fn complete(&mut self, sim: &mut Simulation, pid: ProcessId) -> StepOutcome {
        let now = sim.now();
        sim.counters.completed += 1;
        match self.class {
            ShipClass::Panamax => {
                sim.counters.panamax_completed += 1;
                sim.counters.cargo_tonnage += self.cargo;
            }
            ShipClass::Neopanamax => {
                sim.counters.neopanamax_completed += 1;
                sim.counters.cargo_teu += self.cargo;
            }
        }
        sim.trace.push(TraceEvent::TransitCompleted {
            ship: pid,
            duration: now - self.arrival,
            at: now,
        });
        StepOutcome::Terminated
    }
}

//! The canal admission controller: a hysteresis state machine over canal
//! occupancy.
//!
//! `Open` admits entrants straight into the canal pool. When occupancy
//! reaches full capacity the controller switches to `Restricted`
//! (`priority_exit` set): entrants are parked in their side's bounded wait
//! queue, or rejected outright when the bound is reached. When occupancy
//! drops strictly below half capacity the controller reopens and arms the
//! one-shot `empty_queues` signal; the next resource-release event drains
//! both wait queues in FIFO order, Atlantic fully before Pacific. The two
//! different thresholds prevent flapping at the boundary.

use crate::id::{ProcessId, Side};
use crate::resource::{Admission, CountingResource};
use crate::waitqueue::{QueueAdmission, WaitQueue};

/// What happens to a ship requesting entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryDecision {
    /// Admission policy is open; proceed to the canal pool.
    Proceed,
    /// Parked in the side wait queue; passivate until drained.
    Parked,
    /// Side queue at its bound; cancel the ship, exclude it from statistics.
    Rejected,
}

/// Result of admitting one ship into the canal pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnterOutcome {
    pub admission: Admission,
    /// The admission filled the canal: Open -> Restricted fired.
    pub restricted: bool,
}

/// Result of one ship leaving the canal pool.
#[derive(Debug)]
pub struct LeaveOutcome {
    /// Pool waiters admitted by this departure, FIFO order.
    pub granted: Vec<ProcessId>,
    /// Occupancy fell below half capacity: Restricted -> Open fired and the
    /// `empty_queues` signal was armed.
    pub reopened: bool,
}

/// Admission state machine plus the resources it governs.
#[derive(Debug)]
pub struct CanalController {
    pool: CountingResource,
    /// Hysteresis toggle; `true` while Restricted.
    priority_exit: bool,
    /// One-shot drain signal, consumed by the next resource-release event.
    empty_queues: bool,
    /// Whether the controller is active at all. When inactive every entrant
    /// proceeds to the pool and blocks on its FIFO instead.
    enabled: bool,
    atlantic: WaitQueue,
    pacific: WaitQueue,
}

impl CanalController {
    pub fn new(capacity: u32, queue_bound: usize, enabled: bool) -> Self {
        Self {
            pool: CountingResource::new("Canal", capacity),
            priority_exit: false,
            empty_queues: false,
            enabled,
            atlantic: WaitQueue::new(queue_bound),
            pacific: WaitQueue::new(queue_bound),
        }
    }

    pub fn occupancy(&self) -> u32 {
        self.pool.used()
    }

    pub fn capacity(&self) -> u32 {
        self.pool.capacity()
    }

    pub fn is_restricted(&self) -> bool {
        self.priority_exit
    }

    pub fn drain_pending(&self) -> bool {
        self.empty_queues
    }

    pub fn queue_len(&self, side: Side) -> usize {
        match side {
            Side::Atlantic => self.atlantic.len(),
            Side::Pacific => self.pacific.len(),
        }
    }

    /// Pool wait-list length (entrants blocked when the controller is
    /// inactive).
    pub fn pool_queue_len(&self) -> usize {
        self.pool.queue_len()
    }

    /// Decide what happens to a new entrant from `side`. Parks the process
    /// itself when the decision is [`EntryDecision::Parked`].
    pub fn request_entry(&mut self, process: ProcessId, side: Side) -> EntryDecision {
        if !self.enabled || !self.priority_exit {
            return EntryDecision::Proceed;
        }
        let queue = match side {
            Side::Atlantic => &mut self.atlantic,
            Side::Pacific => &mut self.pacific,
        };
        match queue.push(process) {
            QueueAdmission::Parked => EntryDecision::Parked,
            QueueAdmission::Rejected => EntryDecision::Rejected,
        }
    }

    /// Admit one ship into the canal pool (or queue it on the pool FIFO),
    /// recomputing the hysteresis state.
    pub fn enter(&mut self, process: ProcessId) -> EnterOutcome {
        let admission = self.pool.enter(process, 1);
        let mut restricted = false;
        if self.enabled && !self.priority_exit && self.pool.is_full() {
            self.priority_exit = true;
            restricted = true;
        }
        EnterOutcome {
            admission,
            restricted,
        }
    }

    /// One ship leaves the canal pool. Admits pool waiters that now fit and
    /// recomputes the hysteresis state. Reopening arms the one-shot
    /// `empty_queues` signal; the drain itself happens on the *next*
    /// resource-release event, via [`CanalController::take_drain`].
    pub fn leave(&mut self) -> LeaveOutcome {
        let granted = self.pool.leave(1);
        let mut reopened = false;
        // Strictly below half capacity, computed without integer truncation.
        if self.enabled && self.priority_exit && 2 * self.pool.used() < self.pool.capacity() {
            self.priority_exit = false;
            self.empty_queues = true;
            reopened = true;
        }
        LeaveOutcome { granted, reopened }
    }

    /// Consume the `empty_queues` signal: pop every parked ship, Atlantic
    /// queue fully drained before Pacific. Returns `None` when the signal is
    /// not armed.
    pub fn take_drain(&mut self) -> Option<Vec<ProcessId>> {
        if !self.empty_queues {
            return None;
        }
        self.empty_queues = false;
        let mut drained = self.atlantic.drain();
        drained.extend(self.pacific.drain());
        Some(drained)
    }

    /// Remove a process queued on the pool FIFO (early abandonment).
    pub fn cancel_pool_waiter(&mut self, process: ProcessId) -> bool {
        self.pool.cancel_waiter(process)
    }
}

// ===========================================================================
// Tests
// ===========================================================================

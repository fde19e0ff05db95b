//! FIFO-fair resources: the N-capacity counting pool and the single-holder
//! exclusive lock built on top of it.
//!
//! Resources are plain data structures; they never call back into processes.
//! Operations return the set of waiters that became admissible, and the
//! kernel schedules those resumptions at the current time — insertion-order
//! tie-breaking then guarantees they run before any same-time event enqueued
//! later, which is exactly the FIFO fairness the model requires.

use std::collections::VecDeque;

use crate::id::ProcessId;

/// Result of an admission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Admitted immediately; the caller continues without suspending.
    Admitted,
    /// Appended to the FIFO wait list; the caller must suspend.
    Queued,
}

// ---------------------------------------------------------------------------
// CountingResource
// ---------------------------------------------------------------------------

/// An N-capacity pool with FIFO-fair admission.
///
/// Invariant: `0 <= used <= capacity` at every observation point.
#[derive(Debug, Clone)]
pub struct CountingResource {
    name: String,
    capacity: u32,
    used: u32,
    waiters: VecDeque<(ProcessId, u32)>,
}

impl CountingResource {
    /// Create a pool. `capacity` must be positive (validated at scenario
    /// construction; asserted here as a programming-error backstop).
    pub fn new(name: impl Into<String>, capacity: u32) -> Self {
        assert!(capacity > 0, "counting resource capacity must be positive");
        Self {
            name: name.into(),
            capacity,
            used: 0,
            waiters: VecDeque::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Units currently admitted.
    pub fn used(&self) -> u32 {
        self.used
    }

    /// Free units.
    pub fn available(&self) -> u32 {
        self.capacity - self.used
    }

    /// Length of the FIFO wait list.
    pub fn queue_len(&self) -> usize {
        self.waiters.len()
    }

    /// Whether the pool is at capacity.
    pub fn is_full(&self) -> bool {
        self.used == self.capacity
    }

    /// Request `units`. Admits immediately if they fit, otherwise appends the
    /// request to the FIFO wait list (caller suspends).
    pub fn enter(&mut self, process: ProcessId, units: u32) -> Admission {
        debug_assert!(units > 0 && units <= self.capacity);
        if self.used + units <= self.capacity && self.waiters.is_empty() {
            self.used += units;
            Admission::Admitted
        } else {
            self.waiters.push_back((process, units));
            Admission::Queued
        }
    }

    /// Release `units`, then admit waiters from the head of the FIFO while
    /// their requests fit, stopping at the first that does not (head-of-line
    /// blocking is intentional: a later, smaller request must not bypass an
    /// earlier, larger one). Returns the admitted waiters in FIFO order.
    pub fn leave(&mut self, units: u32) -> Vec<ProcessId> {
        assert!(self.used >= units, "counting resource occupancy underflow");
        self.used -= units;

        let mut granted = Vec::new();
        while let Some(&(head, head_units)) = self.waiters.front() {
            if self.used + head_units > self.capacity {
                break;
            }
            self.waiters.pop_front();
            self.used += head_units;
            granted.push(head);
        }
        debug_assert!(self.used <= self.capacity);
        granted
    }

    /// Remove a queued-but-not-admitted process from the wait list (early
    /// abandonment). Frees nothing — the process never held anything.
    pub fn cancel_waiter(&mut self, process: ProcessId) -> bool {
        if let Some(pos) = self.waiters.iter().position(|&(p, _)| p == process) {
            self.waiters.remove(pos);
            true
        } else {
            false
        }
    }
}

// ---------------------------------------------------------------------------
// ExclusiveResource
// ---------------------------------------------------------------------------

/// A single-holder lock with FIFO-fair blocking.
///
/// Thin wrapper over a capacity-1 [`CountingResource`], adding the holder
/// back-reference. Invariant: at most one holder at any time.
#[derive(Debug, Clone)]
pub struct ExclusiveResource {
    pool: CountingResource,
    holder: Option<ProcessId>,
}

impl ExclusiveResource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            pool: CountingResource::new(name, 1),
            holder: None,
        }
    }

    pub fn name(&self) -> &str {
        self.pool.name()
    }

    /// Read-only busy query.
    pub fn busy(&self) -> bool {
        self.holder.is_some()
    }

    /// Current holder, if any. A back-reference, not ownership.
    pub fn holder(&self) -> Option<ProcessId> {
        self.holder
    }

    /// Length of the FIFO wait list.
    pub fn queue_len(&self) -> usize {
        self.pool.queue_len()
    }

    /// Acquire. Free resource means immediate holdership (zero suspension);
    /// otherwise the process joins the FIFO and must suspend.
    pub fn seize(&mut self, process: ProcessId) -> Admission {
        let admission = self.pool.enter(process, 1);
        if admission == Admission::Admitted {
            debug_assert!(self.holder.is_none(), "second holder admitted");
            self.holder = Some(process);
        }
        admission
    }

    /// Release. Asserts the caller is the current holder. If the wait list is
    /// non-empty its head becomes the new holder; the returned id must be
    /// reactivated at the current time by the kernel.
    pub fn release(&mut self, process: ProcessId) -> Option<ProcessId> {
        assert_eq!(
            self.holder,
            Some(process),
            "release by non-holder on '{}'",
            self.pool.name()
        );
        self.holder = None;
        let granted = self.pool.leave(1);
        debug_assert!(granted.len() <= 1);
        let next = granted.first().copied();
        self.holder = next;
        next
    }

    /// Remove a queued waiter (early abandonment).
    pub fn cancel_waiter(&mut self, process: ProcessId) -> bool {
        self.pool.cancel_waiter(process)
    }
}

// ===========================================================================
// Tests
// ===========================================================================

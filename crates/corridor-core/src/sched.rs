//! The event scheduler: a monotonic clock plus a time-ordered queue of
//! pending process resumptions.
//!
//! Ties at identical times are broken by insertion order (a global sequence
//! counter), never by process identity — this is what makes runs with a
//! fixed seed reproduce byte-identical event order.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use slotmap::SecondaryMap;

use crate::id::ProcessId;
use crate::process::Wakeup;
use crate::time::{SimDuration, SimTime};

/// A pending resumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingEvent {
    due: SimTime,
    seq: u64,
    target: ProcessId,
    wakeup: Wakeup,
}

impl PartialOrd for PendingEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PendingEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // (due, seq) — seq is the insertion-order tie-break.
        (self.due, self.seq).cmp(&(other.due, other.seq))
    }
}

/// A popped, due event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueEvent {
    pub target: ProcessId,
    pub wakeup: Wakeup,
}

/// Time-ordered scheduler. Owns the simulation clock.
#[derive(Debug, Default)]
pub struct Scheduler {
    /// Current simulation time. Mutated only by [`Scheduler::pop`].
    now: SimTime,
    /// Min-heap of pending resumptions.
    heap: BinaryHeap<Reverse<PendingEvent>>,
    /// Global insertion counter for the tie-break.
    next_seq: u64,
    /// Live sequence number per process. A process has at most one pending
    /// resumption; entries popped with a stale seq are skipped (lazy cancel).
    live: SecondaryMap<ProcessId, u64>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current simulation time.
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Number of live pending events.
    pub fn pending(&self) -> usize {
        self.live.len()
    }

    /// Schedule a resumption for `target` at absolute time `at`.
    ///
    /// Panics if `at` is in the past or the process already has a pending
    /// resumption — both are kernel bugs, not recoverable conditions.
    pub fn schedule_at(&mut self, target: ProcessId, wakeup: Wakeup, at: SimTime) {
        assert!(at >= self.now, "scheduling into the past");
        assert!(
            !self.live.contains_key(target),
            "process already has a pending resumption"
        );
        let seq = self.next_seq;
        self.next_seq += 1;
        self.live.insert(target, seq);
        self.heap.push(Reverse(PendingEvent {
            due: at,
            seq,
            target,
            wakeup,
        }));
    }

    /// Schedule a resumption `delay` minutes from now.
    pub fn schedule_after(&mut self, target: ProcessId, wakeup: Wakeup, delay: SimDuration) {
        self.schedule_at(target, wakeup, self.now + delay);
    }

    /// Remove the not-yet-run resumption for `target`, if any. Used when an
    /// entity abandons the system while queued. O(1); the heap entry is
    /// dropped lazily on pop.
    pub fn cancel(&mut self, target: ProcessId) -> bool {
        self.live.remove(target).is_some()
    }

    /// Whether `target` has a pending resumption.
    pub fn is_scheduled(&self, target: ProcessId) -> bool {
        self.live.contains_key(target)
    }

    /// Time of the earliest live event without popping it.
    pub fn peek_due(&mut self) -> Option<SimTime> {
        self.skip_stale();
        self.heap.peek().map(|Reverse(e)| e.due)
    }

    /// Pop the earliest event and advance the clock to its time.
    ///
    /// Never returns an event earlier than the last returned event's time.
    pub fn pop(&mut self) -> Option<DueEvent> {
        self.skip_stale();
        let Reverse(event) = self.heap.pop()?;
        self.live.remove(event.target);
        debug_assert!(event.due >= self.now, "clock would run backwards");
        self.now = event.due;
        Some(DueEvent {
            target: event.target,
            wakeup: event.wakeup,
        })
    }

    /// Drop heap entries whose sequence no longer matches the live map
    /// (canceled or superseded).
    fn skip_stale(&mut self) {
        while let Some(Reverse(e)) = self.heap.peek() {
            if self.live.get(e.target) == Some(&e.seq) {
                break;
            }
            self.heap.pop();
        }
    }
}

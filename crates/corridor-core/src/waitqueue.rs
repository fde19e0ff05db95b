//! The explicit wait queue: a bounded, manually drained list of passivated
//! processes. Not a resource — nothing auto-releases it; the canal
//! controller drains it by explicit activation.

use std::collections::VecDeque;

use crate::id::ProcessId;

/// Outcome of an admission attempt on a bounded wait queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueAdmission {
    /// Appended; the process passivates until drained.
    Parked,
    /// The bound was already reached; the entrant is rejected outright.
    Rejected,
}

/// Ordered sequence of suspended processes with an admission bound.
#[derive(Debug, Clone)]
pub struct WaitQueue {
    queue: VecDeque<ProcessId>,
    bound: usize,
}

impl WaitQueue {
    pub fn new(bound: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            bound,
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn bound(&self) -> usize {
        self.bound
    }

    /// Try to park a process. Rejected when the queue already holds `bound`
    /// entries — rejected entrants are canceled, not merely delayed.
    pub fn push(&mut self, process: ProcessId) -> QueueAdmission {
        if self.queue.len() >= self.bound {
            QueueAdmission::Rejected
        } else {
            self.queue.push_back(process);
            debug_assert!(self.queue.len() <= self.bound);
            QueueAdmission::Parked
        }
    }

    /// Pop every parked process in FIFO order.
    pub fn drain(&mut self) -> Vec<ProcessId> {
        self.queue.drain(..).collect()
    }
}

//! Process lifecycle types.
//!
//! A process is a suspendable unit of domain logic driven entirely by the
//! scheduler issuing resumption calls. There are no coroutines: each body is
//! an explicit phase machine plus enough captured context to resume, which
//! keeps behavior deterministic and inspectable.

/// Lifecycle state of a process.
///
/// ```text
/// Created -> Scheduled -> Running -> { WaitingOnTimer,
///                                      WaitingOnResource,
///                                      Passivated } -> ... -> Terminated
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// Spawned but never activated.
    Created,
    /// Has a pending resumption in the event queue.
    Scheduled,
    /// Its body is executing right now. At most one process is Running.
    Running,
    /// Suspended on a `wait(duration)`; rescheduled automatically.
    WaitingOnTimer,
    /// Enqueued on a resource's FIFO wait list; no timeout.
    WaitingOnResource,
    /// Explicitly parked; requires an external activate.
    Passivated,
}

/// The resumption payload delivered when a process is woken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wakeup {
    /// A `wait(duration)` elapsed.
    Timer,
    /// A resource the process was queued on granted its request.
    Granted,
    /// Another process activated it out of a wait queue (or first activation
    /// after spawn).
    Activated,
}

/// What a body's `step` returns to the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The body hit a suspension point; record the given state.
    Suspend(ProcessState),
    /// The behavior function returned; destroy the process.
    Terminated,
}

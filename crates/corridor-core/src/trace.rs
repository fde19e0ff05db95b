//! Typed trace events.
//!
//! The kernel appends one entry per observable state change, in execution
//! order. The statistics crate folds the finished log into utilization and
//! transit metrics, and the determinism tests compare whole logs across
//! runs. Tracing can be disabled for long batch runs; the summary counters
//! in [`crate::sim::Counters`] are maintained regardless.

use crate::id::{LockId, ProcessId, Side, ShipClass};
use crate::time::SimTime;

/// A simulation trace event. All events carry the time at which they occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum TraceEvent {
    // -- Arrivals and admission --
    ShipArrived {
        ship: ProcessId,
        side: Side,
        class: ShipClass,
        at: SimTime,
    },
    ShipParked {
        ship: ProcessId,
        side: Side,
        at: SimTime,
    },
    ShipRejected {
        ship: ProcessId,
        side: Side,
        at: SimTime,
    },

    // -- Canal occupancy --
    CanalEntered {
        ship: ProcessId,
        occupancy: u32,
        at: SimTime,
    },
    CanalQueued {
        ship: ProcessId,
        at: SimTime,
    },
    CanalLeft {
        ship: ProcessId,
        occupancy: u32,
        at: SimTime,
    },

    // -- Locks --
    LockSeized {
        process: ProcessId,
        lock: LockId,
        at: SimTime,
    },
    LockQueued {
        process: ProcessId,
        lock: LockId,
        at: SimTime,
    },
    LockReleased {
        process: ProcessId,
        lock: LockId,
        at: SimTime,
    },

    // -- Admission controller --
    RestrictionBegan {
        at: SimTime,
    },
    RestrictionLifted {
        at: SimTime,
    },
    QueuesDrained {
        count: usize,
        at: SimTime,
    },

    // -- Accidents --
    AccidentStruck {
        lock: LockId,
        interrupted: Option<ProcessId>,
        at: SimTime,
    },
    RepairCompleted {
        lock: LockId,
        at: SimTime,
    },
    ShipInterrupted {
        ship: ProcessId,
        at: SimTime,
    },

    // -- Completion --
    TransitCompleted {
        ship: ProcessId,
        /// Total time in the system, in minutes.
        duration: SimTime,
        at: SimTime,
    },
}

/// Discriminant tag for trace event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceKind {
    ShipArrived,
    ShipParked,
    ShipRejected,
    CanalEntered,
    CanalQueued,
    CanalLeft,
    LockSeized,
    LockQueued,
    LockReleased,
    RestrictionBegan,
    RestrictionLifted,
    QueuesDrained,
    AccidentStruck,
    RepairCompleted,
    ShipInterrupted,
    TransitCompleted,
}

impl TraceEvent {
    /// Get the discriminant kind for this event.
    pub fn kind(&self) -> TraceKind {
        match self {
            TraceEvent::ShipArrived { .. } => TraceKind::ShipArrived,
            TraceEvent::ShipParked { .. } => TraceKind::ShipParked,
            TraceEvent::ShipRejected { .. } => TraceKind::ShipRejected,
            TraceEvent::CanalEntered { .. } => TraceKind::CanalEntered,
            TraceEvent::CanalQueued { .. } => TraceKind::CanalQueued,
            TraceEvent::CanalLeft { .. } => TraceKind::CanalLeft,
            TraceEvent::LockSeized { .. } => TraceKind::LockSeized,
            TraceEvent::LockQueued { .. } => TraceKind::LockQueued,
            TraceEvent::LockReleased { .. } => TraceKind::LockReleased,
            TraceEvent::RestrictionBegan { .. } => TraceKind::RestrictionBegan,
            TraceEvent::RestrictionLifted { .. } => TraceKind::RestrictionLifted,
            TraceEvent::QueuesDrained { .. } => TraceKind::QueuesDrained,
            TraceEvent::AccidentStruck { .. } => TraceKind::AccidentStruck,
            TraceEvent::RepairCompleted { .. } => TraceKind::RepairCompleted,
            TraceEvent::ShipInterrupted { .. } => TraceKind::ShipInterrupted,
            TraceEvent::TransitCompleted { .. } => TraceKind::TransitCompleted,
        }
    }

    /// The time at which the event occurred.
    pub fn at(&self) -> SimTime {
        match *self {
            TraceEvent::ShipArrived { at, .. }
            | TraceEvent::ShipParked { at, .. }
            | TraceEvent::ShipRejected { at, .. }
            | TraceEvent::CanalEntered { at, .. }
            | TraceEvent::CanalQueued { at, .. }
            | TraceEvent::CanalLeft { at, .. }
            | TraceEvent::LockSeized { at, .. }
            | TraceEvent::LockQueued { at, .. }
            | TraceEvent::LockReleased { at, .. }
            | TraceEvent::RestrictionBegan { at }
            | TraceEvent::RestrictionLifted { at }
            | TraceEvent::QueuesDrained { at, .. }
            | TraceEvent::AccidentStruck { at, .. }
            | TraceEvent::RepairCompleted { at, .. }
            | TraceEvent::ShipInterrupted { at, .. }
            | TraceEvent::TransitCompleted { at, .. } => at,
        }
    }
}

/// Chronological log of trace events.
#[derive(Debug, Default)]
pub struct TraceLog {
    events: Vec<TraceEvent>,
    enabled: bool,
}

impl TraceLog {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            enabled: true,
        }
    }

    /// Disable recording. Already-recorded events are kept.
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Append an event. No-op when disabled.
    pub fn push(&mut self, event: TraceEvent) {
        if self.enabled {
            self.events.push(event);
        }
    }

    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Count events of one kind.
    pub fn count(&self, kind: TraceKind) -> usize {
        self.events.iter().filter(|e| e.kind() == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::minutes;
    use slotmap::SlotMap;

    fn ship_id() -> ProcessId {
        let mut sm = SlotMap::<ProcessId, ()>::with_key();
        sm.insert(())
    }

    #[test]
    fn push_and_count() {
        let mut log = TraceLog::new();
        let ship = ship_id();
        log.push(TraceEvent::ShipArrived {
            ship,
            side: Side::Atlantic,
            class: ShipClass::Panamax,
            at: minutes(0),
        });
        log.push(TraceEvent::ShipRejected {
            ship,
            side: Side::Atlantic,
            at: minutes(0),
        });

        assert_eq!(log.len(), 2);
        assert_eq!(log.count(TraceKind::ShipArrived), 1);
        assert_eq!(log.count(TraceKind::ShipRejected), 1);
        assert_eq!(log.count(TraceKind::TransitCompleted), 0);
    }

    #[test]
    fn disabled_log_records_nothing_new() {
        let mut log = TraceLog::new();
        let ship = ship_id();
        log.push(TraceEvent::ShipInterrupted {
            ship,
            at: minutes(1),
        });
        log.disable();
        log.push(TraceEvent::ShipInterrupted {
            ship,
            at: minutes(2),
        });
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn at_accessor_matches_variant() {
        let e = TraceEvent::RestrictionBegan { at: minutes(42) };
        assert_eq!(e.at(), minutes(42));
        assert_eq!(e.kind(), TraceKind::RestrictionBegan);
    }
}

//! Corridor Core -- a deterministic discrete-event simulation of ships
//! transiting a capacity-constrained canal.
//!
//! Ships arrive from two oceans, pass an entry lock chamber, travel the main
//! channel, pass an exit chamber on the far side, and leave. The canal as a
//! whole is a counting resource; a hysteresis admission controller parks or
//! rejects arrivals when it saturates; an optional repair crew injects
//! accidents that abort in-chamber ships and block the chamber for the
//! repair duration.
//!
//! # Execution Model
//!
//! There are no threads and no coroutines. Each entity is a process: an
//! explicit phase machine resumed by the scheduler one event at a time.
//! [`sched::Scheduler`] orders resumptions by `(time, insertion sequence)`,
//! so a fixed seed reproduces byte-identical runs; [`time::SimTime`] is
//! Q32.32 fixed-point minutes to keep that ordering total across platforms.
//!
//! # Key Types
//!
//! - [`sim::Simulation`] -- the context: scheduler, process table, locks,
//!   controller, RNG, counters, trace log.
//! - [`config::ScenarioConfig`] -- all scenario parameters; one
//!   parameterized model covers every scenario variant.
//! - [`resource::CountingResource`] / [`resource::ExclusiveResource`] --
//!   FIFO-fair pool and single-holder lock.
//! - [`controller::CanalController`] -- the hysteresis admission state
//!   machine with two bounded wait queues.
//! - [`trace::TraceLog`] -- typed event log consumed by the statistics
//!   crate and the determinism tests.

pub mod accident;
pub mod config;
pub mod controller;
pub mod error;
pub mod generator;
pub mod id;
pub mod process;
pub mod resource;
pub mod rng;
pub mod sched;
pub mod ship;
pub mod sim;
pub mod time;
pub mod trace;
pub mod waitqueue;

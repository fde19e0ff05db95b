//! Configuration errors. These abort a run before any simulation time
//! advances; expected in-run conditions (rejection, interruption) are handled
//! inside the affected process and never surface as errors.

/// Fatal scenario-construction errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("canal capacity must be positive (got {0})")]
    NonPositiveCapacity(u32),

    #[error("lock passage time must be positive (got {0} min)")]
    NonPositiveLockTime(f64),

    #[error("simulation horizon must be at least one day (got {0})")]
    EmptyHorizon(u32),

    #[error("scenario defines no arrival generators")]
    NoGenerators,

    #[error("wait-queue bound must be positive when queueing is enabled")]
    ZeroQueueBound,

    #[error("unknown experiment id '{0}' (expected 1 or 2)")]
    UnknownExperiment(String),
}

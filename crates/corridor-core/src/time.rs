use fixed::types::I32F32;

/// Q32.32 fixed-point simulation time, measured in minutes.
///
/// Fixed-point keeps event ordering total and bit-identical across platforms;
/// float timestamps would make the tie-break rules fragile.
pub type SimTime = I32F32;

/// A span of simulation time, also in minutes.
pub type SimDuration = I32F32;

/// Minutes in one simulated day.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Convert a horizon expressed in days into a [`SimTime`] end mark.
#[inline]
pub fn days(n: u32) -> SimTime {
    SimTime::from_num(n * MINUTES_PER_DAY)
}

/// Convert a whole number of minutes into a duration.
#[inline]
pub fn minutes(n: u32) -> SimDuration {
    SimDuration::from_num(n)
}

/// Convert an f64 minute count to a duration. Use for distribution draws and
/// initialization, never for arithmetic inside the event loop.
#[inline]
pub fn f64_minutes(v: f64) -> SimDuration {
    SimDuration::from_num(v)
}

/// Convert a [`SimTime`] to f64 for display and statistics output only.
#[inline]
pub fn to_f64(t: SimTime) -> f64 {
    t.to_num::<f64>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn days_to_minutes() {
        assert_eq!(days(1), SimTime::from_num(1440));
        assert_eq!(days(365), SimTime::from_num(525_600));
    }

    #[test]
    fn ordering_is_total() {
        let a = f64_minutes(1.5);
        let b = f64_minutes(1.5);
        let c = f64_minutes(2.0);
        assert_eq!(a, b);
        assert!(a < c);
    }

    #[test]
    fn round_trip_display_conversion() {
        let t = minutes(90) + f64_minutes(0.25);
        assert_eq!(to_f64(t), 90.25);
    }
}

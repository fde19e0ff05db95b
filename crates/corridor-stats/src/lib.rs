//! Statistics for the corridor simulation.
//!
//! Folds a finished run's trace log into transit-time statistics, a
//! transit-time histogram, per-chamber utilization, and time-weighted canal
//! occupancy, and renders the whole thing as a plain-text report.
//!
//! # Usage
//!
//! ```ignore
//! let mut sim = Simulation::new(&cfg)?;
//! sim.run();
//! let report = Report::build(&sim);
//! println!("{report}");
//! ```
//!
//! Interrupted and rejected ships produce no transit sample by
//! construction: the kernel emits `TransitCompleted` only for normal
//! completions, so the fold never has to filter them out.

use std::collections::{HashMap, HashSet};
use std::fmt;

use corridor_core::id::{LockId, ProcessId};
use corridor_core::sim::{Counters, Simulation};
use corridor_core::time::{to_f64, SimTime};
use corridor_core::trace::TraceEvent;

// ---------------------------------------------------------------------------
// Tally — running sample statistics
// ---------------------------------------------------------------------------

/// Running min/max/mean/stddev over recorded samples.
#[derive(Debug, Clone, Default)]
pub struct Tally {
    count: u64,
    sum: f64,
    sum_sq: f64,
    min: f64,
    max: f64,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        self.sum += value;
        self.sum_sq += value * value;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }

    /// Population standard deviation. Zero with fewer than two samples.
    pub fn stddev(&self) -> f64 {
        if self.count < 2 {
            return 0.0;
        }
        let mean = self.mean();
        let var = self.sum_sq / self.count as f64 - mean * mean;
        var.max(0.0).sqrt()
    }

    pub fn min(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.min }
    }

    pub fn max(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.max }
    }
}

// ---------------------------------------------------------------------------
// Histogram — fixed bins with under/overflow counts
// ---------------------------------------------------------------------------

/// Equal-width histogram over `[low, low + step * bins)`, with explicit
/// underflow and overflow counters.
#[derive(Debug, Clone)]
pub struct Histogram {
    low: f64,
    step: f64,
    bins: Vec<u64>,
    under: u64,
    over: u64,
}

impl Histogram {
    /// # Panics
    ///
    /// Panics if `step` is not positive or `bins` is zero.
    pub fn new(low: f64, step: f64, bins: usize) -> Self {
        assert!(step > 0.0, "histogram step must be positive");
        assert!(bins > 0, "histogram needs at least one bin");
        Self {
            low,
            step,
            bins: vec![0; bins],
            under: 0,
            over: 0,
        }
    }

    pub fn record(&mut self, value: f64) {
        if value < self.low {
            self.under += 1;
            return;
        }
        let idx = ((value - self.low) / self.step) as usize;
        match self.bins.get_mut(idx) {
            Some(bin) => *bin += 1,
            None => self.over += 1,
        }
    }

    pub fn bin_count(&self, idx: usize) -> u64 {
        self.bins[idx]
    }

    pub fn bins(&self) -> &[u64] {
        &self.bins
    }

    pub fn under(&self) -> u64 {
        self.under
    }

    pub fn over(&self) -> u64 {
        self.over
    }

    pub fn total(&self) -> u64 {
        self.under + self.over + self.bins.iter().sum::<u64>()
    }

    /// Half-open value range of bin `idx`.
    pub fn bin_range(&self, idx: usize) -> (f64, f64) {
        let lo = self.low + self.step * idx as f64;
        (lo, lo + self.step)
    }
}

// ---------------------------------------------------------------------------
// Time-weighted accumulator
// ---------------------------------------------------------------------------

/// Integrates a piecewise-constant value over simulation time.
#[derive(Debug, Clone, Default)]
struct TimeWeighted {
    last_at: f64,
    current: f64,
    area: f64,
    max: f64,
}

impl TimeWeighted {
    fn set(&mut self, at: f64, value: f64) {
        debug_assert!(at >= self.last_at, "time-weighted series ran backwards");
        self.area += self.current * (at - self.last_at);
        self.last_at = at;
        self.current = value;
        self.max = self.max.max(value);
    }

    fn close(&mut self, end: f64) {
        self.set(end, self.current);
    }

    fn average(&self, end: f64) -> f64 {
        if end <= 0.0 { 0.0 } else { self.area / end }
    }
}

// ---------------------------------------------------------------------------
// Per-chamber usage
// ---------------------------------------------------------------------------

/// Utilization metrics for one lock chamber.
#[derive(Debug, Clone)]
pub struct LockUsage {
    pub name: String,
    /// Completed grants of holdership.
    pub seizures: u64,
    /// Total busy time, in minutes.
    pub busy_minutes: f64,
    /// Time-weighted average wait-list length.
    pub avg_queue: f64,
    /// Longest wait-list observed.
    pub max_queue: f64,
}

#[derive(Debug, Default)]
struct LockFold {
    seizures: u64,
    busy_from: Option<f64>,
    busy: f64,
    queue: TimeWeighted,
    queued: HashSet<ProcessId>,
}

impl LockFold {
    fn seized(&mut self, process: ProcessId, at: f64) {
        self.seizures += 1;
        if self.busy_from.is_none() {
            self.busy_from = Some(at);
        }
        // A grant off the FIFO shortens the wait list.
        if self.queued.remove(&process) {
            self.queue.set(at, self.queued.len() as f64);
        }
    }

    fn queued(&mut self, process: ProcessId, at: f64) {
        self.queued.insert(process);
        self.queue.set(at, self.queued.len() as f64);
    }

    fn released(&mut self, at: f64) {
        if let Some(from) = self.busy_from.take() {
            self.busy += at - from;
        }
    }

    fn close(mut self, name: String, end: f64) -> LockUsage {
        if let Some(from) = self.busy_from.take() {
            self.busy += end - from;
        }
        self.queue.close(end);
        LockUsage {
            name,
            seizures: self.seizures,
            busy_minutes: self.busy,
            avg_queue: self.queue.average(end),
            max_queue: self.queue.max,
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Transit-time histogram shape: 18 one-hour bins starting at 8 hours.
const HIST_LOW_HOURS: f64 = 8.0;
const HIST_STEP_HOURS: f64 = 1.0;
const HIST_BINS: usize = 18;

/// A folded run: counters, transit statistics, chamber usage, occupancy.
#[derive(Debug)]
pub struct Report {
    pub end: SimTime,
    pub counters: Counters,
    /// Transit times, in minutes.
    pub transit: Tally,
    /// Transit times, in hours.
    pub transit_hours: Histogram,
    /// Chamber usage, in the simulation's chamber order.
    pub locks: Vec<LockUsage>,
    /// Time-weighted average canal occupancy, in ships.
    pub avg_occupancy: f64,
    pub max_occupancy: f64,
    /// Times the admission controller closed the canal to new entrants.
    pub restrictions: u64,
}

impl Report {
    /// Fold a finished simulation's trace into a report.
    pub fn build(sim: &Simulation) -> Self {
        let end = to_f64(sim.now());
        let mut transit = Tally::new();
        let mut transit_hours = Histogram::new(HIST_LOW_HOURS, HIST_STEP_HOURS, HIST_BINS);
        let mut occupancy = TimeWeighted::default();
        let mut restrictions = 0u64;
        let mut locks: HashMap<LockId, LockFold> = sim
            .lock_ids()
            .into_iter()
            .map(|id| (id, LockFold::default()))
            .collect();

        for event in sim.trace.events() {
            match *event {
                TraceEvent::TransitCompleted { duration, .. } => {
                    let mins = to_f64(duration);
                    transit.record(mins);
                    transit_hours.record(mins / 60.0);
                }
                TraceEvent::CanalEntered { occupancy: occ, at, .. }
                | TraceEvent::CanalLeft { occupancy: occ, at, .. } => {
                    occupancy.set(to_f64(at), occ as f64);
                }
                TraceEvent::LockSeized { process, lock, at } => {
                    if let Some(fold) = locks.get_mut(&lock) {
                        fold.seized(process, to_f64(at));
                    }
                }
                TraceEvent::LockQueued { process, lock, at } => {
                    if let Some(fold) = locks.get_mut(&lock) {
                        fold.queued(process, to_f64(at));
                    }
                }
                TraceEvent::LockReleased { lock, at, .. } => {
                    if let Some(fold) = locks.get_mut(&lock) {
                        fold.released(to_f64(at));
                    }
                }
                TraceEvent::RestrictionBegan { .. } => restrictions += 1,
                _ => {}
            }
        }
        occupancy.close(end);

        let lock_usage = sim
            .lock_ids()
            .into_iter()
            .map(|id| {
                locks
                    .remove(&id)
                    .unwrap_or_default()
                    .close(sim.lock(id).name().to_owned(), end)
            })
            .collect();

        Self {
            end: sim.now(),
            counters: sim.counters.clone(),
            transit,
            transit_hours,
            locks: lock_usage,
            avg_occupancy: occupancy.average(end),
            max_occupancy: occupancy.max,
            restrictions,
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let end = to_f64(self.end);
        writeln!(f, "CANAL TRANSIT SIMULATION REPORT")?;
        writeln!(f, "===============================")?;
        writeln!(f, "Simulated time:        {:.1} min ({:.2} days)", end, end / (24.0 * 60.0))?;
        writeln!(f)?;

        let c = &self.counters;
        writeln!(f, "SHIPS")?;
        writeln!(f, "  generated:           {}", c.generated)?;
        writeln!(f, "    from Atlantic:     {}", c.atlantic_ships)?;
        writeln!(f, "    from Pacific:      {}", c.pacific_ships)?;
        writeln!(f, "  completed:           {}", c.completed)?;
        writeln!(f, "    Panamax:           {}", c.panamax_completed)?;
        writeln!(f, "    Neopanamax:        {}", c.neopanamax_completed)?;
        writeln!(f, "  rejected:            {}", c.rejected)?;
        writeln!(f, "  interrupted:         {}", c.interrupted)?;
        let days = end / (24.0 * 60.0);
        if days > 0.0 {
            writeln!(f, "  arrivals per day:    {:.1}", c.generated as f64 / days)?;
        }
        writeln!(f)?;

        writeln!(f, "CARGO THROUGHPUT")?;
        writeln!(f, "  tonnage (Panamax):   {}", c.cargo_tonnage)?;
        writeln!(f, "  TEU (Neopanamax):    {}", c.cargo_teu)?;
        writeln!(f)?;

        writeln!(f, "TRANSIT TIME (minutes, completed ships only)")?;
        writeln!(f, "  samples:             {}", self.transit.count())?;
        writeln!(f, "  mean:                {:.2}", self.transit.mean())?;
        writeln!(f, "  stddev:              {:.2}", self.transit.stddev())?;
        writeln!(f, "  min:                 {:.2}", self.transit.min())?;
        writeln!(f, "  max:                 {:.2}", self.transit.max())?;
        writeln!(f)?;

        writeln!(f, "TRANSIT TIME HISTOGRAM (hours)")?;
        if self.transit_hours.under() > 0 {
            writeln!(f, "  <{:5.1}        {:6}", HIST_LOW_HOURS, self.transit_hours.under())?;
        }
        for (idx, count) in self.transit_hours.bins().iter().enumerate() {
            let (lo, hi) = self.transit_hours.bin_range(idx);
            writeln!(f, "  {:5.1} - {:5.1} {:6}", lo, hi, count)?;
        }
        if self.transit_hours.over() > 0 {
            let top = HIST_LOW_HOURS + HIST_STEP_HOURS * HIST_BINS as f64;
            writeln!(f, "  >={:5.1}       {:6}", top, self.transit_hours.over())?;
        }
        writeln!(f)?;

        writeln!(f, "LOCK CHAMBERS")?;
        for lock in &self.locks {
            writeln!(f, "  {}", lock.name)?;
            writeln!(f, "    seizures:          {}", lock.seizures)?;
            writeln!(
                f,
                "    utilization:       {:.1}%",
                if end > 0.0 { 100.0 * lock.busy_minutes / end } else { 0.0 }
            )?;
            writeln!(f, "    avg queue length:  {:.2}", lock.avg_queue)?;
            writeln!(f, "    max queue length:  {:.0}", lock.max_queue)?;
        }
        writeln!(f)?;

        writeln!(f, "CANAL OCCUPANCY")?;
        writeln!(f, "  time-weighted avg:   {:.2} ships", self.avg_occupancy)?;
        writeln!(f, "  maximum:             {:.0} ships", self.max_occupancy)?;
        writeln!(f, "  restrictions:        {}", self.restrictions)?;
        Ok(())
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use corridor_core::config::{GeneratorConfig, ScenarioConfig};
    use corridor_core::id::{Side, ShipClass};
    use corridor_core::rng::Distribution;

    // -----------------------------------------------------------------------
    // Tally
    // -----------------------------------------------------------------------

    #[test]
    fn tally_basic_moments() {
        let mut t = Tally::new();
        for v in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            t.record(v);
        }
        assert_eq!(t.count(), 8);
        assert!((t.mean() - 5.0).abs() < 1e-9);
        assert!((t.stddev() - 2.0).abs() < 1e-9);
        assert_eq!(t.min(), 2.0);
        assert_eq!(t.max(), 9.0);
    }

    #[test]
    fn empty_tally_is_all_zeroes() {
        let t = Tally::new();
        assert_eq!(t.count(), 0);
        assert_eq!(t.mean(), 0.0);
        assert_eq!(t.stddev(), 0.0);
    }

    // -----------------------------------------------------------------------
    // Histogram
    // -----------------------------------------------------------------------

    #[test]
    fn histogram_bin_placement() {
        let mut h = Histogram::new(8.0, 1.0, 18);
        h.record(7.9); // under
        h.record(8.0); // bin 0
        h.record(14.5); // bin 6
        h.record(25.9); // bin 17
        h.record(26.0); // over

        assert_eq!(h.under(), 1);
        assert_eq!(h.bin_count(0), 1);
        assert_eq!(h.bin_count(6), 1);
        assert_eq!(h.bin_count(17), 1);
        assert_eq!(h.over(), 1);
        assert_eq!(h.total(), 5);
        assert_eq!(h.bin_range(6), (14.0, 15.0));
    }

    // -----------------------------------------------------------------------
    // Report folding
    // -----------------------------------------------------------------------

    fn quiet_scenario() -> ScenarioConfig {
        ScenarioConfig {
            canal_capacity: 8,
            lock_time: 90.0,
            travel_time: Distribution::Fixed(660.0),
            horizon_days: 2,
            queueing: false,
            queue_bound: 5,
            dual_locks: false,
            accidents: None,
            generators: vec![GeneratorConfig {
                class: ShipClass::Panamax,
                cargo: 50_000,
                inter_arrival: Distribution::Fixed(1e9),
                side: Some(Side::Atlantic),
            }],
            seed: 3,
        }
    }

    #[test]
    fn single_transit_report() {
        let mut sim = Simulation::new(&quiet_scenario()).unwrap();
        sim.run();
        let report = Report::build(&sim);

        // One ship: 90 + 660 + 90 = 840 minutes = 14 hours.
        assert_eq!(report.transit.count(), 1);
        assert!((report.transit.mean() - 840.0).abs() < 1e-6);
        assert_eq!(report.transit_hours.bin_count(6), 1); // 14h -> [14, 15)
        assert_eq!(report.counters.cargo_tonnage, 50_000);
        assert_eq!(report.restrictions, 0);

        // Each chamber was seized once and busy for one lockage.
        assert_eq!(report.locks.len(), 2);
        for lock in &report.locks {
            assert_eq!(lock.seizures, 1);
            assert!((lock.busy_minutes - 90.0).abs() < 1e-6);
            assert_eq!(lock.max_queue, 0.0);
        }
        assert_eq!(report.max_occupancy, 1.0);
    }

    #[test]
    fn queueing_shows_up_in_lock_metrics() {
        // Two same-side arrivals at t = 0 share a single entry chamber:
        // the second waits 90 minutes on its FIFO.
        let mut cfg = quiet_scenario();
        cfg.generators.push(cfg.generators[0].clone());
        let mut sim = Simulation::new(&cfg).unwrap();
        sim.run();
        let report = Report::build(&sim);

        let atlantic = &report.locks[0];
        assert_eq!(atlantic.seizures, 2);
        assert!((atlantic.busy_minutes - 180.0).abs() < 1e-6);
        assert_eq!(atlantic.max_queue, 1.0);
        // Second ship's transit is 90 minutes longer.
        assert!((report.transit.max() - 930.0).abs() < 1e-6);
    }

    #[test]
    fn report_renders_every_section() {
        let mut sim = Simulation::new(&quiet_scenario()).unwrap();
        sim.run();
        let text = Report::build(&sim).to_string();

        for heading in [
            "SHIPS",
            "CARGO THROUGHPUT",
            "TRANSIT TIME",
            "TRANSIT TIME HISTOGRAM",
            "LOCK CHAMBERS",
            "CANAL OCCUPANCY",
        ] {
            assert!(text.contains(heading), "missing section {heading}");
        }
        assert!(text.contains("Atlantic Locks 1"));
        assert!(text.contains("Pacific Locks 1"));
    }
}

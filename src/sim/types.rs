//! Core simulation types: configuration, the time index, and strategy labels.

use std::fmt;
use std::ops::Range;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

/// Duration of one timestep in minutes.
pub const SAMPLING_INTERVAL_MINUTES: i64 = 30;

/// Duration of one timestep in hours.
pub const SAMPLING_INTERVAL_HOURS: f64 = SAMPLING_INTERVAL_MINUTES as f64 / 60.0;

/// Number of timesteps in one calendar day at the fixed sampling interval.
pub const STEPS_PER_DAY: usize = (24 * 60 / SAMPLING_INTERVAL_MINUTES) as usize;

/// Centralized simulation configuration.
///
/// Chargers, the optimizer and the strategy runner read the power-to-energy
/// conversion factor from here. It is fixed to the spacing of
/// [`timesteps`](SimConfig::timesteps) and cannot be changed on its own.
///
/// # Examples
///
/// ```
/// use ev_charge_sim::sim::types::SimConfig;
///
/// let cfg = SimConfig::new(2023, 42);
/// assert_eq!(cfg.dt_hours(), 0.5);
/// assert_eq!(cfg.timesteps().len(), 365 * 48);
/// ```
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Calendar year simulated, in UTC.
    pub year: i32,
    dt_hours: f64,
    /// Master random seed for reproducibility.
    pub seed: u64,
}

impl SimConfig {
    /// Creates a new simulation configuration for one calendar year.
    ///
    /// # Panics
    ///
    /// Panics if `year` is outside the range chrono can represent.
    pub fn new(year: i32, seed: u64) -> Self {
        assert!(
            NaiveDate::from_ymd_opt(year, 1, 1).is_some(),
            "year {year} is out of range"
        );
        Self {
            year,
            dt_hours: SAMPLING_INTERVAL_HOURS,
            seed,
        }
    }

    /// Builds the full-year UTC index from Jan 1 00:00 to Dec 31 23:30.
    pub fn timesteps(&self) -> Vec<DateTime<Utc>> {
        let start = Utc.with_ymd_and_hms(self.year, 1, 1, 0, 0, 0).single();
        let end = Utc.with_ymd_and_hms(self.year + 1, 1, 1, 0, 0, 0).single();
        let (Some(start), Some(end)) = (start, end) else {
            return Vec::new();
        };
        timesteps_between(start, end)
    }

    /// Duration of one timestep in hours.
    pub fn dt_hours(&self) -> f64 {
        self.dt_hours
    }

    /// Converts a power in kW held for one timestep to energy in kWh.
    pub fn kw_to_kwh(&self, kw: f64) -> f64 {
        kw * self.dt_hours
    }
}

/// Returns the half-open range `[start, end)` sampled at the fixed interval.
pub fn timesteps_between(start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    let step = Duration::minutes(SAMPLING_INTERVAL_MINUTES);
    let mut out = Vec::new();
    let mut t = start;
    while t < end {
        out.push(t);
        t += step;
    }
    out
}

/// Splits a chronological index into contiguous per-calendar-day ranges.
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use ev_charge_sim::sim::types::{day_ranges, timesteps_between};
///
/// let start = Utc.with_ymd_and_hms(2023, 3, 1, 0, 0, 0).unwrap();
/// let end = Utc.with_ymd_and_hms(2023, 3, 3, 0, 0, 0).unwrap();
/// let index = timesteps_between(start, end);
/// assert_eq!(day_ranges(&index), vec![0..48, 48..96]);
/// ```
pub fn day_ranges(index: &[DateTime<Utc>]) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;
    for day in index.chunk_by(|a, b| a.date_naive() == b.date_naive()) {
        ranges.push(start..start + day.len());
        start += day.len();
    }
    ranges
}

/// Optimization objective that decides how a day's timesteps are ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Strategy {
    /// Earliest hour of the day first.
    Base,
    /// Lowest carbon intensity first.
    Emission,
    /// Lowest electricity price first.
    Price,
    /// Highest PV availability first.
    Pv,
}

impl Strategy {
    /// All strategies in the order they are executed.
    pub const ALL: [Strategy; 4] = [
        Strategy::Base,
        Strategy::Emission,
        Strategy::Price,
        Strategy::Pv,
    ];

    /// Short label used in result maps and exports.
    pub fn label(self) -> &'static str {
        match self {
            Strategy::Base => "Basic",
            Strategy::Emission => "Emission",
            Strategy::Price => "Price",
            Strategy::Pv => "PV",
        }
    }

    /// Name of the result system produced by this strategy.
    pub fn site_name(self) -> &'static str {
        match self {
            Strategy::Base => "BASE_OPTIMIZER_SITE",
            Strategy::Emission => "EMISSION_OPTIMIZER_SITE",
            Strategy::Price => "PRICE_OPTIMIZER_SITE",
            Strategy::Pv => "PV_OPTIMIZER_SITE",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

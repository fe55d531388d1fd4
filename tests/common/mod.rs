//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use ev_charge_sim::devices::{Battery, Charger, ChargerType, ConnectionSchedule, Vehicle};
use ev_charge_sim::sim::site::SiteInputs;
use ev_charge_sim::sim::types::{SimConfig, timesteps_between};

/// Timestep duration used throughout (hours).
pub const DT: f64 = 0.5;

/// Simulation configuration for 2023, seed 42.
pub fn sim() -> SimConfig {
    SimConfig::new(2023, 42)
}

/// `days` whole days starting Monday 2023-01-02.
pub fn index_from_monday(days: i64) -> Arc<[DateTime<Utc>]> {
    let start = Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap();
    timesteps_between(start, start + Duration::days(days)).into()
}

/// Step position of `h:m` on day `day` (0-based) of an index starting at midnight.
pub fn step(day: usize, h: usize, m: usize) -> usize {
    day * 48 + h * 2 + m / 30
}

/// The single-vehicle reference setup: 60 kWh battery at 0.5 SOC charging
/// to 0.65, plugged Mon-Fri 08:00-17:00, on a 7 kW charger.
pub fn reference_charger(index: &Arc<[DateTime<Utc>]>) -> Charger {
    let mut charger = Charger::new("Charger_1", ChargerType::Level2, 7.0, 1, &sim(), index.clone());
    let battery = Battery::new(60.0, 0.5, 0.65, 0.0, ConnectionSchedule::default());
    charger
        .connect(Vehicle::new("EV_1", battery, index.clone()))
        .unwrap();
    charger
}

/// Site inputs with constant demand (kWh per step) and import limit (kW).
pub fn flat_inputs(index: &Arc<[DateTime<Utc>]>, demand_kwh: f64, limit_kw: f64) -> SiteInputs {
    let n = index.len();
    SiteInputs::new(index.clone(), vec![demand_kwh; n], vec![limit_kw; n]).unwrap()
}

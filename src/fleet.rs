//! Builds the charger roster for a scenario.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::{Rng, rngs::StdRng};
use tracing::debug;

use crate::config::ScenarioConfig;
use crate::devices::{Battery, Charger, Vehicle};
use crate::error::Result;
use crate::sim::types::SimConfig;

/// Rounds to two decimal places.
fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Creates the fleet's vehicles and plugs them into chargers.
///
/// Battery sizes are drawn uniformly from
/// `[battery_kwh_min, battery_kwh_max]` using `rng` and rounded to 0.01 kWh.
/// Vehicles are grouped onto chargers `vehicles_per_charger` at a time, so
/// the last charger may hold fewer. Names are `Charger_1..` and `EV_1..`.
///
/// # Errors
///
/// Returns [`crate::error::SimError::Config`] if the connection schedule
/// cannot be parsed.
///
/// # Panics
///
/// Panics if the fleet section has not been validated and holds an empty or
/// inverted battery range, or zero vehicles per charger.
pub fn build_fleet(
    config: &ScenarioConfig,
    sim: &SimConfig,
    index: Arc<[DateTime<Utc>]>,
    rng: &mut StdRng,
) -> Result<Vec<Charger>> {
    let fleet = &config.fleet;
    let schedule = fleet.connection_schedule()?;
    let target_soc = fleet.target_soc();

    let vehicles: Vec<Vehicle> = (1..=fleet.vehicle_count)
        .map(|i| {
            let capacity_kwh =
                round2(rng.random_range(fleet.battery_kwh_min..=fleet.battery_kwh_max));
            let battery = Battery::new(
                capacity_kwh,
                fleet.initial_soc,
                target_soc,
                fleet.loss_rate_per_step,
                schedule.clone(),
            );
            debug!(
                vehicle = i,
                capacity_kwh,
                hours_to_target = battery.charging_time_hours(config.charger.max_output_kw),
                "vehicle created"
            );
            Vehicle::new(format!("EV_{i}"), battery, Arc::clone(&index))
        })
        .collect();

    let per_charger = fleet.vehicles_per_charger;
    assert!(per_charger > 0);
    let mut chargers = Vec::with_capacity(vehicles.len().div_ceil(per_charger));
    let mut vehicles = vehicles.into_iter().peekable();
    let mut n = 0;
    while vehicles.peek().is_some() {
        n += 1;
        let mut charger = Charger::new(
            format!("Charger_{n}"),
            config.charger.charger_type,
            config.charger.max_output_kw,
            per_charger,
            sim,
            Arc::clone(&index),
        )
        .with_costs(config.charger.costs());
        for vehicle in vehicles.by_ref().take(per_charger) {
            charger.connect(vehicle)?;
        }
        chargers.push(charger);
    }

    debug!(
        vehicles = fleet.vehicle_count,
        chargers = chargers.len(),
        "fleet built"
    );
    Ok(chargers)
}

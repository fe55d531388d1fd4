use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::devices::types::{ChargerType, ChargingLoad};
use crate::devices::vehicle::Vehicle;
use crate::error::{Result, SimError};
use crate::sim::recorder::{ChargerColumn, Recorder, TimeseriesRecorder};
use crate::sim::types::SimConfig;

/// Purchase and upkeep attributes of a charger.
#[derive(Debug, Clone, PartialEq)]
pub struct ChargerCosts {
    /// Capital cost per charger (GBP).
    pub capital_cost: f64,
    /// Maintenance cost per year (GBP).
    pub maintenance_cost: f64,
    /// Rated size of the installation (kW).
    pub size_kw: f64,
    /// Expected lifetime in years.
    pub lifetime_years: u32,
}

impl Default for ChargerCosts {
    fn default() -> Self {
        Self {
            capital_cost: 12_000.0,
            maintenance_cost: 120.0,
            size_kw: 10.0,
            lifetime_years: 30,
        }
    }
}

/// A charge point serving one or more vehicles.
///
/// The charger offers the **same** per-timestep energy to each vehicle it
/// holds; every vehicle decides for itself how much to draw. The charger
/// records the sum of what its vehicles actually drew.
///
/// # Power Flow Convention (Feeder)
/// All recorded values are **positive** (consumption / load on the site).
#[derive(Debug, Clone)]
pub struct Charger {
    name: String,

    /// Power class of the charger.
    pub charger_type: ChargerType,

    /// Maximum output in kilowatts.
    pub max_output_kw: f64,

    /// Maximum number of vehicles that can be connected.
    pub connection_capacity: usize,

    /// Capital and maintenance attributes.
    pub costs: ChargerCosts,

    /// Duration of one timestep in hours.
    dt_hours: f64,

    vehicles: Vec<Vehicle>,
    recorder: TimeseriesRecorder<ChargerColumn>,
}

impl Charger {
    /// Creates an empty charger recording over `index`.
    ///
    /// # Panics
    ///
    /// Panics if `max_output_kw` is not positive or `connection_capacity` is zero.
    pub fn new(
        name: impl Into<String>,
        charger_type: ChargerType,
        max_output_kw: f64,
        connection_capacity: usize,
        config: &SimConfig,
        index: Arc<[DateTime<Utc>]>,
    ) -> Self {
        assert!(max_output_kw > 0.0);
        assert!(connection_capacity > 0);

        Self {
            name: name.into(),
            charger_type,
            max_output_kw,
            connection_capacity,
            costs: ChargerCosts::default(),
            dt_hours: config.dt_hours(),
            vehicles: Vec::new(),
            recorder: TimeseriesRecorder::new(index),
        }
    }

    /// Replaces the cost attributes.
    #[must_use]
    pub fn with_costs(mut self, costs: ChargerCosts) -> Self {
        self.costs = costs;
        self
    }

    /// Connects another vehicle to this charger.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::ChargerFull`] when every connection is taken.
    pub fn connect(&mut self, vehicle: Vehicle) -> Result<()> {
        if self.vehicles.len() >= self.connection_capacity {
            return Err(SimError::ChargerFull {
                charger: self.name.clone(),
                capacity: self.connection_capacity,
            });
        }
        self.vehicles.push(vehicle);
        Ok(())
    }

    /// Vehicles connected to this charger.
    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    /// Number of connected vehicles.
    pub fn number_of_vehicles(&self) -> usize {
        self.vehicles.len()
    }

    /// Recorded energy drawn through this charger.
    pub fn recorder(&self) -> &TimeseriesRecorder<ChargerColumn> {
        &self.recorder
    }

    /// Energy drawn through the charger at each timestep (kWh).
    pub fn energy_input_kwh(&self) -> &[f64] {
        self.recorder.column(ChargerColumn::EnergyInput)
    }

    /// Zeroes the charger's record and every connected vehicle's record.
    pub fn clear_records(&mut self) {
        self.recorder.clear();
        self.vehicles.iter_mut().for_each(Vehicle::clear_records);
    }

    /// Runs every vehicle through `timesteps` under a power schedule.
    ///
    /// Without a schedule the charger splits `max_output_kw` equally across
    /// its vehicles and holds that level for every step. The same energy
    /// offer is forwarded to every vehicle; their actual draws are summed and
    /// recorded.
    ///
    /// Returns the total charger output in kW.
    ///
    /// # Errors
    ///
    /// Fails if the schedule length differs from `timesteps` or the window is
    /// not part of the recorder index.
    pub fn charging_profile(
        &mut self,
        timesteps: &[DateTime<Utc>],
        schedule_kw: Option<&[f64]>,
    ) -> Result<Vec<f64>> {
        let offered_kwh: Vec<f64> = match schedule_kw {
            Some(kw) => kw.iter().map(|p| p * self.dt_hours).collect(),
            None => {
                let split_kw = if self.vehicles.is_empty() {
                    0.0
                } else {
                    self.max_output_kw / self.vehicles.len() as f64
                };
                vec![split_kw * self.dt_hours; timesteps.len()]
            }
        };

        let total_kwh = self.draw(timesteps, &offered_kwh)?;
        Ok(total_kwh.iter().map(|e| e / self.dt_hours).collect())
    }

    /// Runs a single connected vehicle through `timesteps` under `schedule_kw`.
    ///
    /// The vehicle's draw is added onto the charger's record, so dispatching
    /// each vehicle in turn leaves the charger holding their sum.
    ///
    /// Returns the energy the vehicle drew (kWh).
    ///
    /// # Errors
    ///
    /// Fails if `vehicle` is out of range or the inputs do not line up.
    pub fn dispatch_vehicle(
        &mut self,
        vehicle: usize,
        timesteps: &[DateTime<Utc>],
        schedule_kw: &[f64],
    ) -> Result<Vec<f64>> {
        let offered_kwh: Vec<f64> = schedule_kw.iter().map(|p| p * self.dt_hours).collect();
        let name = &self.name;
        let ev = self
            .vehicles
            .get_mut(vehicle)
            .ok_or_else(|| SimError::NoSuchVehicle {
                charger: name.clone(),
                index: vehicle,
            })?;
        let drawn_kwh = ev.charging_profile(timesteps, &offered_kwh)?;
        self.recorder
            .accumulate_batch(timesteps, ChargerColumn::EnergyInput, &drawn_kwh)?;
        Ok(drawn_kwh)
    }
}

impl ChargingLoad for Charger {
    fn name(&self) -> &str {
        &self.name
    }

    fn draw(&mut self, timesteps: &[DateTime<Utc>], offered_kwh: &[f64]) -> Result<Vec<f64>> {
        if timesteps.len() != offered_kwh.len() {
            return Err(SimError::LengthMismatch {
                what: "charger schedule",
                expected: timesteps.len(),
                actual: offered_kwh.len(),
            });
        }

        let mut total_kwh = vec![0.0; timesteps.len()];
        for ev in &mut self.vehicles {
            let drawn = ev.draw(timesteps, offered_kwh)?;
            for (sum, e) in total_kwh.iter_mut().zip(drawn) {
                *sum += e;
            }
        }
        self.recorder
            .record_batch(timesteps, ChargerColumn::EnergyInput, &total_kwh)?;
        Ok(total_kwh)
    }
}

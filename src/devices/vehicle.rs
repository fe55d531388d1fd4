use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::devices::battery::Battery;
use crate::devices::types::ChargingLoad;
use crate::error::{Result, SimError};
use crate::sim::recorder::{EvColumn, Recorder, TimeseriesRecorder};

/// An electric vehicle: a battery plus a dense record of what it did.
#[derive(Debug, Clone)]
pub struct Vehicle {
    name: String,
    battery: Battery,
    recorder: TimeseriesRecorder<EvColumn>,
}

impl Vehicle {
    /// Creates a vehicle recording over `index`.
    pub fn new(name: impl Into<String>, battery: Battery, index: Arc<[DateTime<Utc>]>) -> Self {
        Self {
            name: name.into(),
            battery,
            recorder: TimeseriesRecorder::new(index),
        }
    }

    /// The vehicle's battery.
    pub fn battery(&self) -> &Battery {
        &self.battery
    }

    /// Recorded SOC, energy drawn and plugged flag.
    pub fn recorder(&self) -> &TimeseriesRecorder<EvColumn> {
        &self.recorder
    }

    /// Zeroes the recorded series.
    pub fn clear_records(&mut self) {
        self.recorder.clear();
    }

    /// Drives the battery through `timesteps` with the given energy offers.
    ///
    /// SOC, drawn energy and the plugged flag are recorded for every step,
    /// including idle and disconnected ones. Steps run strictly in order
    /// since each depends on the SOC left by the previous one.
    ///
    /// # Errors
    ///
    /// Fails if the two slices differ in length or the timesteps are not a
    /// contiguous window of the vehicle's index.
    pub fn charging_profile(
        &mut self,
        timesteps: &[DateTime<Utc>],
        offered_kwh: &[f64],
    ) -> Result<Vec<f64>> {
        if timesteps.len() != offered_kwh.len() {
            return Err(SimError::LengthMismatch {
                what: "vehicle energy offers",
                expected: timesteps.len(),
                actual: offered_kwh.len(),
            });
        }

        let n = timesteps.len();
        let mut soc = Vec::with_capacity(n);
        let mut energy = Vec::with_capacity(n);
        let mut plugged = Vec::with_capacity(n);
        for (t, offer) in timesteps.iter().zip(offered_kwh) {
            energy.push(self.battery.step(*t, *offer));
            soc.push(self.battery.current_soc());
            plugged.push(f64::from(u8::from(self.battery.schedule().is_plugged(*t))));
        }

        self.recorder.record_batch(timesteps, EvColumn::Soc, &soc)?;
        self.recorder
            .record_batch(timesteps, EvColumn::EnergyInput, &energy)?;
        self.recorder
            .record_batch(timesteps, EvColumn::Plugged, &plugged)?;
        Ok(energy)
    }
}

impl ChargingLoad for Vehicle {
    fn name(&self) -> &str {
        &self.name
    }

    fn draw(&mut self, timesteps: &[DateTime<Utc>], offered_kwh: &[f64]) -> Result<Vec<f64>> {
        self.charging_profile(timesteps, offered_kwh)
    }
}

//! Common types and traits for charging equipment.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::Result;

/// Something that draws energy from a per-timestep offer.
///
/// Implemented by [`super::Vehicle`] (one battery) and [`super::Charger`]
/// (forwards the offer to every vehicle it holds), so either can sit behind
/// a connection point.
pub trait ChargingLoad {
    /// Identity used in result maps and exports.
    fn name(&self) -> &str;

    /// Steps through `timesteps` in order, offering `offered_kwh[i]` at step `i`.
    ///
    /// Returns the energy actually drawn at each step (kWh). Every offer may
    /// be partially or entirely refused.
    ///
    /// # Errors
    ///
    /// Fails if the inputs do not line up with the load's recorder.
    fn draw(&mut self, timesteps: &[DateTime<Utc>], offered_kwh: &[f64]) -> Result<Vec<f64>>;
}

/// Charger power class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChargerType {
    /// Slow, domestic-socket charging.
    Level1,
    /// Medium AC wallbox charging.
    #[default]
    Level2,
    /// Fast DC charging.
    Level3,
}

impl fmt::Display for ChargerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChargerType::Level1 => "LEVEL_1",
            ChargerType::Level2 => "LEVEL_2",
            ChargerType::Level3 => "LEVEL_3",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charger_type_display() {
        assert_eq!(ChargerType::Level2.to_string(), "LEVEL_2");
        assert_eq!(ChargerType::default(), ChargerType::Level2);
    }
}

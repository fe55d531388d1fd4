//! Error types shared across the simulator.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised while wiring or driving a simulation.
#[derive(Debug, Error)]
pub enum SimError {
    /// A batch write referenced a timestep that the recorder does not index.
    #[error("timestep {0} is not part of the recorder index")]
    UnknownTimestep(DateTime<Utc>),

    /// A batch write would run past the end of the recorder index.
    #[error("window of {len} steps starting at position {start} overflows an index of {index_len}")]
    WindowOverflow {
        start: usize,
        len: usize,
        index_len: usize,
    },

    /// Values and timesteps handed to a batch operation differ in length.
    #[error("{what}: expected {expected} values, got {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A charger has no free connection left for another vehicle.
    #[error("charger {charger} already holds {capacity} vehicle(s)")]
    ChargerFull { charger: String, capacity: usize },

    /// A vehicle index does not exist on the charger.
    #[error("charger {charger} has no vehicle at position {index}")]
    NoSuchVehicle { charger: String, index: usize },

    /// Scenario configuration could not be turned into a fleet or inputs.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Convenience alias for results carrying a [`SimError`].
pub type Result<T, E = SimError> = std::result::Result<T, E>;

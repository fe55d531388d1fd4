//! Charging equipment: batteries, vehicles and chargers.

/// Vehicle traction battery state machine.
pub mod battery;
/// Charge point holding one or more vehicles.
pub mod charger;
/// Weekly plug-in pattern.
pub mod schedule;
pub mod types;
pub mod vehicle;

// Re-export the main types for convenience
pub use battery::Battery;
pub use charger::{Charger, ChargerCosts};
pub use schedule::ConnectionSchedule;
pub use types::{ChargerType, ChargingLoad};
pub use vehicle::Vehicle;

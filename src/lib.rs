//! Site-constrained EV fleet charging simulator.
//!
//! A year of half-hourly site demand, an import limit and optional ranking
//! signals (carbon intensity, price, PV availability) go in; per-strategy
//! charging plans for every vehicle come out.

pub mod config;
pub mod devices;
pub mod error;
pub mod fleet;
pub mod io;
pub mod profiles;
pub mod scenario;
/// Time index, recorders, optimizer and strategy runner.
pub mod sim;

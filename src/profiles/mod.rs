//! Synthetic site series: demand, PV availability and grid signals.
//!
//! Every generator draws its noise from a caller-supplied [`StdRng`] so a
//! whole scenario is reproducible from one seed.

use chrono::{DateTime, Timelike, Utc};
use rand::{Rng, rngs::StdRng};

pub mod demand;
pub mod grid;
pub mod solar;

pub use demand::SiteLoad;
pub use grid::GridSignal;
pub use solar::SolarAvailability;

/// Position of `t` within its UTC day, in `[0, 1)`.
pub fn fraction_of_day(t: DateTime<Utc>) -> f64 {
    f64::from(t.num_seconds_from_midnight()) / 86_400.0
}

/// Hour of day of `t` as a fraction, e.g. 13.5 for 13:30.
pub fn hour_of_day(t: DateTime<Utc>) -> f64 {
    fraction_of_day(t) * 24.0
}

/// Utility function to generate Gaussian noise using Box-Muller transform.
///
/// # Arguments
///
/// * `rng` - Random number generator
/// * `std_dev` - Standard deviation of the noise
///
/// # Returns
///
/// Random value from a Gaussian distribution with mean 0 and specified standard deviation
pub fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f64 = rng.random::<f64>().clamp(1e-9, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    z0 * std_dev
}

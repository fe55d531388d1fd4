use chrono::{DateTime, Utc};
use rand::rngs::StdRng;

use super::{fraction_of_day, gaussian_noise};

/// A site demand generator that models daily electricity consumption patterns.
///
/// `SiteLoad` creates a sinusoidal power demand pattern with configurable
/// baseline, amplitude, phase, and random noise. The strategy runner consumes
/// it as energy per timestep.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use rand::{SeedableRng, rngs::StdRng};
/// use ev_charge_sim::profiles::SiteLoad;
///
/// let load = SiteLoad::new(
///     40.0, // base_kw - average consumption
///     15.0, // amp_kw - daily variation
///     0.0,  // phase_rad - no phase shift
///     0.0,  // noise_std - no random variation
/// );
/// let mut rng = StdRng::seed_from_u64(42);
/// let midnight = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
/// assert_eq!(load.demand_kw(midnight, &mut rng), 40.0);
/// ```
#[derive(Debug, Clone)]
pub struct SiteLoad {
    /// Baseline power consumption in kilowatts
    pub base_kw: f64,
    /// Amplitude of the sinusoidal variation in kilowatts
    pub amp_kw: f64,
    /// Phase offset of the sinusoidal pattern in radians
    pub phase_rad: f64,
    /// Standard deviation of the Gaussian noise in kilowatts
    pub noise_std: f64,
}

impl SiteLoad {
    /// Creates a new site demand generator.
    ///
    /// Negative amplitudes and noise levels are clamped to zero.
    pub fn new(base_kw: f64, amp_kw: f64, phase_rad: f64, noise_std: f64) -> Self {
        Self {
            base_kw,
            amp_kw: amp_kw.max(0.0),
            phase_rad,
            noise_std: noise_std.max(0.0),
        }
    }

    /// Power demand at `t`, never negative.
    pub fn demand_kw(&self, t: DateTime<Utc>, rng: &mut StdRng) -> f64 {
        let angle = 2.0 * std::f64::consts::PI * fraction_of_day(t) + self.phase_rad;
        let kw = self.base_kw + self.amp_kw * angle.sin() + gaussian_noise(rng, self.noise_std);
        kw.max(0.0) // no negative demand
    }

    /// Energy drawn per timestep over `index` (kWh).
    pub fn energy_series(
        &self,
        index: &[DateTime<Utc>],
        dt_hours: f64,
        rng: &mut StdRng,
    ) -> Vec<f64> {
        index
            .iter()
            .map(|t| self.demand_kw(*t, rng) * dt_hours)
            .collect()
    }
}

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;

use super::{gaussian_noise, hour_of_day};

/// Hour at which the evening peak is centred.
const EVENING_PEAK_HOUR: f64 = 18.0;
/// Hour at which the midday dip is centred.
const MIDDAY_DIP_HOUR: f64 = 13.0;
/// Width (hours) of both daily bumps.
const BUMP_WIDTH_HOURS: f64 = 2.5;

/// A grid-side ranking signal such as carbon intensity or price.
///
/// The daily shape is a flat base with a Gaussian bump in the evening and a
/// Gaussian dip around midday, plus per-step noise. Values are floored at zero.
#[derive(Debug, Clone)]
pub struct GridSignal {
    /// Level outside the peak and dip.
    pub base: f64,
    /// Height of the evening peak above `base`.
    pub evening_peak: f64,
    /// Depth of the midday dip below `base`.
    pub midday_dip: f64,
    /// Standard deviation of the additive noise.
    pub noise_std: f64,
}

fn bump(hour: f64, centre: f64) -> f64 {
    let z = (hour - centre) / BUMP_WIDTH_HOURS;
    (-z * z).exp()
}

impl GridSignal {
    pub fn new(base: f64, evening_peak: f64, midday_dip: f64, noise_std: f64) -> Self {
        Self {
            base,
            evening_peak,
            midday_dip,
            noise_std: noise_std.max(0.0),
        }
    }

    /// Carbon intensity shape in gCO2/kWh.
    pub fn carbon_intensity() -> Self {
        Self::new(220.0, 90.0, 80.0, 10.0)
    }

    /// Electricity price shape per kWh.
    pub fn price() -> Self {
        Self::new(0.25, 0.12, 0.08, 0.01)
    }

    /// Signal value at `t`.
    pub fn value(&self, t: DateTime<Utc>, rng: &mut StdRng) -> f64 {
        let h = hour_of_day(t);
        let v = self.base + self.evening_peak * bump(h, EVENING_PEAK_HOUR)
            - self.midday_dip * bump(h, MIDDAY_DIP_HOUR)
            + gaussian_noise(rng, self.noise_std);
        v.max(0.0)
    }

    pub fn series(&self, index: &[DateTime<Utc>], rng: &mut StdRng) -> Vec<f64> {
        index.iter().map(|t| self.value(*t, rng)).collect()
    }
}

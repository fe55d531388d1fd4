use chrono::{DateTime, Datelike, Utc};
use rand::rngs::StdRng;

use super::{gaussian_noise, hour_of_day};

/// Day of year around which the seasonal scaling peaks (June solstice).
const SOLSTICE_DAY: f64 = 172.0;

/// PV availability that follows a half-cosine daylight shape.
///
/// Output is zero outside `[sunrise_hour, sunset_hour)`. The peak is scaled
/// over the year by `1 + seasonal_amplitude * cos(...)` and by a per-step
/// noise multiplier.
#[derive(Debug, Clone)]
pub struct SolarAvailability {
    /// Maximum availability in kilowatts under ideal conditions.
    pub kw_peak: f64,
    /// Hour of day when generation starts (inclusive).
    pub sunrise_hour: f64,
    /// Hour of day when generation stops (exclusive).
    pub sunset_hour: f64,
    /// Relative seasonal swing of the peak, `0.0` for none.
    pub seasonal_amplitude: f64,
    /// Standard deviation of the Gaussian noise as a fraction of output.
    pub noise_std: f64,
}

impl SolarAvailability {
    /// Creates a new PV availability profile.
    ///
    /// # Panics
    ///
    /// Panics if `sunrise_hour >= sunset_hour` or either lies outside `[0, 24]`.
    pub fn new(
        kw_peak: f64,
        sunrise_hour: f64,
        sunset_hour: f64,
        seasonal_amplitude: f64,
        noise_std: f64,
    ) -> Self {
        assert!(sunrise_hour < sunset_hour);
        assert!((0.0..=24.0).contains(&sunrise_hour) && (0.0..=24.0).contains(&sunset_hour));
        Self {
            kw_peak: kw_peak.max(0.0),
            sunrise_hour,
            sunset_hour,
            seasonal_amplitude: seasonal_amplitude.clamp(0.0, 1.0),
            noise_std: noise_std.max(0.0),
        }
    }

    /// Daylight fraction in `[0, 1]` at `t`, peaking halfway between
    /// sunrise and sunset.
    pub fn daylight_frac(&self, t: DateTime<Utc>) -> f64 {
        let h = hour_of_day(t);
        if h < self.sunrise_hour || h >= self.sunset_hour {
            return 0.0;
        }
        let x = (h - self.sunrise_hour) / (self.sunset_hour - self.sunrise_hour);
        (std::f64::consts::PI * x).sin()
    }

    fn seasonal_factor(&self, t: DateTime<Utc>) -> f64 {
        let doy = f64::from(t.ordinal());
        1.0 + self.seasonal_amplitude
            * (2.0 * std::f64::consts::PI * (doy - SOLSTICE_DAY) / 365.0).cos()
    }

    /// Available PV power at `t` (kW), never negative.
    pub fn available_kw(&self, t: DateTime<Utc>, rng: &mut StdRng) -> f64 {
        let frac = self.daylight_frac(t);
        if frac <= 0.0 {
            return 0.0;
        }
        let noise_mult = 1.0 + gaussian_noise(rng, self.noise_std);
        (self.kw_peak * self.seasonal_factor(t) * frac * noise_mult).max(0.0)
    }

    /// Availability over `index` (kW).
    pub fn series(&self, index: &[DateTime<Utc>], rng: &mut StdRng) -> Vec<f64> {
        index.iter().map(|t| self.available_kw(*t, rng)).collect()
    }
}

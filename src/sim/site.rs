//! Site-level inputs and per-strategy result systems.

use std::sync::Arc;

use chrono::{DateTime, Timelike, Utc};

use crate::devices::Charger;
use crate::error::{Result, SimError};
use crate::sim::recorder::{Recorder, SiteColumn, TimeseriesRecorder};
use crate::sim::types::Strategy;

/// Everything the strategy runner reads about the site, on one shared index.
#[derive(Debug, Clone)]
pub struct SiteInputs {
    index: Arc<[DateTime<Utc>]>,
    demand_kwh: Vec<f64>,
    import_limit_kw: Vec<f64>,
    carbon: Option<Vec<f64>>,
    price: Option<Vec<f64>>,
    pv: Option<Vec<f64>>,
}

fn check_len(what: &'static str, expected: usize, series: &[f64]) -> Result<()> {
    if series.len() == expected {
        Ok(())
    } else {
        Err(SimError::LengthMismatch {
            what,
            expected,
            actual: series.len(),
        })
    }
}

impl SiteInputs {
    /// Creates site inputs from the existing demand (kWh per step) and the
    /// import limit (kW).
    ///
    /// Only lengths are checked; the series are assumed to be sampled on
    /// `index`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::LengthMismatch`] if a series does not match the index.
    pub fn new(
        index: Arc<[DateTime<Utc>]>,
        demand_kwh: Vec<f64>,
        import_limit_kw: Vec<f64>,
    ) -> Result<Self> {
        check_len("site demand", index.len(), &demand_kwh)?;
        check_len("import limit", index.len(), &import_limit_kw)?;
        Ok(Self {
            index,
            demand_kwh,
            import_limit_kw,
            carbon: None,
            price: None,
            pv: None,
        })
    }

    /// Adds the carbon-intensity series (gCO2/kWh).
    ///
    /// # Errors
    ///
    /// Returns [`SimError::LengthMismatch`] if the series does not match the index.
    pub fn with_carbon(mut self, carbon: Vec<f64>) -> Result<Self> {
        check_len("carbon intensity", self.index.len(), &carbon)?;
        self.carbon = Some(carbon);
        Ok(self)
    }

    /// Adds the electricity price series (per kWh).
    ///
    /// # Errors
    ///
    /// Returns [`SimError::LengthMismatch`] if the series does not match the index.
    pub fn with_price(mut self, price: Vec<f64>) -> Result<Self> {
        check_len("price", self.index.len(), &price)?;
        self.price = Some(price);
        Ok(self)
    }

    /// Adds the PV availability series (kW).
    ///
    /// # Errors
    ///
    /// Returns [`SimError::LengthMismatch`] if the series does not match the index.
    pub fn with_pv(mut self, pv: Vec<f64>) -> Result<Self> {
        check_len("pv availability", self.index.len(), &pv)?;
        self.pv = Some(pv);
        Ok(self)
    }

    pub fn index(&self) -> &Arc<[DateTime<Utc>]> {
        &self.index
    }

    pub fn demand_kwh(&self) -> &[f64] {
        &self.demand_kwh
    }

    pub fn import_limit_kw(&self) -> &[f64] {
        &self.import_limit_kw
    }

    pub fn carbon(&self) -> Option<&[f64]> {
        self.carbon.as_deref()
    }

    pub fn price(&self) -> Option<&[f64]> {
        self.price.as_deref()
    }

    pub fn pv(&self) -> Option<&[f64]> {
        self.pv.as_deref()
    }

    /// The per-step metric a strategy ranks by, lower first.
    ///
    /// `Base` ranks by hour of day, `Pv` by negated availability so the
    /// sunniest steps come first. Returns `None` when the strategy's source
    /// series was not supplied.
    pub fn ranking(&self, strategy: Strategy) -> Option<Vec<f64>> {
        match strategy {
            Strategy::Base => Some(
                self.index
                    .iter()
                    .map(|t| f64::from(t.hour()))
                    .collect(),
            ),
            Strategy::Emission => self.carbon.clone(),
            Strategy::Price => self.price.clone(),
            Strategy::Pv => self.pv.as_ref().map(|pv| pv.iter().map(|v| -v).collect()),
        }
    }

    /// The series a strategy's result is weighed against in reports.
    pub fn weighting(&self, strategy: Strategy) -> Option<&[f64]> {
        match strategy {
            Strategy::Base => None,
            Strategy::Emission => self.carbon(),
            Strategy::Price => self.price(),
            Strategy::Pv => self.pv(),
        }
    }
}

/// A site's chargers together with their aggregated additional demand.
#[derive(Debug, Clone)]
pub struct EvSystem {
    name: String,
    chargers: Vec<Charger>,
    index: Arc<[DateTime<Utc>]>,
    recorder: TimeseriesRecorder<SiteColumn>,
}

impl EvSystem {
    /// Wraps `chargers` into a system with an empty site record.
    pub fn new(
        name: impl Into<String>,
        chargers: Vec<Charger>,
        index: Arc<[DateTime<Utc>]>,
    ) -> Self {
        Self {
            name: name.into(),
            chargers,
            recorder: TimeseriesRecorder::new(Arc::clone(&index)),
            index,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn chargers(&self) -> &[Charger] {
        &self.chargers
    }

    pub fn index(&self) -> &[DateTime<Utc>] {
        &self.index
    }

    /// Total installed charger output (kW).
    pub fn capacity_installed_kw(&self) -> f64 {
        self.chargers.iter().map(|c| c.max_output_kw).sum()
    }

    /// Charges every vehicle uncontrolled over the whole index, each charger
    /// splitting its output equally.
    ///
    /// # Errors
    ///
    /// Propagates recorder errors from the chargers.
    pub fn run_default_simulation(&mut self) -> Result<()> {
        for charger in &mut self.chargers {
            charger.charging_profile(&self.index, None)?;
        }
        self.collect_charger_records()
    }

    /// Sums every charger's drawn energy into the site record.
    ///
    /// # Errors
    ///
    /// Fails if a charger was recorded on a different index.
    pub fn collect_charger_records(&mut self) -> Result<()> {
        let mut total = vec![0.0; self.index.len()];
        for charger in &self.chargers {
            let energy = charger.energy_input_kwh();
            if energy.len() != total.len() {
                return Err(SimError::LengthMismatch {
                    what: "charger record",
                    expected: total.len(),
                    actual: energy.len(),
                });
            }
            for (sum, e) in total.iter_mut().zip(energy) {
                *sum += e;
            }
        }
        self.recorder
            .record_batch(&self.index, SiteColumn::EnergyInput, &total)
    }

    /// Energy the chargers add to site demand at each step (kWh).
    pub fn additional_demand_kwh(&self) -> &[f64] {
        self.recorder.column(SiteColumn::EnergyInput)
    }

    /// On-site generation (kWh); chargers generate nothing.
    pub fn onsite_generation_kwh(&self) -> Vec<f64> {
        vec![0.0; self.index.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::{Battery, ChargerType, ConnectionSchedule, Vehicle};
    use crate::sim::types::{SimConfig, timesteps_between};
    use approx::assert_abs_diff_eq;
    use chrono::TimeZone;

    fn week_index() -> Arc<[DateTime<Utc>]> {
        let start = Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2023, 1, 9, 0, 0, 0).unwrap();
        timesteps_between(start, end).into()
    }

    fn charger(name: &str, index: &Arc<[DateTime<Utc>]>) -> Charger {
        let cfg = SimConfig::new(2023, 0);
        let mut c = Charger::new(name, ChargerType::Level2, 7.0, 1, &cfg, index.clone());
        let battery = Battery::new(60.0, 0.5, 0.65, 0.0, ConnectionSchedule::default());
        c.connect(Vehicle::new("EV", battery, index.clone())).unwrap();
        c
    }

    #[test]
    fn inputs_reject_misaligned_series() {
        let index = week_index();
        let n = index.len();
        assert!(SiteInputs::new(index.clone(), vec![0.0; n - 1], vec![0.0; n]).is_err());
        let inputs = SiteInputs::new(index, vec![0.0; n], vec![0.0; n]).unwrap();
        assert!(inputs.with_carbon(vec![1.0; 3]).is_err());
    }

    #[test]
    fn ranking_per_strategy() {
        let index = week_index();
        let n = index.len();
        let inputs = SiteInputs::new(index, vec![0.0; n], vec![0.0; n])
            .unwrap()
            .with_pv(vec![2.0; n])
            .unwrap();

        let base = inputs.ranking(Strategy::Base).unwrap();
        assert_eq!(base[0], 0.0);
        assert_eq!(base[17], 8.0);
        assert!(inputs.ranking(Strategy::Emission).is_none());
        assert!(inputs.ranking(Strategy::Price).is_none());
        assert_eq!(inputs.ranking(Strategy::Pv).unwrap()[5], -2.0);
        assert!(inputs.weighting(Strategy::Base).is_none());
    }

    #[test]
    fn default_simulation_fills_site_record() {
        let index = week_index();
        let mut system = EvSystem::new(
            "EV_System",
            vec![charger("C1", &index), charger("C2", &index)],
            index,
        );
        assert_eq!(system.capacity_installed_kw(), 14.0);
        assert!(system.additional_demand_kwh().iter().all(|v| *v == 0.0));

        system.run_default_simulation().unwrap();
        let total: f64 = system.additional_demand_kwh().iter().sum();
        // two vehicles, five weekdays, 9 kWh each day
        assert_abs_diff_eq!(total, 90.0, epsilon = 1e-6);
        assert!(system.onsite_generation_kwh().iter().all(|v| *v == 0.0));
    }
}

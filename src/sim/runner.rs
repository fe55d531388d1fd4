//! Runs the daily optimizer for every strategy over an isolated copy of the fleet.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::devices::{Charger, ChargingLoad};
use crate::error::Result;
use crate::sim::optimizer::{DayWindow, optimize_day};
use crate::sim::site::{EvSystem, SiteInputs};
use crate::sim::types::{SimConfig, Strategy, day_ranges};

/// Result of every strategy; `None` marks a strategy that was skipped.
pub type StrategyResults = BTreeMap<Strategy, Option<EvSystem>>;

/// Name of the uncontrolled reference system.
pub const UNCONTROLLED_SITE: &str = "EV_System";

/// A site, its inputs and the charger roster every strategy starts from.
///
/// The roster held here is never mutated; each run works on its own clone so
/// strategies cannot see each other's battery or recorder state.
#[derive(Debug, Clone)]
pub struct OptimizedSites {
    dt_hours: f64,
    inputs: SiteInputs,
    chargers: Vec<Charger>,
}

impl OptimizedSites {
    pub fn new(config: &SimConfig, inputs: SiteInputs, chargers: Vec<Charger>) -> Self {
        Self {
            dt_hours: config.dt_hours(),
            inputs,
            chargers,
        }
    }

    pub fn inputs(&self) -> &SiteInputs {
        &self.inputs
    }

    pub fn chargers(&self) -> &[Charger] {
        &self.chargers
    }

    /// Snapshot of the roster with every record zeroed.
    fn fresh_roster(&self) -> Vec<Charger> {
        let mut chargers = self.chargers.clone();
        chargers.iter_mut().for_each(Charger::clear_records);
        chargers
    }

    /// Charges the fleet without any control: every charger splits its
    /// rated output over its vehicles for the whole year.
    ///
    /// # Errors
    ///
    /// Propagates recorder errors.
    pub fn run_uncontrolled(&self) -> Result<EvSystem> {
        let mut system = EvSystem::new(
            UNCONTROLLED_SITE,
            self.fresh_roster(),
            Arc::clone(self.inputs.index()),
        );
        system.run_default_simulation()?;
        info!(
            site = system.name(),
            additional_kwh = system.additional_demand_kwh().iter().sum::<f64>(),
            "uncontrolled charging completed"
        );
        Ok(system)
    }

    /// Runs one strategy across the whole index.
    ///
    /// Vehicles are optimized one day at a time in charger then vehicle
    /// order. Each vehicle's realized draw is added to the running site
    /// demand before the next vehicle is planned, so later vehicles see the
    /// tighter headroom. Vehicles on the same charger also share its rating.
    ///
    /// Returns `Ok(None)` when the strategy's ranking series is missing.
    ///
    /// # Errors
    ///
    /// Propagates recorder errors.
    pub fn run_strategy(&self, strategy: Strategy) -> Result<Option<EvSystem>> {
        let Some(target) = self.inputs.ranking(strategy) else {
            warn!(
                strategy = %strategy,
                "{} could not be executed as profile was not supplied.",
                strategy.label()
            );
            return Ok(None);
        };

        let index = self.inputs.index();
        let limit = self.inputs.import_limit_kw();
        let mut site_energy = self.inputs.demand_kwh().to_vec();
        info!(
            strategy = %strategy,
            site_demand_kwh = site_energy.iter().sum::<f64>(),
            "running strategy"
        );

        let days = day_ranges(index);
        let mut chargers = self.fresh_roster();
        for charger in &mut chargers {
            let max_output_kw = charger.max_output_kw;
            for vehicle in 0..charger.number_of_vehicles() {
                for day in &days {
                    let window = DayWindow {
                        timesteps: &index[day.clone()],
                        site_energy_kwh: &site_energy[day.clone()],
                        import_limit_kw: &limit[day.clone()],
                        charger_energy_kwh: &charger.energy_input_kwh()[day.clone()],
                        target: &target[day.clone()],
                    };
                    let battery = charger.vehicles()[vehicle].battery();
                    let schedule_kw = optimize_day(
                        &window,
                        battery.schedule(),
                        battery.requested_energy_kwh(),
                        max_output_kw,
                        self.dt_hours,
                    );
                    let drawn_kwh =
                        charger.dispatch_vehicle(vehicle, &index[day.clone()], &schedule_kw)?;
                    for (site, e) in site_energy[day.clone()].iter_mut().zip(&drawn_kwh) {
                        *site += e;
                    }
                }
            }
            debug!(
                strategy = %strategy,
                charger = charger.name(),
                energy_kwh = charger.energy_input_kwh().iter().sum::<f64>(),
                "charger planned"
            );
        }

        let mut system = EvSystem::new(strategy.site_name(), chargers, Arc::clone(index));
        system.collect_charger_records()?;
        info!(
            strategy = %strategy,
            site = system.name(),
            additional_kwh = system.additional_demand_kwh().iter().sum::<f64>(),
            "strategy completed"
        );
        Ok(Some(system))
    }

    /// Runs every strategy in [`Strategy::ALL`] order.
    ///
    /// # Errors
    ///
    /// Stops at the first strategy that fails.
    pub fn run_all(&self) -> Result<StrategyResults> {
        let mut results = BTreeMap::new();
        for strategy in Strategy::ALL {
            results.insert(strategy, self.run_strategy(strategy)?);
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::{Battery, ChargerType, ConnectionSchedule, Vehicle};
    use crate::sim::recorder::{EvColumn, Recorder};
    use crate::sim::types::timesteps_between;
    use approx::assert_abs_diff_eq;
    use chrono::{DateTime, TimeZone, Utc};

    fn week_index() -> Arc<[DateTime<Utc>]> {
        let start = Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2023, 1, 9, 0, 0, 0).unwrap();
        timesteps_between(start, end).into()
    }

    fn sites(vehicles: usize, limit_kw: f64) -> OptimizedSites {
        let cfg = SimConfig::new(2023, 0);
        let index = week_index();
        let n = index.len();
        let mut charger = Charger::new(
            "Charger_1",
            ChargerType::Level2,
            7.0,
            vehicles,
            &cfg,
            index.clone(),
        );
        for i in 0..vehicles {
            let battery = Battery::new(60.0, 0.5, 0.65, 0.0, ConnectionSchedule::default());
            charger
                .connect(Vehicle::new(format!("EV_{}", i + 1), battery, index.clone()))
                .unwrap();
        }
        let inputs = SiteInputs::new(index, vec![1.0; n], vec![limit_kw; n]).unwrap();
        OptimizedSites::new(&cfg, inputs, vec![charger])
    }

    #[test]
    fn missing_series_skips_strategy() {
        let results = sites(1, 100.0).run_all().unwrap();
        assert_eq!(results.len(), 4);
        assert!(results[&Strategy::Base].is_some());
        assert!(results[&Strategy::Emission].is_none());
        assert!(results[&Strategy::Price].is_none());
        assert!(results[&Strategy::Pv].is_none());
    }

    #[test]
    fn base_strategy_delivers_each_weekday() {
        let system = sites(1, 100.0).run_strategy(Strategy::Base).unwrap().unwrap();
        assert_eq!(system.name(), "BASE_OPTIMIZER_SITE");
        let total: f64 = system.additional_demand_kwh().iter().sum();
        assert_abs_diff_eq!(total, 45.0, epsilon = 1e-6);
    }

    #[test]
    fn later_vehicles_see_tighter_headroom() {
        // 1 kWh per step of existing load is 2 kW; a 6 kW limit leaves 4 kW.
        let system = sites(2, 6.0).run_strategy(Strategy::Base).unwrap().unwrap();
        let load_kw: Vec<f64> = system
            .additional_demand_kwh()
            .iter()
            .map(|e| 1.0 / 0.5 + e / 0.5)
            .collect();
        assert!(load_kw.iter().all(|kw| *kw <= 6.0 + 1e-9));

        let first = system.chargers()[0].vehicles()[0].recorder();
        let second = system.chargers()[0].vehicles()[1].recorder();
        // first vehicle takes the earliest Monday slots, second is pushed later
        assert!(first.column(EvColumn::EnergyInput)[16] > 0.0);
        assert_eq!(second.column(EvColumn::EnergyInput)[16], 0.0);
    }

    #[test]
    fn vehicles_on_one_charger_share_its_rating() {
        let system = sites(2, f64::INFINITY)
            .run_strategy(Strategy::Base)
            .unwrap()
            .unwrap();
        let charger = &system.chargers()[0];
        assert!(charger.energy_input_kwh().iter().all(|e| e / 0.5 <= 7.0 + 1e-9));
        // the rating is saturated at 08:00, so both still receive 9 kWh on Monday
        assert_abs_diff_eq!(charger.energy_input_kwh()[16], 3.5, epsilon = 1e-9);
        for v in charger.vehicles() {
            let monday: f64 = v.recorder().column(EvColumn::EnergyInput)[..48].iter().sum();
            assert_abs_diff_eq!(monday, 9.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn runs_do_not_share_state() {
        let sites = sites(1, 100.0);
        let a = sites.run_strategy(Strategy::Base).unwrap().unwrap();
        let b = sites.run_strategy(Strategy::Base).unwrap().unwrap();
        assert_eq!(a.additional_demand_kwh(), b.additional_demand_kwh());
        // the held roster is untouched
        let held = sites.chargers()[0].energy_input_kwh();
        assert!(held.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn uncontrolled_run_uses_full_output() {
        let system = sites(1, 100.0).run_uncontrolled().unwrap();
        assert_eq!(system.name(), UNCONTROLLED_SITE);
        let first_day = &system.additional_demand_kwh()[16..19];
        assert_abs_diff_eq!(first_day.iter().sum::<f64>(), 9.0, epsilon = 1e-9);
    }
}

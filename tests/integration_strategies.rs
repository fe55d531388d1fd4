//! Strategy runner behaviour across a built scenario.

mod common;

use std::sync::Arc;

use chrono::{DateTime, Utc};

use ev_charge_sim::config::ScenarioConfig;
use ev_charge_sim::devices::ChargingLoad;
use ev_charge_sim::io::export::{executed, export_vehicle_csvs, write_csv};
use ev_charge_sim::scenario::Scenario;
use ev_charge_sim::sim::kpi::StrategyReport;
use ev_charge_sim::sim::recorder::{EvColumn, Recorder};
use ev_charge_sim::sim::runner::OptimizedSites;
use ev_charge_sim::sim::types::{SimConfig, Strategy};

use common::{flat_inputs, index_from_monday, reference_charger, sim};

fn four_weeks(config: &ScenarioConfig) -> Scenario {
    let sim = SimConfig::new(config.simulation.year, config.simulation.seed);
    let index: Arc<[DateTime<Utc>]> = sim.timesteps()[..28 * 48].to_vec().into();
    Scenario::build_on(config, sim, index).unwrap()
}

#[test]
fn missing_series_are_skipped_not_fatal() {
    let scenario = four_weeks(&ScenarioConfig::base_only());
    let results = scenario.sites.run_all().unwrap();
    assert_eq!(results.len(), 4);
    assert!(results[&Strategy::Base].is_some());
    assert!(results[&Strategy::Emission].is_none());
    assert!(results[&Strategy::Price].is_none());
    assert!(results[&Strategy::Pv].is_none());
    assert_eq!(executed(&results).len(), 1);
}

#[test]
fn every_strategy_runs_when_all_series_present() {
    let scenario = four_weeks(&ScenarioConfig::baseline());
    let results = scenario.sites.run_all().unwrap();
    for strategy in Strategy::ALL {
        let system = results[&strategy].as_ref().unwrap();
        assert_eq!(system.name(), strategy.site_name());
        assert_eq!(system.chargers().len(), 5);
    }
}

#[test]
fn same_seed_gives_identical_output() {
    let a = four_weeks(&ScenarioConfig::constrained());
    let b = four_weeks(&ScenarioConfig::constrained());
    let ra = a.sites.run_all().unwrap();
    let rb = b.sites.run_all().unwrap();
    for strategy in Strategy::ALL {
        let sa = ra[&strategy].as_ref().unwrap();
        let sb = rb[&strategy].as_ref().unwrap();
        assert_eq!(sa.additional_demand_kwh(), sb.additional_demand_kwh());
        for (ca, cb) in sa.chargers().iter().zip(sb.chargers()) {
            for (va, vb) in ca.vehicles().iter().zip(cb.vehicles()) {
                for c in [EvColumn::Soc, EvColumn::EnergyInput, EvColumn::Plugged] {
                    assert_eq!(va.recorder().column(c), vb.recorder().column(c));
                }
            }
        }
    }
}

#[test]
fn different_seed_changes_fleet() {
    let mut other = ScenarioConfig::baseline();
    other.simulation.seed = 7;
    let a = four_weeks(&ScenarioConfig::baseline());
    let b = four_weeks(&other);
    let capacities = |s: &Scenario| -> Vec<f64> {
        s.sites
            .chargers()
            .iter()
            .map(|c| c.vehicles()[0].battery().capacity_kwh)
            .collect()
    };
    assert_ne!(capacities(&a), capacities(&b));
}

#[test]
fn strategies_do_not_share_vehicle_state() {
    let index = index_from_monday(7);
    let n = index.len();
    // emission prefers the late afternoon, base the early morning
    let carbon: Vec<f64> = (0..n).map(|i| -((i % 48) as f64)).collect();
    let inputs = flat_inputs(&index, 0.0, 50.0).with_carbon(carbon).unwrap();
    let sites = OptimizedSites::new(&sim(), inputs, vec![reference_charger(&index)]);

    let results = sites.run_all().unwrap();
    let base_alone = sites.run_strategy(Strategy::Base).unwrap().unwrap();

    let base = results[&Strategy::Base].as_ref().unwrap();
    let emission = results[&Strategy::Emission].as_ref().unwrap();
    assert_eq!(base.additional_demand_kwh(), base_alone.additional_demand_kwh());
    assert_ne!(base.additional_demand_kwh(), emission.additional_demand_kwh());

    // each strategy still delivers the full weekly requirement
    for system in [base, emission] {
        let total: f64 = system.additional_demand_kwh().iter().sum();
        assert!((total - 45.0).abs() < 1e-6);
    }

    // the roster the runner was built from is untouched
    let held = &sites.chargers()[0].vehicles()[0];
    assert_eq!(held.battery().current_soc(), 0.5);
    assert!(held.recorder().column(EvColumn::Soc).iter().all(|s| *s == 0.0));
}

#[test]
fn uncontrolled_charging_ignores_the_limit() {
    let index = index_from_monday(1);
    // 2 kW of load under a 4 kW limit leaves 2 kW, but uncontrolled takes 7 kW
    let sites = OptimizedSites::new(
        &sim(),
        flat_inputs(&index, 1.0, 4.0),
        vec![reference_charger(&index)],
    );
    let uncontrolled = sites.run_uncontrolled().unwrap();
    let report = StrategyReport::from_system(&uncontrolled, sites.inputs(), None, 0.5);
    assert!(report.limit_violation_count > 0);

    let base = sites.run_strategy(Strategy::Base).unwrap().unwrap();
    let report = StrategyReport::from_system(&base, sites.inputs(), None, 0.5);
    assert_eq!(report.limit_violation_count, 0);
    assert!((report.additional_energy_kwh - 9.0).abs() < 1e-6);
}

#[test]
fn toml_scenario_runs_end_to_end() {
    let toml = r#"
[simulation]
seed = 11

[fleet]
vehicle_count = 4
vehicles_per_charger = 2
weekdays = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat"]

[site]
import_limit_kw = 70.0

[signals]
price = false
"#;
    let config = ScenarioConfig::from_toml_str(toml).unwrap();
    assert!(config.validate().is_empty());
    let scenario = four_weeks(&config);
    assert_eq!(scenario.sites.chargers().len(), 2);

    let results = scenario.sites.run_all().unwrap();
    assert!(results[&Strategy::Price].is_none());
    let systems = executed(&results);
    assert_eq!(
        systems.iter().map(|(l, _)| *l).collect::<Vec<_>>(),
        vec!["Basic", "Emission", "PV"]
    );

    let mut buf = Vec::new();
    write_csv(scenario.sites.inputs(), &systems, &mut buf).unwrap();
    let csv = String::from_utf8(buf).unwrap();
    assert_eq!(csv.lines().count(), 1 + 28 * 48);

    let vehicle_names: Vec<String> = scenario
        .sites
        .chargers()
        .iter()
        .flat_map(|c| c.vehicles())
        .map(|v| v.name().to_string())
        .collect();
    assert_eq!(vehicle_names, vec!["EV_1", "EV_2", "EV_3", "EV_4"]);
}

#[test]
fn vehicle_series_are_written_per_executed_strategy() {
    let mut config = ScenarioConfig::constrained();
    config.signals.pv = false;
    let scenario = four_weeks(&config);
    let results = scenario.sites.run_all().unwrap();
    let systems = executed(&results);
    assert_eq!(systems.len(), 3);

    let dir = std::env::temp_dir().join(format!("ev-charge-sim-{}", std::process::id()));
    let written = export_vehicle_csvs(&systems, &dir).unwrap();
    let names: Vec<String> = written
        .iter()
        .filter_map(|p| p.file_name()?.to_str().map(str::to_string))
        .collect();
    assert_eq!(
        names,
        vec!["Basic_vehicles.csv", "Emission_vehicles.csv", "Price_vehicles.csv"]
    );

    // 6 chargers with one column each, 12 vehicles with three each
    let csv = std::fs::read_to_string(&written[0]).unwrap();
    let header: Vec<&str> = csv.lines().next().unwrap().split(',').collect();
    assert_eq!(header.len(), 1 + 6 + 12 * 3);
    assert_eq!(header[1], "Charger_1_ENERGY_INPUT");
    assert_eq!(header[7..10], ["EV_1_SOC", "EV_1_ENERGY_INPUT", "EV_1_PLUGGED"]);
    assert_eq!(csv.lines().count(), 1 + 28 * 48);

    std::fs::remove_dir_all(&dir).unwrap();
}

//! Scenario configuration: TOML sections, named presets and validation.

use std::fmt;
use std::fs;
use std::path::Path;

use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::Deserialize;

use crate::devices::{ChargerCosts, ChargerType, ConnectionSchedule};

/// Everything needed to synthesize a site and its fleet.
///
/// Missing sections and keys fall back to the baseline values, so an empty
/// TOML document is the baseline scenario.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Simulated year and master seed.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Vehicle fleet parameters.
    #[serde(default)]
    pub fleet: FleetConfig,
    /// Charger parameters shared by every charger.
    #[serde(default)]
    pub charger: ChargerConfig,
    /// Synthetic site demand and import limit.
    #[serde(default)]
    pub site: SiteConfig,
    /// Synthetic ranking signals.
    #[serde(default)]
    pub signals: SignalsConfig,
}

/// Simulated year and master seed.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Calendar year simulated in UTC.
    pub year: i32,
    /// Master random seed.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            year: 2023,
            seed: 42,
        }
    }
}

/// Vehicle fleet parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FleetConfig {
    /// Number of vehicles (must be > 0).
    pub vehicle_count: usize,
    /// Smallest battery capacity drawn (kWh).
    pub battery_kwh_min: f64,
    /// Largest battery capacity drawn (kWh).
    pub battery_kwh_max: f64,
    /// SOC on arrival (0.0-1.0).
    pub initial_soc: f64,
    /// SOC to add on top of `initial_soc` before departure.
    pub charge_amount: f64,
    /// SOC fraction lost every timestep.
    pub loss_rate_per_step: f64,
    /// Arrival time, `"HH:MM"`.
    pub arrival: String,
    /// Departure time, `"HH:MM"`.
    pub departure: String,
    /// Connected weekdays, e.g. `["Mon", "Tue"]`.
    pub weekdays: Vec<String>,
    /// Vehicles sharing one charger (must be > 0).
    pub vehicles_per_charger: usize,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            vehicle_count: 5,
            battery_kwh_min: 60.0,
            battery_kwh_max: 120.0,
            initial_soc: 0.5,
            charge_amount: 0.15,
            loss_rate_per_step: 0.0,
            arrival: "08:00".to_string(),
            departure: "17:00".to_string(),
            weekdays: ["Mon", "Tue", "Wed", "Thu", "Fri"]
                .iter()
                .map(|d| d.to_string())
                .collect(),
            vehicles_per_charger: 1,
        }
    }
}

/// Charger parameters shared by every charger.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChargerConfig {
    /// Rated output (kW).
    pub max_output_kw: f64,
    /// `"level1"`, `"level2"` or `"level3"`.
    pub charger_type: ChargerType,
    /// Capital cost per charger.
    pub capital_cost: f64,
    /// Maintenance cost per year.
    pub maintenance_cost: f64,
    /// Installation size (kW).
    pub size_kw: f64,
    /// Expected lifetime in years.
    pub lifetime_years: u32,
}

impl Default for ChargerConfig {
    fn default() -> Self {
        let costs = ChargerCosts::default();
        Self {
            max_output_kw: 7.0,
            charger_type: ChargerType::Level2,
            capital_cost: costs.capital_cost,
            maintenance_cost: costs.maintenance_cost,
            size_kw: costs.size_kw,
            lifetime_years: costs.lifetime_years,
        }
    }
}

impl ChargerConfig {
    pub fn costs(&self) -> ChargerCosts {
        ChargerCosts {
            capital_cost: self.capital_cost,
            maintenance_cost: self.maintenance_cost,
            size_kw: self.size_kw,
            lifetime_years: self.lifetime_years,
        }
    }
}

/// Synthetic site demand and import limit.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Baseline consumption (kW).
    pub base_kw: f64,
    /// Sinusoidal amplitude (kW).
    pub amp_kw: f64,
    /// Phase offset (radians).
    pub phase_rad: f64,
    /// Gaussian noise standard deviation (kW).
    pub noise_std: f64,
    /// Site import limit (kW), constant over the year.
    pub import_limit_kw: f64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_kw: 40.0,
            amp_kw: 15.0,
            phase_rad: -1.8,
            noise_std: 2.0,
            import_limit_kw: 100.0,
        }
    }
}

/// Synthetic ranking signals. A disabled signal leaves its strategy skipped.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SignalsConfig {
    /// Generate a carbon-intensity series.
    pub carbon: bool,
    /// Generate a price series.
    pub price: bool,
    /// Generate a PV availability series.
    pub pv: bool,
    /// Carbon intensity outside the peak and dip (gCO2/kWh).
    pub carbon_base: f64,
    /// Evening carbon peak above base.
    pub carbon_evening_peak: f64,
    /// Midday carbon dip below base.
    pub carbon_midday_dip: f64,
    /// Carbon noise standard deviation.
    pub carbon_noise_std: f64,
    /// Price outside the peak and dip (per kWh).
    pub price_base: f64,
    /// Evening price peak above base.
    pub price_evening_peak: f64,
    /// Midday price dip below base.
    pub price_midday_dip: f64,
    /// Price noise standard deviation.
    pub price_noise_std: f64,
    /// Peak PV availability (kW).
    pub pv_kw_peak: f64,
    /// Hour PV starts (inclusive).
    pub pv_sunrise_hour: f64,
    /// Hour PV stops (exclusive).
    pub pv_sunset_hour: f64,
    /// Relative seasonal swing of the PV peak.
    pub pv_seasonal_amplitude: f64,
    /// PV noise standard deviation as a fraction of output.
    pub pv_noise_std: f64,
}

impl Default for SignalsConfig {
    fn default() -> Self {
        Self {
            carbon: true,
            price: true,
            pv: true,
            carbon_base: 220.0,
            carbon_evening_peak: 90.0,
            carbon_midday_dip: 80.0,
            carbon_noise_std: 10.0,
            price_base: 0.25,
            price_evening_peak: 0.12,
            price_midday_dip: 0.08,
            price_noise_std: 0.01,
            pv_kw_peak: 50.0,
            pv_sunrise_hour: 6.0,
            pv_sunset_hour: 18.0,
            pv_seasonal_amplitude: 0.3,
            pv_noise_std: 0.1,
        }
    }
}

/// A violated constraint, reported against the offending key.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"fleet.vehicle_count"`).
    pub field: String,
    /// What is wrong with the value.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

fn parse_time(field: &str, value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| ConfigError::new(field, format!("expected \"HH:MM\", got \"{value}\"")))
}

fn parse_weekdays(values: &[String]) -> Result<Vec<Weekday>, ConfigError> {
    if values.is_empty() {
        return Err(ConfigError::new("fleet.weekdays", "must not be empty"));
    }
    values
        .iter()
        .map(|v| {
            v.parse::<Weekday>().map_err(|_| {
                ConfigError::new("fleet.weekdays", format!("unknown weekday \"{v}\""))
            })
        })
        .collect()
}

impl FleetConfig {
    /// SOC every vehicle charges towards.
    pub fn target_soc(&self) -> f64 {
        (self.initial_soc + self.charge_amount).clamp(0.0, 1.0)
    }

    /// Builds the weekly connection pattern shared by the fleet.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if a time or weekday cannot be parsed or the
    /// arrival is after the departure.
    pub fn connection_schedule(&self) -> Result<ConnectionSchedule, ConfigError> {
        let arrival = parse_time("fleet.arrival", &self.arrival)?;
        let departure = parse_time("fleet.departure", &self.departure)?;
        if arrival > departure {
            return Err(ConfigError::new("fleet.arrival", "must not be after fleet.departure"));
        }
        let weekdays = parse_weekdays(&self.weekdays)?;
        Ok(ConnectionSchedule::new(arrival, departure, &weekdays))
    }
}

impl ScenarioConfig {
    /// Returns the baseline scenario: five vehicles, generous import limit,
    /// every ranking signal enabled.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Returns the constrained preset: a larger fleet behind a tight import limit.
    pub fn constrained() -> Self {
        Self {
            fleet: FleetConfig {
                vehicle_count: 12,
                vehicles_per_charger: 2,
                ..FleetConfig::default()
            },
            charger: ChargerConfig {
                max_output_kw: 11.0,
                ..ChargerConfig::default()
            },
            site: SiteConfig {
                import_limit_kw: 65.0,
                ..SiteConfig::default()
            },
            ..Self::default()
        }
    }

    /// Returns the base-only preset: no ranking signals, so only the base
    /// strategy runs.
    pub fn base_only() -> Self {
        Self {
            signals: SignalsConfig {
                carbon: false,
                price: false,
                pv: false,
                ..SignalsConfig::default()
            },
            ..Self::default()
        }
    }

    /// Names accepted by [`ScenarioConfig::from_preset`].
    pub const PRESETS: &[&str] = &["baseline", "constrained", "base_only"];

    /// Looks up a built-in scenario by name.
    ///
    /// # Errors
    ///
    /// Fails for names not listed in [`ScenarioConfig::PRESETS`].
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "constrained" => Ok(Self::constrained()),
            "base_only" => Ok(Self::base_only()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Reads and parses a scenario file.
    ///
    /// # Errors
    ///
    /// Fails when the file is unreadable or its TOML does not parse.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// # Errors
    ///
    /// Fails on malformed TOML, wrong value types or unrecognised keys.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Checks every constraint and collects all violations, not just the
    /// first. An empty result means the scenario can be built.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let s = &self.simulation;
        let next_year = s.year.checked_add(1);
        if NaiveDate::from_ymd_opt(s.year, 1, 1).is_none()
            || next_year.and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1)).is_none()
        {
            errors.push(ConfigError::new("simulation.year", "out of range"));
        }

        let fl = &self.fleet;
        if fl.vehicle_count == 0 {
            errors.push(ConfigError::new("fleet.vehicle_count", "must be > 0"));
        }
        if fl.battery_kwh_min <= 0.0 {
            errors.push(ConfigError::new("fleet.battery_kwh_min", "must be > 0"));
        }
        if fl.battery_kwh_min > fl.battery_kwh_max {
            errors.push(ConfigError::new(
                "fleet.battery_kwh_min",
                "must be <= fleet.battery_kwh_max",
            ));
        }
        if !(0.0..=1.0).contains(&fl.initial_soc) {
            errors.push(ConfigError::new("fleet.initial_soc", "must be in [0.0, 1.0]"));
        }
        if fl.charge_amount < 0.0 {
            errors.push(ConfigError::new("fleet.charge_amount", "must be >= 0"));
        }
        if fl.loss_rate_per_step < 0.0 {
            errors.push(ConfigError::new("fleet.loss_rate_per_step", "must be >= 0"));
        }
        if fl.vehicles_per_charger == 0 {
            errors.push(ConfigError::new("fleet.vehicles_per_charger", "must be > 0"));
        }
        let arrival = parse_time("fleet.arrival", &fl.arrival);
        let departure = parse_time("fleet.departure", &fl.departure);
        match (arrival, departure) {
            (Ok(a), Ok(d)) if a > d => {
                errors.push(ConfigError::new(
                    "fleet.arrival",
                    "must not be after fleet.departure",
                ));
            }
            (a, d) => {
                errors.extend(a.err());
                errors.extend(d.err());
            }
        }
        errors.extend(parse_weekdays(&fl.weekdays).err());

        let ch = &self.charger;
        if ch.max_output_kw <= 0.0 {
            errors.push(ConfigError::new("charger.max_output_kw", "must be > 0"));
        }
        if ch.capital_cost < 0.0 || ch.maintenance_cost < 0.0 {
            errors.push(ConfigError::new("charger.capital_cost", "costs must be >= 0"));
        }

        let site = &self.site;
        if site.import_limit_kw <= 0.0 {
            errors.push(ConfigError::new("site.import_limit_kw", "must be > 0"));
        }
        if site.base_kw < 0.0 {
            errors.push(ConfigError::new("site.base_kw", "must be >= 0"));
        }

        let sig = &self.signals;
        if sig.pv_sunrise_hour >= sig.pv_sunset_hour {
            errors.push(ConfigError::new(
                "signals.pv_sunrise_hour",
                "must be < signals.pv_sunset_hour",
            ));
        }
        let day_hours = 0.0..=24.0;
        if !day_hours.contains(&sig.pv_sunrise_hour) || !day_hours.contains(&sig.pv_sunset_hour) {
            errors.push(ConfigError::new(
                "signals.pv_sunset_hour",
                "PV hours must be in [0, 24]",
            ));
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_preset_lists_the_known_ones() {
        let e = ScenarioConfig::from_preset("weekend").unwrap_err();
        assert_eq!(e.field, "preset");
        assert!(e.message.contains("base_only"));
    }

    #[test]
    fn every_preset_validates() {
        for name in ScenarioConfig::PRESETS {
            let errors = ScenarioConfig::from_preset(name).unwrap().validate();
            assert!(errors.is_empty(), "{name}: {errors:?}");
        }
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[simulation]
year = 2024
seed = 7

[fleet]
vehicle_count = 3
battery_kwh_min = 40.0
battery_kwh_max = 80.0
initial_soc = 0.3
charge_amount = 0.4
arrival = "07:30"
departure = "18:00"
weekdays = ["Mon", "Wed", "Sat"]
vehicles_per_charger = 3

[charger]
max_output_kw = 22.0
charger_type = "level3"

[site]
import_limit_kw = 70.0

[signals]
pv = false
"#;
        let cfg = ScenarioConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.simulation.year), Some(2024));
        assert_eq!(cfg.as_ref().map(|c| c.fleet.vehicle_count), Some(3));
        assert_eq!(
            cfg.as_ref().map(|c| c.charger.charger_type),
            Some(ChargerType::Level3)
        );
        assert_eq!(cfg.as_ref().map(|c| c.signals.pv), Some(false));
        assert_eq!(cfg.as_ref().map(|c| c.signals.carbon), Some(true));
        assert!(cfg.map(|c| c.validate().is_empty()).unwrap_or(false));
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[fleet]
vehicle_count = 2
bogus_field = true
"#;
        assert!(ScenarioConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let cfg = ScenarioConfig::from_toml_str("[simulation]\nseed = 99\n");
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.simulation.seed), Some(99));
        assert_eq!(cfg.as_ref().map(|c| c.simulation.year), Some(2023));
        assert_eq!(cfg.as_ref().map(|c| c.charger.max_output_kw), Some(7.0));
    }

    #[test]
    fn validation_reports_every_problem() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.fleet.vehicle_count = 0;
        cfg.fleet.initial_soc = 1.5;
        cfg.fleet.arrival = "8am".to_string();
        cfg.fleet.weekdays = vec!["Funday".to_string()];
        cfg.charger.max_output_kw = 0.0;
        let fields: Vec<String> = cfg.validate().into_iter().map(|e| e.field).collect();
        for expected in [
            "fleet.vehicle_count",
            "fleet.initial_soc",
            "fleet.arrival",
            "fleet.weekdays",
            "charger.max_output_kw",
        ] {
            assert!(fields.iter().any(|f| f == expected), "missing {expected}");
        }
    }

    #[test]
    fn validation_catches_inverted_window() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.fleet.arrival = "18:00".to_string();
        cfg.fleet.departure = "08:00".to_string();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "fleet.arrival"));
        assert!(cfg.fleet.connection_schedule().is_err());
    }

    #[test]
    fn validation_catches_battery_range() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.fleet.battery_kwh_min = 130.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "fleet.battery_kwh_min"));
    }

    #[test]
    fn schedule_from_defaults() {
        let schedule = ScenarioConfig::baseline().fleet.connection_schedule();
        assert_eq!(schedule.ok(), Some(ConnectionSchedule::default()));
    }

    #[test]
    fn target_soc_is_clamped() {
        let mut fleet = FleetConfig::default();
        assert!((fleet.target_soc() - 0.65).abs() < 1e-12);
        fleet.charge_amount = 0.9;
        assert_eq!(fleet.target_soc(), 1.0);
    }

    #[test]
    fn base_only_disables_signals() {
        let cfg = ScenarioConfig::base_only();
        assert!(!cfg.signals.carbon && !cfg.signals.price && !cfg.signals.pv);
    }

    #[test]
    fn constrained_has_tighter_limit() {
        let base = ScenarioConfig::baseline();
        let tight = ScenarioConfig::constrained();
        assert!(tight.site.import_limit_kw < base.site.import_limit_kw);
        assert!(tight.fleet.vehicle_count > base.fleet.vehicle_count);
    }
}

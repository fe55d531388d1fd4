//! Wires a validated configuration into site inputs, a fleet and a runner.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::{SeedableRng, rngs::StdRng};
use tracing::info;

use crate::config::ScenarioConfig;
use crate::error::Result;
use crate::fleet::build_fleet;
use crate::profiles::{GridSignal, SiteLoad, SolarAvailability};
use crate::sim::runner::OptimizedSites;
use crate::sim::site::SiteInputs;
use crate::sim::types::SimConfig;

/// Seed offsets so each generated series has its own stream.
const FLEET_STREAM: u64 = 0;
const DEMAND_STREAM: u64 = 1;
const CARBON_STREAM: u64 = 2;
const PRICE_STREAM: u64 = 3;
const PV_STREAM: u64 = 4;

fn stream(seed: u64, offset: u64) -> StdRng {
    StdRng::seed_from_u64(seed.wrapping_add(offset))
}

/// Synthesizes the site series described by `config` over `index`.
///
/// Disabled signals are left out, which makes their strategies skip.
///
/// # Errors
///
/// Propagates length errors from [`SiteInputs`].
pub fn build_site_inputs(
    config: &ScenarioConfig,
    sim: &SimConfig,
    index: Arc<[DateTime<Utc>]>,
) -> Result<SiteInputs> {
    let site = &config.site;
    let load = SiteLoad::new(site.base_kw, site.amp_kw, site.phase_rad, site.noise_std);
    let demand_kwh =
        load.energy_series(&index, sim.dt_hours(), &mut stream(sim.seed, DEMAND_STREAM));
    let limit_kw = vec![site.import_limit_kw; index.len()];
    let mut inputs = SiteInputs::new(Arc::clone(&index), demand_kwh, limit_kw)?;

    let sig = &config.signals;
    if sig.carbon {
        let carbon = GridSignal::new(
            sig.carbon_base,
            sig.carbon_evening_peak,
            sig.carbon_midday_dip,
            sig.carbon_noise_std,
        );
        inputs = inputs.with_carbon(carbon.series(&index, &mut stream(sim.seed, CARBON_STREAM)))?;
    }
    if sig.price {
        let price = GridSignal::new(
            sig.price_base,
            sig.price_evening_peak,
            sig.price_midday_dip,
            sig.price_noise_std,
        );
        inputs = inputs.with_price(price.series(&index, &mut stream(sim.seed, PRICE_STREAM)))?;
    }
    if sig.pv {
        let pv = SolarAvailability::new(
            sig.pv_kw_peak,
            sig.pv_sunrise_hour,
            sig.pv_sunset_hour,
            sig.pv_seasonal_amplitude,
            sig.pv_noise_std,
        );
        inputs = inputs.with_pv(pv.series(&index, &mut stream(sim.seed, PV_STREAM)))?;
    }
    Ok(inputs)
}

/// A ready-to-run scenario.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub sim: SimConfig,
    pub sites: OptimizedSites,
}

impl Scenario {
    /// Builds the full-year index, site inputs and fleet for `config`.
    ///
    /// The configuration is expected to have passed
    /// [`ScenarioConfig::validate`].
    ///
    /// # Errors
    ///
    /// Fails if the fleet schedule cannot be parsed.
    pub fn build(config: &ScenarioConfig) -> Result<Self> {
        let sim = SimConfig::new(config.simulation.year, config.simulation.seed);
        let index: Arc<[DateTime<Utc>]> = sim.timesteps().into();
        Self::build_on(config, sim, index)
    }

    /// Like [`Scenario::build`] but over a caller-chosen index.
    ///
    /// # Errors
    ///
    /// Fails if the fleet schedule cannot be parsed.
    pub fn build_on(
        config: &ScenarioConfig,
        sim: SimConfig,
        index: Arc<[DateTime<Utc>]>,
    ) -> Result<Self> {
        let inputs = build_site_inputs(config, &sim, Arc::clone(&index))?;
        let chargers = build_fleet(config, &sim, index, &mut stream(sim.seed, FLEET_STREAM))?;
        info!(
            year = sim.year,
            seed = sim.seed,
            steps = inputs.index().len(),
            chargers = chargers.len(),
            "scenario built"
        );
        let sites = OptimizedSites::new(&sim, inputs, chargers);
        Ok(Self { sim, sites })
    }
}

//! Daily constrained charging optimizer.
//!
//! For one vehicle on one calendar day, spreads the vehicle's outstanding
//! energy requirement over the day's most favourable timesteps without
//! pushing site import above its limit.

use chrono::{DateTime, Utc};

use crate::devices::schedule::ConnectionSchedule;

/// One calendar day of site data, all slices aligned with `timesteps`.
#[derive(Debug, Clone, Copy)]
pub struct DayWindow<'a> {
    /// Chronological timesteps of the day.
    pub timesteps: &'a [DateTime<Utc>],
    /// Site energy already drawn per step (kWh), including earlier vehicles.
    pub site_energy_kwh: &'a [f64],
    /// Site import limit per step (kW).
    pub import_limit_kw: &'a [f64],
    /// Energy already drawn through the vehicle's charger per step (kWh).
    pub charger_energy_kwh: &'a [f64],
    /// Ranking metric per step; lower is allocated first.
    pub target: &'a [f64],
}

/// Power the charger could deliver at each step without breaching the limit.
///
/// `min(charger_spare_kw, limit - site_load)` floored at zero.
pub fn headroom_profile(
    site_load_kw: &[f64],
    import_limit_kw: &[f64],
    charger_spare_kw: &[f64],
) -> Vec<f64> {
    site_load_kw
        .iter()
        .zip(import_limit_kw)
        .zip(charger_spare_kw)
        .map(|((load, limit), spare)| spare.min(limit - load).max(0.0))
        .collect()
}

/// Rating left on a charger once its earlier vehicles' draws are served.
pub fn charger_spare_kw(
    charger_energy_kwh: &[f64],
    charger_max_kw: f64,
    dt_hours: f64,
) -> Vec<f64> {
    charger_energy_kwh
        .iter()
        .map(|e| (charger_max_kw - e / dt_hours).max(0.0))
        .collect()
}

/// Zeroes headroom at steps where the vehicle is not plugged in.
pub fn mask_unplugged(headroom_kw: &mut [f64], plugged: &[bool]) {
    for (h, p) in headroom_kw.iter_mut().zip(plugged) {
        if !*p {
            *h = 0.0;
        }
    }
}

/// Step positions ordered by ascending `target`, ties kept chronological.
pub fn rank_slots(target: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..target.len()).collect();
    // `sort_by` is stable, so equal targets keep their original order.
    order.sort_by(|&a, &b| target[a].total_cmp(&target[b]));
    order
}

/// Greedily fills the best-ranked slots until `requested_kwh` is met.
///
/// Each slot in `order` receives its full headroom while the running total
/// stays within `requested_kwh`; the slot that would overshoot receives
/// exactly the remaining deficit and every later slot receives zero. The
/// result is indexed chronologically, like `headroom_kw`.
pub fn allocate(
    headroom_kw: &[f64],
    order: &[usize],
    requested_kwh: f64,
    dt_hours: f64,
) -> Vec<f64> {
    let mut profile_kw = vec![0.0; headroom_kw.len()];
    if requested_kwh <= 0.0 {
        return profile_kw;
    }

    let mut allocated_kwh = 0.0;
    for &slot in order {
        let slot_kwh = headroom_kw[slot] * dt_hours;
        if allocated_kwh + slot_kwh > requested_kwh {
            profile_kw[slot] = (requested_kwh - allocated_kwh) / dt_hours;
            break;
        }
        profile_kw[slot] = headroom_kw[slot];
        allocated_kwh += slot_kwh;
    }
    profile_kw
}

/// Computes a feasible charging power profile (kW) for one vehicle-day.
///
/// `requested_kwh` is the vehicle's outstanding requirement at the start of
/// the day; anything not delivered is simply requested again next day from
/// the battery's own state.
///
/// `charger_max_kw` is the charger's rating. Vehicles sharing the charger
/// are planned in turn, so the rating is reduced by whatever
/// `day.charger_energy_kwh` already holds.
pub fn optimize_day(
    day: &DayWindow<'_>,
    schedule: &ConnectionSchedule,
    requested_kwh: f64,
    charger_max_kw: f64,
    dt_hours: f64,
) -> Vec<f64> {
    let site_load_kw: Vec<f64> = day.site_energy_kwh.iter().map(|e| e / dt_hours).collect();
    let spare_kw = charger_spare_kw(day.charger_energy_kwh, charger_max_kw, dt_hours);
    let mut headroom_kw = headroom_profile(&site_load_kw, day.import_limit_kw, &spare_kw);
    mask_unplugged(&mut headroom_kw, &schedule.plugged_profile(day.timesteps));
    let order = rank_slots(day.target);
    allocate(&headroom_kw, &order, requested_kwh, dt_hours)
}

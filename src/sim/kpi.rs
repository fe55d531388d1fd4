//! Post-hoc KPI computation from a finished result system.

use std::fmt;

use super::site::{EvSystem, SiteInputs};

/// Absolute tolerance when checking site import against its limit (kW).
const LIMIT_TOLERANCE_KW: f64 = 1e-6;

/// Aggregate indicators of one result system.
///
/// Computed after the run from the recorded additional demand so the report
/// always agrees with the exported series.
#[derive(Debug, Clone)]
pub struct StrategyReport {
    /// Result system name.
    pub site: String,
    /// Installed charger output (kW).
    pub capacity_installed_kw: f64,
    /// Energy added to site demand by charging (kWh).
    pub additional_energy_kwh: f64,
    /// Highest charging power at any step (kW).
    pub peak_charging_kw: f64,
    /// Highest total site import including charging (kW).
    pub peak_import_kw: f64,
    /// Steps where total import exceeded the limit.
    pub limit_violation_count: usize,
    /// Charging energy weighted by the strategy's ranking series, if any.
    pub weighted_total: Option<f64>,
}

impl StrategyReport {
    /// Computes the report from raw series.
    ///
    /// # Arguments
    ///
    /// * `site` - Name printed in the report header
    /// * `additional_kwh` - Charging energy per step
    /// * `demand_kwh` - Existing site demand per step
    /// * `import_limit_kw` - Site import limit per step
    /// * `weighting` - Optional per-step weight (carbon intensity, price, ...)
    /// * `dt_hours` - Timestep duration in hours
    pub fn from_series(
        site: impl Into<String>,
        additional_kwh: &[f64],
        demand_kwh: &[f64],
        import_limit_kw: &[f64],
        weighting: Option<&[f64]>,
        dt_hours: f64,
    ) -> Self {
        let mut energy = 0.0;
        let mut peak_charging = 0.0_f64;
        let mut peak_import = 0.0_f64;
        let mut violations = 0_usize;

        for ((add, base), limit) in additional_kwh.iter().zip(demand_kwh).zip(import_limit_kw) {
            energy += add;
            peak_charging = peak_charging.max(add / dt_hours);
            let import_kw = (base + add) / dt_hours;
            peak_import = peak_import.max(import_kw);
            if import_kw > limit + LIMIT_TOLERANCE_KW {
                violations += 1;
            }
        }

        let weighted_total =
            weighting.map(|w| additional_kwh.iter().zip(w).map(|(e, w)| e * w).sum());

        Self {
            site: site.into(),
            capacity_installed_kw: 0.0,
            additional_energy_kwh: energy,
            peak_charging_kw: peak_charging,
            peak_import_kw: peak_import,
            limit_violation_count: violations,
            weighted_total,
        }
    }

    /// Computes the report for `system` against the site it ran on.
    pub fn from_system(
        system: &EvSystem,
        inputs: &SiteInputs,
        weighting: Option<&[f64]>,
        dt_hours: f64,
    ) -> Self {
        let mut report = Self::from_series(
            system.name(),
            system.additional_demand_kwh(),
            inputs.demand_kwh(),
            inputs.import_limit_kw(),
            weighting,
            dt_hours,
        );
        report.capacity_installed_kw = system.capacity_installed_kw();
        report
    }
}

impl fmt::Display for StrategyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- {} ---", self.site)?;
        writeln!(f, "Installed capacity:    {:.1} kW", self.capacity_installed_kw)?;
        writeln!(f, "Charging energy:       {:.2} kWh", self.additional_energy_kwh)?;
        writeln!(f, "Peak charging power:   {:.2} kW", self.peak_charging_kw)?;
        writeln!(f, "Peak site import:      {:.2} kW", self.peak_import_kw)?;
        if let Some(w) = self.weighted_total {
            writeln!(f, "Weighted total:        {w:.2}")?;
        }
        write!(f, "Limit violations:      {}", self.limit_violation_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn energy_and_peaks() {
        let r = StrategyReport::from_series(
            "S",
            &[0.0, 3.5, 1.0],
            &[1.0, 1.0, 1.0],
            &[20.0, 20.0, 20.0],
            None,
            0.5,
        );
        assert_abs_diff_eq!(r.additional_energy_kwh, 4.5);
        assert_abs_diff_eq!(r.peak_charging_kw, 7.0);
        assert_abs_diff_eq!(r.peak_import_kw, 9.0);
        assert_eq!(r.limit_violation_count, 0);
        assert!(r.weighted_total.is_none());
    }

    #[test]
    fn violations_are_counted() {
        let r = StrategyReport::from_series(
            "S",
            &[1.0, 0.0, 2.0],
            &[2.0, 2.0, 2.0],
            &[5.0, 5.0, 5.0],
            None,
            0.5,
        );
        // 6 kW, 4 kW, 8 kW against 5 kW
        assert_eq!(r.limit_violation_count, 2);
    }

    #[test]
    fn weighted_total_uses_series() {
        let r = StrategyReport::from_series(
            "S",
            &[1.0, 2.0],
            &[0.0, 0.0],
            &[10.0, 10.0],
            Some(&[100.0, 50.0]),
            0.5,
        );
        assert_eq!(r.weighted_total, Some(200.0));
    }

    #[test]
    fn empty_series() {
        let r = StrategyReport::from_series("S", &[], &[], &[], None, 0.5);
        assert_eq!(r.additional_energy_kwh, 0.0);
        assert_eq!(r.peak_import_kw, 0.0);
        assert_eq!(r.limit_violation_count, 0);
    }

    #[test]
    fn display_lists_weighted_total_only_when_present() {
        let r = StrategyReport::from_series("BASE", &[1.0], &[0.0], &[10.0], None, 0.5);
        let text = r.to_string();
        assert!(text.starts_with("--- BASE ---"));
        assert!(!text.contains("Weighted"));
    }
}

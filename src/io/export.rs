//! CSV export for strategy results.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::devices::ChargingLoad;
use crate::sim::recorder::{ChargerColumn, Column, EvColumn, Recorder};
use crate::sim::runner::StrategyResults;
use crate::sim::site::{EvSystem, SiteInputs};

/// Leading columns of the site export.
const SITE_HEADER: [&str; 3] = ["timestamp", "site_demand_kwh", "import_limit_kw"];

/// Pairs each executed strategy's label with its system, skipping the rest.
pub fn executed(results: &StrategyResults) -> Vec<(&'static str, &EvSystem)> {
    results
        .iter()
        .filter_map(|(strategy, system)| system.as_ref().map(|s| (strategy.label(), s)))
        .collect()
}

/// Exports site-level results to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(
    inputs: &SiteInputs,
    systems: &[(&str, &EvSystem)],
    path: &Path,
) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(inputs, systems, buf)
}

/// Writes one row per timestep: the site demand, the import limit and, per
/// system, `<label>_additional_kwh` and `<label>_onsite_generation_kwh`.
///
/// Timestamps are RFC 3339 in UTC. Output is deterministic for identical
/// inputs.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(
    inputs: &SiteInputs,
    systems: &[(&str, &EvSystem)],
    writer: impl Write,
) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    let mut header: Vec<String> = SITE_HEADER.iter().map(|h| h.to_string()).collect();
    for (label, _) in systems {
        header.push(format!("{label}_additional_kwh"));
        header.push(format!("{label}_onsite_generation_kwh"));
    }
    wtr.write_record(&header)?;

    let generation: Vec<Vec<f64>> = systems
        .iter()
        .map(|(_, system)| system.onsite_generation_kwh())
        .collect();

    let demand = inputs.demand_kwh();
    let limit = inputs.import_limit_kw();
    for (i, t) in inputs.index().iter().enumerate() {
        let mut row = Vec::with_capacity(header.len());
        row.push(t.to_rfc3339());
        row.push(format!("{:.4}", demand[i]));
        row.push(format!("{:.4}", limit[i]));
        for ((_, system), generated) in systems.iter().zip(&generation) {
            let added = system.additional_demand_kwh().get(i).copied().unwrap_or(0.0);
            let generated = generated.get(i).copied().unwrap_or(0.0);
            row.push(format!("{added:.4}"));
            row.push(format!("{generated:.4}"));
        }
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Writes the recorded series of every charger and vehicle in `system`:
/// one `<charger>_ENERGY_INPUT` column per charger, then one
/// `<vehicle>_<COLUMN>` column per vehicle and column.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_vehicle_csv(system: &EvSystem, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    let vehicles: Vec<_> = system
        .chargers()
        .iter()
        .flat_map(|c| c.vehicles())
        .collect();

    let mut header = vec!["timestamp".to_string()];
    for c in system.chargers() {
        header.extend(
            ChargerColumn::ALL
                .iter()
                .map(|col| format!("{}_{}", c.name(), col.name())),
        );
    }
    for v in &vehicles {
        header.extend(EvColumn::ALL.iter().map(|c| format!("{}_{}", v.name(), c.name())));
    }
    wtr.write_record(&header)?;

    for (i, t) in system.index().iter().enumerate() {
        let mut row = Vec::with_capacity(header.len());
        row.push(t.to_rfc3339());
        for c in system.chargers() {
            for col in ChargerColumn::ALL {
                row.push(format!("{:.4}", c.recorder().column(*col)[i]));
            }
        }
        for v in &vehicles {
            for c in EvColumn::ALL {
                let value = v.recorder().column(*c)[i];
                row.push(match c {
                    EvColumn::Plugged => format!("{value:.0}"),
                    _ => format!("{value:.4}"),
                });
            }
        }
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Writes one `<label>_vehicles.csv` per system into `dir`, creating it if
/// needed, and returns the written paths.
///
/// # Errors
///
/// Returns an `io::Error` if the directory or a file cannot be written.
pub fn export_vehicle_csvs(
    systems: &[(&str, &EvSystem)],
    dir: &Path,
) -> io::Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(systems.len());
    for (label, system) in systems {
        let path = dir.join(format!("{label}_vehicles.csv"));
        write_vehicle_csv(system, io::BufWriter::new(File::create(&path)?))?;
        written.push(path);
    }
    Ok(written)
}

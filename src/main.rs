//! EV charging simulator entry point: CLI wiring and config-driven run.

use std::path::PathBuf;
use std::process;

use tracing::info;
use tracing_subscriber::EnvFilter;

use ev_charge_sim::config::ScenarioConfig;
use ev_charge_sim::io::export::{executed, export_csv, export_vehicle_csvs};
use ev_charge_sim::scenario::Scenario;
use ev_charge_sim::sim::kpi::StrategyReport;

#[derive(Debug, Default, PartialEq)]
struct RunArgs {
    scenario: Option<PathBuf>,
    preset: Option<String>,
    seed: Option<u64>,
    results_out: Option<PathBuf>,
    vehicles_out: Option<PathBuf>,
}

#[derive(Debug, PartialEq)]
enum Command {
    Help,
    Run(RunArgs),
}

fn print_help() {
    eprintln!("ev-charge-sim: site-constrained EV charging strategy simulator");
    eprintln!();
    eprintln!("Usage: ev-charge-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>        Read the scenario from a TOML file");
    eprintln!(
        "  --preset <name>          Start from a built-in scenario ({})",
        ScenarioConfig::PRESETS.join(", ")
    );
    eprintln!("  --seed <u64>             Replace the scenario seed");
    eprintln!("  --results-out <path>     Write per-strategy site series as CSV");
    eprintln!("  --vehicles-out <dir>     Write charger and vehicle series, one CSV per strategy");
    eprintln!("  --help                   Print this text");
    eprintln!();
    eprintln!("Without --scenario or --preset the baseline scenario runs.");
    eprintln!("Log verbosity follows RUST_LOG (default: info).");
}

/// Parses everything after the program name.
fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Command, String> {
    let mut run = RunArgs::default();
    while let Some(flag) = args.next() {
        let mut value =
            |what: &str| args.next().ok_or_else(|| format!("{flag} requires a {what} argument"));
        match flag.as_str() {
            "--help" | "-h" => return Ok(Command::Help),
            "--scenario" => run.scenario = Some(value("path")?.into()),
            "--preset" => run.preset = Some(value("name")?),
            "--seed" => {
                let raw = value("u64")?;
                let seed = raw
                    .parse()
                    .map_err(|_| format!("--seed value \"{raw}\" is not a valid u64"))?;
                run.seed = Some(seed);
            }
            "--results-out" => run.results_out = Some(value("path")?.into()),
            "--vehicles-out" => run.vehicles_out = Some(value("directory")?.into()),
            other => return Err(format!("unknown argument \"{other}\"")),
        }
    }
    Ok(Command::Run(run))
}

/// `--scenario` wins over `--preset`; neither means baseline.
fn load_config(args: &RunArgs) -> Result<ScenarioConfig, String> {
    let mut config = match (&args.scenario, &args.preset) {
        (Some(path), _) => ScenarioConfig::from_toml_file(path).map_err(|e| e.to_string())?,
        (None, Some(name)) => ScenarioConfig::from_preset(name).map_err(|e| e.to_string())?,
        (None, None) => ScenarioConfig::baseline(),
    };
    if let Some(seed) = args.seed {
        config.simulation.seed = seed;
    }

    let errors = config.validate();
    if errors.is_empty() {
        Ok(config)
    } else {
        let lines: Vec<String> = errors.iter().map(ToString::to_string).collect();
        Err(lines.join("\n"))
    }
}

fn run(args: &RunArgs) -> Result<(), String> {
    let config = load_config(args)?;
    let scenario = Scenario::build(&config).map_err(|e| format!("error: {e}"))?;
    let sites = &scenario.sites;
    let dt_hours = scenario.sim.dt_hours();

    let uncontrolled = sites
        .run_uncontrolled()
        .map_err(|e| format!("error: uncontrolled run failed: {e}"))?;
    let results = sites
        .run_all()
        .map_err(|e| format!("error: strategy run failed: {e}"))?;

    println!(
        "{}",
        StrategyReport::from_system(&uncontrolled, sites.inputs(), None, dt_hours)
    );
    for (strategy, system) in &results {
        match system {
            Some(system) => {
                let weighting = sites.inputs().weighting(*strategy);
                println!(
                    "\n{}",
                    StrategyReport::from_system(system, sites.inputs(), weighting, dt_hours)
                );
            }
            None => println!("\n--- {} ---\nnot executed", strategy.site_name()),
        }
    }

    let mut systems = vec![("Uncontrolled", &uncontrolled)];
    systems.extend(executed(&results));
    if let Some(path) = &args.results_out {
        export_csv(sites.inputs(), &systems, path)
            .map_err(|e| format!("error: failed to write CSV: {e}"))?;
        info!(path = %path.display(), "results written");
    }
    if let Some(dir) = &args.vehicles_out {
        let written = export_vehicle_csvs(&systems, dir)
            .map_err(|e| format!("error: failed to write vehicle CSVs: {e}"))?;
        info!(dir = %dir.display(), files = written.len(), "vehicle series written");
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(Command::Help) => {
            print_help();
            return;
        }
        Ok(Command::Run(args)) => args,
        Err(e) => {
            eprintln!("error: {e}");
            print_help();
            process::exit(1);
        }
    };

    if let Err(e) = run(&args) {
        eprintln!("{e}");
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Command, String> {
        parse_args(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn no_arguments_runs_baseline() {
        assert_eq!(parse(&[]), Ok(Command::Run(RunArgs::default())));
        let config = load_config(&RunArgs::default()).unwrap();
        let baseline = ScenarioConfig::baseline();
        assert_eq!(config.fleet.vehicle_count, baseline.fleet.vehicle_count);
        assert_eq!(config.simulation.seed, baseline.simulation.seed);
    }

    #[test]
    fn flags_are_collected() {
        let args = ["--preset", "constrained", "--seed", "9", "--vehicles-out", "out"];
        let Ok(Command::Run(run)) = parse(&args) else {
            panic!("expected a run command");
        };
        assert_eq!(run.preset.as_deref(), Some("constrained"));
        assert_eq!(run.vehicles_out, Some(PathBuf::from("out")));
        assert_eq!(run.seed, Some(9));
        assert_eq!(load_config(&run).unwrap().simulation.seed, 9);
    }

    #[test]
    fn help_short_circuits() {
        assert_eq!(parse(&["--seed", "1", "-h", "--bogus"]), Ok(Command::Help));
    }

    #[test]
    fn bad_input_is_reported() {
        assert!(parse(&["--seed"]).unwrap_err().contains("requires a u64"));
        assert!(parse(&["--seed", "x"]).unwrap_err().contains("not a valid u64"));
        assert!(parse(&["--frobnicate"]).unwrap_err().contains("unknown argument"));
        let unknown = RunArgs {
            preset: Some("nope".into()),
            ..RunArgs::default()
        };
        assert!(load_config(&unknown).is_err());
    }
}

//! The `corridor` binary: run a canal scenario and write the report.
//!
//! Hand-rolled argument loop (no clap dependency) — the surface is three
//! flags, no subcommands.
//!
//! ```text
//! corridor            run the validation scenario
//! corridor -v         run the validation scenario
//! corridor -e <1|2>   run experiment 1 or 2
//! corridor -h         print usage and exit
//! ```
//!
//! The report is written to `simulation.out` in the working directory.
//! Unrecognized option values are silently ignored; configuration errors
//! abort with exit code 2 before any simulation time advances.

use std::env;
use std::fs;
use std::process::ExitCode;

use corridor_core::error::ConfigError;
use corridor_scenarios::Scenario;
use tracing::info;

const REPORT_PATH: &str = "simulation.out";

fn print_usage(exe: &str) {
    eprintln!("usage: {exe} [-h] [-v] [-e <1|2>]");
    eprintln!();
    eprintln!("  -h        print this usage and exit");
    eprintln!("  -v        run the validation scenario (default)");
    eprintln!("  -e <id>   run experiment 1 (admission control) or 2 (accidents)");
    eprintln!();
    eprintln!("the report is written to {REPORT_PATH}");
}

fn parse_args() -> Result<Scenario, ConfigError> {
    let mut args = env::args();
    let exe = args.next().unwrap_or_else(|| "corridor".into());
    let mut scenario = Scenario::Validation;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_usage(&exe);
                std::process::exit(0);
            }
            "-v" => scenario = Scenario::Validation,
            "-e" => match args.next() {
                Some(id) => scenario = Scenario::from_experiment_id(&id)?,
                None => return Err(ConfigError::UnknownExperiment(String::new())),
            },
            // Unknown options are ignored rather than rejected.
            _ => {}
        }
    }
    Ok(scenario)
}

fn run() -> Result<(), ConfigError> {
    let scenario = parse_args()?;
    info!(scenario = scenario.name(), "starting canal simulation");

    let report = corridor_scenarios::run(scenario)?;
    let text = report.to_string();
    if let Err(err) = fs::write(REPORT_PATH, &text) {
        eprintln!("error: cannot write {REPORT_PATH}: {err}");
        std::process::exit(2);
    }

    print!("{text}");
    info!(
        completed = report.counters.completed,
        rejected = report.counters.rejected,
        interrupted = report.counters.interrupted,
        "run finished"
    );
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(2)
        }
    }
}

//! This example runs the basic preset against a simulator script given as
//! the first argument.

extern crate lorarun_core as lorarun;
extern crate simplelog;

use std::env;
use std::path::PathBuf;

use lorarun::{ExperimentConfig, ProcessLauncher, RunSettings, TrialRunner, Variant};
use simplelog::{Config, LevelFilter, TermLogger, TerminalMode};

fn main() {
    let args: Vec<String> = env::args().collect();
    let be_verbose = args.contains(&"--verbose".to_string());

    // setup the logger
    let level = if be_verbose {
        LevelFilter::max()
    } else {
        LevelFilter::Info
    };
    TermLogger::init(level, Config::default(), TerminalMode::Mixed).unwrap();

    // handle path to the simulator script
    let script = match args.iter().skip(1).find(|a| !a.starts_with("--")) {
        Some(p) => PathBuf::from(p),
        None => {
            println!("Please provide a path to the simulator script");
            return;
        }
    };

    let settings = RunSettings {
        trials: 3,
        script,
        ..RunSettings::preset(Variant::Basic)
    };
    let mut runner = TrialRunner::new(
        ExperimentConfig::preset(Variant::Basic),
        settings,
        ProcessLauncher::default(),
    );
    match runner.run_all() {
        Ok(report) => println!(
            "{} succeeded, {} failed",
            report.succeeded(),
            report.failed()
        ),
        Err(e) => println!("run failed: {}", e),
    }
}

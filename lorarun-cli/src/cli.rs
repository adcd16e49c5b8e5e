//! Application definition.

extern crate simplelog;

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Error, Result};
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use colored::*;
use lorarun::{
    ExperimentConfig, ExperimentFile, FailurePolicy, ProcessLauncher, RadioProfile, RunOutcome,
    RunSettings, Topology, TrialRunner, Variant,
};

use crate::init;

pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");

/// Accepted values for `--verbosity`, numeric levels and their names.
const VERBOSITY_VALUES: &[&str] = &[
    "0", "none", "1", "err", "error", "min", "2", "warn", "warning", "default", "3", "info", "4",
    "debug", "5", "trace", "max", "all",
];

pub fn app<'a, 'b>() -> App<'a, 'b> {
    let app = App::new("lorarun")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .version(VERSION)
        .about("Run repeated trials of a LoRa collision simulator from the command line.")
        .arg(Arg::with_name("verbosity")
            .long("verbosity")
            .short("v")
            .takes_value(true)
            .default_value("info")
            .value_name("verb")
            .possible_values(VERBOSITY_VALUES)
            .hide_possible_values(true)
            .global(true)
            .help("Set the verbosity of the log output"))

        // run subcommand
        .subcommand(SubCommand::with_name("run")
            .display_order(10)
            .about("Run the simulator a number of times with a fixed configuration")
            .long_about("Run the simulator a number of times with a fixed configuration.\n\n\
            Values are taken from the selected variant preset, then from the \n\
            experiment file (if any), then from the flags given here.")
            .arg(Arg::with_name("variant")
                .display_order(0)
                .long("variant")
                .takes_value(true)
                .value_name("variant")
                .possible_values(&["basic", "extended"])
                .help("Simulator signature and preset to start from (defaults to the \
                experiment file's variant, or basic)"))
            .arg(Arg::with_name("config")
                .display_order(1)
                .long("config")
                .short("c")
                .takes_value(true)
                .value_name("path")
                .help("Path to experiment file (toml or yaml)"))
            .arg(Arg::with_name("trials")
                .display_order(2)
                .long("trials")
                .short("n")
                .takes_value(true)
                .value_name("count")
                .help("Number of trials to run"))
            .arg(Arg::with_name("nodes")
                .display_order(10)
                .long("nodes")
                .takes_value(true)
                .value_name("count")
                .help("Number of nodes to simulate"))
            .arg(Arg::with_name("avg-send")
                .display_order(11)
                .long("avg-send")
                .takes_value(true)
                .value_name("millis")
                .help("Average sending interval in milliseconds"))
            .arg(Arg::with_name("experiment")
                .display_order(12)
                .long("experiment")
                .short("e")
                .takes_value(true)
                .value_name("profile")
                .help("Radio experiment profile (see `lorarun profiles`)"))
            .arg(Arg::with_name("sim-time")
                .display_order(13)
                .long("sim-time")
                .takes_value(true)
                .value_name("millis")
                .help("Total simulated time in milliseconds"))
            .arg(Arg::with_name("base-stations")
                .display_order(20)
                .long("base-stations")
                .takes_value(true)
                .value_name("count")
                .help("Number of base stations (extended variant)"))
            .arg(Arg::with_name("collision")
                .display_order(21)
                .long("collision")
                .takes_value(true)
                .value_name("flag")
                .possible_values(&["0", "1"])
                .help("Use the full collision check (extended variant)"))
            .arg(Arg::with_name("directional")
                .display_order(22)
                .long("directional")
                .takes_value(true)
                .value_name("flag")
                .possible_values(&["0", "1"])
                .help("Use directional antennas (extended variant)"))
            .arg(Arg::with_name("topology")
                .display_order(23)
                .long("topology")
                .takes_value(true)
                .value_name("topology")
                .possible_values(&["star", "mesh", "1", "2"])
                .help("Network topology (extended variant)"))
            .arg(Arg::with_name("base-distance")
                .display_order(24)
                .long("base-distance")
                .takes_value(true)
                .value_name("meters")
                .help("Distance between base stations in meters (extended variant)"))
            .arg(Arg::with_name("interpreter")
                .display_order(30)
                .long("interpreter")
                .takes_value(true)
                .value_name("program")
                .help("Interpreter used to run the simulator script, pass an empty \
                string to execute the script directly"))
            .arg(Arg::with_name("script")
                .display_order(31)
                .long("script")
                .takes_value(true)
                .value_name("path")
                .help("Path to the simulator script"))
            .arg(Arg::with_name("timeout")
                .display_order(32)
                .long("timeout")
                .takes_value(true)
                .value_name("millis")
                .help("Kill a trial that runs longer than this (0 disables)"))
            .arg(Arg::with_name("abort-on-failure")
                .display_order(33)
                .long("abort-on-failure")
                .help("Stop the run when a trial exits with a non-zero status"))
            .arg(Arg::with_name("sweep-nodes")
                .display_order(34)
                .long("sweep-nodes")
                .takes_value(true)
                .value_name("counts")
                .help("Comma separated node counts, runs all trials once per count"))
            .arg(Arg::with_name("dry-run")
                .display_order(35)
                .long("dry-run")
                .help("Print the command lines instead of running them"))
        )

        // profiles subcommand
        .subcommand(SubCommand::with_name("profiles")
            .display_order(20)
            .about("List radio experiment profiles known to the simulator"))

        // new subcommand
        .subcommand(SubCommand::with_name("new")
            .display_order(30)
            .about("Create new experiment directory from a template")
            .arg(Arg::with_name("path")
                .required(true)
                .value_name("path"))
            .arg(Arg::with_name("template")
                .possible_values(&["basic", "extended", "commented"])
                .takes_value(true)
                .default_value("commented")
                .help("Init with a template")
                .long("template")
                .short("t")));

    app
}

pub fn app_matches() -> ArgMatches<'static> {
    app().get_matches()
}

/// Runs based on specified subcommand.
pub fn start(matches: ArgMatches) -> Result<()> {
    match matches.subcommand() {
        ("run", Some(m)) => start_run(m),
        ("profiles", Some(m)) => start_profiles(m),
        ("new", Some(m)) => start_new(m),
        _ => Ok(()),
    }
}

fn start_run(matches: &ArgMatches) -> Result<()> {
    setup_log_verbosity(matches);

    let (config, settings) = resolve_run_config(matches)?;
    info!(
        "{} variant, {} trial(s), radio profile {}",
        config.variant(),
        settings.trials,
        config.experiment
    );

    // on ctrl-c or termination stop starting new trials and pass the
    // signal on to the trial that's running
    let launcher = ProcessLauncher::new(settings.timeout);
    let child = launcher.child_handle();
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
        if child.terminate() {
            info!("stop requested, terminated running trial");
        }
    })
    .context("failed setting Ctrl-C handler")?;

    let mut runner = TrialRunner::new(config, settings, launcher)
        .with_running_flag(running)
        .with_dry_run(matches.is_present("dry-run"));
    let report = runner.run_all()?;

    match report.outcome {
        RunOutcome::Completed => (),
        RunOutcome::Interrupted => println!("{}", "Run interrupted.".yellow()),
        RunOutcome::Aborted => println!("{}", "Run aborted after failed trial.".yellow()),
    }
    Ok(())
}

/// Assembles experiment config and run settings from preset, experiment
/// file and flags, in that order.
pub(crate) fn resolve_run_config(matches: &ArgMatches) -> Result<(ExperimentConfig, RunSettings)> {
    let file = match matches.value_of("config") {
        Some(p) => Some(read_experiment_file(PathBuf::from(p))?),
        None => {
            let default_path = env::current_dir()?.join(lorarun::EXPERIMENT_FILE);
            if default_path.is_file() {
                info!(
                    "using experiment file found at: {}",
                    default_path.to_string_lossy()
                );
                Some(read_experiment_file(default_path)?)
            } else {
                None
            }
        }
    };

    let variant = match matches.value_of("variant") {
        Some(v) => Variant::from_str(v)?,
        None => file.as_ref().and_then(|f| f.variant()).unwrap_or_default(),
    };
    let mut config = ExperimentConfig::preset(variant);
    let mut settings = RunSettings::preset(variant);
    if let Some(file) = &file {
        file.apply(&mut config, &mut settings);
    }

    if let Some(n) = parse_arg(matches, "nodes")? {
        config.nodes = n;
    }
    if let Some(ms) = parse_arg(matches, "avg-send")? {
        config.avg_send = ms;
    }
    if let Some(p) = parse_arg::<RadioProfile>(matches, "experiment")? {
        config.experiment = p;
    }
    if let Some(ms) = parse_arg(matches, "sim-time")? {
        config.sim_time = ms;
    }
    if let Some(n) = parse_arg(matches, "base-stations")? {
        config.network_mut().base_stations = n;
    }
    if let Some(flag) = parse_arg::<u8>(matches, "collision")? {
        config.network_mut().full_collision = flag == 1;
    }
    if let Some(flag) = parse_arg::<u8>(matches, "directional")? {
        config.network_mut().directional = flag == 1;
    }
    if let Some(t) = parse_arg::<Topology>(matches, "topology")? {
        config.network_mut().topology = t;
    }
    if let Some(m) = parse_arg(matches, "base-distance")? {
        config.network_mut().base_distance = m;
    }

    if let Some(n) = parse_arg(matches, "trials")? {
        settings.trials = n;
    }
    if let Some(i) = matches.value_of("interpreter") {
        settings.interpreter = match i.trim() {
            "" => None,
            i => Some(i.to_string()),
        };
    }
    if let Some(s) = matches.value_of("script") {
        settings.script = PathBuf::from(s);
    }
    if let Some(ms) = parse_arg::<u64>(matches, "timeout")? {
        settings.timeout = match ms {
            0 => None,
            _ => Some(Duration::from_millis(ms)),
        };
    }
    if matches.is_present("abort-on-failure") {
        settings.on_failure = FailurePolicy::Abort;
    }
    if let Some(list) = matches.value_of("sweep-nodes") {
        settings.sweep_nodes = parse_list(list).context("failed parsing sweep node counts")?;
    }

    config.validate()?;
    settings.validate()?;
    Ok((config, settings))
}

fn read_experiment_file(path: PathBuf) -> Result<ExperimentFile> {
    ExperimentFile::from_path(&path).with_context(|| {
        format!(
            "failed reading experiment file: {}",
            path.to_string_lossy()
        )
    })
}

fn parse_arg<T>(matches: &ArgMatches, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match matches.value_of(name) {
        Some(s) => s
            .parse::<T>()
            .map(Some)
            .map_err(|e| Error::msg(format!("invalid value for --{}: {} ({})", name, s, e))),
        None => Ok(None),
    }
}

fn parse_list(list: &str) -> Result<Vec<u32>> {
    let mut out = Vec::new();
    for s in list.split(',').map(|s| s.trim()).filter(|s| !s.is_empty()) {
        out.push(s.parse::<u32>().with_context(|| format!("not a node count: {}", s))?);
    }
    Ok(out)
}

fn start_profiles(_matches: &ArgMatches) -> Result<()> {
    println!(
        "\
         Radio experiment profiles\n\
         -----------------------------------------"
    );
    for profile in RadioProfile::known() {
        println!(
            "{:>3}  {}",
            profile.id().to_string().green(),
            profile.describe().unwrap_or("")
        );
    }
    Ok(())
}

// Initiate new experiment directory based on input args
fn start_new(matches: &ArgMatches) -> Result<()> {
    let path = matches
        .value_of("path")
        .ok_or(Error::msg("path must be provided"))?;
    let template = matches.value_of("template").unwrap_or("commented");
    init::init_at_path(path, template)
}

fn level_filter(verbosity: &str) -> Option<simplelog::LevelFilter> {
    use self::simplelog::LevelFilter;
    let level = match verbosity {
        "0" | "none" => LevelFilter::Off,
        "1" | "err" | "error" | "min" => LevelFilter::Error,
        "2" | "warn" | "warning" | "default" => LevelFilter::Warn,
        "3" | "info" => LevelFilter::Info,
        "4" | "debug" => LevelFilter::Debug,
        "5" | "trace" | "max" | "all" => LevelFilter::Trace,
        _ => return None,
    };
    Some(level)
}

fn setup_log_verbosity(matches: &ArgMatches) {
    use self::simplelog::{LevelFilter, TermLogger};
    let level = matches
        .value_of("verbosity")
        .and_then(level_filter)
        .unwrap_or(LevelFilter::Info);
    let logger_conf = simplelog::ConfigBuilder::new()
        .set_time_level(LevelFilter::Error)
        .set_target_level(LevelFilter::Debug)
        .set_location_level(LevelFilter::Error)
        .set_time_format_str("%H:%M:%S%.6f")
        .build();
    let _ = TermLogger::init(level, logger_conf, simplelog::TerminalMode::Mixed);
}

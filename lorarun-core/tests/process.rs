//! Runs trials against small shell scripts standing in for the simulator.

#![cfg(unix)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use lorarun_core::{
    ExperimentConfig, ExperimentFile, Launcher, ProcessLauncher, RunOutcome, RunSettings,
    TrialRunner, TrialStatus, Variant,
};
use tempfile::TempDir;

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    path
}

fn sh_settings(script: PathBuf, trials: u32) -> RunSettings {
    RunSettings {
        trials,
        interpreter: Some("sh".to_string()),
        script,
        ..RunSettings::preset(Variant::Basic)
    }
}

#[test]
fn arguments_reach_the_simulator() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("calls.log");
    let script = write_script(
        dir.path(),
        "sim.sh",
        &format!("echo \"$@\" >> '{}'", log.to_string_lossy()),
    );

    let mut runner = TrialRunner::with_output(
        ExperimentConfig::preset(Variant::Extended),
        sh_settings(script, 3),
        ProcessLauncher::default(),
        Vec::new(),
    );
    let report = runner.run_all().unwrap();
    assert_eq!(report.succeeded(), 3);

    let calls = fs::read_to_string(&log).unwrap();
    let lines = calls.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 3);
    for line in lines {
        assert_eq!(line, "100 60000 5 100000 1 1 1 1 1000");
    }
}

#[test]
fn non_zero_exit_continues_with_next_trial() {
    let dir = TempDir::new().unwrap();
    let script = write_script(dir.path(), "fail.sh", "exit 3");

    let mut runner = TrialRunner::with_output(
        ExperimentConfig::preset(Variant::Basic),
        sh_settings(script, 4),
        ProcessLauncher::default(),
        Vec::new(),
    );
    let report = runner.run_all().unwrap();

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.trials.len(), 4);
    assert!(report
        .trials
        .iter()
        .all(|t| t.status == TrialStatus::Failed(Some(3))));
}

#[test]
fn missing_interpreter_is_a_launch_error() {
    let dir = TempDir::new().unwrap();
    let script = write_script(dir.path(), "sim.sh", "exit 0");
    let settings = RunSettings {
        interpreter: Some("no-such-interpreter-for-lorarun".to_string()),
        ..sh_settings(script, 10)
    };

    let mut runner = TrialRunner::with_output(
        ExperimentConfig::preset(Variant::Basic),
        settings,
        ProcessLauncher::default(),
        Vec::new(),
    );
    let err = runner.run_all().unwrap_err();
    assert!(err.is_launch());

    let out = String::from_utf8(runner.output().clone()).unwrap();
    assert!(out.contains("Simulation : 1"));
    assert!(!out.contains("Simulation : 2"));
}

#[test]
fn long_trial_is_killed_after_timeout() {
    let dir = TempDir::new().unwrap();
    let script = write_script(dir.path(), "slow.sh", "exec sleep 10");
    let settings = sh_settings(script, 1);

    let mut launcher = ProcessLauncher::new(Some(Duration::from_millis(200)));
    launcher.prepare(&settings).unwrap();
    let invocation = lorarun_core::Invocation::for_experiment(
        &ExperimentConfig::preset(Variant::Basic),
        &settings,
    );
    assert_eq!(launcher.launch(&invocation).unwrap(), TrialStatus::TimedOut);
}

#[test]
fn experiment_file_drives_the_run() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("calls.log");
    let script = write_script(
        dir.path(),
        "sim.sh",
        &format!("echo \"$1\" >> '{}'", log.to_string_lossy()),
    );
    let file_path = dir.path().join("experiment.toml");
    fs::write(
        &file_path,
        format!(
            "[experiment]\nnodes = 20\n\n[run]\ntrials = 2\ninterpreter = \"sh\"\nscript = \"{}\"\nsweep_nodes = [10, 30]\n",
            script.to_string_lossy()
        ),
    )
    .unwrap();

    let file = ExperimentFile::from_path(&file_path).unwrap();
    let variant = file.variant().unwrap_or_default();
    let mut config = ExperimentConfig::preset(variant);
    let mut settings = RunSettings::preset(variant);
    file.apply(&mut config, &mut settings);
    assert_eq!(config.nodes, 20);

    let mut runner =
        TrialRunner::with_output(config, settings, ProcessLauncher::default(), Vec::new());
    runner.run_all().unwrap();

    let calls = fs::read_to_string(&log).unwrap();
    assert_eq!(calls.lines().collect::<Vec<_>>(), vec!["10", "10", "30", "30"]);
}

#[test]
fn unsupported_file_extension_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("experiment.ini");
    fs::write(&path, "nodes=1").unwrap();
    assert!(ExperimentFile::from_path(&path).is_err());
}

#[test]
fn stop_request_terminates_running_trial() {
    let dir = TempDir::new().unwrap();
    let script = write_script(dir.path(), "slow.sh", "exec sleep 10");

    let launcher = ProcessLauncher::default();
    let child = launcher.child_handle();
    let running = Arc::new(AtomicBool::new(true));

    // same steps the command line's signal handler takes
    let r = running.clone();
    let stopper = thread::spawn(move || {
        let deadline = Instant::now() + Duration::from_secs(5);
        while child.pid().is_none() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        thread::sleep(Duration::from_millis(100));
        r.store(false, Ordering::SeqCst);
        child.terminate()
    });

    let start = Instant::now();
    let mut runner = TrialRunner::with_output(
        ExperimentConfig::preset(Variant::Basic),
        sh_settings(script, 3),
        launcher,
        Vec::new(),
    )
    .with_running_flag(running);
    let report = runner.run_all().unwrap();

    assert!(stopper.join().unwrap());
    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(report.outcome, RunOutcome::Interrupted);
    assert_eq!(report.trials.len(), 1);
    assert_eq!(report.trials[0].status, TrialStatus::Failed(None));
    assert_eq!(runner.launcher().child_handle().pid(), None);
}

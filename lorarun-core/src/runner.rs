//! Trial runner.
//!
//! Runs a configured number of trials of the simulator one after another,
//! in increasing index order, each one finishing before the next is started.
//! There's no parallelism and no shared state between trials other than the
//! identical configuration.
//!
//! # Stopping early
//!
//! A run ends before all trials are done in three cases:
//!
//! - the simulator can't be launched, which is returned as an error
//! - the running flag was cleared (e.g. by a Ctrl-C handler), checked
//!   before each trial
//! - a trial failed and the failure policy is set to abort

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

use crate::banner;
use crate::config::{ExperimentConfig, FailurePolicy, RunSettings};
use crate::error::Result;
use crate::invocation::Invocation;
use crate::launcher::{Launcher, TrialStatus};

/// Record of a single finished trial.
#[derive(Debug, Clone)]
pub struct TrialRun {
    /// 1-based index within its block.
    pub index: u32,
    /// Simulator arguments the trial was launched with.
    pub args: Vec<String>,
    pub status: TrialStatus,
    pub started_at: DateTime<Local>,
    pub duration: Duration,
}

/// How the run as a whole ended.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Interrupted,
    /// Stopped after a failed trial because of `FailurePolicy::Abort`.
    Aborted,
}

impl Default for RunOutcome {
    fn default() -> Self {
        RunOutcome::Completed
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub trials: Vec<TrialRun>,
    pub outcome: RunOutcome,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.trials.iter().filter(|t| t.status.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.trials.len() - self.succeeded()
    }
}

/// Progress of a run. A runner that hasn't started yet has no state.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RunState {
    Running(u32),
    Done,
}

pub struct TrialRunner<L: Launcher, W: Write = io::Stdout> {
    config: ExperimentConfig,
    settings: RunSettings,
    launcher: L,
    out: W,
    running: Arc<AtomicBool>,
    dry_run: bool,
    state: Option<RunState>,
}

impl<L: Launcher> TrialRunner<L, io::Stdout> {
    /// Creates a runner printing banners to standard output.
    pub fn new(config: ExperimentConfig, settings: RunSettings, launcher: L) -> Self {
        TrialRunner::with_output(config, settings, launcher, io::stdout())
    }
}

impl<L: Launcher, W: Write> TrialRunner<L, W> {
    pub fn with_output(config: ExperimentConfig, settings: RunSettings, launcher: L, out: W) -> Self {
        TrialRunner {
            config,
            settings,
            launcher,
            out,
            running: Arc::new(AtomicBool::new(true)),
            dry_run: false,
            state: None,
        }
    }

    /// Uses the given flag for stopping the run. Once it's set to `false`
    /// no new trial will be started.
    pub fn with_running_flag(mut self, running: Arc<AtomicBool>) -> Self {
        self.running = running;
        self
    }

    /// Print the would-be command lines instead of launching anything.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn state(&self) -> Option<RunState> {
        self.state
    }

    /// Configurations for each block of trials, a single one unless
    /// sweeping over node counts.
    fn blocks(&self) -> Vec<ExperimentConfig> {
        if self.settings.sweep_nodes.is_empty() {
            vec![self.config.clone()]
        } else {
            self.settings
                .sweep_nodes
                .iter()
                .map(|n| self.config.with_nodes(*n))
                .collect()
        }
    }

    /// Runs all the trials.
    pub fn run_all(&mut self) -> Result<RunReport> {
        self.config.validate()?;
        self.settings.validate()?;
        if !self.dry_run {
            self.launcher.prepare(&self.settings)?;
        }

        let blocks = self.blocks();
        let mut report = RunReport::default();
        let result = self.run_blocks(&blocks, &mut report);
        self.state = Some(RunState::Done);
        result?;

        info!(
            "finished {} trial(s): {} succeeded, {} failed ({:?})",
            report.trials.len(),
            report.succeeded(),
            report.failed(),
            report.outcome
        );
        Ok(report)
    }

    fn run_blocks(&mut self, blocks: &[ExperimentConfig], report: &mut RunReport) -> Result<()> {
        for (n, config) in blocks.iter().enumerate() {
            if blocks.len() > 1 {
                info!(
                    "sweep point {}/{}: {} nodes",
                    n + 1,
                    blocks.len(),
                    config.nodes
                );
            }
            let outcome = self.run_block(config, report)?;
            if outcome != RunOutcome::Completed {
                report.outcome = outcome;
                break;
            }
        }
        Ok(())
    }

    fn run_block(&mut self, config: &ExperimentConfig, report: &mut RunReport) -> Result<RunOutcome> {
        let invocation = Invocation::for_experiment(config, &self.settings);
        let trailing_banner = self.settings.trailing_banner_for(config);
        info!(
            "running {} trial(s) of: {}",
            self.settings.trials, invocation
        );

        for index in 1..=self.settings.trials {
            if !self.running.load(Ordering::SeqCst) {
                info!("interrupted, not starting trial {}", index);
                return Ok(RunOutcome::Interrupted);
            }
            self.state = Some(RunState::Running(index));
            banner::write_header(&mut self.out, index)?;

            if self.dry_run {
                writeln!(self.out, "{}", invocation)?;
                if trailing_banner {
                    banner::write_separator(&mut self.out)?;
                }
                continue;
            }

            let started_at = Local::now();
            let start = Instant::now();
            let status = self.launcher.launch(&invocation)?;
            let duration = start.elapsed();

            if trailing_banner {
                banner::write_separator(&mut self.out)?;
            }
            match status {
                TrialStatus::Succeeded => debug!(
                    "trial {} succeeded after {} ms",
                    index,
                    duration.as_millis()
                ),
                _ => warn!("trial {} {}", index, status),
            }

            report.trials.push(TrialRun {
                index,
                args: config.to_args(),
                status,
                started_at,
                duration,
            });

            if !status.is_success() && self.settings.on_failure == FailurePolicy::Abort {
                warn!("aborting run after failed trial {}", index);
                return Ok(RunOutcome::Aborted);
            }
        }
        Ok(RunOutcome::Completed)
    }
}

//! This library implements the repeated-trial runner for external LoRa
//! collision simulations.
//!
//! Programming interface is centered around the [`TrialRunner`] structure,
//! which takes an immutable [`ExperimentConfig`] together with
//! [`RunSettings`] and launches the simulator once per trial, strictly
//! sequentially, printing progress banners in between.
//!
//! # Launching
//!
//! The runner itself never touches `std::process` directly. Spawning is
//! delegated to an implementation of the [`Launcher`] trait, the default
//! being [`ProcessLauncher`]. This allows the trial loop to be exercised
//! without a simulator present.
//!
//! # Configuration
//!
//! Experiments can be described in code, loaded from a `toml` (or `yaml`,
//! with the `yaml` feature) experiment file, or a mix of both. See
//! [`ExperimentFile`].
//!
//! ## Example
//!
//! ```ignore
//! use lorarun_core::{ExperimentConfig, ProcessLauncher, RunSettings, TrialRunner, Variant};
//!
//! pub fn main() {
//!     let config = ExperimentConfig::preset(Variant::Basic);
//!     let settings = RunSettings::preset(Variant::Basic);
//!     let mut runner = TrialRunner::new(config, settings, ProcessLauncher::new(None));
//!     let report = runner.run_all().unwrap();
//!     println!("{} trials finished", report.trials.len());
//! }
//! ```
//!
//! [`TrialRunner`]: runner/struct.TrialRunner.html
//! [`ExperimentConfig`]: config/struct.ExperimentConfig.html
//! [`RunSettings`]: config/struct.RunSettings.html
//! [`Launcher`]: launcher/trait.Launcher.html
//! [`ProcessLauncher`]: launcher/struct.ProcessLauncher.html
//! [`ExperimentFile`]: config/struct.ExperimentFile.html

#[macro_use]
extern crate serde;
#[macro_use]
extern crate log;

// reexports
pub use config::{
    ExperimentConfig, ExperimentFile, FailurePolicy, NetworkParams, RunSettings, Topology, Variant,
};
pub use error::{Error, Result};
pub use invocation::Invocation;
pub use launcher::{ChildHandle, Launcher, ProcessLauncher, TrialStatus};
pub use profile::RadioProfile;
pub use runner::{RunOutcome, RunReport, TrialRun, TrialRunner};

pub mod banner;
pub mod config;
pub mod error;
pub mod invocation;
pub mod launcher;
pub mod profile;
pub mod runner;

mod util;

pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");

/// Interpreter used to run the simulator script if none is specified.
pub const DEFAULT_INTERPRETER: &str = "python";
/// Simulator script launched on every trial if none is specified.
pub const DEFAULT_SCRIPT: &str = "loraDir.py";

/// Default experiment file name looked up by the command line tool.
pub const EXPERIMENT_FILE: &str = "experiment.toml";

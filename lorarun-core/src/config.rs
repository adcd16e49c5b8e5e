//! Experiment configuration, presets and experiment file handling.
//!
//! # Precedence
//!
//! A final configuration is assembled in layers: first the preset for the
//! selected [`Variant`], then any values found in an experiment file, then
//! any explicitly provided overrides (usually command line flags). Once
//! assembled and validated the configuration doesn't change for the
//! lifetime of the run.
//!
//! [`Variant`]: enum.Variant.html

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::profile::RadioProfile;
use crate::util;
use crate::{DEFAULT_INTERPRETER, DEFAULT_SCRIPT};

/// Selects which signature of the simulator is used.
///
/// The basic variant passes four positional arguments, the extended
/// variant adds five more describing the network.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Basic,
    Extended,
}

impl Default for Variant {
    fn default() -> Self {
        Variant::Basic
    }
}

impl FromStr for Variant {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "basic" | "4" => Ok(Variant::Basic),
            "extended" | "ext" | "9" => Ok(Variant::Extended),
            _ => Err(Error::InvalidConfig(format!("unknown variant: {}", s))),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Basic => write!(f, "basic"),
            Variant::Extended => write!(f, "extended"),
        }
    }
}

/// Network topology simulated in the extended variant.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topology {
    Star,
    Mesh,
}

impl Topology {
    /// Integer code the simulator expects on its command line.
    pub fn code(&self) -> u8 {
        match self {
            Topology::Star => 1,
            Topology::Mesh => 2,
        }
    }
}

impl Default for Topology {
    fn default() -> Self {
        Topology::Star
    }
}

impl FromStr for Topology {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "star" | "1" => Ok(Topology::Star),
            "mesh" | "2" => Ok(Topology::Mesh),
            _ => Err(Error::InvalidConfig(format!("unknown topology: {}", s))),
        }
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topology::Star => write!(f, "star"),
            Topology::Mesh => write!(f, "mesh"),
        }
    }
}

/// What to do when a trial exits with a non-zero status.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Log the failure and carry on with the next trial.
    Continue,
    /// Stop the run after the failed trial.
    Abort,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        FailurePolicy::Continue
    }
}

/// Parameters only present in the extended simulator signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkParams {
    pub base_stations: u32,
    /// Use the full collision check, including the capture effect.
    pub full_collision: bool,
    /// Use directional antennas.
    pub directional: bool,
    pub topology: Topology,
    /// Distance between base stations, in meters.
    pub base_distance: u32,
}

impl Default for NetworkParams {
    fn default() -> Self {
        NetworkParams {
            base_stations: 1,
            full_collision: true,
            directional: true,
            topology: Topology::Star,
            base_distance: 1000,
        }
    }
}

/// Set of simulation parameters passed positionally to the simulator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Number of nodes to simulate.
    pub nodes: u32,
    /// Average sending interval, in milliseconds.
    pub avg_send: u64,
    /// Radio settings preset.
    pub experiment: RadioProfile,
    /// Total simulated time, in milliseconds.
    pub sim_time: u64,
    /// Present only for the extended variant.
    pub network: Option<NetworkParams>,
}

impl ExperimentConfig {
    pub fn preset(variant: Variant) -> Self {
        match variant {
            Variant::Basic => ExperimentConfig {
                nodes: 100,
                avg_send: 1000,
                experiment: RadioProfile(0),
                sim_time: 10000,
                network: None,
            },
            Variant::Extended => ExperimentConfig {
                nodes: 100,
                avg_send: 60000,
                experiment: RadioProfile(5),
                sim_time: 100000,
                network: Some(NetworkParams::default()),
            },
        }
    }

    pub fn variant(&self) -> Variant {
        match self.network {
            Some(_) => Variant::Extended,
            None => Variant::Basic,
        }
    }

    /// Returns network parameters, switching to the extended variant with
    /// default network parameters if necessary.
    pub fn network_mut(&mut self) -> &mut NetworkParams {
        self.network.get_or_insert_with(NetworkParams::default)
    }

    /// Returns a copy of the config with a different node count.
    pub fn with_nodes(&self, nodes: u32) -> Self {
        ExperimentConfig {
            nodes,
            ..self.clone()
        }
    }

    /// Checks that all numeric fields are positive.
    ///
    /// Radio profile is deliberately not checked here beyond logging,
    /// interpreting it is up to the simulator.
    pub fn validate(&self) -> Result<()> {
        require_positive("nodes", self.nodes as u64)?;
        require_positive("avg_send", self.avg_send)?;
        require_positive("sim_time", self.sim_time)?;
        if let Some(net) = &self.network {
            require_positive("base_stations", net.base_stations as u64)?;
            require_positive("base_distance", net.base_distance as u64)?;
        }
        if !self.experiment.is_known() {
            warn!(
                "radio experiment profile {} is not known, passing it to the simulator as is",
                self.experiment
            );
        }
        Ok(())
    }

    /// Stringified positional arguments, in the order the simulator
    /// expects them.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            self.nodes.to_string(),
            self.avg_send.to_string(),
            self.experiment.to_string(),
            self.sim_time.to_string(),
        ];
        if let Some(net) = &self.network {
            args.push(net.base_stations.to_string());
            args.push(flag(net.full_collision));
            args.push(flag(net.directional));
            args.push(net.topology.code().to_string());
            args.push(net.base_distance.to_string());
        }
        args
    }
}

fn flag(b: bool) -> String {
    match b {
        true => "1".to_string(),
        false => "0".to_string(),
    }
}

fn require_positive(name: &str, value: u64) -> Result<()> {
    if value == 0 {
        return Err(Error::InvalidConfig(format!(
            "{} must be a positive integer",
            name
        )));
    }
    Ok(())
}

/// Runner-level settings, these are never passed to the simulator.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    /// Number of trials per configuration.
    pub trials: u32,
    /// Interpreter used for running the script. If `None` the script is
    /// executed directly.
    pub interpreter: Option<String>,
    pub script: PathBuf,
    pub timeout: Option<Duration>,
    pub on_failure: FailurePolicy,
    /// Print a separator after each trial completes. If not set it's only
    /// printed for the extended variant.
    pub trailing_banner: Option<bool>,
    /// Node counts to sweep over. Empty means a single block of trials
    /// using the configured node count.
    pub sweep_nodes: Vec<u32>,
}

impl RunSettings {
    pub fn preset(variant: Variant) -> Self {
        RunSettings {
            trials: match variant {
                Variant::Basic => 10,
                Variant::Extended => 5,
            },
            interpreter: Some(DEFAULT_INTERPRETER.to_string()),
            script: PathBuf::from(DEFAULT_SCRIPT),
            timeout: None,
            on_failure: FailurePolicy::default(),
            trailing_banner: None,
            sweep_nodes: Vec::new(),
        }
    }

    pub fn trailing_banner_for(&self, config: &ExperimentConfig) -> bool {
        self.trailing_banner
            .unwrap_or(config.variant() == Variant::Extended)
    }

    pub fn validate(&self) -> Result<()> {
        if self.trials == 0 {
            return Err(Error::InvalidConfig(
                "trial count must be greater than zero".to_string(),
            ));
        }
        if self.script.as_os_str().is_empty() {
            return Err(Error::InvalidConfig(
                "simulator script path is empty".to_string(),
            ));
        }
        if self.sweep_nodes.iter().any(|n| *n == 0) {
            return Err(Error::InvalidConfig(
                "sweep node counts must be positive integers".to_string(),
            ));
        }
        if self.timeout == Some(Duration::from_millis(0)) {
            return Err(Error::InvalidConfig(
                "timeout must be positive if set".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for RunSettings {
    fn default() -> Self {
        RunSettings::preset(Variant::default())
    }
}

/// Deserialized experiment file.
///
/// Every field is optional, missing values are taken from whatever the file
/// is applied on top of.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExperimentFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<Variant>,
    #[serde(default)]
    pub experiment: ExperimentSection,
    #[serde(default)]
    pub run: RunSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExperimentSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_send: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experiment: Option<RadioProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sim_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_stations: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_collision: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directional: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topology: Option<Topology>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_distance: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trials: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpreter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_failure: Option<FailurePolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailing_banner: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sweep_nodes: Option<Vec<u32>>,
}

impl ExperimentFile {
    /// Reads an experiment file, format is selected based on the file
    /// extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("reading experiment file: {}", path.to_string_lossy());
        util::deser_struct_from_path(path)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Creates a fully populated file from the given preset.
    pub fn from_preset(variant: Variant) -> Self {
        let config = ExperimentConfig::preset(variant);
        let settings = RunSettings::preset(variant);
        ExperimentFile {
            variant: Some(variant),
            experiment: ExperimentSection {
                nodes: Some(config.nodes),
                avg_send: Some(config.avg_send),
                experiment: Some(config.experiment),
                sim_time: Some(config.sim_time),
                network: config.network.map(|net| NetworkSection {
                    base_stations: Some(net.base_stations),
                    full_collision: Some(net.full_collision),
                    directional: Some(net.directional),
                    topology: Some(net.topology),
                    base_distance: Some(net.base_distance),
                }),
            },
            run: RunSection {
                trials: Some(settings.trials),
                interpreter: settings.interpreter,
                script: Some(settings.script.to_string_lossy().to_string()),
                ..Default::default()
            },
        }
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Variant implied by the file, either stated explicitly or inferred
    /// from the presence of a network section.
    pub fn variant(&self) -> Option<Variant> {
        match self.variant {
            Some(v) => Some(v),
            None if self.experiment.network.is_some() => Some(Variant::Extended),
            None => None,
        }
    }

    /// Overwrites values in `config` and `settings` with the ones present
    /// in the file.
    pub fn apply(&self, config: &mut ExperimentConfig, settings: &mut RunSettings) {
        let exp = &self.experiment;
        if let Some(nodes) = exp.nodes {
            config.nodes = nodes;
        }
        if let Some(avg_send) = exp.avg_send {
            config.avg_send = avg_send;
        }
        if let Some(profile) = exp.experiment {
            config.experiment = profile;
        }
        if let Some(sim_time) = exp.sim_time {
            config.sim_time = sim_time;
        }
        if let Some(net_section) = &exp.network {
            let net = config.network_mut();
            if let Some(n) = net_section.base_stations {
                net.base_stations = n;
            }
            if let Some(b) = net_section.full_collision {
                net.full_collision = b;
            }
            if let Some(b) = net_section.directional {
                net.directional = b;
            }
            if let Some(t) = net_section.topology {
                net.topology = t;
            }
            if let Some(d) = net_section.base_distance {
                net.base_distance = d;
            }
        }

        let run = &self.run;
        if let Some(trials) = run.trials {
            settings.trials = trials;
        }
        if let Some(interpreter) = &run.interpreter {
            // empty string means the script is executable on its own
            settings.interpreter = match interpreter.trim() {
                "" => None,
                i => Some(i.to_string()),
            };
        }
        if let Some(script) = &run.script {
            settings.script = PathBuf::from(script);
        }
        if let Some(ms) = run.timeout_ms {
            settings.timeout = match ms {
                0 => None,
                _ => Some(Duration::from_millis(ms)),
            };
        }
        if let Some(policy) = run.on_failure {
            settings.on_failure = policy;
        }
        if let Some(b) = run.trailing_banner {
            settings.trailing_banner = Some(b);
        }
        if let Some(sweep) = &run.sweep_nodes {
            settings.sweep_nodes = sweep.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_preset_args() {
        let config = ExperimentConfig::preset(Variant::Basic);
        assert_eq!(config.to_args(), vec!["100", "1000", "0", "10000"]);
        assert_eq!(config.variant(), Variant::Basic);
        assert_eq!(RunSettings::preset(Variant::Basic).trials, 10);
    }

    #[test]
    fn extended_preset_args() {
        let config = ExperimentConfig::preset(Variant::Extended);
        assert_eq!(
            config.to_args(),
            vec!["100", "60000", "5", "100000", "1", "1", "1", "1", "1000"]
        );
        assert_eq!(RunSettings::preset(Variant::Extended).trials, 5);
    }

    #[test]
    fn flags_and_topology_are_encoded() {
        let mut config = ExperimentConfig::preset(Variant::Extended);
        {
            let net = config.network_mut();
            net.full_collision = false;
            net.topology = Topology::Mesh;
        }
        let args = config.to_args();
        assert_eq!(args[5], "0");
        assert_eq!(args[6], "1");
        assert_eq!(args[7], "2");
    }

    #[test]
    fn zero_fields_fail_validation() {
        let mut config = ExperimentConfig::preset(Variant::Basic);
        assert!(config.validate().is_ok());
        config.sim_time = 0;
        assert!(config.validate().is_err());

        let mut config = ExperimentConfig::preset(Variant::Extended);
        config.network_mut().base_distance = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_trials_fail_validation() {
        let mut settings = RunSettings::default();
        assert!(settings.validate().is_ok());
        settings.trials = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn trailing_banner_follows_variant() {
        let settings = RunSettings::default();
        assert!(!settings.trailing_banner_for(&ExperimentConfig::preset(Variant::Basic)));
        assert!(settings.trailing_banner_for(&ExperimentConfig::preset(Variant::Extended)));

        let settings = RunSettings {
            trailing_banner: Some(true),
            ..RunSettings::default()
        };
        assert!(settings.trailing_banner_for(&ExperimentConfig::preset(Variant::Basic)));
    }

    #[test]
    fn topology_parses_names_and_codes() {
        assert_eq!("star".parse::<Topology>().unwrap(), Topology::Star);
        assert_eq!("2".parse::<Topology>().unwrap(), Topology::Mesh);
        assert!("ring".parse::<Topology>().is_err());
    }

    #[test]
    fn file_overrides_preset() {
        let file = ExperimentFile::from_toml_str(
            r#"
            [experiment]
            nodes = 250
            sim_time = 5000

            [experiment.network]
            topology = "mesh"

            [run]
            trials = 3
            interpreter = ""
            timeout_ms = 1500
            on_failure = "abort"
            "#,
        )
        .unwrap();
        assert_eq!(file.variant(), Some(Variant::Extended));

        let mut config = ExperimentConfig::preset(Variant::Basic);
        let mut settings = RunSettings::preset(Variant::Basic);
        file.apply(&mut config, &mut settings);

        assert_eq!(config.nodes, 250);
        assert_eq!(config.avg_send, 1000);
        assert_eq!(config.sim_time, 5000);
        assert_eq!(config.network.as_ref().unwrap().topology, Topology::Mesh);
        assert_eq!(config.network.as_ref().unwrap().base_distance, 1000);
        assert_eq!(settings.trials, 3);
        assert_eq!(settings.interpreter, None);
        assert_eq!(settings.timeout, Some(Duration::from_millis(1500)));
        assert_eq!(settings.on_failure, FailurePolicy::Abort);
    }

    #[test]
    fn unknown_file_fields_are_rejected() {
        assert!(ExperimentFile::from_toml_str("[experiment]\nnodez = 5\n").is_err());
    }

    #[test]
    fn preset_file_reproduces_preset() {
        let text = ExperimentFile::from_preset(Variant::Extended)
            .to_toml_string()
            .unwrap();
        let file = ExperimentFile::from_toml_str(&text).unwrap();

        let mut config = ExperimentConfig::preset(Variant::Basic);
        let mut settings = RunSettings::preset(Variant::Basic);
        file.apply(&mut config, &mut settings);
        assert_eq!(config, ExperimentConfig::preset(Variant::Extended));
        assert_eq!(settings.trials, 5);
    }
}

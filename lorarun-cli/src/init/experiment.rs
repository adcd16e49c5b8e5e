use std::collections::HashMap;

use anyhow::Result;
use lorarun::{ExperimentFile, Variant, DEFAULT_SCRIPT, EXPERIMENT_FILE};

pub fn collect_template_files(
    name: &str,
    template_str: &str,
) -> Result<Option<HashMap<String, String>>> {
    let content = match template_str {
        "basic" => ExperimentFile::from_preset(Variant::Basic).to_toml_string()?,
        "extended" => ExperimentFile::from_preset(Variant::Extended).to_toml_string()?,
        "commented" => template_commented(name),
        _ => return Ok(None),
    };
    let mut map = HashMap::new();
    map.insert(EXPERIMENT_FILE.to_string(), content);
    Ok(Some(map))
}

// commented template
fn template_commented(name: &str) -> String {
    format!(
        r##"# Experiment: {title}
#
# Run with `lorarun run` from this directory. Any value can also be
# overridden on the command line.

# "basic" passes 4 arguments to the simulator, "extended" passes 9
variant = "extended"

[experiment]
# number of nodes to simulate
nodes = 100
# average sending interval in milliseconds
avg_send = 60000
# radio settings preset, see `lorarun profiles`
experiment = 5
# total simulated time in milliseconds
sim_time = 100000

# only used by the extended variant
[experiment.network]
base_stations = 1
# full collision check including the capture effect
full_collision = true
directional = true
# "star" or "mesh"
topology = "star"
# distance between base stations in meters
base_distance = 1000

[run]
trials = 5
interpreter = "python"
script = "{script}"
# kill trials running longer than this, 0 disables
timeout_ms = 0
# "continue" or "abort" when a trial exits with a non-zero status
on_failure = "continue"
# run all trials once for each of these node counts
# sweep_nodes = [100, 200, 500]
"##,
        title = name.replace("_", " "),
        script = DEFAULT_SCRIPT,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use lorarun::{ExperimentConfig, RunSettings};

    #[test]
    fn commented_template_matches_extended_preset() {
        let file = ExperimentFile::from_toml_str(&template_commented("my_exp")).unwrap();
        assert_eq!(file.variant(), Some(Variant::Extended));

        let mut config = ExperimentConfig::preset(Variant::Basic);
        let mut settings = RunSettings::preset(Variant::Basic);
        file.apply(&mut config, &mut settings);
        assert_eq!(config, ExperimentConfig::preset(Variant::Extended));
        assert_eq!(settings.trials, 5);
        assert_eq!(settings.timeout, None);
    }

    #[test]
    fn all_templates_are_available() {
        for template in &["basic", "extended", "commented"] {
            let files = collect_template_files("exp", template).unwrap().unwrap();
            assert!(files.contains_key(EXPERIMENT_FILE));
        }
        assert!(collect_template_files("exp", "tutorial").unwrap().is_none());
    }
}

//! Command line handed to the launcher for a single trial.

use std::fmt;

use crate::config::{ExperimentConfig, RunSettings};
use crate::util;

/// Program together with its ordered arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Invocation {
            program: program.into(),
            args,
        }
    }

    /// Builds the simulator invocation.
    ///
    /// With an interpreter set this gives `<interpreter> <script> <args..>`,
    /// otherwise the script itself is the program.
    pub fn for_experiment(config: &ExperimentConfig, settings: &RunSettings) -> Self {
        let script = settings.script.to_string_lossy().to_string();
        match &settings.interpreter {
            Some(interpreter) => {
                let mut args = Vec::with_capacity(10);
                args.push(script);
                args.extend(config.to_args());
                Invocation::new(interpreter.as_str(), args)
            }
            None => Invocation::new(script, config.to_args()),
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = std::iter::once(self.program.as_str()).chain(self.args.iter().map(|a| a.as_str()));
        write!(f, "{}", util::shell_join(parts))
    }
}

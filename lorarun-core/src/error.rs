//! Error types.

use std::io;

pub type Result<T> = core::result::Result<T, Error>;

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::IoError(e.to_string())
    }
}

/// Crate-wide error type.
///
/// Note that a trial exiting with a non-zero status is *not* an error, it's
/// reported through [`TrialStatus`] instead. Only failing to launch the
/// simulator at all aborts a run.
///
/// [`TrialStatus`]: ../launcher/enum.TrialStatus.html
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed launching `{command}`: {source}")]
    Launch {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("io error: {0}")]
    IoError(String),

    #[error("invalid experiment config: {0}")]
    InvalidConfig(String),
    #[error("unsupported experiment file format: {0}")]
    UnsupportedConfigFormat(String),

    #[cfg(feature = "yaml")]
    #[error("yaml deserialization error: {0}")]
    YamlDeserError(#[from] serde_yaml::Error),
    #[error("toml deserialization error: {0}")]
    TomlDeserError(#[from] toml::de::Error),
    #[error("toml serialization error: {0}")]
    TomlSerError(#[from] toml::ser::Error),

    #[error("failed parsing int: {0}")]
    ParseIntError(#[from] std::num::ParseIntError),
}

impl Error {
    /// Convenience constructor for launch failures.
    pub fn launch(command: impl Into<String>, source: io::Error) -> Self {
        Self::Launch {
            command: command.into(),
            source,
        }
    }

    /// Whether the error originated from trying to spawn the simulator.
    pub fn is_launch(&self) -> bool {
        matches!(self, Self::Launch { .. })
    }
}

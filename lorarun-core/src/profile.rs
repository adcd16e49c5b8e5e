//! Radio experiment profiles understood by the simulator.
//!
//! The profile is an opaque integer as far as the runner is concerned. It
//! selects a fixed spreading factor, bandwidth and coding rate preset inside
//! the simulator. The table here only serves to describe known profiles to
//! the user; unknown ids are passed through untouched.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Highest profile id the simulator is known to recognize.
pub const MAX_KNOWN_PROFILE: u8 = 5;

/// Radio settings preset selected for a simulation run.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RadioProfile(pub u8);

impl RadioProfile {
    /// Returns all the profiles known to the simulator.
    pub fn known() -> impl Iterator<Item = RadioProfile> {
        (0..=MAX_KNOWN_PROFILE).map(RadioProfile)
    }

    pub fn id(&self) -> u8 {
        self.0
    }

    pub fn is_known(&self) -> bool {
        self.0 <= MAX_KNOWN_PROFILE
    }

    /// Human readable description of the radio settings, if the profile
    /// is known.
    pub fn describe(&self) -> Option<&'static str> {
        let desc = match self.0 {
            0 => "slowest data rate (SF12, BW125, CR4/8), single frequency",
            1 => "like 0, but with a random choice of 3 transmit frequencies",
            2 => "fastest data rate (SF6, BW500, CR4/5)",
            3 => "settings optimised per node based on distance to the gateway",
            4 => "LoRaWAN settings (SF12, BW125, CR4/5)",
            5 => "like 3, but also optimises the transmit power",
            _ => return None,
        };
        Some(desc)
    }
}

impl Default for RadioProfile {
    fn default() -> Self {
        RadioProfile(0)
    }
}

impl fmt::Display for RadioProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RadioProfile {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        Ok(RadioProfile(s.trim().parse()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_profiles_are_described() {
        assert_eq!(RadioProfile::known().count(), 6);
        for profile in RadioProfile::known() {
            assert!(profile.is_known());
            assert!(profile.describe().is_some());
        }
    }

    #[test]
    fn unknown_profile_passes_through() {
        let profile: RadioProfile = "9".parse().unwrap();
        assert!(!profile.is_known());
        assert_eq!(profile.describe(), None);
        assert_eq!(profile.to_string(), "9");
    }

    #[test]
    fn non_numeric_profile_is_rejected() {
        assert!("sf12".parse::<RadioProfile>().is_err());
    }
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which sources a scan consults.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    Sherlock,
    Reddit,
    #[default]
    Both,
}

impl ScanMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ScanMode::Sherlock => "sherlock",
            ScanMode::Reddit => "reddit",
            ScanMode::Both => "both",
        }
    }

    pub fn includes_sherlock(self) -> bool {
        matches!(self, ScanMode::Sherlock | ScanMode::Both)
    }

    pub fn includes_reddit(self) -> bool {
        matches!(self, ScanMode::Reddit | ScanMode::Both)
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScanMode {
    type Err = crate::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sherlock" => Ok(ScanMode::Sherlock),
            "reddit" => Ok(ScanMode::Reddit),
            "both" => Ok(ScanMode::Both),
            other => Err(anyhow::anyhow!(
                "unknown scan mode `{other}` (expected sherlock, reddit, or both)"
            )),
        }
    }
}

/// Cache key for one (target, mode) scan: `"<username>:<mode>"`.
///
/// Usernames are trimmed and lowercased so `Foo` and ` foo` share a result.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ScanKey(String);

impl ScanKey {
    pub fn new(username: &str, mode: ScanMode) -> Self {
        Self(format!("{}:{}", username.trim().to_lowercase(), mode))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScanKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{ScanKey, ScanMode};

    #[test]
    fn parses_modes_case_insensitively() {
        assert_eq!("Sherlock".parse::<ScanMode>().ok(), Some(ScanMode::Sherlock));
        assert_eq!(" reddit ".parse::<ScanMode>().ok(), Some(ScanMode::Reddit));
        assert_eq!("BOTH".parse::<ScanMode>().ok(), Some(ScanMode::Both));
        assert!("everything".parse::<ScanMode>().is_err());
        assert_eq!(ScanMode::default(), ScanMode::Both);
    }

    #[test]
    fn mode_source_coverage() {
        assert!(ScanMode::Both.includes_reddit() && ScanMode::Both.includes_sherlock());
        assert!(!ScanMode::Sherlock.includes_reddit());
        assert!(!ScanMode::Reddit.includes_sherlock());
    }

    #[test]
    fn keys_are_deterministic_per_target_and_mode() {
        assert_eq!(ScanKey::new("u", ScanMode::Both).as_str(), "u:both");
        assert_eq!(
            ScanKey::new("  JohnDoe ", ScanMode::Reddit),
            ScanKey::new("johndoe", ScanMode::Reddit)
        );
        assert_ne!(
            ScanKey::new("johndoe", ScanMode::Reddit),
            ScanKey::new("johndoe", ScanMode::Sherlock)
        );
    }
}

//! Search configuration

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::types::ConfigError;
use crate::{DEFAULT_CONCURRENCY, DEFAULT_LENGTH, DEFAULT_PASSES, DEFAULT_PLACEHOLDER};

/// Target architecture, selects the tracer module build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Architecture {
    X86,
    X64,
}

impl Architecture {
    /// Pin object directory holding the tracer for this architecture
    pub fn object_dir(&self) -> &'static str {
        match self {
            Architecture::X86 => "obj-ia32",
            Architecture::X64 => "obj-intel64",
        }
    }

    /// Pointer width in bits
    pub fn bits(&self) -> u8 {
        match self {
            Architecture::X86 => 32,
            Architecture::X64 => 64,
        }
    }
}

impl FromStr for Architecture {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "32" => Ok(Architecture::X86),
            "64" => Ok(Architecture::X64),
            other => Err(ConfigError::UnknownArchitecture(other.to_string())),
        }
    }
}

impl std::fmt::Display for Architecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.bits())
    }
}

/// How the candidate reaches the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    /// Written to stdin followed by a newline
    #[default]
    Stdin,
    /// Appended as the last process argument
    Argv,
}

/// Order in which positions are visited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Forward,
    /// Start from the last character
    Reverse,
}

/// What happens when no candidate is accepted at a position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOrder {
    /// Target checks characters in ascending order: a miss is fatal
    #[default]
    Strict,
    /// Target checks in some other order: leave the slot and move on
    BestEffort,
}

/// End of the buffer the known seed occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    #[default]
    Prefix,
    Suffix,
}

/// Everything the search engine needs besides the oracle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Secret length, fixed for the whole solve
    pub length: usize,
    /// Known characters of the secret
    pub seed: String,
    /// End the seed occupies
    pub anchor: Anchor,
    /// Stand-in for unresolved characters
    pub placeholder: char,
    pub direction: Direction,
    pub order: MatchOrder,
    /// Probes in flight per position
    pub concurrency: usize,
    /// Passes over unresolved slots, best-effort mode only
    pub passes: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            length: DEFAULT_LENGTH,
            seed: String::new(),
            anchor: Anchor::Prefix,
            placeholder: DEFAULT_PLACEHOLDER,
            direction: Direction::Forward,
            order: MatchOrder::Strict,
            concurrency: DEFAULT_CONCURRENCY,
            passes: DEFAULT_PASSES,
        }
    }
}

impl SolverConfig {
    /// Config for a secret of the given length, defaults elsewhere
    pub fn with_length(length: usize) -> Self {
        Self { length, ..Self::default() }
    }

    /// Check the combination before any probe runs
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.length == 0 {
            return Err(ConfigError::ZeroLength);
        }
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.passes == 0 {
            return Err(ConfigError::ZeroPasses);
        }
        let seed_len = self.seed.chars().count();
        if seed_len >= self.length {
            return Err(ConfigError::SeedTooLong { seed_len, length: self.length });
        }
        Ok(())
    }
}

/// Parse a placeholder argument, which must be exactly one character
pub fn parse_placeholder(s: &str) -> Result<char, ConfigError> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(ConfigError::InvalidPlaceholder(s.to_string())),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_architecture_from_str() {
        assert_eq!("32".parse::<Architecture>(), Ok(Architecture::X86));
        assert_eq!("64".parse::<Architecture>(), Ok(Architecture::X64));
        assert_eq!(
            "arm".parse::<Architecture>(),
            Err(ConfigError::UnknownArchitecture("arm".to_string()))
        );
    }

    #[test]
    fn test_architecture_object_dir() {
        assert_eq!(Architecture::X86.object_dir(), "obj-ia32");
        assert_eq!(Architecture::X64.object_dir(), "obj-intel64");
        assert_eq!(Architecture::X64.to_string(), "64");
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(SolverConfig::default().validate().is_ok());
    }

    #[test]
    fn test_seed_must_be_shorter_than_length() {
        let config = SolverConfig { seed: "CTF{".to_string(), ..SolverConfig::with_length(4) };
        assert_eq!(
            config.validate(),
            Err(ConfigError::SeedTooLong { seed_len: 4, length: 4 })
        );

        let config = SolverConfig { seed: "CTF".to_string(), ..SolverConfig::with_length(4) };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_values_rejected() {
        assert_eq!(SolverConfig::with_length(0).validate(), Err(ConfigError::ZeroLength));

        let config = SolverConfig { concurrency: 0, ..SolverConfig::default() };
        assert_eq!(config.validate(), Err(ConfigError::ZeroConcurrency));

        let config = SolverConfig { passes: 0, ..SolverConfig::default() };
        assert_eq!(config.validate(), Err(ConfigError::ZeroPasses));
    }

    #[test]
    fn test_parse_placeholder() {
        assert_eq!(parse_placeholder("-"), Ok('-'));
        assert_eq!(parse_placeholder("é"), Ok('é'));
        assert!(parse_placeholder("").is_err());
        assert!(parse_placeholder("--").is_err());
    }
}

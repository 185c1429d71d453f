//! Error taxonomy
//!
//! Configuration errors are raised before any probing starts. Oracle errors
//! are fatal on a baseline probe and downgraded to a rejection on a candidate
//! probe. Solve errors are what the engine hands back to the caller.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Invalid user configuration, detected at startup
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid comparator expression '{0}', expected '<operator> <integer>'")]
    InvalidExpression(String),

    #[error("Unknown comparator operator '{0}'")]
    UnknownOperator(String),

    #[error("Unknown architecture '{0}', expected 32 or 64")]
    UnknownArchitecture(String),

    #[error("Unknown charset '{0}'")]
    UnknownCharset(String),

    #[error("The charset is empty")]
    EmptyAlphabet,

    #[error("Only one placeholder symbol is allowed, got '{0}'")]
    InvalidPlaceholder(String),

    #[error("The secret length must be at least 1")]
    ZeroLength,

    #[error("The concurrency ceiling must be at least 1")]
    ZeroConcurrency,

    #[error("At least one search pass is required")]
    ZeroPasses,

    #[error("The initial characters ({seed_len}) must be fewer than the secret length ({length})")]
    SeedTooLong { seed_len: usize, length: usize },

    #[error("File does not exist: {}", .0.display())]
    TargetNotFound(PathBuf),
}

/// Failure to obtain a metric from the backend
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("Failed to launch the instrumentation driver: {0}")]
    Launch(#[source] std::io::Error),

    #[error("Failed to feed the candidate on stdin: {0}")]
    Stdin(#[source] std::io::Error),

    #[error("Failed to wait for the instrumentation driver: {0}")]
    Wait(#[source] std::io::Error),

    #[error("Instrumentation driver exited abnormally: {0}")]
    AbnormalExit(String),

    #[error("No output artifact at {}", .0.display())]
    MissingArtifact(PathBuf),

    #[error("Failed to read artifact {}: {source}", .path.display())]
    Artifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unparsable artifact content '{0}'")]
    Unparsable(String),

    #[error("Probe timed out after {0:?}")]
    Timeout(Duration),

    #[error("Probe cancelled")]
    Cancelled,

    #[error("Failed to prepare the artifact directory: {0}")]
    Workspace(#[source] std::io::Error),
}

impl OracleError {
    /// Did the probe stop because somebody asked it to?
    pub fn is_cancelled(&self) -> bool {
        matches!(self, OracleError::Cancelled)
    }
}

/// Terminal failure of a solve
#[derive(Error, Debug)]
pub enum SolveError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Baseline probe failed at position {position}: {source}")]
    Baseline {
        position: usize,
        #[source]
        source: OracleError,
    },

    #[error("Password not found at position {position} (partial: {partial}), try changing charsets")]
    Exhausted { position: usize, partial: String },

    #[error("Interrupted (partial: {partial})")]
    Interrupted { partial: String },
}

impl SolveError {
    /// Partially resolved buffer, when the failure happened mid-search
    pub fn partial(&self) -> Option<&str> {
        match self {
            SolveError::Exhausted { partial, .. } | SolveError::Interrupted { partial } => {
                Some(partial)
            }
            _ => None,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_too_long_message() {
        let err = ConfigError::SeedTooLong { seed_len: 5, length: 4 };
        assert!(err.to_string().contains("(5)"));
        assert!(err.to_string().contains("(4)"));
    }

    #[test]
    fn test_config_error_converts_into_solve_error() {
        let err: SolveError = ConfigError::ZeroLength.into();
        assert!(matches!(err, SolveError::Config(ConfigError::ZeroLength)));
        assert_eq!(err.partial(), None);
    }

    #[test]
    fn test_exhausted_carries_partial_buffer() {
        let err = SolveError::Exhausted { position: 2, partial: "ab---".to_string() };
        assert_eq!(err.partial(), Some("ab---"));
    }

    #[test]
    fn test_cancelled_is_recognised() {
        assert!(OracleError::Cancelled.is_cancelled());
        assert!(!OracleError::Unparsable("x".into()).is_cancelled());
    }
}

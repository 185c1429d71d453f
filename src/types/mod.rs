//! Core types for Pintool

mod error;
mod config;
mod probe;
mod buffer;
mod report;

pub use error::{ConfigError, OracleError, SolveError};
pub use config::{Architecture, InputMode, Direction, MatchOrder, Anchor, SolverConfig, parse_placeholder};
pub use probe::{ProbeRequest, ProbeResult, Resolution};
pub use buffer::SecretBuffer;
pub use report::{PositionReport, SolveReport, LengthSample};

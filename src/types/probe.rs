//! Probe requests and their results

use serde::{Deserialize, Serialize};

/// One guess to run through the oracle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeRequest {
    /// Slot being guessed
    pub position: usize,
    /// Symbol substituted at that slot
    pub symbol: char,
    /// Full candidate value handed to the target
    pub value: String,
}

impl ProbeRequest {
    pub fn new(position: usize, symbol: char, value: impl Into<String>) -> Self {
        Self { position, symbol, value: value.into() }
    }

    /// Probe for the length detector: `length` copies of the placeholder.
    /// No slot is being guessed; position and symbol only name the artifact.
    pub fn for_length(length: usize, placeholder: char) -> Self {
        Self {
            position: 0,
            symbol: placeholder,
            value: std::iter::repeat(placeholder).take(length).collect(),
        }
    }
}

/// Metric of one candidate against the position baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub symbol: char,
    pub metric: i64,
    pub baseline: i64,
    /// metric - baseline
    pub delta: i64,
}

impl ProbeResult {
    /// `None` when the difference does not fit in an `i64`
    pub fn new(symbol: char, metric: i64, baseline: i64) -> Option<Self> {
        let delta = metric.checked_sub(baseline)?;
        Some(Self { symbol, metric, baseline, delta })
    }
}

/// Outcome of one position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "symbol", rename_all = "snake_case")]
pub enum Resolution {
    Resolved(char),
    Unresolved,
}

impl Resolution {
    pub fn symbol(&self) -> Option<char> {
        match self {
            Resolution::Resolved(c) => Some(*c),
            Resolution::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }
}

// =============================================================================
// TESTS
// =============================================================================

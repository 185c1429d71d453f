//! Reports produced by the engine and the length detector

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::{Deserialize, Serialize};

use crate::types::Resolution;

/// What happened at one position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionReport {
    pub position: usize,
    /// Metric with the placeholder at this position
    pub baseline: i64,
    pub resolution: Resolution,
    /// Delta of the accepted candidate
    pub accepted_delta: Option<i64>,
    /// Candidate probes that reached the oracle
    pub launched: usize,
    /// Candidate probes that failed and were counted as rejections
    pub failed: usize,
}

/// Result of a full solve
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveReport {
    /// Rendered buffer, placeholders left where unresolved
    pub secret: String,
    pub length: usize,
    /// Every slot resolved
    pub complete: bool,
    /// Slots left as placeholder (best-effort only)
    pub unresolved: Vec<usize>,
    /// Passes actually run
    pub passes: usize,
    pub baseline_probes: usize,
    pub candidate_probes: usize,
    pub positions: Vec<PositionReport>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SolveReport {
    /// Total oracle invocations
    pub fn total_probes(&self) -> usize {
        self.baseline_probes + self.candidate_probes
    }

    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        let secret = if self.complete {
            self.secret.green().bold()
        } else {
            self.secret.yellow().bold()
        };
        let mut out = format!("Password: {}", secret);
        if !self.complete {
            out.push_str(&format!(
                "\n{}",
                format!("Unresolved positions: {:?}", self.unresolved).yellow()
            ));
        }
        out.push_str(&format!(
            "\n{}",
            format!(
                "{} probes ({} baseline, {} candidate) in {:.1}s",
                self.total_probes(),
                self.baseline_probes,
                self.candidate_probes,
                self.elapsed_secs()
            )
            .dimmed()
        ));
        out
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        format!("Password: {}", self.secret)
    }

    pub fn elapsed_secs(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }
}

/// One row of the length sweep
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthSample {
    pub length: usize,
    /// Placeholder string probed
    pub value: String,
    pub metric: i64,
    /// Difference from the first sample
    pub delta: i64,
}

impl std::fmt::Display for LengthSample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} = with {} characters difference {} instructions",
            self.value, self.length, self.delta
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================

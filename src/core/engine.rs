//! Search engine: walks the buffer and commits one symbol per position
//!
//! States:
//! - Scanning(i) → ResolvingPosition(i): run the position solver at i
//! - ResolvingPosition(i) → Scanning(next): symbol committed
//! - ResolvingPosition(i) → Failure: nothing accepted, strict order
//! - ResolvingPosition(i) → Scanning(next): nothing accepted, best-effort;
//!   the slot stays a placeholder
//! - Scanning → Success: every slot resolved
//!
//! Commitments are permanent. Positions are resolved strictly one after the
//! other; a position's probes have all settled before the next one starts.

use chrono::Utc;
use log::{info, warn};
use tokio_util::sync::CancellationToken;

use crate::core::{Comparator, Oracle, PositionSolver};
use crate::types::{
    ConfigError, MatchOrder, SecretBuffer, SolveError, SolveReport, SolverConfig,
};

/// Drives the position solver over the whole secret
#[derive(Debug, Clone)]
pub struct SearchEngine {
    config: SolverConfig,
    alphabet: Vec<char>,
    comparator: Comparator,
    shutdown: CancellationToken,
}

impl SearchEngine {
    /// Validate the configuration up front; nothing is probed here
    pub fn new(
        config: SolverConfig,
        alphabet: Vec<char>,
        comparator: Comparator,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if alphabet.is_empty() {
            return Err(ConfigError::EmptyAlphabet);
        }
        Ok(Self { config, alphabet, comparator, shutdown: CancellationToken::new() })
    }

    /// Abort the search when `token` is cancelled
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn alphabet(&self) -> &[char] {
        &self.alphabet
    }

    /// Recover the secret.
    ///
    /// Strict order fails with [`SolveError::Exhausted`] at the first
    /// position without an accepted symbol. Best-effort order returns the
    /// buffer with placeholders left where nothing was accepted.
    pub async fn solve<O: Oracle>(&self, oracle: &O) -> Result<SolveReport, SolveError> {
        let c = &self.config;
        let started_at = Utc::now();
        let mut buffer = SecretBuffer::new(c.length, &c.seed, c.anchor, c.placeholder)?;
        let solver = PositionSolver::new(&self.alphabet, self.comparator, c.concurrency);

        let mut positions = Vec::new();
        let mut passes = 0;

        while passes < c.passes && !buffer.is_complete() {
            passes += 1;
            let pending = buffer.pending(c.direction);
            if passes > 1 {
                info!("Pass {}: {} positions left", passes, pending.len());
            }

            let mut committed = 0;
            for position in pending {
                let report = solver.solve(oracle, &buffer, position, &self.shutdown).await?;
                let resolved = report.resolution.symbol();
                positions.push(report);

                match resolved {
                    Some(symbol) => {
                        buffer.commit(position, symbol);
                        committed += 1;
                        info!("{}", buffer);
                    }
                    None => match c.order {
                        MatchOrder::Strict => {
                            return Err(SolveError::Exhausted {
                                position,
                                partial: buffer.to_string(),
                            });
                        }
                        MatchOrder::BestEffort => {
                            warn!("No symbol accepted at position {}, moving on", position);
                        }
                    },
                }
            }

            if committed == 0 {
                break;
            }
        }

        // Let just-cancelled probes finish settling before handing back
        tokio::task::yield_now().await;

        let baseline_probes = positions.len();
        let candidate_probes = positions.iter().map(|p| p.launched).sum();
        Ok(SolveReport {
            secret: buffer.to_string(),
            length: buffer.len(),
            complete: buffer.is_complete(),
            unresolved: buffer.unresolved(),
            passes,
            baseline_probes,
            candidate_probes,
            positions,
            started_at,
            finished_at: Utc::now(),
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

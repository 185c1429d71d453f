//! Position solver: races one probe per alphabet symbol at a single slot
//!
//! 1. Baseline: probe with the placeholder at the slot.
//! 2. Launch a probe per symbol, at most `concurrency` in flight.
//! 3. Evaluate results in completion order: delta = metric - baseline.
//! 4. First accepted delta wins; everything else is cancelled and drained
//!    before returning, so no late result can reach the next position.

use futures_util::stream::{FuturesUnordered, StreamExt};
use log::{debug, warn};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::core::{Comparator, Oracle};
use crate::types::{OracleError, PositionReport, ProbeResult, Resolution, SecretBuffer, SolveError};

/// Result of one racing probe
enum Outcome {
    /// Never got an admission slot before cancellation
    Skipped,
    Finished(char, Result<i64, OracleError>),
}

/// Resolves one position of the buffer
#[derive(Debug)]
pub struct PositionSolver<'a> {
    alphabet: &'a [char],
    comparator: Comparator,
    concurrency: usize,
}

impl<'a> PositionSolver<'a> {
    pub fn new(alphabet: &'a [char], comparator: Comparator, concurrency: usize) -> Self {
        Self { alphabet, comparator, concurrency: concurrency.max(1) }
    }

    /// Find the symbol at `position`.
    ///
    /// `buffer` is a read-only snapshot; the caller commits the winner.
    /// `shutdown` aborts the whole search when cancelled.
    pub async fn solve<O: Oracle>(
        &self,
        oracle: &O,
        buffer: &SecretBuffer,
        position: usize,
        shutdown: &CancellationToken,
    ) -> Result<PositionReport, SolveError> {
        let interrupted = || SolveError::Interrupted { partial: buffer.to_string() };

        let baseline_request = buffer.baseline(position);
        let baseline = match oracle.probe(&baseline_request, shutdown).await {
            Ok(metric) => metric,
            Err(OracleError::Cancelled) => return Err(interrupted()),
            Err(source) => return Err(SolveError::Baseline { position, source }),
        };
        debug!("{} = {} (baseline)", baseline_request.value, baseline);

        // Child token: cancelling losers leaves the shutdown token alone
        let race = shutdown.child_token();
        let gate = Semaphore::new(self.concurrency);

        let mut probes: FuturesUnordered<_> = self
            .alphabet
            .iter()
            .map(|&symbol| {
                let request = buffer.request(position, symbol);
                let race = &race;
                let gate = &gate;
                async move {
                    // Cancellation wins over admission for queued probes
                    let permit = tokio::select! {
                        biased;
                        _ = race.cancelled() => return Outcome::Skipped,
                        permit = gate.acquire() => permit,
                    };
                    let Ok(_permit) = permit else {
                        return Outcome::Skipped;
                    };
                    // Permit is held until the probe has fully settled
                    let result = oracle.probe(&request, race).await;
                    if let Ok(metric) = &result {
                        debug!(
                            "{} = {} difference {} instructions",
                            request.value,
                            metric,
                            metric.saturating_sub(baseline)
                        );
                    }
                    Outcome::Finished(symbol, result)
                }
            })
            .collect();

        let mut report = PositionReport {
            position,
            baseline,
            resolution: Resolution::Unresolved,
            accepted_delta: None,
            launched: 0,
            failed: 0,
        };

        while let Some(outcome) = probes.next().await {
            let Outcome::Finished(symbol, result) = outcome else {
                continue;
            };
            report.launched += 1;
            match result {
                Ok(metric) => match ProbeResult::new(symbol, metric, baseline) {
                    Some(result) if self.comparator.accept(result.delta) => {
                        report.resolution = Resolution::Resolved(symbol);
                        report.accepted_delta = Some(result.delta);
                        race.cancel();
                        break;
                    }
                    Some(_) => {}
                    None => {
                        report.failed += 1;
                        warn!(
                            "Probe '{}' at position {} rejected: difference {} - {} out of range",
                            symbol, position, metric, baseline
                        );
                    }
                },
                Err(OracleError::Cancelled) => {}
                Err(e) => {
                    report.failed += 1;
                    warn!("Probe '{}' at position {} rejected: {}", symbol, position, e);
                }
            }
        }

        // Drain: losers observe the cancellation, kill and reap their
        // processes, and release their permits. Their results are discarded.
        let mut discarded = 0usize;
        while let Some(outcome) = probes.next().await {
            if let Outcome::Finished(..) = outcome {
                discarded += 1;
            }
        }
        if discarded > 0 {
            debug!("Discarded {} losing probes at position {}", discarded, position);
        }
        report.launched += discarded;

        if shutdown.is_cancelled() && !report.resolution.is_resolved() {
            return Err(interrupted());
        }
        Ok(report)
    }
}

// =============================================================================
// TESTS
// =============================================================================

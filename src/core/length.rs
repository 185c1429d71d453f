//! Length detector: linear sweep over candidate lengths
//!
//! Probes `placeholder * n` for n = 1..=max, one at a time, and reports each
//! metric relative to the first sample. It decides nothing; a jump in the
//! delta column usually marks the real length.

use tokio_util::sync::CancellationToken;

use crate::core::Oracle;
use crate::types::{LengthSample, OracleError, ProbeRequest};

#[derive(Debug, Clone)]
pub struct LengthDetector {
    placeholder: char,
    cancel: CancellationToken,
}

impl LengthDetector {
    pub fn new(placeholder: char) -> Self {
        Self { placeholder, cancel: CancellationToken::new() }
    }

    /// Stop the sweep when `token` is cancelled
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Probe every length from 1 to `max_len`, calling `on_sample` as each
    /// row arrives
    pub async fn detect<O, F>(
        &self,
        oracle: &O,
        max_len: usize,
        mut on_sample: F,
    ) -> Result<Vec<LengthSample>, OracleError>
    where
        O: Oracle,
        F: FnMut(&LengthSample),
    {
        let mut samples = Vec::with_capacity(max_len);
        let mut initial = None;

        for length in 1..=max_len {
            let request = ProbeRequest::for_length(length, self.placeholder);
            let metric = oracle.probe(&request, &self.cancel).await?;
            let first = *initial.get_or_insert(metric);

            let delta = metric.saturating_sub(first);
            let sample = LengthSample { length, value: request.value, metric, delta };
            on_sample(&sample);
            samples.push(sample);
        }
        Ok(samples)
    }
}

// =============================================================================
// TESTS
// =============================================================================

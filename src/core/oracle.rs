//! Oracle: anything that turns a candidate value into an integer metric
//!
//! The engine only relies on this trait. The Pin-backed implementation lives
//! in `pin.rs`; tests use in-memory oracles.

use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_util::sync::CancellationToken;

use crate::types::{OracleError, ProbeRequest};

/// Source of the side-channel metric.
///
/// Implementations must tolerate many concurrent calls. When `cancel` fires
/// the call must stop its backend work (kill and reap any process) and
/// return [`OracleError::Cancelled`].
#[allow(async_fn_in_trait)]
pub trait Oracle {
    async fn probe(
        &self,
        request: &ProbeRequest,
        cancel: &CancellationToken,
    ) -> Result<i64, OracleError>;
}

impl<O: Oracle + ?Sized> Oracle for &O {
    async fn probe(
        &self,
        request: &ProbeRequest,
        cancel: &CancellationToken,
    ) -> Result<i64, OracleError> {
        (**self).probe(request, cancel).await
    }
}

/// Synchronous oracle backed by a function of the candidate value
pub struct FnOracle<F> {
    f: F,
}

impl<F> FnOracle<F>
where
    F: Fn(&str) -> Result<i64, OracleError>,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Oracle for FnOracle<F>
where
    F: Fn(&str) -> Result<i64, OracleError>,
{
    async fn probe(
        &self,
        request: &ProbeRequest,
        cancel: &CancellationToken,
    ) -> Result<i64, OracleError> {
        if cancel.is_cancelled() {
            return Err(OracleError::Cancelled);
        }
        (self.f)(&request.value)
    }
}

/// Wraps an oracle and counts what happens to its calls
#[derive(Debug)]
pub struct CountingOracle<O> {
    oracle: O,
    calls: AtomicUsize,
    failures: AtomicUsize,
    cancellations: AtomicUsize,
}

impl<O: Oracle> CountingOracle<O> {
    pub fn new(oracle: O) -> Self {
        Self {
            oracle,
            calls: AtomicUsize::new(0),
            failures: AtomicUsize::new(0),
            cancellations: AtomicUsize::new(0),
        }
    }

    /// Calls that reached the wrapped oracle
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Calls that failed for a reason other than cancellation
    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::SeqCst)
    }

    /// Calls that ended because they were cancelled
    pub fn cancellations(&self) -> usize {
        self.cancellations.load(Ordering::SeqCst)
    }
}

impl<O: Oracle> Oracle for CountingOracle<O> {
    async fn probe(
        &self,
        request: &ProbeRequest,
        cancel: &CancellationToken,
    ) -> Result<i64, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = self.oracle.probe(request, cancel).await;
        match &result {
            Err(e) if e.is_cancelled() => {
                self.cancellations.fetch_add(1, Ordering::SeqCst);
            }
            Err(_) => {
                self.failures.fetch_add(1, Ordering::SeqCst);
            }
            Ok(_) => {}
        }
        result
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn length_oracle() -> FnOracle<impl Fn(&str) -> Result<i64, OracleError>> {
        FnOracle::new(|value: &str| Ok(value.len() as i64 * 10))
    }

    #[tokio::test]
    async fn test_fn_oracle_probe() {
        let oracle = length_oracle();
        let token = CancellationToken::new();
        let metric = oracle.probe(&ProbeRequest::new(0, 'a', "abc"), &token).await.unwrap();
        assert_eq!(metric, 30);
    }

    #[tokio::test]
    async fn test_fn_oracle_honours_cancellation() {
        let oracle = length_oracle();
        let token = CancellationToken::new();
        token.cancel();
        let result = oracle.probe(&ProbeRequest::new(0, 'a', "abc"), &token).await;
        assert!(matches!(result, Err(OracleError::Cancelled)));
    }

    #[tokio::test]
    async fn test_counting_oracle() {
        let oracle = CountingOracle::new(FnOracle::new(|value: &str| {
            if value == "bad" {
                Err(OracleError::Unparsable(String::new()))
            } else {
                Ok(1)
            }
        }));
        let live = CancellationToken::new();
        let dead = CancellationToken::new();
        dead.cancel();

        oracle.probe(&ProbeRequest::new(0, 'a', "ok"), &live).await.unwrap();
        assert!(oracle.probe(&ProbeRequest::new(0, 'b', "bad"), &live).await.is_err());
        assert!(oracle.probe(&ProbeRequest::new(0, 'c', "ok"), &dead).await.is_err());

        assert_eq!(oracle.calls(), 3);
        assert_eq!(oracle.failures(), 1);
        assert_eq!(oracle.cancellations(), 1);
    }

    #[tokio::test]
    async fn test_reference_is_an_oracle() {
        let oracle = length_oracle();
        let by_ref = &oracle;
        let token = CancellationToken::new();
        assert_eq!(by_ref.probe(&ProbeRequest::new(0, 'a', "ab"), &token).await.unwrap(), 20);
    }
}

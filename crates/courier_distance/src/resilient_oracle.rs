use std::{future::Future, time::Duration};

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::{
    google_maps_api::MAX_DESTINATIONS_PER_REQUEST,
    oracle::{DistanceOracle, DistanceResult, OracleError},
};

#[derive(Clone, Debug)]
pub struct OracleParams {
    /// Applied to every single request, a timeout counts as a transient error.
    pub timeout: Duration,
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// Upper bound of requests in flight against the provider.
    pub max_concurrent_requests: usize,
    /// Destinations per batched request. Each batch is one request and holds one permit.
    pub max_batch_size: usize,
}

impl Default for OracleParams {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
            max_concurrent_requests: 8,
            max_batch_size: MAX_DESTINATIONS_PER_REQUEST,
        }
    }
}

impl OracleParams {
    /// Exponential backoff before retry number `attempt + 1`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_backoff)
    }
}

/// Wraps an oracle with per-request timeouts, bounded retries of transient errors
/// and a global cap on concurrent requests.
pub struct ResilientOracle<O> {
    inner: O,
    params: OracleParams,
    permits: Semaphore,
}

impl<O: DistanceOracle> ResilientOracle<O> {
    pub fn new(inner: O, params: OracleParams) -> Self {
        let permits = Semaphore::new(params.max_concurrent_requests.max(1));
        Self {
            inner,
            params,
            permits,
        }
    }

    pub fn inner(&self) -> &O {
        &self.inner
    }

    pub fn params(&self) -> &OracleParams {
        &self.params
    }

    async fn limited<T, Fut>(&self, call: Fut) -> Result<T, OracleError>
    where
        Fut: Future<Output = T>,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| OracleError::Failure(String::from("oracle is shut down")))?;

        tokio::time::timeout(self.params.timeout, call)
            .await
            .map_err(|_| {
                OracleError::Transient(format!("timed out after {:?}", self.params.timeout))
            })
    }

    /// `first` is the outcome of an attempt already made elsewhere, it counts as
    /// attempt zero.
    async fn with_retries<F, Fut>(
        &self,
        origin: &str,
        destination: &str,
        first: Option<DistanceResult>,
        mut call: F,
    ) -> DistanceResult
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = DistanceResult>,
    {
        let mut result = match first {
            Some(result) => result,
            None => self.limited(call()).await.and_then(|result| result),
        };

        let mut attempt = 0;
        loop {
            match result {
                Err(error) if error.is_transient() => {
                    if attempt >= self.params.max_retries {
                        warn!(
                            origin,
                            destination,
                            "ResilientOracle: giving up after {} attempts: {}",
                            attempt + 1,
                            error
                        );
                        return Err(error.into_failure());
                    }

                    let backoff = self.params.backoff(attempt);
                    debug!(
                        origin,
                        destination,
                        "ResilientOracle: retrying in {:?} ({})",
                        backoff,
                        error
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;

                    result = self.limited(call()).await.and_then(|result| result);
                }
                other => return other,
            }
        }
    }

    async fn batch(&self, origin: &str, destinations: &[&str]) -> Vec<DistanceResult> {
        match self
            .limited(self.inner.distance_matrix(origin, destinations))
            .await
        {
            Ok(results) if results.len() == destinations.len() => results,
            Ok(results) => {
                let error = OracleError::Transient(format!(
                    "matrix returned {} entries for {} destinations",
                    results.len(),
                    destinations.len()
                ));
                vec![Err(error); destinations.len()]
            }
            Err(error) => vec![Err(error); destinations.len()],
        }
    }
}

impl<O: DistanceOracle> DistanceOracle for ResilientOracle<O> {
    async fn distance(&self, origin: &str, destination: &str) -> DistanceResult {
        self.with_retries(origin, destination, None, || {
            self.inner.distance(origin, destination)
        })
        .await
    }

    /// Issues one batched request per `max_batch_size` destinations, then retries
    /// transient entries one pair at a time.
    async fn distance_matrix(&self, origin: &str, destinations: &[&str]) -> Vec<DistanceResult> {
        let batches = join_all(
            destinations
                .chunks(self.params.max_batch_size.max(1))
                .map(|chunk| self.batch(origin, chunk)),
        )
        .await;

        let retried = batches
            .into_iter()
            .flatten()
            .zip(destinations.iter().copied())
            .map(|(result, destination)| {
                self.with_retries(origin, destination, Some(result), move || {
                    self.inner.distance(origin, destination)
                })
            });

        join_all(retried).await
    }
}

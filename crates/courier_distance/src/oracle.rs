use thiserror::Error;

use crate::meters::Meters;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    /// The query may succeed if issued again (network error, timeout, throttling).
    #[error("transient oracle error: {0}")]
    Transient(String),

    /// The distance could not be obtained. Callers must treat the pair as unknown.
    #[error("oracle failure: {0}")]
    Failure(String),
}

impl OracleError {
    pub fn is_transient(&self) -> bool {
        matches!(self, OracleError::Transient(_))
    }

    pub fn into_failure(self) -> OracleError {
        match self {
            OracleError::Transient(message) => {
                OracleError::Failure(format!("retries exhausted: {message}"))
            }
            failure => failure,
        }
    }
}

pub type DistanceResult = Result<Meters, OracleError>;

/// Answers distance queries between addresses, in meters.
///
/// A failed query means the distance is unknown, implementations never
/// substitute a default value. `distance_matrix` must return one entry per
/// destination, in the order of `destinations`.
#[allow(async_fn_in_trait)]
pub trait DistanceOracle {
    async fn distance(&self, origin: &str, destination: &str) -> DistanceResult;

    async fn distance_matrix(&self, origin: &str, destinations: &[&str]) -> Vec<DistanceResult> {
        futures::future::join_all(
            destinations
                .iter()
                .map(|destination| self.distance(origin, destination)),
        )
        .await
    }
}

impl<O: DistanceOracle + ?Sized> DistanceOracle for &O {
    async fn distance(&self, origin: &str, destination: &str) -> DistanceResult {
        (**self).distance(origin, destination).await
    }

    async fn distance_matrix(&self, origin: &str, destinations: &[&str]) -> Vec<DistanceResult> {
        (**self).distance_matrix(origin, destinations).await
    }
}

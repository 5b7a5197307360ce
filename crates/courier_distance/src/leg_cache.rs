use fxhash::FxHashMap;
use parking_lot::Mutex;

use crate::{
    meters::Meters,
    oracle::{DistanceOracle, DistanceResult, OracleError},
};

/// Memoizes successful leg distances for the lifetime of the cache. Failed
/// queries are never cached, a later query asks the inner oracle again.
pub struct LegCache<O> {
    inner: O,
    legs: Mutex<FxHashMap<String, FxHashMap<String, Meters>>>,
}

impl<O: DistanceOracle> LegCache<O> {
    pub fn new(inner: O) -> Self {
        Self {
            inner,
            legs: Mutex::new(FxHashMap::default()),
        }
    }

    pub fn inner(&self) -> &O {
        &self.inner
    }

    pub fn cached(&self, origin: &str, destination: &str) -> Option<Meters> {
        self.legs
            .lock()
            .get(origin)
            .and_then(|row| row.get(destination))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.legs.lock().values().map(|row| row.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn store(&self, origin: &str, destination: &str, distance: Meters) {
        self.legs
            .lock()
            .entry(origin.to_owned())
            .or_default()
            .insert(destination.to_owned(), distance);
    }
}

impl<O: DistanceOracle> DistanceOracle for LegCache<O> {
    async fn distance(&self, origin: &str, destination: &str) -> DistanceResult {
        if let Some(distance) = self.cached(origin, destination) {
            return Ok(distance);
        }

        let distance = self.inner.distance(origin, destination).await?;
        self.store(origin, destination, distance);

        Ok(distance)
    }

    async fn distance_matrix(&self, origin: &str, destinations: &[&str]) -> Vec<DistanceResult> {
        let mut results: Vec<Option<DistanceResult>> = destinations
            .iter()
            .map(|destination| self.cached(origin, destination).map(Ok))
            .collect();

        let missing: Vec<usize> = results
            .iter()
            .enumerate()
            .filter(|(_, result)| result.is_none())
            .map(|(index, _)| index)
            .collect();

        if !missing.is_empty() {
            let missing_destinations: Vec<&str> =
                missing.iter().map(|&index| destinations[index]).collect();
            let fetched = self
                .inner
                .distance_matrix(origin, &missing_destinations)
                .await;

            for (&index, result) in missing.iter().zip(fetched) {
                if let Ok(distance) = result {
                    self.store(origin, destinations[index], distance);
                }
                results[index] = Some(result);
            }
        }

        destinations
            .iter()
            .zip(results)
            .map(|(destination, result)| {
                result.unwrap_or_else(|| {
                    Err(OracleError::Failure(format!(
                        "no distance returned for {origin} -> {destination}"
                    )))
                })
            })
            .collect()
    }
}

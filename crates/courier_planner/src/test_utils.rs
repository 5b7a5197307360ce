use courier_distance::{
    meters::Meters,
    oracle::{DistanceOracle, DistanceResult, OracleError},
    table_oracle::TableOracle,
};
use fxhash::FxHashSet;
use parking_lot::Mutex;

use crate::problem::{
    route_assignment_problem::{RouteAssignmentProblem, RouteAssignmentProblemBuilder},
    stop::Stop,
    vehicle::Vehicle,
};

pub const DEPOT: &str = "Depot";

/// Table oracle that records every pair it is asked about and can be told to
/// fail specific pairs.
pub struct RecordingOracle {
    table: TableOracle,
    failing: FxHashSet<(String, String)>,
    queries: Mutex<Vec<(String, String)>>,
}

impl RecordingOracle {
    pub fn new(table: TableOracle) -> Self {
        Self {
            table,
            failing: FxHashSet::default(),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Every pair among `addresses` (depot included) at `distance`, both directions.
    pub fn uniform(addresses: &[&str], distance: f64) -> Self {
        let mut table = TableOracle::new(true);
        let all: Vec<&str> = std::iter::once(DEPOT).chain(addresses.iter().copied()).collect();
        for (i, origin) in all.iter().enumerate() {
            for destination in &all[i + 1..] {
                table.insert(origin, destination, Meters::new(distance));
            }
        }
        Self::new(table)
    }

    pub fn failing(mut self, origin: &str, destination: &str) -> Self {
        self.failing
            .insert((origin.to_owned(), destination.to_owned()));
        self
    }

    pub fn queries(&self) -> Vec<(String, String)> {
        self.queries.lock().clone()
    }

    pub fn mentions(&self, address: &str) -> bool {
        self.queries
            .lock()
            .iter()
            .any(|(origin, destination)| origin == address || destination == address)
    }
}

impl DistanceOracle for RecordingOracle {
    async fn distance(&self, origin: &str, destination: &str) -> DistanceResult {
        self.queries
            .lock()
            .push((origin.to_owned(), destination.to_owned()));

        if self
            .failing
            .contains(&(origin.to_owned(), destination.to_owned()))
        {
            return Err(OracleError::Failure(String::from("mocked failure")));
        }

        self.table.distance(origin, destination).await
    }
}

pub fn create_stops(stops: &[(&str, f64)]) -> Vec<Stop> {
    stops
        .iter()
        .map(|&(address, weight)| Stop::new(address, weight))
        .collect()
}

pub fn create_vehicles(capacities: &[f64]) -> Vec<Vehicle> {
    capacities
        .iter()
        .enumerate()
        .map(|(index, &capacity)| Vehicle::new(format!("v{}", index + 1), capacity))
        .collect()
}

pub fn create_test_problem(stops: Vec<Stop>, vehicles: Vec<Vehicle>) -> RouteAssignmentProblem {
    let mut builder = RouteAssignmentProblemBuilder::default();
    builder
        .set_depot(DEPOT)
        .set_stops(stops)
        .set_vehicles(vehicles);
    builder.build().unwrap()
}

pub fn addresses(stops: &[Stop]) -> Vec<&str> {
    stops.iter().map(|stop| stop.address()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_oracle_records_and_fails() {
        let oracle = RecordingOracle::uniform(&["A", "B"], 10.0).failing(DEPOT, "B");

        assert_eq!(oracle.distance(DEPOT, "A").await, Ok(Meters::new(10.0)));
        assert!(oracle.distance(DEPOT, "B").await.is_err());
        assert_eq!(oracle.distance("B", "A").await, Ok(Meters::new(10.0)));

        assert_eq!(oracle.queries().len(), 3);
        assert!(oracle.mentions("B"));
        assert!(!oracle.mentions("C"));
    }
}

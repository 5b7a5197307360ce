use courier_distance::meters::Meters;
use schemars::JsonSchema;
use serde::Serialize;

use crate::problem::{stop::Stop, vehicle::Vehicle};

#[derive(Serialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UnassignedReason {
    /// No vehicle had room left, or every route ended before reaching the stop.
    CapacityOrDistanceUnreachable,
    /// The stop is heavier than the largest vehicle capacity.
    WeightExceedsAllCapacities,
    /// The computation deadline passed before the stop was evaluated.
    DeadlineExceeded,
}

#[derive(Serialize, JsonSchema, Debug, Clone, PartialEq)]
pub struct UnassignedStop {
    pub stop: Stop,
    pub reason: UnassignedReason,
}

/// An oracle failure absorbed during the computation.
#[derive(Serialize, JsonSchema, Debug, Clone, PartialEq, Eq, Hash)]
pub struct OracleWarning {
    pub origin: String,
    pub destination: String,
    pub message: String,
}

/// Best visiting order found by the cluster search among a route's stops.
#[derive(Serialize, JsonSchema, Debug, Clone, PartialEq)]
pub struct ClusterSelection {
    pub stops: Vec<Stop>,
    pub total_distance: Meters,
}

#[derive(Serialize, JsonSchema, Debug, Clone, PartialEq)]
pub struct Route {
    vehicle: Vehicle,
    stops: Vec<Stop>,
    /// `leg_distances[i]` is the distance driven to reach `stops[i]`.
    leg_distances: Vec<Meters>,
    total_weight: f64,
    total_distance: Meters,
    #[serde(skip_serializing_if = "Option::is_none")]
    best_cluster: Option<ClusterSelection>,
}

impl Route {
    pub fn empty(vehicle: Vehicle) -> Self {
        Self {
            vehicle,
            stops: Vec::new(),
            leg_distances: Vec::new(),
            total_weight: 0.0,
            total_distance: Meters::ZERO,
            best_cluster: None,
        }
    }

    pub fn vehicle(&self) -> &Vehicle {
        &self.vehicle
    }

    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    pub fn leg_distances(&self) -> &[Meters] {
        &self.leg_distances
    }

    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    pub fn total_distance(&self) -> Meters {
        self.total_distance
    }

    pub fn best_cluster(&self) -> Option<&ClusterSelection> {
        self.best_cluster.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn last_address(&self) -> Option<&str> {
        self.stops.last().map(|stop| stop.address())
    }

    pub fn fits(&self, stop: &Stop) -> bool {
        self.vehicle.can_carry(self.total_weight + stop.weight())
    }

    pub(crate) fn push(&mut self, stop: Stop, leg_distance: Meters) {
        self.total_weight += stop.weight();
        self.total_distance += leg_distance;
        self.leg_distances.push(leg_distance);
        self.stops.push(stop);
    }

    pub(crate) fn set_best_cluster(&mut self, best_cluster: Option<ClusterSelection>) {
        self.best_cluster = best_cluster;
    }
}

#[derive(Serialize, JsonSchema, Debug, Clone, PartialEq, Default)]
pub struct AssignmentResult {
    pub routes: Vec<Route>,
    pub unassigned: Vec<UnassignedStop>,
    pub warnings: Vec<OracleWarning>,
    /// The deadline passed. Routes only hold what was committed before it, and
    /// routes without a `best_cluster` may not have been searched.
    pub partial: bool,
}

impl AssignmentResult {
    pub fn assigned_count(&self) -> usize {
        self.routes.iter().map(|route| route.len()).sum()
    }

    pub fn total_distance(&self) -> Meters {
        self.routes.iter().map(|route| route.total_distance()).sum()
    }

    pub fn unassigned_reason(&self, address: &str) -> Option<UnassignedReason> {
        self.unassigned
            .iter()
            .find(|unassigned| unassigned.stop.address() == address)
            .map(|unassigned| unassigned.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_accumulates_weight_and_distance() {
        let mut route = Route::empty(Vehicle::new("v1", 500.0));

        route.push(Stop::new("A", 100.0), Meters::new(1000.0));
        route.push(Stop::new("B", 200.0), Meters::new(500.0));

        assert_eq!(route.total_weight(), 300.0);
        assert_eq!(route.total_distance(), Meters::new(1500.0));
        assert_eq!(route.last_address(), Some("B"));
        assert!(route.fits(&Stop::new("C", 200.0)));
        assert!(!route.fits(&Stop::new("C", 200.5)));
    }

    #[test]
    fn test_serialize_reason_snake_case() {
        let json = serde_json::to_string(&UnassignedReason::WeightExceedsAllCapacities).unwrap();
        assert_eq!(json, "\"weight_exceeds_all_capacities\"");
    }
}

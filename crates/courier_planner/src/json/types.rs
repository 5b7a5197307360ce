use std::time::Duration;

use courier_distance::{distance_oracle_provider::DistanceOracleProvider, meters::Meters};
use jiff::SignedDuration;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    error::InvalidInputError,
    planner::planner_params::{ClusterStrategy, PlannerParams, VehicleOrder},
    problem::{
        route_assignment_problem::{RouteAssignmentProblem, RouteAssignmentProblemBuilder},
        stop::Stop,
        vehicle::Vehicle,
    },
};

#[derive(Serialize, Deserialize, JsonSchema, Debug)]
#[serde(deny_unknown_fields, rename = "RouteRequest")]
pub struct JsonRouteRequest {
    /// Address, or "lat,lon", every route starts from.
    pub depot: String,
    pub stops: Vec<JsonStop>,
    pub vehicles: Vec<JsonVehicle>,

    /// Meters, defaults to 35 km.
    pub max_leg_distance: Option<f64>,
    pub cluster_size: Option<usize>,
    pub cluster_strategy: Option<ClusterStrategy>,
    pub cluster_concurrency: Option<usize>,
    pub vehicle_order: Option<VehicleOrder>,
    pub deadline: Option<SignedDuration>,
    pub provider: Option<DistanceOracleProvider>,
}

#[derive(Serialize, Deserialize, JsonSchema, Debug)]
#[serde(deny_unknown_fields, rename = "Stop")]
pub struct JsonStop {
    pub address: String,
    /// Total weight of the sales delivered at this address.
    pub weight: f64,
}

#[derive(Serialize, Deserialize, JsonSchema, Debug)]
#[serde(deny_unknown_fields, rename = "Vehicle")]
pub struct JsonVehicle {
    pub name: String,
    pub capacity: f64,
}

impl From<&JsonStop> for Stop {
    fn from(value: &JsonStop) -> Self {
        Stop::new(value.address.clone(), value.weight)
    }
}

impl From<&JsonVehicle> for Vehicle {
    fn from(value: &JsonVehicle) -> Self {
        Vehicle::new(value.name.clone(), value.capacity)
    }
}

impl JsonRouteRequest {
    pub fn stops(&self) -> Vec<Stop> {
        self.stops.iter().map(Stop::from).collect()
    }

    pub fn build_problem(&self) -> Result<RouteAssignmentProblem, InvalidInputError> {
        let mut builder = RouteAssignmentProblemBuilder::default();
        builder
            .set_depot(self.depot.clone())
            .set_stops(self.stops())
            .set_vehicles(self.vehicles.iter().map(Vehicle::from).collect());

        builder.build()
    }

    /// Missing fields take the [`PlannerParams`] defaults.
    pub fn planner_params(&self) -> Result<PlannerParams, InvalidInputError> {
        let defaults = PlannerParams::default();

        let deadline = self
            .deadline
            .map(|deadline| {
                Duration::try_from(deadline).map_err(|_| InvalidInputError::NegativeDeadline)
            })
            .transpose()?;

        let params = PlannerParams {
            max_leg_distance: self
                .max_leg_distance
                .map(Meters::new)
                .unwrap_or(defaults.max_leg_distance),
            cluster_size: self.cluster_size,
            cluster_strategy: self.cluster_strategy.unwrap_or(defaults.cluster_strategy),
            cluster_concurrency: self
                .cluster_concurrency
                .unwrap_or(defaults.cluster_concurrency),
            vehicle_order: self.vehicle_order.unwrap_or(defaults.vehicle_order),
            deadline,
        };
        params.validate()?;

        Ok(params)
    }
}

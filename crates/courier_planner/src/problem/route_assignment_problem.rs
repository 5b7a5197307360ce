use fxhash::FxHashSet;

use crate::{
    error::InvalidInputError,
    problem::{
        stop::{Stop, StopIdx},
        vehicle::{Vehicle, VehicleIdx},
    },
};

/// Validated input of one route computation.
#[derive(Debug, Clone)]
pub struct RouteAssignmentProblem {
    depot: String,
    stops: Vec<Stop>,
    vehicles: Vec<Vehicle>,
}

impl RouteAssignmentProblem {
    pub fn depot(&self) -> &str {
        &self.depot
    }

    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    pub fn stop(&self, stop_id: StopIdx) -> &Stop {
        &self.stops[stop_id]
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn vehicle(&self, vehicle_id: VehicleIdx) -> &Vehicle {
        &self.vehicles[vehicle_id]
    }
}

#[derive(Default)]
pub struct RouteAssignmentProblemBuilder {
    depot: Option<String>,
    stops: Vec<Stop>,
    vehicles: Vec<Vehicle>,
}

impl RouteAssignmentProblemBuilder {
    pub fn set_depot(&mut self, depot: impl Into<String>) -> &mut Self {
        self.depot = Some(depot.into());
        self
    }

    pub fn set_stops(&mut self, stops: Vec<Stop>) -> &mut Self {
        self.stops = stops;
        self
    }

    pub fn add_stop(&mut self, stop: Stop) -> &mut Self {
        self.stops.push(stop);
        self
    }

    pub fn set_vehicles(&mut self, vehicles: Vec<Vehicle>) -> &mut Self {
        self.vehicles = vehicles;
        self
    }

    pub fn add_vehicle(&mut self, vehicle: Vehicle) -> &mut Self {
        self.vehicles.push(vehicle);
        self
    }

    pub fn build(self) -> Result<RouteAssignmentProblem, InvalidInputError> {
        let depot = self
            .depot
            .filter(|depot| !depot.trim().is_empty())
            .ok_or(InvalidInputError::EmptyDepot)?;

        let mut addresses = FxHashSet::default();
        for (index, stop) in self.stops.iter().enumerate() {
            if stop.address().trim().is_empty() {
                return Err(InvalidInputError::EmptyAddress(index));
            }

            if !stop.weight().is_finite() || stop.weight() < 0.0 {
                return Err(InvalidInputError::InvalidWeight {
                    address: stop.address().to_owned(),
                    weight: stop.weight(),
                });
            }

            if !addresses.insert(stop.address()) {
                return Err(InvalidInputError::DuplicateAddress(
                    stop.address().to_owned(),
                ));
            }
        }

        if self.vehicles.is_empty() {
            return Err(InvalidInputError::NoVehicles);
        }

        let mut names = FxHashSet::default();
        for (index, vehicle) in self.vehicles.iter().enumerate() {
            if vehicle.name().trim().is_empty() {
                return Err(InvalidInputError::EmptyVehicleName(index));
            }

            if !vehicle.capacity().is_finite() || vehicle.capacity() <= 0.0 {
                return Err(InvalidInputError::InvalidCapacity {
                    name: vehicle.name().to_owned(),
                    capacity: vehicle.capacity(),
                });
            }

            if !names.insert(vehicle.name()) {
                return Err(InvalidInputError::DuplicateVehicle(
                    vehicle.name().to_owned(),
                ));
            }
        }

        Ok(RouteAssignmentProblem {
            depot,
            stops: self.stops,
            vehicles: self.vehicles,
        })
    }
}

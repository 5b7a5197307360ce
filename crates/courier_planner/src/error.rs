use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidInputError {
    #[error("Depot address is empty")]
    EmptyDepot,
    #[error("Stop #{0} has an empty address")]
    EmptyAddress(usize),
    #[error("Stop {address} has an invalid weight {weight}")]
    InvalidWeight { address: String, weight: f64 },
    #[error("Stop address {0} appears more than once")]
    DuplicateAddress(String),
    #[error("Vehicle #{0} has an empty name")]
    EmptyVehicleName(usize),
    #[error("Vehicle {name} has an invalid capacity {capacity}")]
    InvalidCapacity { name: String, capacity: f64 },
    #[error("Vehicle name {0} appears more than once")]
    DuplicateVehicle(String),
    #[error("At least one vehicle is required")]
    NoVehicles,
    #[error("Maximum leg distance must be positive, got {0}")]
    InvalidMaxLegDistance(f64),
    #[error("Cluster size must be at least 1")]
    InvalidClusterSize,
    #[error("Cluster concurrency must be at least 1")]
    InvalidClusterConcurrency,
    #[error("Deadline must not be negative")]
    NegativeDeadline,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlannerError {
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

use std::time::Duration;

use courier_distance::meters::Meters;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    error::InvalidInputError,
    problem::vehicle::{Vehicle, VehicleIdx},
};

pub const DEFAULT_MAX_LEG_DISTANCE: Meters = Meters::new(35_000.0);

/// Evaluating clusters of size `k` out of `n` stops costs `C(n, k)` orderings,
/// keep it small.
pub const DEFAULT_CLUSTER_SIZE: usize = 3;

/// Order in which vehicles pick stops. Earlier vehicles get first pick of the
/// closest stops, so the choice changes the assignment.
#[derive(Deserialize, Serialize, JsonSchema, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VehicleOrder {
    #[default]
    AsGiven,
    CapacityDescending,
    CapacityAscending,
}

impl VehicleOrder {
    /// Ties keep the input order.
    pub fn arrange(&self, vehicles: &[Vehicle]) -> Vec<VehicleIdx> {
        let mut order: Vec<VehicleIdx> = VehicleIdx::all(vehicles.len()).collect();

        match self {
            VehicleOrder::AsGiven => {}
            VehicleOrder::CapacityDescending => order.sort_by(|&a, &b| {
                vehicles[b]
                    .capacity()
                    .total_cmp(&vehicles[a].capacity())
            }),
            VehicleOrder::CapacityAscending => order.sort_by(|&a, &b| {
                vehicles[a]
                    .capacity()
                    .total_cmp(&vehicles[b].capacity())
            }),
        }

        order
    }
}

#[derive(Deserialize, Serialize, JsonSchema, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClusterStrategy {
    /// Stops keep their relative input order inside a cluster.
    #[default]
    Combinations,
    /// Every visiting order of every combination, `k!` times more expensive.
    Permutations,
}

#[derive(Clone, Debug)]
pub struct PlannerParams {
    pub max_leg_distance: Meters,
    /// Enables the cluster search over every route with at least this many stops.
    pub cluster_size: Option<usize>,
    pub cluster_strategy: ClusterStrategy,
    /// Cluster orderings evaluated at the same time.
    pub cluster_concurrency: usize,
    pub vehicle_order: VehicleOrder,
    /// Budget for the whole computation, exceeding it yields a partial result.
    pub deadline: Option<Duration>,
}

impl Default for PlannerParams {
    fn default() -> Self {
        Self {
            max_leg_distance: DEFAULT_MAX_LEG_DISTANCE,
            cluster_size: None,
            cluster_strategy: ClusterStrategy::Combinations,
            cluster_concurrency: 4,
            vehicle_order: VehicleOrder::AsGiven,
            deadline: None,
        }
    }
}

impl PlannerParams {
    pub fn validate(&self) -> Result<(), InvalidInputError> {
        let max_leg_distance = self.max_leg_distance.value();
        if max_leg_distance.is_nan() || max_leg_distance <= 0.0 {
            return Err(InvalidInputError::InvalidMaxLegDistance(max_leg_distance));
        }

        if self.cluster_size == Some(0) {
            return Err(InvalidInputError::InvalidClusterSize);
        }

        if self.cluster_concurrency == 0 {
            return Err(InvalidInputError::InvalidClusterConcurrency);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vehicle_order_is_stable() {
        let vehicles = vec![
            Vehicle::new("small", 100.0),
            Vehicle::new("big", 500.0),
            Vehicle::new("small-2", 100.0),
        ];

        assert_eq!(
            VehicleOrder::AsGiven.arrange(&vehicles),
            vec![VehicleIdx::new(0), VehicleIdx::new(1), VehicleIdx::new(2)]
        );
        assert_eq!(
            VehicleOrder::CapacityDescending.arrange(&vehicles),
            vec![VehicleIdx::new(1), VehicleIdx::new(0), VehicleIdx::new(2)]
        );
        assert_eq!(
            VehicleOrder::CapacityAscending.arrange(&vehicles),
            vec![VehicleIdx::new(0), VehicleIdx::new(2), VehicleIdx::new(1)]
        );
    }

    #[test]
    fn test_validate() {
        assert!(PlannerParams::default().validate().is_ok());

        let params = PlannerParams {
            max_leg_distance: Meters::ZERO,
            ..PlannerParams::default()
        };
        assert_eq!(
            params.validate(),
            Err(InvalidInputError::InvalidMaxLegDistance(0.0))
        );

        let params = PlannerParams {
            cluster_size: Some(0),
            ..PlannerParams::default()
        };
        assert_eq!(params.validate(), Err(InvalidInputError::InvalidClusterSize));
    }
}

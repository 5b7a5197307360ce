use courier_distance::{
    meters::Meters,
    oracle::{DistanceOracle, OracleError},
};
use fixedbitset::FixedBitSet;
use tokio::time::Instant;
use tracing::{Level, debug, info, instrument};

use crate::{
    planner::address_ranker::RankedStop,
    problem::{
        assignment::{AssignmentResult, OracleWarning, Route, UnassignedReason, UnassignedStop},
        stop::{Stop, StopIdx},
        vehicle::{Vehicle, VehicleIdx},
    },
};

enum LegOutcome {
    Accepted(Meters),
    TooLong(Meters),
    Unknown(OracleError),
    DeadlineExceeded,
}

/// Splits off stops heavier than every vehicle's capacity. No vehicle will ever
/// carry them, so they never need a distance query.
pub fn split_unservable(
    stops: &[Stop],
    candidates: impl IntoIterator<Item = StopIdx>,
    vehicles: &[Vehicle],
) -> (Vec<StopIdx>, Vec<UnassignedStop>) {
    let mut servable = Vec::new();
    let mut unservable = Vec::new();

    for stop_id in candidates {
        let stop = &stops[stop_id];
        if vehicles.iter().any(|vehicle| vehicle.can_carry(stop.weight())) {
            servable.push(stop_id);
        } else {
            unservable.push(UnassignedStop {
                stop: stop.clone(),
                reason: UnassignedReason::WeightExceedsAllCapacities,
            });
        }
    }

    (servable, unservable)
}

/// Greedily fills vehicles, one after the other, with the ranked stops.
///
/// A vehicle skips stops it has no room for, but its route ends at the first leg
/// that is longer than `max_leg_distance` or whose distance is unknown, even if a
/// later stop would have been reachable. Vehicles only see stops no earlier
/// vehicle committed, so the vehicle order is part of the input.
pub struct CapacitatedRouteBuilder<'a, O> {
    oracle: &'a O,
    max_leg_distance: Meters,
    deadline: Option<Instant>,
}

impl<'a, O: DistanceOracle> CapacitatedRouteBuilder<'a, O> {
    pub fn new(oracle: &'a O, max_leg_distance: Meters) -> Self {
        Self {
            oracle,
            max_leg_distance,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    async fn query_leg(&self, from: &str, to: &str) -> LegOutcome {
        let result = match self.deadline {
            Some(deadline) => {
                match tokio::time::timeout_at(deadline, self.oracle.distance(from, to)).await {
                    Ok(result) => result,
                    Err(_) => return LegOutcome::DeadlineExceeded,
                }
            }
            None => self.oracle.distance(from, to).await,
        };

        match result {
            Ok(distance) if distance <= self.max_leg_distance => LegOutcome::Accepted(distance),
            Ok(distance) => LegOutcome::TooLong(distance),
            Err(error) => LegOutcome::Unknown(error),
        }
    }

    fn deadline_passed(&self) -> bool {
        self.deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }

    #[instrument(skip_all, level = Level::DEBUG)]
    pub async fn build(
        &self,
        depot: &str,
        stops: &[Stop],
        ranked: &[RankedStop],
        vehicles: &[Vehicle],
        vehicle_order: &[VehicleIdx],
    ) -> AssignmentResult {
        let mut result = AssignmentResult::default();
        let mut assigned = FixedBitSet::with_capacity(stops.len());

        let (servable, unservable) = split_unservable(
            stops,
            ranked.iter().map(|ranked| ranked.stop_id),
            vehicles,
        );
        result.unassigned.extend(unservable);

        'vehicles: for &vehicle_id in vehicle_order {
            let vehicle = &vehicles[vehicle_id];
            let mut route = Route::empty(vehicle.clone());

            for &stop_id in &servable {
                if assigned.contains(stop_id.get()) {
                    continue;
                }

                let stop = &stops[stop_id];
                if !route.fits(stop) {
                    continue;
                }

                if self.deadline_passed() {
                    result.partial = true;
                    result.routes.push(route);
                    break 'vehicles;
                }

                let previous = route.last_address().unwrap_or(depot);
                match self.query_leg(previous, stop.address()).await {
                    LegOutcome::Accepted(distance) => {
                        assigned.insert(stop_id.get());
                        route.push(stop.clone(), distance);
                    }
                    LegOutcome::TooLong(distance) => {
                        debug!(
                            vehicle = vehicle.name(),
                            "RouteBuilder: leg {} -> {} is {}, closing route",
                            previous,
                            stop.address(),
                            distance
                        );
                        break;
                    }
                    LegOutcome::Unknown(error) => {
                        debug!(
                            vehicle = vehicle.name(),
                            "RouteBuilder: leg {} -> {} unknown, closing route",
                            previous,
                            stop.address()
                        );
                        result.warnings.push(OracleWarning {
                            origin: previous.to_owned(),
                            destination: stop.address().to_owned(),
                            message: error.to_string(),
                        });
                        break;
                    }
                    LegOutcome::DeadlineExceeded => {
                        result.partial = true;
                        result.routes.push(route);
                        break 'vehicles;
                    }
                }
            }

            result.routes.push(route);
        }

        let reason = if result.partial {
            UnassignedReason::DeadlineExceeded
        } else {
            UnassignedReason::CapacityOrDistanceUnreachable
        };

        for &stop_id in &servable {
            if !assigned.contains(stop_id.get()) {
                result.unassigned.push(UnassignedStop {
                    stop: stops[stop_id].clone(),
                    reason,
                });
            }
        }

        info!(
            "RouteBuilder: {} stops assigned to {} routes, {} unassigned{}",
            assigned.count_ones(..),
            result.routes.iter().filter(|route| !route.is_empty()).count(),
            result.unassigned.len(),
            if result.partial { " (deadline exceeded)" } else { "" }
        );

        result
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use courier_distance::table_oracle::TableOracle;

    use crate::test_utils::{DEPOT, RecordingOracle, create_stops, create_vehicles};

    use super::*;

    fn ranked_in_order(stops: &[Stop]) -> Vec<RankedStop> {
        (0..stops.len())
            .map(|index| RankedStop {
                stop_id: StopIdx::new(index),
                distance_from_depot: None,
            })
            .collect()
    }

    fn in_order(vehicles: &[Vehicle]) -> Vec<VehicleIdx> {
        VehicleIdx::all(vehicles.len()).collect()
    }

    fn route_addresses(route: &Route) -> Vec<&str> {
        route.stops().iter().map(|stop| stop.address()).collect()
    }

    async fn build(
        oracle: &RecordingOracle,
        max_leg_distance: f64,
        stops: &[Stop],
        vehicles: &[Vehicle],
    ) -> AssignmentResult {
        CapacitatedRouteBuilder::new(oracle, Meters::new(max_leg_distance))
            .build(
                DEPOT,
                stops,
                &ranked_in_order(stops),
                vehicles,
                &in_order(vehicles),
            )
            .await
    }

    #[tokio::test]
    async fn test_single_vehicle_takes_all_stops_in_ranked_order() {
        let stops = create_stops(&[("A", 100.0), ("B", 200.0), ("C", 150.0)]);
        let vehicles = create_vehicles(&[500.0]);
        let oracle = RecordingOracle::uniform(&["A", "B", "C"], 1000.0);

        let result = build(&oracle, 35_000.0, &stops, &vehicles).await;

        assert_eq!(result.routes.len(), 1);
        assert_eq!(route_addresses(&result.routes[0]), vec!["A", "B", "C"]);
        assert_eq!(result.routes[0].total_weight(), 450.0);
        assert_eq!(result.routes[0].total_distance(), Meters::new(3000.0));
        assert!(result.unassigned.is_empty());
        assert_eq!(
            oracle.queries(),
            vec![
                (DEPOT.to_owned(), "A".to_owned()),
                ("A".to_owned(), "B".to_owned()),
                ("B".to_owned(), "C".to_owned())
            ]
        );
    }

    #[tokio::test]
    async fn test_capacity_skips_without_querying() {
        let stops = create_stops(&[("A", 200.0), ("B", 200.0), ("C", 200.0)]);
        let vehicles = create_vehicles(&[300.0, 300.0]);
        let oracle = RecordingOracle::uniform(&["A", "B", "C"], 1000.0);

        let result = build(&oracle, 35_000.0, &stops, &vehicles).await;

        assert_eq!(route_addresses(&result.routes[0]), vec!["A"]);
        assert_eq!(route_addresses(&result.routes[1]), vec!["B"]);
        assert_eq!(
            result.unassigned,
            vec![UnassignedStop {
                stop: Stop::new("C", 200.0),
                reason: UnassignedReason::CapacityOrDistanceUnreachable
            }]
        );
        assert_eq!(oracle.queries().len(), 2);
    }

    #[tokio::test]
    async fn test_smaller_stop_further_down_still_fits() {
        let stops = create_stops(&[("A", 200.0), ("B", 200.0), ("C", 50.0)]);
        let vehicles = create_vehicles(&[300.0]);
        let oracle = RecordingOracle::uniform(&["A", "B", "C"], 1000.0);

        let result = build(&oracle, 35_000.0, &stops, &vehicles).await;

        assert_eq!(route_addresses(&result.routes[0]), vec!["A", "C"]);
        assert_eq!(
            result.unassigned_reason("B"),
            Some(UnassignedReason::CapacityOrDistanceUnreachable)
        );
    }

    #[tokio::test]
    async fn test_first_long_leg_closes_the_route() {
        let stops = create_stops(&[("A", 1.0), ("B", 1.0), ("C", 1.0)]);
        let vehicles = create_vehicles(&[100.0, 100.0]);
        // A -> B is too long, A -> C would be fine but is never tried by the first vehicle
        let oracle = RecordingOracle::new(
            TableOracle::new(true)
                .with_leg(DEPOT, "A", 10.0)
                .with_leg(DEPOT, "B", 20.0)
                .with_leg(DEPOT, "C", 30.0)
                .with_leg("A", "B", 5000.0)
                .with_leg("A", "C", 10.0)
                .with_leg("B", "C", 10.0),
        );

        let result = build(&oracle, 1000.0, &stops, &vehicles).await;

        assert_eq!(route_addresses(&result.routes[0]), vec!["A"]);
        assert_eq!(route_addresses(&result.routes[1]), vec!["B", "C"]);
        assert!(result.unassigned.is_empty());
        assert!(!oracle
            .queries()
            .contains(&("A".to_owned(), "C".to_owned())));
    }

    #[tokio::test]
    async fn test_failed_leg_fails_closed_and_stays_candidate() {
        let stops = create_stops(&[("A", 100.0), ("B", 100.0)]);
        let vehicles = create_vehicles(&[500.0, 500.0]);
        let oracle = RecordingOracle::uniform(&["A", "B"], 100.0).failing(DEPOT, "A");

        let result = build(&oracle, 35_000.0, &stops, &vehicles).await;

        // both vehicles stop at the failing first leg
        assert!(result.routes.iter().all(|route| route.is_empty()));
        assert_eq!(
            result.unassigned_reason("A"),
            Some(UnassignedReason::CapacityOrDistanceUnreachable)
        );
        assert_eq!(result.warnings.len(), 2);
        assert_eq!(
            oracle
                .queries()
                .iter()
                .filter(|(origin, destination)| origin == DEPOT && destination == "A")
                .count(),
            2
        );
    }

    #[tokio::test]
    async fn test_failed_leg_only_closes_current_route() {
        let stops = create_stops(&[("A", 100.0), ("B", 100.0), ("C", 100.0)]);
        let vehicles = create_vehicles(&[500.0, 500.0]);
        // A -> B is unknown, the second vehicle starts from the depot and reaches B
        let oracle = RecordingOracle::new(
            TableOracle::new(false)
                .with_leg(DEPOT, "A", 10.0)
                .with_leg(DEPOT, "B", 10.0)
                .with_leg("B", "C", 10.0),
        );

        let result = build(&oracle, 1000.0, &stops, &vehicles).await;

        assert_eq!(route_addresses(&result.routes[0]), vec!["A"]);
        assert_eq!(route_addresses(&result.routes[1]), vec!["B", "C"]);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].origin, "A");
        assert_eq!(result.warnings[0].destination, "B");
        assert!(result.unassigned.is_empty());
    }

    #[tokio::test]
    async fn test_overweight_stop_is_never_queried() {
        let stops = create_stops(&[("A", 600.0), ("B", 100.0)]);
        let vehicles = create_vehicles(&[500.0, 300.0]);
        let oracle = RecordingOracle::uniform(&["A", "B"], 100.0);

        let result = build(&oracle, 35_000.0, &stops, &vehicles).await;

        assert_eq!(
            result.unassigned_reason("A"),
            Some(UnassignedReason::WeightExceedsAllCapacities)
        );
        assert_eq!(result.unassigned.len(), 1);
        assert!(!oracle.mentions("A"));
    }

    #[tokio::test]
    async fn test_vehicle_order_changes_assignment() {
        let stops = create_stops(&[("A", 300.0), ("B", 100.0)]);
        let vehicles = create_vehicles(&[100.0, 300.0]);
        let oracle = RecordingOracle::uniform(&["A", "B"], 100.0);

        let given = CapacitatedRouteBuilder::new(&oracle, Meters::new(1000.0))
            .build(
                DEPOT,
                &stops,
                &ranked_in_order(&stops),
                &vehicles,
                &[VehicleIdx::new(0), VehicleIdx::new(1)],
            )
            .await;
        let reversed = CapacitatedRouteBuilder::new(&oracle, Meters::new(1000.0))
            .build(
                DEPOT,
                &stops,
                &ranked_in_order(&stops),
                &vehicles,
                &[VehicleIdx::new(1), VehicleIdx::new(0)],
            )
            .await;

        assert_eq!(route_addresses(&given.routes[0]), vec!["B"]);
        assert_eq!(route_addresses(&given.routes[1]), vec!["A"]);
        assert!(given.unassigned.is_empty());

        assert_eq!(reversed.routes[0].vehicle().name(), "v2");
        assert_eq!(route_addresses(&reversed.routes[0]), vec!["A"]);
        assert_eq!(route_addresses(&reversed.routes[1]), vec!["B"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_deadline_returns_partial_result() {
        let stops = create_stops(&[("A", 1.0), ("B", 1.0)]);
        let vehicles = create_vehicles(&[100.0]);
        let oracle = RecordingOracle::uniform(&["A", "B"], 100.0);

        let deadline = Instant::now();
        tokio::time::advance(Duration::from_millis(1)).await;

        let result = CapacitatedRouteBuilder::new(&oracle, Meters::new(1000.0))
            .with_deadline(Some(deadline))
            .build(
                DEPOT,
                &stops,
                &ranked_in_order(&stops),
                &vehicles,
                &in_order(&vehicles),
            )
            .await;

        assert!(result.partial);
        assert!(result.routes[0].is_empty());
        assert_eq!(
            result.unassigned_reason("A"),
            Some(UnassignedReason::DeadlineExceeded)
        );
        assert_eq!(result.unassigned.len(), 2);
        assert!(oracle.queries().is_empty());
    }
}

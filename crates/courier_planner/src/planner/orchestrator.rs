use std::time::Duration;

use courier_distance::{leg_cache::LegCache, meters::Meters, oracle::DistanceOracle};
use fxhash::FxHashSet;
use tokio::time::Instant;
use tracing::{Level, debug, info, instrument, warn};

use crate::{
    error::PlannerError,
    planner::{
        address_ranker::AddressRanker,
        cluster_search::{ClusterSearch, SmallClusterSearcher},
        planner_params::PlannerParams,
        route_builder::{CapacitatedRouteBuilder, split_unservable},
    },
    problem::{
        assignment::{AssignmentResult, OracleWarning, UnassignedReason, UnassignedStop},
        route_assignment_problem::{RouteAssignmentProblem, RouteAssignmentProblemBuilder},
        stop::{Stop, StopIdx},
        vehicle::Vehicle,
    },
};

/// Runs one route computation: ranking, greedy packing and the optional cluster search.
///
/// Holds nothing between computations. Legs are memoized for the duration of a
/// single [`compute`](Self::compute) call only.
pub struct RouteAssignmentOrchestrator<O> {
    oracle: O,
}

impl<O: DistanceOracle> RouteAssignmentOrchestrator<O> {
    pub fn new(oracle: O) -> Self {
        Self { oracle }
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    #[instrument(skip_all, level = Level::DEBUG)]
    pub async fn compute(
        &self,
        problem: &RouteAssignmentProblem,
        params: &PlannerParams,
    ) -> Result<AssignmentResult, PlannerError> {
        params.validate()?;

        let start = Instant::now();
        // a deadline past the end of the clock is no deadline
        let deadline = params
            .deadline
            .and_then(|deadline| start.checked_add(deadline));
        let oracle = LegCache::new(&self.oracle);

        let stops = problem.stops();
        let vehicles = problem.vehicles();

        let (servable, unservable) = split_unservable(
            stops,
            StopIdx::all(stops.len()),
            vehicles,
        );
        if !unservable.is_empty() {
            debug!(
                "Orchestrator: {} stops exceed every vehicle capacity",
                unservable.len()
            );
        }

        let ranker = AddressRanker::new(&oracle);
        let ranking = match deadline {
            Some(deadline) => {
                match tokio::time::timeout_at(
                    deadline,
                    ranker.rank(problem.depot(), stops, &servable),
                )
                .await
                {
                    Ok(ranking) => ranking,
                    Err(_) => {
                        warn!("Orchestrator: deadline exceeded while ranking stops");
                        return Ok(Self::expired_before_building(stops, &servable, unservable));
                    }
                }
            }
            None => ranker.rank(problem.depot(), stops, &servable).await,
        };

        let vehicle_order = params.vehicle_order.arrange(vehicles);
        let built = CapacitatedRouteBuilder::new(&oracle, params.max_leg_distance)
            .with_deadline(deadline)
            .build(
                problem.depot(),
                stops,
                &ranking.ranked,
                vehicles,
                &vehicle_order,
            )
            .await;

        let mut result = AssignmentResult {
            routes: built.routes,
            unassigned: unservable,
            warnings: ranking.warnings,
            partial: built.partial,
        };
        result.unassigned.extend(built.unassigned);
        result.warnings.extend(built.warnings);

        if let Some(cluster_size) = params.cluster_size
            && !result.partial
        {
            let searcher = SmallClusterSearcher::new(&oracle)
                .with_cluster_size(cluster_size)
                .with_strategy(params.cluster_strategy)
                .with_concurrency(params.cluster_concurrency);

            for route in result.routes.iter_mut() {
                if route.len() < cluster_size {
                    continue;
                }

                let search = match deadline {
                    Some(deadline) => {
                        match tokio::time::timeout_at(deadline, searcher.search(route.stops()))
                            .await
                        {
                            Ok(search) => search,
                            Err(_) => {
                                warn!("Orchestrator: deadline exceeded, skipping cluster search");
                                result.partial = true;
                                break;
                            }
                        }
                    }
                    None => searcher.search(route.stops()).await,
                };

                result.warnings.extend(search.warnings);
                route.set_best_cluster(search.best);
            }
        }

        result.warnings = dedup_warnings(result.warnings);

        info!(
            "Orchestrator: {} of {} stops assigned, {} routes, total {} in {:?}{}",
            result.assigned_count(),
            stops.len(),
            result.routes.len(),
            result.total_distance(),
            start.elapsed(),
            if result.partial { " (partial)" } else { "" }
        );

        Ok(result)
    }

    /// Searches the cheapest cluster among `stops` directly, using the cluster
    /// parameters of `params` (`cluster_size` falls back to the default size).
    #[instrument(skip_all, level = Level::DEBUG)]
    pub async fn best_cluster(
        &self,
        stops: &[Stop],
        params: &PlannerParams,
    ) -> Result<ClusterSearch, PlannerError> {
        params.validate()?;

        let oracle = LegCache::new(&self.oracle);
        let mut searcher = SmallClusterSearcher::new(&oracle)
            .with_strategy(params.cluster_strategy)
            .with_concurrency(params.cluster_concurrency);
        if let Some(cluster_size) = params.cluster_size {
            searcher = searcher.with_cluster_size(cluster_size);
        }

        let mut search = searcher.search(stops).await;
        search.warnings = dedup_warnings(search.warnings);

        Ok(search)
    }

    fn expired_before_building(
        stops: &[Stop],
        servable: &[StopIdx],
        unservable: Vec<UnassignedStop>,
    ) -> AssignmentResult {
        let mut unassigned = unservable;
        unassigned.extend(servable.iter().map(|&stop_id| UnassignedStop {
            stop: stops[stop_id].clone(),
            reason: UnassignedReason::DeadlineExceeded,
        }));

        AssignmentResult {
            routes: Vec::new(),
            unassigned,
            warnings: Vec::new(),
            partial: true,
        }
    }
}

/// Keeps the first warning of each leg.
fn dedup_warnings(warnings: Vec<OracleWarning>) -> Vec<OracleWarning> {
    let mut seen = FxHashSet::default();
    warnings
        .into_iter()
        .filter(|warning| seen.insert((warning.origin.clone(), warning.destination.clone())))
        .collect()
}

/// Validates the raw input and computes the routes in one call.
pub async fn compute_routes<O: DistanceOracle>(
    oracle: &O,
    depot: &str,
    stops: Vec<Stop>,
    vehicles: Vec<Vehicle>,
    max_leg_distance: Meters,
    cluster_size: Option<usize>,
    deadline: Option<Duration>,
) -> Result<AssignmentResult, PlannerError> {
    let mut builder = RouteAssignmentProblemBuilder::default();
    builder
        .set_depot(depot)
        .set_stops(stops)
        .set_vehicles(vehicles);
    let problem = builder.build()?;

    let params = PlannerParams {
        max_leg_distance,
        cluster_size,
        deadline,
        ..PlannerParams::default()
    };

    RouteAssignmentOrchestrator::new(oracle)
        .compute(&problem, &params)
        .await
}

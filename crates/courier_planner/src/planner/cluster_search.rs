use courier_distance::{meters::Meters, oracle::DistanceOracle};
use futures::{StreamExt, future::join_all, stream};
use fxhash::FxHashSet;
use tracing::{Level, debug, instrument};

use crate::{
    planner::planner_params::{ClusterStrategy, DEFAULT_CLUSTER_SIZE},
    problem::{
        assignment::{ClusterSelection, OracleWarning},
        stop::Stop,
    },
    utils::combinations::{ClusterOrderings, binomial},
};

#[derive(Debug, Default)]
pub struct ClusterSearch {
    /// `None` when there are fewer than `k` candidates or no ordering has a known cost.
    pub best: Option<ClusterSelection>,
    pub evaluated: usize,
    pub warnings: Vec<OracleWarning>,
}

struct Evaluation {
    position: usize,
    ordering: Vec<usize>,
    cost: Option<Meters>,
    failures: Vec<OracleWarning>,
}

#[derive(Default)]
struct Reduction {
    best: Option<(Meters, usize, Vec<usize>)>,
    evaluated: usize,
    warnings: Vec<OracleWarning>,
    seen: FxHashSet<(String, String)>,
}

impl Reduction {
    fn absorb(mut self, evaluation: Evaluation) -> Self {
        self.evaluated += 1;

        for failure in evaluation.failures {
            if self
                .seen
                .insert((failure.origin.clone(), failure.destination.clone()))
            {
                self.warnings.push(failure);
            }
        }

        if let Some(cost) = evaluation.cost {
            let key = (cost, evaluation.position);
            let better = match &self.best {
                Some((best_cost, best_position, _)) => key < (*best_cost, *best_position),
                None => true,
            };

            if better {
                self.best = Some((cost, evaluation.position, evaluation.ordering));
            }
        }

        self
    }
}

/// Exhaustive search for the cheapest cluster of `k` stops.
///
/// The cost of a cluster is the sum of the consecutive leg distances in visiting
/// order, the depot is not part of it. With [`ClusterStrategy::Combinations`] the
/// visiting order is the candidates' input order, `C(n, k)` clusters are evaluated.
/// [`ClusterStrategy::Permutations`] also reorders the stops, `C(n, k) * k!` clusters.
pub struct SmallClusterSearcher<'a, O> {
    oracle: &'a O,
    cluster_size: usize,
    strategy: ClusterStrategy,
    concurrency: usize,
}

impl<'a, O: DistanceOracle> SmallClusterSearcher<'a, O> {
    pub fn new(oracle: &'a O) -> Self {
        Self {
            oracle,
            cluster_size: DEFAULT_CLUSTER_SIZE,
            strategy: ClusterStrategy::default(),
            concurrency: 4,
        }
    }

    pub fn with_cluster_size(mut self, cluster_size: usize) -> Self {
        self.cluster_size = cluster_size;
        self
    }

    pub fn with_strategy(mut self, strategy: ClusterStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    async fn evaluate(&self, candidates: &[Stop], position: usize, ordering: Vec<usize>) -> Evaluation {
        let legs = join_all(ordering.windows(2).map(|pair| {
            let origin = candidates[pair[0]].address();
            let destination = candidates[pair[1]].address();
            async move {
                (
                    origin,
                    destination,
                    self.oracle.distance(origin, destination).await,
                )
            }
        }))
        .await;

        let mut cost = Some(Meters::ZERO);
        let mut failures = Vec::new();
        for (origin, destination, result) in legs {
            match result {
                Ok(distance) => {
                    cost = cost.map(|cost| cost + distance);
                }
                Err(error) => {
                    cost = None;
                    failures.push(OracleWarning {
                        origin: origin.to_owned(),
                        destination: destination.to_owned(),
                        message: error.to_string(),
                    });
                }
            }
        }

        Evaluation {
            position,
            ordering,
            cost,
            failures,
        }
    }

    #[instrument(skip_all, level = Level::DEBUG)]
    pub async fn search(&self, candidates: &[Stop]) -> ClusterSearch {
        let k = self.cluster_size;
        if k == 0 || candidates.len() < k {
            return ClusterSearch::default();
        }

        debug!(
            "ClusterSearch: {} candidates, k = {}, {} combinations ({:?})",
            candidates.len(),
            k,
            binomial(candidates.len(), k),
            self.strategy
        );

        let permute = self.strategy == ClusterStrategy::Permutations;
        let orderings = ClusterOrderings::new(candidates.len(), k, permute);

        // buffered keeps the output in input order, the reduction key makes it irrelevant anyway
        let reduction = stream::iter(orderings.enumerate())
            .map(|(position, ordering)| self.evaluate(candidates, position, ordering))
            .buffered(self.concurrency)
            .fold(Reduction::default(), |reduction, evaluation| {
                futures::future::ready(reduction.absorb(evaluation))
            })
            .await;

        let best = reduction
            .best
            .map(|(total_distance, _, ordering)| ClusterSelection {
                stops: ordering
                    .into_iter()
                    .map(|index| candidates[index].clone())
                    .collect(),
                total_distance,
            });

        ClusterSearch {
            best,
            evaluated: reduction.evaluated,
            warnings: reduction.warnings,
        }
    }
}

use courier_distance::{meters::Meters, oracle::DistanceOracle};
use tracing::{Level, debug, instrument};

use crate::problem::{
    assignment::OracleWarning,
    stop::{Stop, StopIdx},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedStop {
    pub stop_id: StopIdx,
    /// `None` when the depot distance could not be obtained.
    pub distance_from_depot: Option<Meters>,
}

impl RankedStop {
    pub fn sort_key(&self) -> Meters {
        self.distance_from_depot.unwrap_or(Meters::INFINITY)
    }
}

#[derive(Debug, Default)]
pub struct Ranking {
    pub ranked: Vec<RankedStop>,
    pub warnings: Vec<OracleWarning>,
}

/// Orders stops by their distance from the depot, closest first.
pub struct AddressRanker<'a, O> {
    oracle: &'a O,
}

impl<'a, O: DistanceOracle> AddressRanker<'a, O> {
    pub fn new(oracle: &'a O) -> Self {
        Self { oracle }
    }

    /// Issues a single one-to-many query. Stops whose distance is unknown stay
    /// candidates but rank last, equal distances keep their input order.
    #[instrument(skip_all, level = Level::DEBUG)]
    pub async fn rank(&self, depot: &str, stops: &[Stop], candidates: &[StopIdx]) -> Ranking {
        if candidates.is_empty() {
            return Ranking::default();
        }

        let destinations: Vec<&str> = candidates
            .iter()
            .map(|&stop_id| stops[stop_id].address())
            .collect();

        let results = self.oracle.distance_matrix(depot, &destinations).await;
        let mut results = results.into_iter();

        let mut warnings = Vec::new();
        let mut ranked: Vec<RankedStop> = candidates
            .iter()
            .map(|&stop_id| {
                let distance_from_depot = match results.next() {
                    Some(Ok(distance)) => Some(distance),
                    Some(Err(error)) => {
                        warnings.push(OracleWarning {
                            origin: depot.to_owned(),
                            destination: stops[stop_id].address().to_owned(),
                            message: error.to_string(),
                        });
                        None
                    }
                    None => {
                        warnings.push(OracleWarning {
                            origin: depot.to_owned(),
                            destination: stops[stop_id].address().to_owned(),
                            message: String::from("missing from distance matrix response"),
                        });
                        None
                    }
                };

                RankedStop {
                    stop_id,
                    distance_from_depot,
                }
            })
            .collect();

        // sort_by is stable
        ranked.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

        debug!(
            "AddressRanker: ranked {} stops, {} without depot distance",
            ranked.len(),
            warnings.len()
        );

        Ranking { ranked, warnings }
    }
}

#[cfg(test)]
mod tests {
    use courier_distance::table_oracle::TableOracle;

    use crate::test_utils::{DEPOT, RecordingOracle, create_stops};

    use super::*;

    fn all_ids(stops: &[Stop]) -> Vec<StopIdx> {
        StopIdx::all(stops.len()).collect()
    }

    fn ranked_addresses<'s>(ranking: &Ranking, stops: &'s [Stop]) -> Vec<&'s str> {
        ranking
            .ranked
            .iter()
            .map(|ranked| stops[ranked.stop_id].address())
            .collect()
    }

    #[tokio::test]
    async fn test_rank_by_distance_from_depot() {
        let stops = create_stops(&[("A", 1.0), ("B", 1.0), ("C", 1.0)]);
        let oracle = RecordingOracle::new(
            TableOracle::new(false)
                .with_leg(DEPOT, "A", 300.0)
                .with_leg(DEPOT, "B", 100.0)
                .with_leg(DEPOT, "C", 200.0),
        );

        let ranking = AddressRanker::new(&oracle)
            .rank(DEPOT, &stops, &all_ids(&stops))
            .await;

        assert_eq!(ranked_addresses(&ranking, &stops), vec!["B", "C", "A"]);
        assert_eq!(
            ranking.ranked[0].distance_from_depot,
            Some(Meters::new(100.0))
        );
        assert!(ranking.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_equal_distances_keep_input_order() {
        let stops = create_stops(&[("D1", 1.0), ("A", 1.0), ("C", 1.0), ("B", 1.0)]);
        let oracle = RecordingOracle::new(
            TableOracle::new(false)
                .with_leg(DEPOT, "D1", 50.0)
                .with_leg(DEPOT, "A", 50.0)
                .with_leg(DEPOT, "C", 10.0)
                .with_leg(DEPOT, "B", 50.0),
        );

        let ranking = AddressRanker::new(&oracle)
            .rank(DEPOT, &stops, &all_ids(&stops))
            .await;

        assert_eq!(ranked_addresses(&ranking, &stops), vec!["C", "D1", "A", "B"]);
    }

    #[tokio::test]
    async fn test_failed_stops_rank_last_and_are_reported() {
        let stops = create_stops(&[("A", 1.0), ("B", 1.0), ("C", 1.0)]);
        let oracle = RecordingOracle::new(
            TableOracle::new(false)
                .with_leg(DEPOT, "A", 300.0)
                .with_leg(DEPOT, "C", 200.0),
        );

        let ranking = AddressRanker::new(&oracle)
            .rank(DEPOT, &stops, &all_ids(&stops))
            .await;

        assert_eq!(ranked_addresses(&ranking, &stops), vec!["C", "A", "B"]);
        assert_eq!(ranking.ranked[2].distance_from_depot, None);
        assert_eq!(ranking.warnings.len(), 1);
        assert_eq!(ranking.warnings[0].destination, "B");
    }

    #[tokio::test]
    async fn test_only_candidates_are_queried() {
        let stops = create_stops(&[("A", 1.0), ("B", 1.0)]);
        let oracle = RecordingOracle::uniform(&["A", "B"], 10.0);

        let ranking = AddressRanker::new(&oracle)
            .rank(DEPOT, &stops, &[StopIdx::new(1)])
            .await;

        assert_eq!(ranked_addresses(&ranking, &stops), vec!["B"]);
        assert!(!oracle.mentions("A"));
    }
}

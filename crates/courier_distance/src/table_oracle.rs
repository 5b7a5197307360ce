use fxhash::FxHashMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    meters::Meters,
    oracle::{DistanceOracle, DistanceResult, OracleError},
};

#[derive(Deserialize, Serialize, JsonSchema, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TableLeg {
    pub origin: String,
    pub destination: String,
    pub distance: Meters,
}

/// Answers from a fixed table of leg distances. Pairs missing from the table fail,
/// except an address to itself which is always zero.
#[derive(Debug, Clone, Default)]
pub struct TableOracle {
    distances: FxHashMap<String, FxHashMap<String, Meters>>,
    symmetric: bool,
}

impl TableOracle {
    pub fn new(symmetric: bool) -> Self {
        Self {
            distances: FxHashMap::default(),
            symmetric,
        }
    }

    pub fn from_legs(legs: &[TableLeg], symmetric: bool) -> Self {
        let mut table = Self::new(symmetric);
        for leg in legs {
            table.insert(&leg.origin, &leg.destination, leg.distance);
        }
        table
    }

    pub fn with_leg(mut self, origin: &str, destination: &str, distance: f64) -> Self {
        self.insert(origin, destination, Meters::new(distance));
        self
    }

    pub fn insert(&mut self, origin: &str, destination: &str, distance: Meters) {
        self.distances
            .entry(origin.to_owned())
            .or_default()
            .insert(destination.to_owned(), distance);
    }

    pub fn get(&self, origin: &str, destination: &str) -> Option<Meters> {
        if origin == destination {
            return Some(Meters::ZERO);
        }

        let lookup = |from: &str, to: &str| {
            self.distances
                .get(from)
                .and_then(|row| row.get(to))
                .copied()
        };

        lookup(origin, destination).or_else(|| {
            if self.symmetric {
                lookup(destination, origin)
            } else {
                None
            }
        })
    }
}

impl DistanceOracle for TableOracle {
    async fn distance(&self, origin: &str, destination: &str) -> DistanceResult {
        self.get(origin, destination).ok_or_else(|| {
            OracleError::Failure(format!("no distance known for {origin} -> {destination}"))
        })
    }
}

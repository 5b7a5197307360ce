use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{google_maps_api::TravelMode, table_oracle::TableLeg};

fn default_detour_factor() -> f64 {
    1.0
}

#[derive(Deserialize, Serialize, JsonSchema, Clone, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DistanceOracleProvider {
    /// https://developers.google.com/maps/documentation/distance-matrix
    GoogleMaps {
        #[serde(default)]
        mode: TravelMode,
    },

    /// Only understands addresses written as "lat,lon".
    AsTheCrowFlies {
        #[serde(default = "default_detour_factor")]
        detour_factor: f64,
    },

    Custom {
        legs: Vec<TableLeg>,
        #[serde(default)]
        symmetric: bool,
    },
}

impl Default for DistanceOracleProvider {
    fn default() -> Self {
        DistanceOracleProvider::GoogleMaps {
            mode: TravelMode::default(),
        }
    }
}

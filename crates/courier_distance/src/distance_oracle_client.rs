use anyhow::Context;

use crate::{
    as_the_crow_flies::AsTheCrowFlies,
    distance_oracle_provider::DistanceOracleProvider,
    google_maps_api::{GOOGLE_MAPS_API_KEY_ENV_VAR, GoogleMapsClient, GoogleMapsClientParams},
    oracle::{DistanceOracle, DistanceResult},
    table_oracle::TableOracle,
};

/// Dispatches queries to the oracle selected by a [`DistanceOracleProvider`].
pub enum DistanceOracleClient {
    GoogleMaps(GoogleMapsClient),
    AsTheCrowFlies(AsTheCrowFlies),
    Table(TableOracle),
}

impl DistanceOracleClient {
    pub fn from_provider(provider: &DistanceOracleProvider) -> anyhow::Result<Self> {
        match provider {
            DistanceOracleProvider::GoogleMaps { mode } => {
                let params = GoogleMapsClientParams::from_env(*mode)
                    .with_context(|| format!("{GOOGLE_MAPS_API_KEY_ENV_VAR} is not set"))?;
                Ok(DistanceOracleClient::GoogleMaps(GoogleMapsClient::new(
                    params,
                )))
            }
            DistanceOracleProvider::AsTheCrowFlies { detour_factor } => {
                if !detour_factor.is_finite() || *detour_factor < 1.0 {
                    anyhow::bail!("detour factor must be a finite number >= 1, got {detour_factor}");
                }
                Ok(DistanceOracleClient::AsTheCrowFlies(AsTheCrowFlies::new(
                    *detour_factor,
                )))
            }
            DistanceOracleProvider::Custom { legs, symmetric } => Ok(DistanceOracleClient::Table(
                TableOracle::from_legs(legs, *symmetric),
            )),
        }
    }
}

impl DistanceOracle for DistanceOracleClient {
    async fn distance(&self, origin: &str, destination: &str) -> DistanceResult {
        match self {
            DistanceOracleClient::GoogleMaps(client) => client.distance(origin, destination).await,
            DistanceOracleClient::AsTheCrowFlies(client) => {
                client.distance(origin, destination).await
            }
            DistanceOracleClient::Table(client) => client.distance(origin, destination).await,
        }
    }

    async fn distance_matrix(&self, origin: &str, destinations: &[&str]) -> Vec<DistanceResult> {
        match self {
            DistanceOracleClient::GoogleMaps(client) => {
                client.distance_matrix(origin, destinations).await
            }
            DistanceOracleClient::AsTheCrowFlies(client) => {
                client.distance_matrix(origin, destinations).await
            }
            DistanceOracleClient::Table(client) => {
                client.distance_matrix(origin, destinations).await
            }
        }
    }
}

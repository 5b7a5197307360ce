use std::{fs::File, io::BufReader, path::Path};

use anyhow::Context;
use clap::{Args, ValueEnum};
use courier_distance::{
    distance_oracle_client::DistanceOracleClient,
    distance_oracle_provider::DistanceOracleProvider,
    google_maps_api::TravelMode,
    resilient_oracle::{OracleParams, ResilientOracle},
};
use courier_planner::json::types::JsonRouteRequest;
use tracing::info;

use crate::parsers::{self, to_std_duration};

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ProviderArg {
    Google,
    CrowFlies,
}

#[derive(Args)]
pub struct OracleArgs {
    /// Overrides the provider of the request file
    #[arg(long, value_enum, env = "COURIER_PROVIDER")]
    provider: Option<ProviderArg>,

    /// Timeout of a single distance request
    #[arg(long, value_parser = parsers::parse_duration, default_value = "10s", env = "COURIER_ORACLE_TIMEOUT")]
    oracle_timeout: jiff::SignedDuration,

    #[arg(long, default_value_t = 3, env = "COURIER_MAX_RETRIES")]
    max_retries: u32,

    #[arg(long, value_parser = parsers::parse_duration, default_value = "200ms", env = "COURIER_INITIAL_BACKOFF")]
    initial_backoff: jiff::SignedDuration,

    #[arg(long, value_parser = parsers::parse_duration, default_value = "5s", env = "COURIER_MAX_BACKOFF")]
    max_backoff: jiff::SignedDuration,

    /// Distance requests in flight at the same time
    #[arg(long, default_value_t = 8, env = "COURIER_MAX_CONCURRENT_REQUESTS")]
    max_concurrent_requests: usize,
}

impl OracleArgs {
    pub fn params(&self) -> anyhow::Result<OracleParams> {
        if self.max_concurrent_requests == 0 {
            anyhow::bail!("max concurrent requests must be at least 1");
        }

        Ok(OracleParams {
            timeout: to_std_duration(self.oracle_timeout)?,
            max_retries: self.max_retries,
            initial_backoff: to_std_duration(self.initial_backoff)?,
            max_backoff: to_std_duration(self.max_backoff)?,
            max_concurrent_requests: self.max_concurrent_requests,
            ..OracleParams::default()
        })
    }

    fn provider(&self, request: &JsonRouteRequest) -> DistanceOracleProvider {
        match self.provider {
            Some(ProviderArg::Google) => DistanceOracleProvider::GoogleMaps {
                mode: TravelMode::default(),
            },
            Some(ProviderArg::CrowFlies) => DistanceOracleProvider::AsTheCrowFlies {
                detour_factor: 1.0,
            },
            None => request.provider.clone().unwrap_or_default(),
        }
    }

    pub fn build_oracle(
        &self,
        request: &JsonRouteRequest,
    ) -> anyhow::Result<ResilientOracle<DistanceOracleClient>> {
        let provider = self.provider(request);
        info!("Using distance provider {}", provider_name(&provider));

        let client = DistanceOracleClient::from_provider(&provider)?;
        Ok(ResilientOracle::new(client, self.params()?))
    }
}

fn provider_name(provider: &DistanceOracleProvider) -> &'static str {
    match provider {
        DistanceOracleProvider::GoogleMaps { .. } => "google_maps",
        DistanceOracleProvider::AsTheCrowFlies { .. } => "as_the_crow_flies",
        DistanceOracleProvider::Custom { .. } => "custom",
    }
}

pub fn read_request(path: &Path) -> anyhow::Result<JsonRouteRequest> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let reader = BufReader::new(file);
    let request = serde_json::from_reader(reader)
        .with_context(|| format!("{} is not a valid route request", path.display()))?;

    Ok(request)
}

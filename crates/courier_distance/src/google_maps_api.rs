use std::fmt::Display;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{
    meters::Meters,
    oracle::{DistanceOracle, DistanceResult, OracleError},
};

#[derive(Deserialize, Serialize, JsonSchema, Copy, Clone, Debug, Default, Hash, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TravelMode {
    #[default]
    Driving,
    Walking,
    Bicycling,
}

impl Display for TravelMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                TravelMode::Driving => "driving",
                TravelMode::Walking => "walking",
                TravelMode::Bicycling => "bicycling",
            }
        )
    }
}

#[derive(Debug, Error)]
pub enum GoogleMapsError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Request rejected with status {status}: {message}")]
    Status { status: String, message: String },

    #[error("Element status: {0}")]
    Element(String),

    #[error("Response contains no route")]
    NoRoute,

    #[error("Response has {got} elements, expected {expected}")]
    IncompleteResponse { expected: usize, got: usize },

    #[error("Deserialization error: {0}")]
    Deserialize(#[from] serde_json::Error),
}

impl GoogleMapsError {
    pub fn is_transient(&self) -> bool {
        match self {
            GoogleMapsError::Request(error) => error.is_timeout() || error.is_connect(),
            GoogleMapsError::Api { status, .. } => *status == 429 || *status >= 500,
            GoogleMapsError::Status { status, .. } => {
                status == "OVER_QUERY_LIMIT" || status == "UNKNOWN_ERROR"
            }
            GoogleMapsError::Element(_)
            | GoogleMapsError::NoRoute
            | GoogleMapsError::IncompleteResponse { .. }
            | GoogleMapsError::Deserialize(_) => false,
        }
    }
}

impl From<GoogleMapsError> for OracleError {
    fn from(error: GoogleMapsError) -> Self {
        if error.is_transient() {
            OracleError::Transient(error.to_string())
        } else {
            OracleError::Failure(error.to_string())
        }
    }
}

#[derive(Deserialize)]
struct TextValue {
    /// Distance in meters
    value: f64,
}

#[derive(Deserialize)]
struct DirectionsLeg {
    distance: TextValue,
}

#[derive(Deserialize)]
struct DirectionsRoute {
    legs: Vec<DirectionsLeg>,
}

#[derive(Deserialize)]
struct DirectionsResponse {
    status: String,
    error_message: Option<String>,
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Deserialize)]
struct MatrixElement {
    status: String,
    distance: Option<TextValue>,
}

#[derive(Deserialize)]
struct MatrixRow {
    elements: Vec<MatrixElement>,
}

#[derive(Deserialize)]
struct DistanceMatrixResponse {
    status: String,
    error_message: Option<String>,
    #[serde(default)]
    rows: Vec<MatrixRow>,
}

fn check_status(status: String, error_message: Option<String>) -> Result<(), GoogleMapsError> {
    if status == "OK" {
        Ok(())
    } else {
        Err(GoogleMapsError::Status {
            status,
            message: error_message.unwrap_or_default(),
        })
    }
}

/// Distance of the first leg of the first route, like the Maps web client reports it.
fn parse_directions(body: &str) -> Result<Meters, GoogleMapsError> {
    let response: DirectionsResponse = serde_json::from_str(body)?;

    if response.status == "ZERO_RESULTS" {
        return Err(GoogleMapsError::NoRoute);
    }
    check_status(response.status, response.error_message)?;

    response
        .routes
        .first()
        .and_then(|route| route.legs.first())
        .map(|leg| Meters::new(leg.distance.value))
        .ok_or(GoogleMapsError::NoRoute)
}

fn parse_distance_matrix(
    body: &str,
    expected: usize,
) -> Result<Vec<Result<Meters, GoogleMapsError>>, GoogleMapsError> {
    let response: DistanceMatrixResponse = serde_json::from_str(body)?;
    check_status(response.status, response.error_message)?;

    let elements = response
        .rows
        .into_iter()
        .next()
        .map(|row| row.elements)
        .unwrap_or_default();

    if elements.len() != expected {
        return Err(GoogleMapsError::IncompleteResponse {
            expected,
            got: elements.len(),
        });
    }

    Ok(elements
        .into_iter()
        .map(|element| match (element.status.as_str(), element.distance) {
            ("OK", Some(distance)) => Ok(Meters::new(distance.value)),
            _ => Err(GoogleMapsError::Element(element.status)),
        })
        .collect())
}

pub const GOOGLE_MAPS_DIRECTIONS_API_URL: &str =
    "https://maps.googleapis.com/maps/api/directions/json";
pub const GOOGLE_MAPS_DISTANCE_MATRIX_API_URL: &str =
    "https://maps.googleapis.com/maps/api/distancematrix/json";

/// The Distance Matrix API rejects requests with more destinations than this.
pub const MAX_DESTINATIONS_PER_REQUEST: usize = 25;

pub const GOOGLE_MAPS_API_KEY_ENV_VAR: &str = "GOOGLE_MAPS_API_KEY";

#[derive(Clone, Debug)]
pub struct GoogleMapsClientParams {
    pub api_key: String,
    pub mode: TravelMode,
    pub directions_url: String,
    pub distance_matrix_url: String,
}

impl GoogleMapsClientParams {
    pub fn new(api_key: String, mode: TravelMode) -> Self {
        Self {
            api_key,
            mode,
            directions_url: GOOGLE_MAPS_DIRECTIONS_API_URL.to_owned(),
            distance_matrix_url: GOOGLE_MAPS_DISTANCE_MATRIX_API_URL.to_owned(),
        }
    }

    pub fn from_env(mode: TravelMode) -> Result<Self, std::env::VarError> {
        let api_key = std::env::var(GOOGLE_MAPS_API_KEY_ENV_VAR)?;
        Ok(Self::new(api_key, mode))
    }
}

pub struct GoogleMapsClient {
    params: GoogleMapsClientParams,
    client: reqwest::Client,
}

impl GoogleMapsClient {
    pub fn new(params: GoogleMapsClientParams) -> Self {
        Self {
            params,
            client: reqwest::Client::new(),
        }
    }

    async fn fetch_text(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<String, GoogleMapsError> {
        let mode = self.params.mode.to_string();
        let response = self
            .client
            .get(url)
            .query(query)
            .query(&[("mode", mode.as_str()), ("key", self.params.api_key.as_str())])
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.text().await?)
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            Err(GoogleMapsError::Api { status, message })
        }
    }

    pub async fn fetch_directions_distance(
        &self,
        origin: &str,
        destination: &str,
    ) -> Result<Meters, GoogleMapsError> {
        let body = self
            .fetch_text(
                &self.params.directions_url,
                &[("origin", origin), ("destination", destination)],
            )
            .await?;

        parse_directions(&body)
    }

    pub async fn fetch_distance_row(
        &self,
        origin: &str,
        destinations: &[&str],
    ) -> Result<Vec<Result<Meters, GoogleMapsError>>, GoogleMapsError> {
        let joined = destinations.join("|");
        let body = self
            .fetch_text(
                &self.params.distance_matrix_url,
                &[("origins", origin), ("destinations", joined.as_str())],
            )
            .await?;

        debug!(
            "GoogleMapsApi: fetched distance row for {} destinations",
            destinations.len()
        );

        parse_distance_matrix(&body, destinations.len())
    }
}

impl DistanceOracle for GoogleMapsClient {
    async fn distance(&self, origin: &str, destination: &str) -> DistanceResult {
        Ok(self.fetch_directions_distance(origin, destination).await?)
    }

    async fn distance_matrix(&self, origin: &str, destinations: &[&str]) -> Vec<DistanceResult> {
        // one request at a time, callers bound concurrency per batch
        let mut results = Vec::with_capacity(destinations.len());
        for chunk in destinations.chunks(MAX_DESTINATIONS_PER_REQUEST) {
            match self.fetch_distance_row(origin, chunk).await {
                Ok(row) => results.extend(row.into_iter().map(|entry| entry.map_err(OracleError::from))),
                Err(error) => {
                    let error = OracleError::from(error);
                    results.extend(std::iter::repeat_n(Err(error), chunk.len()));
                }
            }
        }

        results
    }
}

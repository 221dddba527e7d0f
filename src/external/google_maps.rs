use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    config::GoogleMapsConfig,
    entities::Coordinate,
    error::{location_unreachable_error, upstream_error, Error},
};

/// Optional check run on each waypoint after parsing and before routing.
#[async_trait]
pub trait LocationValidator {
    async fn validate_location(&self, coordinate: Coordinate) -> Result<(), Error>;
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub formatted_address: String,
    #[serde(default)]
    pub types: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Response<T> {
    status: String,
    results: Option<T>,
}

const WATER_TYPES: [&str; 2] = ["natural_feature", "ocean"];

impl GeocodeResult {
    pub fn is_on_land(&self) -> bool {
        !self.types.iter().any(|t| WATER_TYPES.contains(&t.as_str()))
    }
}

/// Reverse geocodes a point and rejects it when nothing is there or the top
/// result is a body of water.
pub struct GoogleGeocoder {
    client: reqwest::Client,
    config: GoogleMapsConfig,
}

impl GoogleGeocoder {
    pub fn new(config: GoogleMapsConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

fn check(data: Response<Vec<GeocodeResult>>) -> Result<(), Error> {
    let results = data.results.unwrap_or_default();

    if data.status == "ZERO_RESULTS" || (data.status == "OK" && results.is_empty()) {
        return Err(location_unreachable_error("location not found"));
    } else if data.status != "OK" {
        return Err(upstream_error(data.status));
    }

    match results.first() {
        Some(place) if place.is_on_land() => Ok(()),
        _ => Err(location_unreachable_error("location is in the ocean")),
    }
}

#[async_trait]
impl LocationValidator for GoogleGeocoder {
    #[tracing::instrument(skip(self))]
    async fn validate_location(&self, coordinate: Coordinate) -> Result<(), Error> {
        let url = format!(
            "{}/maps/api/geocode/json",
            self.config.api_base.trim_end_matches('/')
        );
        let latlng: String = coordinate.into();

        let res = self
            .client
            .get(url)
            .query(&[("latlng", latlng.as_str())])
            .query(&[("key", self.config.api_key.as_str())])
            .send()
            .await
            .map_err(|e| upstream_error(e.without_url().to_string()))?;

        let status = res.status();

        if !status.is_success() {
            return Err(upstream_error(status));
        }

        let data: Response<Vec<GeocodeResult>> = res
            .json()
            .await
            .map_err(|e| upstream_error(e.without_url().to_string()))?;

        check(data)
    }
}

#[cfg(test)]
fn response(value: serde_json::Value) -> Response<Vec<GeocodeResult>> {
    serde_json::from_value(value).unwrap()
}

#[test]
fn land_result_passes() {
    let data = response(serde_json::json!({
        "status": "OK",
        "results": [{ "formatted_address": "Nairobi, Kenya", "types": ["locality", "political"] }]
    }));

    assert!(check(data).is_ok());
}

#[test]
fn ocean_result_is_unreachable() {
    let data = response(serde_json::json!({
        "status": "OK",
        "results": [{ "formatted_address": "Indian Ocean", "types": ["natural_feature"] }]
    }));

    let err = check(data).unwrap_err();
    assert_eq!(err.code, crate::error::LOCATION_UNREACHABLE_ERROR);
    assert!(err.is_validation_error());
}

#[test]
fn zero_results_is_unreachable() {
    let data = response(serde_json::json!({ "status": "ZERO_RESULTS", "results": [] }));

    assert_eq!(
        check(data).unwrap_err().code,
        crate::error::LOCATION_UNREACHABLE_ERROR
    );
}

#[test]
fn denied_request_is_upstream_error() {
    let data = response(serde_json::json!({ "status": "REQUEST_DENIED" }));

    assert_eq!(check(data).unwrap_err().code, crate::error::UPSTREAM_ERROR);
}

#[test]
fn request_error_does_not_expose_api_key() {
    tokio_test::block_on(async {
        let addr = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();
        let geocoder = GoogleGeocoder::new(GoogleMapsConfig {
            api_base: format!("http://{}", addr),
            api_key: "g.SECRET".into(),
        });

        let err = geocoder
            .validate_location(Coordinate::new(1.3, 36.9).unwrap())
            .await
            .unwrap_err();

        assert_eq!(err.code, crate::error::UPSTREAM_ERROR);
        assert!(!err.is_validation_error());
        assert!(!err.message.contains("g.SECRET"));
    });
}

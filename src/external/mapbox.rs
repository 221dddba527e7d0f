use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    config::MapboxConfig,
    entities::{Coordinate, Route, RouteRequest},
    error::{route_fetch_error, Error},
};

/// Anything that can turn a [`RouteRequest`] into route geometry.
#[async_trait]
pub trait RouteClient {
    /// An empty [`Route`] means the service found no path; it is not an
    /// error. No retries and no timeout are applied here.
    async fn fetch_route(&self, request: &RouteRequest) -> Result<Route, Error>;
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DirectionsGeometry {
    pub coordinates: Vec<[f64; 2]>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DirectionsRoute {
    pub geometry: Option<DirectionsGeometry>,
    pub distance: Option<f64>,
    pub duration: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DirectionsResponse {
    pub code: String,
    pub message: Option<String>,
    #[serde(default)]
    pub routes: Vec<DirectionsRoute>,
}

impl TryFrom<DirectionsResponse> for Route {
    type Error = Error;

    /// Picks the first route and flips each `[lon, lat]` pair into a
    /// [`Coordinate`], keeping traversal order.
    fn try_from(data: DirectionsResponse) -> Result<Self, Self::Error> {
        match data.code.as_str() {
            "Ok" => {}
            "NoRoute" | "NoSegment" => return Ok(Route::default()),
            code => {
                return Err(route_fetch_error(format!(
                    "{}: {}",
                    code,
                    data.message.unwrap_or_default()
                )))
            }
        }

        let first = match data.routes.into_iter().next() {
            Some(route) => route,
            None => return Ok(Route::default()),
        };

        let path = first
            .geometry
            .map(|g| g.coordinates)
            .unwrap_or_default()
            .into_iter()
            .map(Coordinate::from_wire)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| route_fetch_error("malformed response: coordinate out of range"))?;

        Ok(Route {
            path,
            distance: first.distance,
            duration: first.duration,
        })
    }
}

pub struct MapboxClient {
    client: reqwest::Client,
    config: MapboxConfig,
}

impl MapboxClient {
    pub fn new(config: MapboxConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn url(&self, request: &RouteRequest) -> String {
        format!(
            "{}/directions/v5/mapbox/{}/{}",
            self.config.api_base.trim_end_matches('/'),
            request.profile,
            request.path_segment()
        )
    }
}

#[async_trait]
impl RouteClient for MapboxClient {
    #[tracing::instrument(skip(self))]
    async fn fetch_route(&self, request: &RouteRequest) -> Result<Route, Error> {
        let request = request.clone().with_profile(self.config.profile.clone());

        let res = self
            .client
            .get(self.url(&request))
            .query(&[("geometries", "geojson")])
            .query(&[("access_token", self.config.access_token.as_str())])
            .send()
            .await?;

        let status = res.status();

        if !status.is_success() {
            tracing::error!(%status, "directions request failed");
            return Err(route_fetch_error(format!("unexpected status {}", status)));
        }

        let text = res.text().await?;
        let data: DirectionsResponse = serde_json::from_str(&text).map_err(|e| {
            tracing::error!(error = %e, body = %text, "failed to parse directions response");
            e
        })?;

        let route = Route::try_from(data)?;

        if route.is_empty() {
            tracing::debug!("directions returned no route");
        } else {
            tracing::debug!(points = route.len(), "directions returned a route");
        }

        Ok(route)
    }
}

mod helpers;
mod map_api;
mod trip_api;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    api::API,
    config::Config,
    entities::TripSession,
    external::{GoogleGeocoder, LocationValidator, MapboxClient, RouteClient},
};

type Sessions = Mutex<HashMap<Uuid, TripSession>>;

pub const DEFAULT_SESSION_TTL_SECS: u32 = 60 * 60;

pub type DynRouteClient = Arc<dyn RouteClient + Send + Sync>;
pub type DynLocationValidator = Arc<dyn LocationValidator + Send + Sync>;

pub struct Engine {
    sessions: Sessions,
    route_client: DynRouteClient,
    location_validator: Option<DynLocationValidator>,
    session_ttl: Duration,
}

impl Engine {
    pub fn new(route_client: DynRouteClient) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            route_client,
            location_validator: None,
            session_ttl: Duration::seconds(DEFAULT_SESSION_TTL_SECS.into()),
        }
    }

    /// Sessions left alone for longer than `ttl` are dropped the next time a
    /// trip is created.
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    pub fn with_location_validator(mut self, validator: DynLocationValidator) -> Self {
        self.location_validator = Some(validator);
        self
    }

    #[tracing::instrument(name = "Engine::from_config", skip_all)]
    pub fn from_config(config: &Config) -> Self {
        let engine = Self::new(Arc::new(MapboxClient::new(config.mapbox.clone())))
            .with_session_ttl(Duration::seconds(config.session_ttl_secs.into()));

        match &config.google_maps {
            Some(google_maps) => {
                tracing::info!("land check enabled");
                engine.with_location_validator(Arc::new(GoogleGeocoder::new(google_maps.clone())))
            }
            None => engine,
        }
    }
}

impl Engine {
    async fn evict_stale_sessions(&self) {
        let evicted = helpers::evict_sessions(&self.sessions, Utc::now() - self.session_ttl).await;

        if evicted > 0 {
            tracing::info!(evicted, "stale trip sessions dropped");
        }
    }
}

impl API for Engine {}

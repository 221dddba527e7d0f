use std::env;
use std::net::SocketAddr;

use crate::engine::DEFAULT_SESSION_TTL_SECS;
use crate::entities::DEFAULT_PROFILE;
use crate::error::{invalid_input_error, Error};

pub const DEFAULT_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_MAPBOX_API_BASE: &str = "https://api.mapbox.com";
pub const DEFAULT_GOOGLE_MAPS_API_BASE: &str = "https://maps.googleapis.com";

#[derive(Clone, Debug)]
pub struct MapboxConfig {
    pub api_base: String,
    pub access_token: String,
    pub profile: String,
}

#[derive(Clone, Debug)]
pub struct GoogleMapsConfig {
    pub api_base: String,
    pub api_key: String,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    /// Idle sessions older than this are evicted.
    pub session_ttl_secs: u32,
    pub mapbox: MapboxConfig,
    /// Land/ocean pre-validation runs only when this is set.
    pub google_maps: Option<GoogleMapsConfig>,
}

impl Config {
    /// Reads the process environment. Call `dotenv::dotenv()` first to pick
    /// up a `.env` file.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| env::var(key))
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|_| default.into());

        let addr: SocketAddr = or_default("PLANNER_ADDR", DEFAULT_ADDR)
            .parse()
            .map_err(|_| invalid_input_error())?;

        let session_ttl_secs = match lookup("PLANNER_SESSION_TTL_SECS") {
            Ok(value) => value.parse().map_err(|_| invalid_input_error())?,
            Err(_) => DEFAULT_SESSION_TTL_SECS,
        };

        let mapbox = MapboxConfig {
            api_base: or_default("MAPBOX_API_BASE", DEFAULT_MAPBOX_API_BASE),
            access_token: lookup("MAPBOX_ACCESS_TOKEN")?,
            profile: or_default("MAPBOX_PROFILE", DEFAULT_PROFILE),
        };

        let google_maps = lookup("GOOGLE_MAPS_API_KEY")
            .ok()
            .map(|api_key| GoogleMapsConfig {
                api_base: or_default("GOOGLE_MAPS_API_BASE", DEFAULT_GOOGLE_MAPS_API_BASE),
                api_key,
            });

        Ok(Self {
            addr,
            session_ttl_secs,
            mapbox,
            google_maps,
        })
    }
}

#[cfg(test)]
fn lookup_from(
    pairs: &'static [(&'static str, &'static str)],
) -> impl Fn(&str) -> Result<String, env::VarError> {
    move |key: &str| {
        pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
            .ok_or(env::VarError::NotPresent)
    }
}

#[test]
fn defaults_apply_when_only_token_is_set() {
    let config = Config::from_lookup(lookup_from(&[("MAPBOX_ACCESS_TOKEN", "pk.test")])).unwrap();

    assert_eq!(config.addr, DEFAULT_ADDR.parse::<SocketAddr>().unwrap());
    assert_eq!(config.mapbox.api_base, DEFAULT_MAPBOX_API_BASE);
    assert_eq!(config.mapbox.access_token, "pk.test");
    assert_eq!(config.mapbox.profile, "driving");
    assert!(config.google_maps.is_none());
    assert_eq!(config.session_ttl_secs, DEFAULT_SESSION_TTL_SECS);
}

#[test]
fn session_ttl_is_read_in_seconds() {
    let config = Config::from_lookup(lookup_from(&[
        ("MAPBOX_ACCESS_TOKEN", "pk.test"),
        ("PLANNER_SESSION_TTL_SECS", "900"),
    ]))
    .unwrap();
    assert_eq!(config.session_ttl_secs, 900);

    let err = Config::from_lookup(lookup_from(&[
        ("MAPBOX_ACCESS_TOKEN", "pk.test"),
        ("PLANNER_SESSION_TTL_SECS", "-1"),
    ]))
    .unwrap_err();
    assert_eq!(err.code, crate::error::INVALID_INPUT_ERROR);
}

#[test]
fn missing_token_is_an_env_error() {
    let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
    assert_eq!(err.code, crate::error::ENV_VAR_ERROR);
}

#[test]
fn google_key_enables_land_check() {
    let config = Config::from_lookup(lookup_from(&[
        ("MAPBOX_ACCESS_TOKEN", "pk.test"),
        ("GOOGLE_MAPS_API_KEY", "g.test"),
        ("PLANNER_ADDR", "0.0.0.0:8080"),
    ]))
    .unwrap();

    let google_maps = config.google_maps.unwrap();
    assert_eq!(google_maps.api_key, "g.test");
    assert_eq!(google_maps.api_base, DEFAULT_GOOGLE_MAPS_API_BASE);
    assert_eq!(config.addr.port(), 8080);
}

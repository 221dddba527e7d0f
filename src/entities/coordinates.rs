use std::str::FromStr;

use serde::Serialize;

use crate::error::{coordinate_parse_error, Error};

/// A validated (longitude, latitude) pair in degrees.
///
/// User input is written latitude first ("lat,lon"), the routing service
/// speaks longitude first. Both orders are handled here and nowhere else.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Coordinate {
    longitude: f64,
    latitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, Error> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(coordinate_parse_error());
        }

        Ok(Self {
            longitude,
            latitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Decodes a `[lon, lat]` pair as sent by the routing service.
    pub fn from_wire(pair: [f64; 2]) -> Result<Self, Error> {
        Self::new(pair[1], pair[0])
    }

    pub fn to_wire(&self) -> String {
        format!("{},{}", self.longitude, self.latitude)
    }
}

impl FromStr for Coordinate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();

        if parts.len() != 2 {
            return Err(coordinate_parse_error());
        }

        let latitude: f64 = parts[0].parse().map_err(|_| coordinate_parse_error())?;
        let longitude: f64 = parts[1].parse().map_err(|_| coordinate_parse_error())?;

        // NaN falls out of the range checks in `new`
        Self::new(latitude, longitude)
    }
}

impl From<Coordinate> for geo_types::Coord<f64> {
    fn from(coordinate: Coordinate) -> Self {
        geo_types::Coord {
            x: coordinate.longitude,
            y: coordinate.latitude,
        }
    }
}

impl From<Coordinate> for String {
    fn from(coordinate: Coordinate) -> Self {
        format!("{},{}", coordinate.latitude, coordinate.longitude)
    }
}

#[test]
fn parse_latitude_first() {
    let coordinate: Coordinate = "1.2921,36.8219".parse().unwrap();

    assert_eq!(coordinate.latitude(), 1.2921);
    assert_eq!(coordinate.longitude(), 36.8219);
}

#[test]
fn parse_trims_whitespace() {
    let coordinate: Coordinate = "  -1.5 ,\t 120 ".parse().unwrap();

    assert_eq!(coordinate.latitude(), -1.5);
    assert_eq!(coordinate.longitude(), 120.0);
}

#[test]
fn parse_accepts_bounds() {
    assert!("90,180".parse::<Coordinate>().is_ok());
    assert!("-90,-180".parse::<Coordinate>().is_ok());
}

#[test]
fn parse_rejects_invalid_input() {
    for input in [
        "",
        "1.2",
        "1,2,3",
        "abc,36",
        "36,abc",
        ",36",
        "91,36",
        "-90.5,36",
        "36,180.01",
        "NaN,1",
        "inf,1",
        "1;2",
    ] {
        let result = input.parse::<Coordinate>();
        assert_eq!(
            result.map_err(|e| e.code),
            Err(crate::error::COORDINATE_PARSE_ERROR),
            "{:?}",
            input
        );
    }
}

#[test]
fn wire_order_is_longitude_first() {
    let coordinate = Coordinate::new(1.3, 36.9).unwrap();
    assert_eq!(coordinate.to_wire(), "36.9,1.3");
    assert_eq!(Coordinate::from_wire([36.9, 1.3]).unwrap(), coordinate);
    assert!(Coordinate::from_wire([1.3, 95.0]).is_err());
}

#[test]
fn latlng_string_is_latitude_first() {
    let coordinate = Coordinate::new(1.3, 36.9).unwrap();

    assert_eq!(String::from(coordinate), "1.3,36.9");
    assert_ne!(String::from(coordinate), coordinate.to_wire());
}

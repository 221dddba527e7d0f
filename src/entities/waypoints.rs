use serde::Serialize;

use crate::entities::{Coordinate, TripInput};
use crate::error::Error;

/// The three stops of a trip, always in (current, pickup, dropoff) order.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Waypoints {
    pub current: Coordinate,
    pub pickup: Coordinate,
    pub dropoff: Coordinate,
}

impl Waypoints {
    pub fn new(current: Coordinate, pickup: Coordinate, dropoff: Coordinate) -> Self {
        Self {
            current,
            pickup,
            dropoff,
        }
    }

    /// Fails as a whole if any of the three location fields does not parse.
    pub fn parse(input: &TripInput) -> Result<Self, Error> {
        let current = input.current_location.parse()?;
        let pickup = input.pickup_location.parse()?;
        let dropoff = input.dropoff_location.parse()?;

        Ok(Self::new(current, pickup, dropoff))
    }

    pub fn to_array(&self) -> [Coordinate; 3] {
        [self.current, self.pickup, self.dropoff]
    }
}

#[test]
fn parse_keeps_field_order() {
    let input = TripInput {
        current_location: "1.2921,36.8219".into(),
        pickup_location: "1.3,36.9".into(),
        dropoff_location: "1.4,37.0".into(),
        cycle_hours: "".into(),
    };

    let waypoints = Waypoints::parse(&input).unwrap();
    let latitudes: Vec<f64> = waypoints.to_array().iter().map(|c| c.latitude()).collect();

    assert_eq!(latitudes, vec![1.2921, 1.3, 1.4]);
}

#[test]
fn parse_fails_on_any_invalid_field() {
    let input = TripInput {
        current_location: "1.2921,36.8219".into(),
        pickup_location: "1.3,36.9".into(),
        dropoff_location: "abc,37.0".into(),
        cycle_hours: "".into(),
    };

    assert!(Waypoints::parse(&input).is_err());
}

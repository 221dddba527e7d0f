use serde::Serialize;

use crate::entities::{Coordinate, Waypoints};

pub const DEFAULT_PROFILE: &str = "driving";

/// What gets sent to the routing service: the stops in itinerary order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RouteRequest {
    pub profile: String,
    pub points: [Coordinate; 3],
}

impl RouteRequest {
    /// Points are neither reordered nor deduplicated.
    pub fn build(waypoints: &Waypoints) -> Self {
        Self {
            profile: DEFAULT_PROFILE.into(),
            points: waypoints.to_array(),
        }
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    /// `lon,lat;lon,lat;lon,lat`
    pub fn path_segment(&self) -> String {
        self.points
            .iter()
            .map(Coordinate::to_wire)
            .collect::<Vec<_>>()
            .join(";")
    }
}

#[cfg(test)]
fn point(latitude: f64, longitude: f64) -> Coordinate {
    Coordinate::new(latitude, longitude).unwrap()
}

#[test]
fn path_segment_is_longitude_first() {
    let waypoints = Waypoints::new(point(1.2921, 36.8219), point(1.3, 36.9), point(1.4, 37.0));

    assert_eq!(
        RouteRequest::build(&waypoints).path_segment(),
        "36.8219,1.2921;36.9,1.3;37,1.4"
    );
}

#[test]
fn coinciding_points_are_kept() {
    let a = point(10.0, 20.0);
    let request = RouteRequest::build(&Waypoints::new(a, a, a));

    assert_eq!(request.points, [a, a, a]);
    assert_eq!(request.profile, DEFAULT_PROFILE);
}

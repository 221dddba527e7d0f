use geo_types::{Coord, LineString, Rect};
use serde::Serialize;

use crate::entities::{Route, Waypoints};

/// Map center used before any waypoints exist, as `[lat, lon]`.
pub const DEFAULT_CENTER: [f64; 2] = [-1.2921, 36.8219];
pub const DEFAULT_ZOOM: u8 = 6;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Bounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl From<Rect<f64>> for Bounds {
    fn from(rect: Rect<f64>) -> Self {
        Self {
            north: rect.max().y,
            south: rect.min().y,
            east: rect.max().x,
            west: rect.min().x,
        }
    }
}

/// Everything a map front end needs to draw a trip. Positions are
/// `[lat, lon]`, the order map widgets expect.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MapView {
    pub center: [f64; 2],
    pub zoom: Option<u8>,
    pub bounds: Option<Bounds>,
    pub markers: Vec<[f64; 2]>,
    pub polyline: Option<Vec<[f64; 2]>>,
}

impl MapView {
    pub fn new(waypoints: Option<&Waypoints>, route: &Route) -> Self {
        let bounds = waypoints.map(fit_bounds);

        let center = match bounds {
            Some(b) => [(b.north + b.south) / 2.0, (b.east + b.west) / 2.0],
            None => DEFAULT_CENTER,
        };

        let markers: Vec<[f64; 2]> = waypoints
            .map(|w| w.to_array().iter().map(|c| [c.latitude(), c.longitude()]).collect())
            .unwrap_or_default();

        Self {
            center,
            // fitted bounds decide the zoom on the client
            zoom: bounds.map_or(Some(DEFAULT_ZOOM), |_| None),
            bounds,
            markers,
            polyline: polyline(route),
        }
    }
}

pub fn fit_bounds(waypoints: &Waypoints) -> Bounds {
    let [first, rest @ ..] = waypoints.to_array();

    let rect = rest.iter().fold(Rect::new(first, first), |rect, &c| {
        let c: Coord<f64> = c.into();
        Rect::new(
            Coord {
                x: rect.min().x.min(c.x),
                y: rect.min().y.min(c.y),
            },
            Coord {
                x: rect.max().x.max(c.x),
                y: rect.max().y.max(c.y),
            },
        )
    });

    rect.into()
}

/// A single point is not a line, so nothing is drawn below two points.
pub fn polyline(route: &Route) -> Option<Vec<[f64; 2]>> {
    if route.len() < 2 {
        return None;
    }

    let line: LineString<f64> = route.path.iter().map(|&c| Coord::from(c)).collect();

    Some(line.coords().map(|c| [c.y, c.x]).collect())
}

#[cfg(test)]
use crate::entities::Coordinate;

#[cfg(test)]
fn point(latitude: f64, longitude: f64) -> Coordinate {
    Coordinate::new(latitude, longitude).unwrap()
}

#[test]
fn bounds_cover_all_waypoints() {
    let waypoints = Waypoints::new(point(1.2921, 36.8219), point(-1.3, 36.9), point(1.4, 35.0));

    assert_eq!(
        fit_bounds(&waypoints),
        Bounds {
            north: 1.4,
            south: -1.3,
            east: 36.9,
            west: 35.0,
        }
    );
}

#[test]
fn empty_session_uses_default_center() {
    let view = MapView::new(None, &Route::default());

    assert_eq!(view.center, DEFAULT_CENTER);
    assert_eq!(view.zoom, Some(DEFAULT_ZOOM));
    assert!(view.bounds.is_none());
    assert!(view.markers.is_empty());
    assert!(view.polyline.is_none());
}

#[test]
fn single_point_route_is_not_drawn() {
    let route = Route::new(vec![point(1.0, 2.0)]);
    assert!(polyline(&route).is_none());
}

#[test]
fn polyline_is_latitude_first_in_route_order() {
    let route = Route::new(vec![point(1.0, 2.0), point(3.0, 4.0), point(5.0, 6.0)]);

    assert_eq!(
        polyline(&route),
        Some(vec![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]])
    );
}

#[test]
fn markers_follow_waypoint_order() {
    let waypoints = Waypoints::new(point(1.0, 2.0), point(3.0, 4.0), point(5.0, 6.0));
    let view = MapView::new(Some(&waypoints), &Route::default());

    assert_eq!(view.markers, vec![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]);
    assert_eq!(view.center, [3.0, 4.0]);
    assert!(view.zoom.is_none());
}

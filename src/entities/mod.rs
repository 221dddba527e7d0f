mod coordinates;
mod route;
mod route_request;
mod trip;
mod viewport;
mod waypoints;

pub use coordinates::Coordinate;
pub use route::Route;
pub use route_request::{RouteRequest, DEFAULT_PROFILE};
pub use trip::{
    PendingFetch, Status as TripStatus, TripInput, TripInputPatch, TripSession, FETCH_FAILED_NOTICE,
    INVALID_LOCATION_NOTICE, LOCATION_CHECK_FAILED_NOTICE,
};
pub use viewport::{Bounds, MapView};
pub use waypoints::Waypoints;

pub mod google_maps;
pub mod mapbox;

pub use google_maps::{GoogleGeocoder, LocationValidator};
pub use mapbox::{MapboxClient, RouteClient};

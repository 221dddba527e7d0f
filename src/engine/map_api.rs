use super::helpers::fetch_session;
use super::Engine;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{api::MapAPI, entities::MapView, error::Error};

#[async_trait]
impl MapAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn find_map(&self, id: Uuid) -> Result<MapView, Error> {
        let session = fetch_session(&self.sessions, &id).await?;

        Ok(session.map())
    }
}

#[test]
fn map_follows_session_state() {
    use crate::api::TripAPI;
    use crate::entities::{Route, RouteRequest, TripInputPatch};
    use crate::external::RouteClient;
    use std::sync::Arc;
    use tokio_test::block_on;

    struct EmptyRouteClient;

    #[async_trait]
    impl RouteClient for EmptyRouteClient {
        async fn fetch_route(&self, _: &RouteRequest) -> Result<Route, Error> {
            Ok(Route::default())
        }
    }

    block_on(async {
        let engine = Engine::new(Arc::new(EmptyRouteClient));
        let id = engine.create_trip().await.unwrap().id;

        let map = engine.find_map(id).await.unwrap();
        assert!(map.markers.is_empty());
        assert!(map.bounds.is_none());

        let patch = TripInputPatch {
            current_location: Some("1.0,36.0".into()),
            pickup_location: Some("2.0,37.0".into()),
            dropoff_location: Some("3.0,38.0".into()),
            cycle_hours: None,
        };
        engine.update_trip(id, patch).await.unwrap();
        engine.submit_trip(id).await.unwrap();

        let map = engine.find_map(id).await.unwrap();
        assert_eq!(map.markers, vec![[1.0, 36.0], [2.0, 37.0], [3.0, 38.0]]);
        assert_eq!(map.bounds.unwrap().north, 3.0);
        assert!(map.polyline.is_none());
    });
}

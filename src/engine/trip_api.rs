use super::helpers::{fetch_session, insert_session, remove_session, update_session};
use super::Engine;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    api::TripAPI,
    entities::{TripInputPatch, TripSession},
    error::Error,
};

#[async_trait]
impl TripAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn create_trip(&self) -> Result<TripSession, Error> {
        self.evict_stale_sessions().await;

        let session = TripSession::new();
        insert_session(&self.sessions, session.clone()).await;

        tracing::info!(id = %session.id, "trip session created");

        Ok(session)
    }

    #[tracing::instrument(skip(self))]
    async fn find_trip(&self, id: Uuid) -> Result<TripSession, Error> {
        fetch_session(&self.sessions, &id).await
    }

    #[tracing::instrument(skip(self))]
    async fn update_trip(&self, id: Uuid, patch: TripInputPatch) -> Result<TripSession, Error> {
        update_session(&self.sessions, &id, |session| {
            session.update(patch);
            session.clone()
        })
        .await
    }

    /// Validates, then fetches without holding the store lock. A fetch failure
    /// or a location check that could not run is not an error here: the
    /// returned session is `Failed` and carries a notice.
    #[tracing::instrument(skip(self))]
    async fn submit_trip(&self, id: Uuid) -> Result<TripSession, Error> {
        let pending = match &self.location_validator {
            None => update_session(&self.sessions, &id, |session| session.submit()).await??,
            Some(validator) => {
                let waypoints =
                    update_session(&self.sessions, &id, |session| session.validate()).await??;

                for coordinate in waypoints.to_array() {
                    if let Err(err) = validator.validate_location(coordinate).await {
                        let session = update_session(&self.sessions, &id, |session| {
                            session.reject(err.clone());
                            session.clone()
                        })
                        .await?;

                        if err.is_validation_error() {
                            return Err(err);
                        }
                        return Ok(session);
                    }
                }

                update_session(&self.sessions, &id, |session| session.begin_fetch(waypoints))
                    .await??
            }
        };

        tracing::debug!(submission = pending.submission, "fetching route");

        let result = self.route_client.fetch_route(&pending.request).await;

        update_session(&self.sessions, &id, |session| {
            session.resolve(pending, result);
            session.clone()
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn delete_trip(&self, id: Uuid) -> Result<TripSession, Error> {
        let session = remove_session(&self.sessions, &id).await?;

        tracing::info!(id = %session.id, "trip session deleted");

        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        entities::{
            Coordinate, Route, RouteRequest, TripStatus, FETCH_FAILED_NOTICE,
            LOCATION_CHECK_FAILED_NOTICE,
        },
        error::{
            location_unreachable_error, route_fetch_error, upstream_error, COORDINATE_PARSE_ERROR,
            NOT_FOUND_ERROR,
        },
        external::{LocationValidator, RouteClient},
    };
    use chrono::{Duration, Utc};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::sync::oneshot;
    use tokio_test::block_on;

    struct StaticRouteClient {
        result: Mutex<Result<Route, Error>>,
        calls: AtomicUsize,
    }

    impl StaticRouteClient {
        fn new(result: Result<Route, Error>) -> Arc<Self> {
            Arc::new(Self {
                result: Mutex::new(result),
                calls: AtomicUsize::new(0),
            })
        }

        fn set(&self, result: Result<Route, Error>) {
            *self.result.lock().unwrap() = result;
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RouteClient for StaticRouteClient {
        async fn fetch_route(&self, _: &RouteRequest) -> Result<Route, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.lock().unwrap().clone()
        }
    }

    /// Each call waits for the next queued response, so tests decide the
    /// order in which fetches resolve.
    struct QueuedRouteClient {
        responses: Mutex<VecDeque<oneshot::Receiver<Result<Route, Error>>>>,
    }

    #[async_trait]
    impl RouteClient for QueuedRouteClient {
        async fn fetch_route(&self, _: &RouteRequest) -> Result<Route, Error> {
            let rx = self.responses.lock().unwrap().pop_front().unwrap();
            rx.await.unwrap()
        }
    }

    struct OceanValidator;

    #[async_trait]
    impl LocationValidator for OceanValidator {
        async fn validate_location(&self, coordinate: Coordinate) -> Result<(), Error> {
            if coordinate.longitude() > 40.0 {
                return Err(location_unreachable_error("location is in the ocean"));
            }
            Ok(())
        }
    }

    struct UnavailableValidator;

    #[async_trait]
    impl LocationValidator for UnavailableValidator {
        async fn validate_location(&self, _: Coordinate) -> Result<(), Error> {
            Err(upstream_error("OVER_QUERY_LIMIT"))
        }
    }

    /// Holds the first check open until the test releases it.
    struct GatedValidator {
        gate: Mutex<Option<oneshot::Receiver<()>>>,
    }

    #[async_trait]
    impl LocationValidator for GatedValidator {
        async fn validate_location(&self, _: Coordinate) -> Result<(), Error> {
            let gate = self.gate.lock().unwrap().take();
            if let Some(rx) = gate {
                rx.await.unwrap();
            }
            Ok(())
        }
    }

    fn patch(current: &str, pickup: &str, dropoff: &str) -> TripInputPatch {
        TripInputPatch {
            current_location: Some(current.into()),
            pickup_location: Some(pickup.into()),
            dropoff_location: Some(dropoff.into()),
            cycle_hours: Some("11".into()),
        }
    }

    fn valid_patch() -> TripInputPatch {
        patch("1.2921,36.8219", "1.3,36.9", "1.4,37.0")
    }

    fn route(points: &[(f64, f64)]) -> Route {
        Route::new(
            points
                .iter()
                .map(|&(lat, lon)| Coordinate::new(lat, lon).unwrap())
                .collect(),
        )
    }

    async fn trip_with(engine: &Engine, patch: TripInputPatch) -> Uuid {
        let id = engine.create_trip().await.unwrap().id;
        engine.update_trip(id, patch).await.unwrap();
        id
    }

    #[test]
    fn submit_valid_trip_is_ready() {
        block_on(async {
            let expected = route(&[(1.2921, 36.8219), (1.35, 36.95), (1.4, 37.0)]);
            let client = StaticRouteClient::new(Ok(expected.clone()));
            let engine = Engine::new(client.clone());
            let id = trip_with(&engine, valid_patch()).await;

            let session = engine.submit_trip(id).await.unwrap();

            assert_eq!(session.status, TripStatus::Ready);
            assert_eq!(session.route, expected);
            assert_eq!(session.waypoints.unwrap().to_array().len(), 3);
            assert_eq!(client.calls(), 1);
        });
    }

    #[test]
    fn out_of_range_input_never_reaches_the_network() {
        block_on(async {
            let client = StaticRouteClient::new(Ok(Route::default()));
            let engine = Engine::new(client.clone());
            let id = trip_with(&engine, patch("91,36", "1.3,36.9", "1.4,37.0")).await;

            let err = engine.submit_trip(id).await.unwrap_err();

            assert_eq!(err.code, COORDINATE_PARSE_ERROR);
            assert_eq!(engine.find_trip(id).await.unwrap().status, TripStatus::Invalid);
            assert_eq!(client.calls(), 0);
        });
    }

    #[test]
    fn non_numeric_input_is_invalid() {
        block_on(async {
            let client = StaticRouteClient::new(Ok(Route::default()));
            let engine = Engine::new(client.clone());
            let id = trip_with(&engine, patch("1.2921,36.8219", "abc,36", "1.4,37.0")).await;

            assert!(engine.submit_trip(id).await.is_err());
            assert_eq!(engine.find_trip(id).await.unwrap().status, TripStatus::Invalid);
            assert_eq!(client.calls(), 0);
        });
    }

    #[test]
    fn empty_geometry_is_ready_with_empty_route() {
        block_on(async {
            let engine = Engine::new(StaticRouteClient::new(Ok(Route::default())));
            let id = trip_with(&engine, valid_patch()).await;

            let session = engine.submit_trip(id).await.unwrap();

            assert_eq!(session.status, TripStatus::Ready);
            assert!(session.route.is_empty());
            assert!(session.notice.is_none());
        });
    }

    #[test]
    fn network_error_keeps_prior_route() {
        block_on(async {
            let prior = route(&[(1.0, 36.0), (1.4, 37.0)]);
            let client = StaticRouteClient::new(Ok(prior.clone()));
            let engine = Engine::new(client.clone());
            let id = trip_with(&engine, valid_patch()).await;
            engine.submit_trip(id).await.unwrap();

            client.set(Err(route_fetch_error("connection reset")));
            let session = engine.submit_trip(id).await.unwrap();

            assert_eq!(session.status, TripStatus::Failed);
            assert_eq!(session.route, prior);
            assert_eq!(session.notice.as_deref(), Some(FETCH_FAILED_NOTICE));
        });
    }

    #[test]
    fn resubmitting_same_input_is_idempotent() {
        block_on(async {
            let expected = route(&[(1.2921, 36.8219), (1.4, 37.0)]);
            let engine = Engine::new(StaticRouteClient::new(Ok(expected)));
            let id = trip_with(&engine, valid_patch()).await;

            let first = engine.submit_trip(id).await.unwrap();
            let second = engine.submit_trip(id).await.unwrap();

            assert_eq!(first.route, second.route);
            assert_eq!(first.waypoints, second.waypoints);
        });
    }

    #[test]
    fn later_resolving_fetch_wins() {
        block_on(async {
            let (first_tx, first_rx) = oneshot::channel();
            let (second_tx, second_rx) = oneshot::channel();
            let client = QueuedRouteClient {
                responses: Mutex::new(VecDeque::from(vec![first_rx, second_rx])),
            };
            let engine = Engine::new(Arc::new(client));
            let id = trip_with(&engine, valid_patch()).await;

            let first_route = route(&[(1.0, 36.0), (1.1, 36.1)]);
            let second_route = route(&[(2.0, 37.0), (2.1, 37.1)]);

            let responder = async {
                second_tx.send(Ok(second_route.clone())).unwrap();
                while engine.find_trip(id).await.unwrap().route != second_route {
                    tokio::task::yield_now().await;
                }
                first_tx.send(Ok(first_route.clone())).unwrap();
            };

            let (first, second, ()) =
                tokio::join!(engine.submit_trip(id), engine.submit_trip(id), responder);

            assert!(first.is_ok());
            assert!(second.is_ok());

            let session = engine.find_trip(id).await.unwrap();
            assert_eq!(session.route, first_route);
            assert_eq!(session.status, TripStatus::Ready);
        });
    }

    #[test]
    fn land_check_rejects_before_fetching() {
        block_on(async {
            let client = StaticRouteClient::new(Ok(Route::default()));
            let engine =
                Engine::new(client.clone()).with_location_validator(Arc::new(OceanValidator));
            let id = trip_with(&engine, patch("1.2921,36.8219", "-4.0,45.0", "1.4,37.0")).await;

            let err = engine.submit_trip(id).await.unwrap_err();

            assert_eq!(err.code, crate::error::LOCATION_UNREACHABLE_ERROR);
            assert_eq!(engine.find_trip(id).await.unwrap().status, TripStatus::Invalid);
            assert_eq!(client.calls(), 0);
        });
    }

    #[test]
    fn land_check_passes_valid_trip_through() {
        block_on(async {
            let client = StaticRouteClient::new(Ok(route(&[(1.2921, 36.8219), (1.4, 37.0)])));
            let engine =
                Engine::new(client.clone()).with_location_validator(Arc::new(OceanValidator));
            let id = trip_with(&engine, valid_patch()).await;

            let session = engine.submit_trip(id).await.unwrap();

            assert_eq!(session.status, TripStatus::Ready);
            assert_eq!(client.calls(), 1);
        });
    }

    #[test]
    fn unknown_trip_is_not_found() {
        block_on(async {
            let engine = Engine::new(StaticRouteClient::new(Ok(Route::default())));

            let err = engine.submit_trip(Uuid::new_v4()).await.unwrap_err();

            assert_eq!(err.code, crate::error::NOT_FOUND_ERROR);
        });
    }

    #[test]
    fn land_check_outage_fails_without_fetching() {
        block_on(async {
            let client = StaticRouteClient::new(Ok(Route::default()));
            let engine =
                Engine::new(client.clone()).with_location_validator(Arc::new(UnavailableValidator));
            let id = trip_with(&engine, valid_patch()).await;

            let session = engine.submit_trip(id).await.unwrap();

            assert_eq!(session.status, TripStatus::Failed);
            assert_eq!(session.notice.as_deref(), Some(LOCATION_CHECK_FAILED_NOTICE));
            assert_eq!(client.calls(), 0);
        });
    }

    #[test]
    fn edit_during_land_check_still_fetches() {
        block_on(async {
            let (tx, rx) = oneshot::channel();
            let client = StaticRouteClient::new(Ok(route(&[(1.2921, 36.8219), (1.4, 37.0)])));
            let engine = Engine::new(client.clone()).with_location_validator(Arc::new(
                GatedValidator {
                    gate: Mutex::new(Some(rx)),
                },
            ));
            let id = trip_with(&engine, valid_patch()).await;

            let editor = async {
                while engine.find_trip(id).await.unwrap().status != TripStatus::Validating {
                    tokio::task::yield_now().await;
                }

                let edited = engine
                    .update_trip(
                        id,
                        TripInputPatch {
                            cycle_hours: Some("9".into()),
                            ..Default::default()
                        },
                    )
                    .await
                    .unwrap();
                assert_eq!(edited.status, TripStatus::Validating);

                tx.send(()).unwrap();
            };

            let (submitted, ()) = tokio::join!(engine.submit_trip(id), editor);

            let session = submitted.unwrap();
            assert_eq!(session.status, TripStatus::Ready);
            assert_eq!(session.input.cycle_hours, "9");
            assert_eq!(client.calls(), 1);
        });
    }

    #[test]
    fn deleted_trip_is_gone() {
        block_on(async {
            let engine = Engine::new(StaticRouteClient::new(Ok(Route::default())));
            let id = trip_with(&engine, valid_patch()).await;

            let deleted = engine.delete_trip(id).await.unwrap();

            assert_eq!(deleted.id, id);
            assert_eq!(engine.find_trip(id).await.unwrap_err().code, NOT_FOUND_ERROR);
            assert_eq!(engine.delete_trip(id).await.unwrap_err().code, NOT_FOUND_ERROR);
        });
    }

    #[test]
    fn stale_sessions_are_evicted_on_create() {
        block_on(async {
            let engine = Engine::new(StaticRouteClient::new(Ok(Route::default())))
                .with_session_ttl(Duration::minutes(30));
            let stale = engine.create_trip().await.unwrap().id;
            let busy = engine.create_trip().await.unwrap().id;
            let fresh = engine.create_trip().await.unwrap().id;

            let long_ago = Utc::now() - Duration::hours(2);
            update_session(&engine.sessions, &stale, |session| session.updated_at = long_ago)
                .await
                .unwrap();
            update_session(&engine.sessions, &busy, |session| {
                session.status = TripStatus::Validating;
                session.updated_at = long_ago;
            })
            .await
            .unwrap();

            engine.create_trip().await.unwrap();

            assert_eq!(engine.find_trip(stale).await.unwrap_err().code, NOT_FOUND_ERROR);
            assert!(engine.find_trip(busy).await.is_ok());
            assert!(engine.find_trip(fresh).await.is_ok());
        });
    }
}

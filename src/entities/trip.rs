use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{MapView, Route, RouteRequest, Waypoints};
use crate::error::{invalid_state_error, Error};

pub const INVALID_LOCATION_NOTICE: &str = "One of your locations is invalid";
pub const FETCH_FAILED_NOTICE: &str = "Could not fetch a route, please try again";
pub const LOCATION_CHECK_FAILED_NOTICE: &str = "Could not check your locations, please try again";

/// Raw form values, kept exactly as typed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TripInput {
    pub current_location: String,
    pub pickup_location: String,
    pub dropoff_location: String,
    pub cycle_hours: String,
}

/// A partial edit of [`TripInput`]; absent fields are left untouched.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TripInputPatch {
    pub current_location: Option<String>,
    pub pickup_location: Option<String>,
    pub dropoff_location: Option<String>,
    pub cycle_hours: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum Status {
    Idle,
    Validating,
    Invalid,
    Fetching { submission: u64 },
    Ready,
    Failed,
}

impl Status {
    pub fn name(&self) -> String {
        match self {
            Self::Idle => "idle".into(),
            Self::Validating => "validating".into(),
            Self::Invalid => "invalid".into(),
            Self::Fetching { submission: _ } => "fetching".into(),
            Self::Ready => "ready".into(),
            Self::Failed => "failed".into(),
        }
    }
}

/// A fetch that has been started but not yet applied to the session.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingFetch {
    pub submission: u64,
    pub request: RouteRequest,
}

#[derive(Clone, Debug, Serialize)]
pub struct TripSession {
    pub id: Uuid,
    pub status: Status,
    pub input: TripInput,
    pub waypoints: Option<Waypoints>,
    pub route: Route,
    pub notice: Option<String>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    submissions: u64,
}

impl Default for TripSession {
    fn default() -> Self {
        Self::new()
    }
}

impl TripSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            status: Status::Idle,
            input: TripInput::default(),
            waypoints: None,
            route: Route::default(),
            notice: None,
            updated_at: Utc::now(),
            submissions: 0,
        }
    }

    pub fn is_fetching(&self) -> bool {
        matches!(self.status, Status::Fetching { submission: _ })
    }

    /// A submit is under way: locations are being checked or a route is
    /// being fetched.
    pub fn is_in_flight(&self) -> bool {
        matches!(self.status, Status::Validating) || self.is_fetching()
    }

    /// Applies an edit. Any settled session goes back to `Idle`; a submit in
    /// flight keeps its status and finishes with the waypoints it validated.
    pub fn update(&mut self, patch: TripInputPatch) {
        if let Some(value) = patch.current_location {
            self.input.current_location = value;
        }
        if let Some(value) = patch.pickup_location {
            self.input.pickup_location = value;
        }
        if let Some(value) = patch.dropoff_location {
            self.input.dropoff_location = value;
        }
        if let Some(value) = patch.cycle_hours {
            self.input.cycle_hours = value;
        }

        if !self.is_in_flight() {
            self.status = Status::Idle;
        }
        self.notice = None;
        self.touch();
    }

    /// Parses all three locations. On failure the session is `Invalid` and
    /// waypoints from an earlier submit are left alone.
    #[tracing::instrument(skip(self), fields(id = %self.id))]
    pub fn validate(&mut self) -> Result<Waypoints, Error> {
        self.status = Status::Validating;
        self.touch();

        match Waypoints::parse(&self.input) {
            Ok(waypoints) => Ok(waypoints),
            Err(err) => {
                self.reject(err.clone());
                Err(err)
            }
        }
    }

    /// Ends a submit before any route is requested. Bad input leaves the
    /// session `Invalid`; a location check that could not run leaves it
    /// `Failed` so the same input can be retried.
    pub fn reject(&mut self, err: Error) {
        if err.is_validation_error() {
            tracing::debug!(id = %self.id, error = %err, "trip input rejected");

            self.status = Status::Invalid;
            self.notice = Some(INVALID_LOCATION_NOTICE.into());
        } else {
            tracing::warn!(id = %self.id, error = %err, "location check failed");

            self.status = Status::Failed;
            self.notice = Some(LOCATION_CHECK_FAILED_NOTICE.into());
        }
        self.touch();
    }

    /// Commits validated waypoints and hands out the request to send. An
    /// earlier fetch still in flight is not cancelled.
    pub fn begin_fetch(&mut self, waypoints: Waypoints) -> Result<PendingFetch, Error> {
        match self.status {
            Status::Validating | Status::Fetching { submission: _ } => {
                self.submissions += 1;
                self.waypoints = Some(waypoints);
                self.status = Status::Fetching {
                    submission: self.submissions,
                };
                self.notice = None;
                self.touch();

                Ok(PendingFetch {
                    submission: self.submissions,
                    request: RouteRequest::build(&waypoints),
                })
            }
            _ => Err(invalid_state_error()),
        }
    }

    /// Validation followed by `begin_fetch`, for callers without a
    /// pre-validation step.
    pub fn submit(&mut self) -> Result<PendingFetch, Error> {
        let waypoints = self.validate()?;
        self.begin_fetch(waypoints)
    }

    /// Applies a finished fetch. Whichever fetch resolves last wins, even if
    /// it was submitted first.
    #[tracing::instrument(skip(self, pending, result), fields(id = %self.id, submission = pending.submission))]
    pub fn resolve(&mut self, pending: PendingFetch, result: Result<Route, Error>) {
        match result {
            Ok(route) => {
                if route.is_empty() {
                    tracing::debug!("no route found");
                }

                self.route = route;
                self.status = Status::Ready;
                self.notice = None;
            }
            Err(err) => {
                tracing::warn!(error = %err, "route fetch failed");

                self.status = Status::Failed;
                self.notice = Some(FETCH_FAILED_NOTICE.into());
            }
        }

        self.touch();
    }

    pub fn map(&self) -> MapView {
        MapView::new(self.waypoints.as_ref(), &self.route)
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
use crate::entities::Coordinate;

#[cfg(test)]
fn valid_session() -> TripSession {
    let mut session = TripSession::new();
    session.update(TripInputPatch {
        current_location: Some("1.2921,36.8219".into()),
        pickup_location: Some("1.3,36.9".into()),
        dropoff_location: Some("1.4,37.0".into()),
        cycle_hours: Some("8".into()),
    });
    session
}

#[cfg(test)]
fn route(points: &[(f64, f64)]) -> Route {
    Route::new(
        points
            .iter()
            .map(|&(lat, lon)| Coordinate::new(lat, lon).unwrap())
            .collect(),
    )
}

#[test]
fn new_session_is_idle_and_empty() {
    let session = TripSession::new();

    assert_eq!(session.status, Status::Idle);
    assert!(session.waypoints.is_none());
    assert!(session.route.is_empty());
}

#[test]
fn valid_submit_starts_fetching_with_three_waypoints() {
    let mut session = valid_session();

    let pending = session.submit().unwrap();

    assert_eq!(session.status, Status::Fetching { submission: 1 });
    let waypoints = session.waypoints.unwrap();
    assert_eq!(waypoints.current, Coordinate::new(1.2921, 36.8219).unwrap());
    assert_eq!(waypoints.pickup, Coordinate::new(1.3, 36.9).unwrap());
    assert_eq!(waypoints.dropoff, Coordinate::new(1.4, 37.0).unwrap());
    assert_eq!(pending.request.points, waypoints.to_array());
}

#[test]
fn out_of_range_latitude_is_invalid() {
    let mut session = valid_session();
    session.update(TripInputPatch {
        pickup_location: Some("91,36".into()),
        ..Default::default()
    });

    assert!(session.submit().is_err());
    assert_eq!(session.status, Status::Invalid);
    assert_eq!(session.notice.as_deref(), Some(INVALID_LOCATION_NOTICE));
    assert!(session.waypoints.is_none());
}

#[test]
fn non_numeric_input_is_invalid() {
    let mut session = valid_session();
    session.update(TripInputPatch {
        current_location: Some("abc,36".into()),
        ..Default::default()
    });

    assert!(session.submit().is_err());
    assert_eq!(session.status, Status::Invalid);
}

#[test]
fn editing_after_invalid_returns_to_idle() {
    let mut session = valid_session();
    session.update(TripInputPatch {
        current_location: Some("abc,36".into()),
        ..Default::default()
    });
    let _ = session.submit();

    session.update(TripInputPatch {
        current_location: Some("1.2921,36.8219".into()),
        ..Default::default()
    });

    assert_eq!(session.status, Status::Idle);
    assert!(session.notice.is_none());
}

#[test]
fn editing_while_fetching_keeps_fetching() {
    let mut session = valid_session();
    session.submit().unwrap();

    session.update(TripInputPatch {
        cycle_hours: Some("10".into()),
        ..Default::default()
    });

    assert!(session.is_fetching());
    assert_eq!(session.input.cycle_hours, "10");
}

#[test]
fn empty_route_is_ready_without_notice() {
    let mut session = valid_session();
    let pending = session.submit().unwrap();

    session.resolve(pending, Ok(Route::default()));

    assert_eq!(session.status, Status::Ready);
    assert!(session.route.is_empty());
    assert!(session.notice.is_none());
}

#[test]
fn failed_fetch_keeps_previous_route() {
    let mut session = valid_session();
    let first = route(&[(1.0, 2.0), (3.0, 4.0)]);

    let pending = session.submit().unwrap();
    session.resolve(pending, Ok(first.clone()));

    let pending = session.submit().unwrap();
    session.resolve(pending, Err(crate::error::route_fetch_error("timed out")));

    assert_eq!(session.status, Status::Failed);
    assert_eq!(session.route, first);
    assert_eq!(session.notice.as_deref(), Some(FETCH_FAILED_NOTICE));
}

#[test]
fn last_resolved_fetch_wins() {
    let mut session = valid_session();
    let first_response = route(&[(1.0, 2.0), (3.0, 4.0)]);
    let second_response = route(&[(5.0, 6.0), (7.0, 8.0)]);

    let first = session.submit().unwrap();
    let second = session.submit().unwrap();
    assert_eq!(session.status, Status::Fetching { submission: 2 });

    session.resolve(second, Ok(second_response));
    session.resolve(first, Ok(first_response.clone()));

    assert_eq!(session.route, first_response);
    assert_eq!(session.status, Status::Ready);
}

#[test]
fn begin_fetch_requires_validation() {
    let mut session = valid_session();
    let waypoints = Waypoints::parse(&session.input).unwrap();

    assert_eq!(
        session.begin_fetch(waypoints).map_err(|e| e.code),
        Err(crate::error::INVALID_STATE_ERROR)
    );
}

#[test]
fn status_serializes_with_name_tag() {
    let value = serde_json::to_value(Status::Fetching { submission: 3 }).unwrap();

    assert_eq!(value, serde_json::json!({ "name": "fetching", "submission": 3 }));
    assert_eq!(Status::Ready.name(), "ready");
}

#[test]
fn editing_while_validating_keeps_validating() {
    let mut session = valid_session();
    let waypoints = session.validate().unwrap();

    session.update(TripInputPatch {
        dropoff_location: Some("1.5,37.1".into()),
        ..Default::default()
    });
    assert_eq!(session.status, Status::Validating);

    let pending = session.begin_fetch(waypoints).unwrap();
    assert_eq!(pending.request.points, waypoints.to_array());
    assert_eq!(session.input.dropoff_location, "1.5,37.1");
}

#[test]
fn unreachable_location_is_invalid() {
    let mut session = valid_session();
    session.validate().unwrap();

    session.reject(crate::error::location_unreachable_error("location is in the ocean"));

    assert_eq!(session.status, Status::Invalid);
    assert_eq!(session.notice.as_deref(), Some(INVALID_LOCATION_NOTICE));
}

#[test]
fn location_check_outage_is_failed_not_invalid() {
    let mut session = valid_session();
    session.validate().unwrap();

    session.reject(crate::error::upstream_error("OVER_QUERY_LIMIT"));

    assert_eq!(session.status, Status::Failed);
    assert_eq!(session.notice.as_deref(), Some(LOCATION_CHECK_FAILED_NOTICE));

    session.submit().unwrap();
    assert!(session.is_fetching());
}

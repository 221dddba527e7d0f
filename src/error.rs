use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::env;
use std::fmt::{self, Debug, Display};

#[derive(Clone, Debug, PartialEq)]
pub struct Error {
    pub code: i32,
    pub message: String,
}

pub const ENV_VAR_ERROR: i32 = 1;
pub const ROUTE_FETCH_ERROR: i32 = 3;
pub const UPSTREAM_ERROR: i32 = 4;
pub const UNEXPECTED_ERROR: i32 = 5;
pub const INVALID_STATE_ERROR: i32 = 100;
pub const INVALID_INPUT_ERROR: i32 = 101;
pub const COORDINATE_PARSE_ERROR: i32 = 102;
pub const LOCATION_UNREACHABLE_ERROR: i32 = 103;
pub const NOT_FOUND_ERROR: i32 = 104;

impl Error {
    /// Validation failures block the submit and never reach the network.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self.code,
            COORDINATE_PARSE_ERROR | LOCATION_UNREACHABLE_ERROR | INVALID_INPUT_ERROR
        )
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

impl std::error::Error for Error {}

impl From<env::VarError> for Error {
    fn from(err: env::VarError) -> Self {
        env_var_error(err)
    }
}

impl From<reqwest::Error> for Error {
    /// Request URLs carry the access token, so they never reach the message.
    fn from(err: reqwest::Error) -> Self {
        route_fetch_error(err.without_url())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        route_fetch_error(format!("malformed response: {}", err))
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_message) = match self.code {
            1..=99 => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"),
            NOT_FOUND_ERROR => (StatusCode::NOT_FOUND, self.message.as_str()),
            _ => (StatusCode::BAD_REQUEST, self.message.as_str()),
        };

        let body = Json(json!({
            "code": self.code,
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

pub fn invalid_state_error() -> Error {
    Error {
        code: INVALID_STATE_ERROR,
        message: "invalid state".into(),
    }
}

pub fn invalid_input_error() -> Error {
    Error {
        code: INVALID_INPUT_ERROR,
        message: "invalid input".into(),
    }
}

/// Deliberately does not name the offending field or value.
pub fn coordinate_parse_error() -> Error {
    Error {
        code: COORDINATE_PARSE_ERROR,
        message: "One of your locations is invalid".into(),
    }
}

pub fn location_unreachable_error<T: Display>(reason: T) -> Error {
    Error {
        code: LOCATION_UNREACHABLE_ERROR,
        message: format!("location unreachable: {}", reason),
    }
}

pub fn not_found_error() -> Error {
    Error {
        code: NOT_FOUND_ERROR,
        message: "not found".into(),
    }
}

pub fn env_var_error(err: env::VarError) -> Error {
    Error {
        code: ENV_VAR_ERROR,
        message: format!("environment variable error: {}", err),
    }
}

pub fn route_fetch_error<T: Display>(cause: T) -> Error {
    Error {
        code: ROUTE_FETCH_ERROR,
        message: format!("route fetch error: {}", cause),
    }
}

pub fn upstream_error<T: Debug>(status: T) -> Error {
    Error {
        code: UPSTREAM_ERROR,
        message: format!("upstream error: {:?}", status),
    }
}

pub fn unexpected_error() -> Error {
    Error {
        code: UNEXPECTED_ERROR,
        message: "unexpected error".into(),
    }
}

#[test]
fn client_errors_map_to_bad_request() {
    let response = coordinate_parse_error().into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = not_found_error().into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[test]
fn internal_errors_hide_their_message() {
    let response = route_fetch_error("connection refused").into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn route_fetch_error_carries_cause() {
    let err = route_fetch_error("connection refused");
    assert_eq!(err.code, ROUTE_FETCH_ERROR);
    assert!(err.message.contains("connection refused"));
    assert!(!err.is_validation_error());
    assert!(coordinate_parse_error().is_validation_error());
}
